//! HTTP Handlers

use crate::application::catalog::{
    CatalogAdminUseCase, CatalogQueryUseCase, NewMission, NewQuestion, NewQuiz, NewTask,
};
use crate::application::config::GamificationConfig;
use crate::application::enrollment::{
    AddParticipantUseCase, JoinMissionUseCase, LeaveMissionUseCase, RemoveParticipantUseCase,
};
use crate::application::profile::ProfileUseCase;
use crate::application::ranking::RankingUseCase;
use crate::application::submit_quiz::{SubmitQuizInput, SubmitQuizUseCase, SubmittedAnswer};
use crate::application::submit_task::{SubmitTaskInput, SubmitTaskUseCase};
use crate::application::validate_submission::{
    ValidateSubmissionInput, ValidateSubmissionUseCase,
};
use crate::domain::repository::GamificationStore;
use crate::error::GamificationResult;
use crate::presentation::dto::{
    AddParticipantRequest, CreateMissionRequest, CreateQuizRequest, CreateTaskRequest,
    EnrollmentResponse, HealthResponse, LeaveMissionResponse, MeResponse, MissionRankingEntryResponse,
    MissionResponse, MissionTopScorerResponse, PointLogResponse, QuizAnswerResponse, QuizResponse,
    RankingEntryResponse, ScoreResponse, SubmissionResponse, SubmitQuizRequest, SubmitQuizResponse,
    SubmitTaskRequest, SubmitTaskResponse, TaskResponse, ValidateSubmissionRequest,
    ValidateSubmissionResponse,
};
use auth::Identity;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use kernel::id::{MissionId, QuizId, SubmissionId, TaskId, UserId};
use std::sync::Arc;

/// Shared state for gamification handlers
#[derive(Clone)]
pub struct GamificationAppState<R>
where
    R: GamificationStore,
{
    pub repo: Arc<R>,
    pub config: Arc<GamificationConfig>,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// GET /api/me
pub async fn me<R>(
    State(state): State<GamificationAppState<R>>,
    identity: Identity,
) -> GamificationResult<Json<MeResponse>>
where
    R: GamificationStore,
{
    let user = ProfileUseCase::new(state.repo.clone())
        .me(identity.user_id)
        .await?;
    Ok(Json(user.into()))
}

/// GET /api/me/points
pub async fn point_history<R>(
    State(state): State<GamificationAppState<R>>,
    identity: Identity,
) -> GamificationResult<Json<Vec<PointLogResponse>>>
where
    R: GamificationStore,
{
    let logs = ProfileUseCase::new(state.repo.clone())
        .point_history(identity.user_id, state.config.point_history_limit)
        .await?;
    Ok(Json(logs.into_iter().map(Into::into).collect()))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// GET /api/missions
pub async fn list_missions<R>(
    State(state): State<GamificationAppState<R>>,
) -> GamificationResult<Json<Vec<MissionResponse>>>
where
    R: GamificationStore,
{
    let missions = CatalogQueryUseCase::new(state.repo.clone(), state.repo.clone())
        .missions()
        .await?;
    Ok(Json(missions.into_iter().map(Into::into).collect()))
}

/// GET /api/missions/{mission_id}/tasks
pub async fn list_mission_tasks<R>(
    State(state): State<GamificationAppState<R>>,
    identity: Identity,
    Path(mission_id): Path<MissionId>,
) -> GamificationResult<Json<Vec<TaskResponse>>>
where
    R: GamificationStore,
{
    let tasks = CatalogQueryUseCase::new(state.repo.clone(), state.repo.clone())
        .mission_tasks(identity.user_id, mission_id)
        .await?;
    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}

/// GET /api/quizzes/{quiz_id}
pub async fn get_quiz<R>(
    State(state): State<GamificationAppState<R>>,
    Path(quiz_id): Path<QuizId>,
) -> GamificationResult<Json<QuizResponse>>
where
    R: GamificationStore,
{
    let quiz = CatalogQueryUseCase::new(state.repo.clone(), state.repo.clone())
        .quiz(quiz_id)
        .await?;
    Ok(Json(quiz.into()))
}

/// POST /api/admin/missions
pub async fn create_mission<R>(
    State(state): State<GamificationAppState<R>>,
    Json(req): Json<CreateMissionRequest>,
) -> GamificationResult<(StatusCode, Json<MissionResponse>)>
where
    R: GamificationStore,
{
    let input = NewMission {
        title: req.title,
        description: req.description,
        starts_at: req.starts_at,
        ends_at: req.ends_at,
        price_cents: req.price_cents,
        capacity: req.capacity,
        previous_mission_id: req.previous_mission_id,
    };
    let mission = CatalogAdminUseCase::new(state.repo.clone())
        .create_mission(input)
        .await?;
    Ok((StatusCode::CREATED, Json(mission.into())))
}

/// POST /api/admin/missions/{mission_id}/tasks
pub async fn create_task<R>(
    State(state): State<GamificationAppState<R>>,
    Path(mission_id): Path<MissionId>,
    Json(req): Json<CreateTaskRequest>,
) -> GamificationResult<(StatusCode, Json<TaskResponse>)>
where
    R: GamificationStore,
{
    let input = NewTask {
        title: req.title,
        description: req.description,
        category_id: req.category_id,
        points: req.points,
        task_type: req.task_type,
        difficulty: req.difficulty,
        order_index: req.order_index,
        requirements: req.requirements,
    };
    let task = CatalogAdminUseCase::new(state.repo.clone())
        .create_task(mission_id, input)
        .await?;
    let progress = crate::application::catalog::TaskProgress {
        task,
        quiz_id: None,
        submission: None,
    };
    Ok((StatusCode::CREATED, Json(progress.into())))
}

/// POST /api/admin/tasks/{task_id}/quiz
pub async fn create_quiz<R>(
    State(state): State<GamificationAppState<R>>,
    Path(task_id): Path<TaskId>,
    Json(req): Json<CreateQuizRequest>,
) -> GamificationResult<(StatusCode, Json<QuizResponse>)>
where
    R: GamificationStore,
{
    let input = NewQuiz {
        title: req.title,
        questions: req
            .questions
            .into_iter()
            .map(|q| NewQuestion {
                statement: q.statement,
                options: q.options,
                correct_answer: q.correct_answer,
            })
            .collect(),
    };
    let quiz = CatalogAdminUseCase::new(state.repo.clone())
        .create_quiz(task_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(quiz.into())))
}

// ---------------------------------------------------------------------------
// Enrollment
// ---------------------------------------------------------------------------

/// POST /api/missions/{mission_id}/join
pub async fn join_mission<R>(
    State(state): State<GamificationAppState<R>>,
    identity: Identity,
    Path(mission_id): Path<MissionId>,
) -> GamificationResult<(StatusCode, Json<EnrollmentResponse>)>
where
    R: GamificationStore,
{
    let enrollment = JoinMissionUseCase::new(state.repo.clone(), state.repo.clone())
        .execute(identity.user_id, mission_id)
        .await?;
    Ok((StatusCode::CREATED, Json(enrollment.into())))
}

/// DELETE /api/missions/{mission_id}/join
pub async fn leave_mission<R>(
    State(state): State<GamificationAppState<R>>,
    identity: Identity,
    Path(mission_id): Path<MissionId>,
) -> GamificationResult<Json<LeaveMissionResponse>>
where
    R: GamificationStore,
{
    let removed = LeaveMissionUseCase::new(state.repo.clone())
        .execute(identity.user_id, mission_id)
        .await?;
    Ok(Json(LeaveMissionResponse {
        removed_submissions: removed,
    }))
}

/// POST /api/admin/missions/{mission_id}/participants
pub async fn add_participant<R>(
    State(state): State<GamificationAppState<R>>,
    identity: Identity,
    Path(mission_id): Path<MissionId>,
    Json(req): Json<AddParticipantRequest>,
) -> GamificationResult<(StatusCode, Json<EnrollmentResponse>)>
where
    R: GamificationStore,
{
    let enrollment =
        AddParticipantUseCase::new(state.repo.clone(), state.repo.clone(), state.repo.clone())
            .execute(identity.user_id, req.user_id, mission_id)
            .await?;
    Ok((StatusCode::CREATED, Json(enrollment.into())))
}

/// DELETE /api/admin/missions/{mission_id}/participants/{user_id}
pub async fn remove_participant<R>(
    State(state): State<GamificationAppState<R>>,
    identity: Identity,
    Path((mission_id, user_id)): Path<(MissionId, UserId)>,
) -> GamificationResult<StatusCode>
where
    R: GamificationStore,
{
    RemoveParticipantUseCase::new(state.repo.clone())
        .execute(identity.user_id, user_id, mission_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Submission workflow
// ---------------------------------------------------------------------------

/// POST /api/missions/{mission_id}/tasks/{task_id}/submit
pub async fn submit_task<R>(
    State(state): State<GamificationAppState<R>>,
    identity: Identity,
    Path((mission_id, task_id)): Path<(MissionId, TaskId)>,
    Json(req): Json<SubmitTaskRequest>,
) -> GamificationResult<Json<SubmitTaskResponse>>
where
    R: GamificationStore,
{
    let use_case =
        SubmitTaskUseCase::new(state.repo.clone(), state.repo.clone(), state.repo.clone());

    let output = use_case
        .execute(SubmitTaskInput {
            user_id: identity.user_id,
            mission_id,
            task_id,
            evidence: req.evidence,
        })
        .await?;

    Ok(Json(SubmitTaskResponse {
        submission: output.submission.into(),
        score: output.score.map(|s| ScoreResponse {
            correct: s.correct,
            total: s.total,
        }),
        message: output.message,
    }))
}

/// POST /api/quizzes/{quiz_id}/submit
pub async fn submit_quiz<R>(
    State(state): State<GamificationAppState<R>>,
    identity: Identity,
    Path(quiz_id): Path<QuizId>,
    Json(req): Json<SubmitQuizRequest>,
) -> GamificationResult<Json<SubmitQuizResponse>>
where
    R: GamificationStore,
{
    let use_case =
        SubmitQuizUseCase::new(state.repo.clone(), state.repo.clone(), state.repo.clone());

    let output = use_case
        .execute(SubmitQuizInput {
            user_id: identity.user_id,
            quiz_id,
            answers: req
                .answers
                .into_iter()
                .map(|a| SubmittedAnswer {
                    question_id: a.question_id,
                    answer: a.answer,
                })
                .collect(),
        })
        .await?;

    Ok(Json(SubmitQuizResponse {
        score: ScoreResponse {
            correct: output.score.correct,
            total: output.score.total,
        },
        points_earned: output.credited,
        answers: output
            .answers
            .into_iter()
            .map(QuizAnswerResponse::from)
            .collect(),
        message: output.message,
    }))
}

/// GET /api/admin/submissions/pending
pub async fn pending_submissions<R>(
    State(state): State<GamificationAppState<R>>,
) -> GamificationResult<Json<Vec<SubmissionResponse>>>
where
    R: GamificationStore,
{
    let pending = ValidateSubmissionUseCase::new(state.repo.clone())
        .pending(state.config.pending_queue_limit)
        .await?;
    Ok(Json(pending.into_iter().map(Into::into).collect()))
}

/// POST /api/admin/submissions/{submission_id}/validate
pub async fn validate_submission<R>(
    State(state): State<GamificationAppState<R>>,
    identity: Identity,
    Path(submission_id): Path<SubmissionId>,
    Json(req): Json<ValidateSubmissionRequest>,
) -> GamificationResult<Json<ValidateSubmissionResponse>>
where
    R: GamificationStore,
{
    let output = ValidateSubmissionUseCase::new(state.repo.clone())
        .execute(ValidateSubmissionInput {
            submission_id,
            validator_id: identity.user_id,
            approve: req.approve,
            points: req.points,
        })
        .await?;

    Ok(Json(ValidateSubmissionResponse {
        submission: output.submission.into(),
        points_credited: output.credited,
    }))
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// GET /api/ranking
pub async fn global_ranking<R>(
    State(state): State<GamificationAppState<R>>,
) -> GamificationResult<Json<Vec<RankingEntryResponse>>>
where
    R: GamificationStore,
{
    let users = RankingUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone())
        .global()
        .await?;
    Ok(Json(RankingEntryResponse::ranked(users)))
}

/// GET /api/ranking/missions
pub async fn mission_top_scorers<R>(
    State(state): State<GamificationAppState<R>>,
) -> GamificationResult<Json<Vec<MissionTopScorerResponse>>>
where
    R: GamificationStore,
{
    let tops = RankingUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone())
        .top_per_mission()
        .await?;
    Ok(Json(tops.into_iter().map(Into::into).collect()))
}

/// GET /api/ranking/missions/{mission_id}
pub async fn mission_ranking<R>(
    State(state): State<GamificationAppState<R>>,
    identity: Identity,
    Path(mission_id): Path<MissionId>,
) -> GamificationResult<Json<Vec<MissionRankingEntryResponse>>>
where
    R: GamificationStore,
{
    let entries = RankingUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone())
        .mission(mission_id, identity.user_id)
        .await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
