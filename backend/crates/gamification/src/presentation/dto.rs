//! API DTOs (Data Transfer Objects)

use crate::application::catalog::{QuizView, TaskProgress};
use crate::application::ranking::MissionRankingEntry;
use crate::domain::entities::{
    Enrollment, Mission, MissionTopScorer, PointLog, QuizAnswer, RankedUser, Submission, User,
};
use crate::domain::value_objects::{
    ParticipationStatus, PaymentStatus, PointCategory, PublicQuestion, TaskDifficulty, TaskType,
};
use auth::UserRole;
use chrono::{DateTime, Utc};
use kernel::id::{
    EnrollmentId, MissionId, PointLogId, QuestionId, QuizId, SubmissionId, TaskId, UserId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Request for POST /api/missions/{mission_id}/tasks/{task_id}/submit
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitTaskRequest {
    #[serde(default)]
    pub evidence: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub question_id: QuestionId,
    pub answer: String,
}

/// Request for POST /api/quizzes/{quiz_id}/submit
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: Vec<AnswerRequest>,
}

/// Request for POST /api/admin/submissions/{submission_id}/validate
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateSubmissionRequest {
    pub approve: bool,
    #[serde(default)]
    pub points: Option<i32>,
}

/// Request for POST /api/admin/missions/{mission_id}/participants
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddParticipantRequest {
    pub user_id: UserId,
}

/// Request for POST /api/admin/missions
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMissionRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub price_cents: i64,
    #[serde(default)]
    pub capacity: Option<i32>,
    #[serde(default)]
    pub previous_mission_id: Option<MissionId>,
}

/// Request for POST /api/admin/missions/{mission_id}/tasks
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub points: i32,
    pub task_type: TaskType,
    #[serde(default)]
    pub difficulty: TaskDifficulty,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default)]
    pub requirements: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub statement: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// Request for POST /api/admin/tasks/{task_id}/quiz
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuizRequest {
    pub title: String,
    pub questions: Vec<CreateQuestionRequest>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub points: i64,
    pub total_points: i64,
    pub avatar_url: Option<String>,
}

impl From<User> for MeResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            points: u.points,
            total_points: u.total_points,
            avatar_url: u.avatar_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointLogResponse {
    pub id: PointLogId,
    pub task_id: Option<TaskId>,
    pub points: i32,
    pub category: PointCategory,
    pub description: String,
    /// `None` for automatic scoring
    pub validated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl From<PointLog> for PointLogResponse {
    fn from(l: PointLog) -> Self {
        Self {
            id: l.id,
            task_id: l.task_id,
            points: l.points,
            category: l.category,
            description: l.description,
            validated_by: l.validator.staff_id(),
            created_at: l.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionResponse {
    pub id: MissionId,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub price_cents: i64,
    pub capacity: Option<i32>,
    pub previous_mission_id: Option<MissionId>,
}

impl From<Mission> for MissionResponse {
    fn from(m: Mission) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            starts_at: m.starts_at,
            ends_at: m.ends_at,
            price_cents: m.price_cents,
            capacity: m.capacity,
            previous_mission_id: m.previous_mission_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub id: SubmissionId,
    pub user_id: UserId,
    pub task_id: TaskId,
    pub completed: bool,
    pub points_awarded: i32,
    pub evidence: Value,
    pub attempts: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub validated_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionResponse {
    fn from(s: Submission) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            task_id: s.task_id,
            completed: s.completed,
            points_awarded: s.points_awarded,
            evidence: s.evidence,
            attempts: s.attempts,
            completed_at: s.completed_at,
            validated_at: s.validated_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: TaskId,
    pub mission_id: MissionId,
    pub title: String,
    pub description: Option<String>,
    pub points: i32,
    pub task_type: TaskType,
    pub difficulty: TaskDifficulty,
    pub order_index: i32,
    pub requirements: Option<Value>,
    pub quiz_id: Option<QuizId>,
    pub submission: Option<SubmissionResponse>,
}

impl From<TaskProgress> for TaskResponse {
    fn from(p: TaskProgress) -> Self {
        let t = p.task;
        Self {
            id: t.id,
            mission_id: t.mission_id,
            title: t.title,
            description: t.description,
            points: t.points,
            task_type: t.task_type,
            difficulty: t.difficulty,
            order_index: t.order_index,
            requirements: t.requirements,
            quiz_id: p.quiz_id,
            submission: p.submission.map(SubmissionResponse::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResponse {
    pub id: QuizId,
    pub task_id: TaskId,
    pub title: String,
    pub questions: Vec<PublicQuestion>,
}

impl From<QuizView> for QuizResponse {
    fn from(v: QuizView) -> Self {
        Self {
            id: v.quiz.id,
            task_id: v.quiz.task_id,
            title: v.quiz.title,
            questions: v.questions,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub correct: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTaskResponse {
    pub submission: SubmissionResponse,
    pub score: Option<ScoreResponse>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswerResponse {
    pub question_id: QuestionId,
    pub answer: String,
    pub is_correct: bool,
}

impl From<QuizAnswer> for QuizAnswerResponse {
    fn from(a: QuizAnswer) -> Self {
        Self {
            question_id: a.question_id,
            answer: a.submitted_answer,
            is_correct: a.is_correct,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizResponse {
    pub score: ScoreResponse,
    pub points_earned: i32,
    pub answers: Vec<QuizAnswerResponse>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateSubmissionResponse {
    pub submission: SubmissionResponse,
    pub points_credited: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub mission_id: MissionId,
    pub payment_status: PaymentStatus,
    pub participation_status: ParticipationStatus,
    pub amount_paid_cents: i64,
    pub enrolled_at: DateTime<Utc>,
}

impl From<Enrollment> for EnrollmentResponse {
    fn from(e: Enrollment) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            mission_id: e.mission_id,
            payment_status: e.payment_status,
            participation_status: e.participation_status,
            amount_paid_cents: e.amount_paid_cents,
            enrolled_at: e.enrolled_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveMissionResponse {
    pub removed_submissions: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntryResponse {
    pub position: usize,
    pub user_id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    pub total_points: i64,
}

impl RankingEntryResponse {
    pub fn ranked(users: Vec<RankedUser>) -> Vec<Self> {
        users
            .into_iter()
            .enumerate()
            .map(|(i, u)| Self {
                position: i + 1,
                user_id: u.user_id,
                name: u.name,
                avatar_url: u.avatar_url,
                total_points: u.total_points,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionTopScorerResponse {
    pub mission_id: MissionId,
    pub mission_title: String,
    pub user_id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    pub points: i64,
}

impl From<MissionTopScorer> for MissionTopScorerResponse {
    fn from(t: MissionTopScorer) -> Self {
        Self {
            mission_id: t.mission_id,
            mission_title: t.mission_title,
            user_id: t.user_id,
            name: t.name,
            avatar_url: t.avatar_url,
            points: t.points,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionRankingEntryResponse {
    pub position: usize,
    pub user_id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    pub points: i64,
    pub is_current_user: bool,
}

impl From<MissionRankingEntry> for MissionRankingEntryResponse {
    fn from(e: MissionRankingEntry) -> Self {
        Self {
            position: e.position,
            user_id: e.score.user_id,
            name: e.score.name,
            avatar_url: e.score.avatar_url,
            points: e.score.points,
            is_current_user: e.is_current_user,
        }
    }
}

/// Response for GET /api/health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
