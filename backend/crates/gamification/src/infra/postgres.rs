//! PostgreSQL Repository Implementations

use crate::domain::entities::{
    Enrollment, Mission, MissionScore, MissionTopScorer, PointCredit, PointLog, Question, Quiz,
    QuizAnswer, RankedUser, ReviewDecision, Submission, SubmissionDraft, Task, User,
};
use crate::domain::repository::{
    CatalogRepository, EnrollmentRepository, QuizAttemptRepository, RankingRepository,
    SubmissionRepository, UserRepository,
};
use crate::domain::value_objects::{
    ParticipationStatus, PaymentStatus, PointCategory, QuestionOption, TaskDifficulty, TaskType,
    Validator,
};
use crate::error::{GamificationError, GamificationResult};
use auth::UserRole;
use chrono::{DateTime, Utc};
use kernel::id::{
    EnrollmentId, MissionId, PointLogId, QuestionId, QuizId, SubmissionId, TaskId, UserId,
};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

macro_rules! submission_columns {
    () => {
        "submission_id, user_id, task_id, completed, points_awarded, evidence, attempts, \
         completed_at, validator_kind, validator_id, validated_at, created_at, updated_at"
    };
}

macro_rules! mission_columns {
    () => {
        "mission_id, title, description, starts_at, ends_at, price_cents, capacity, is_active, \
         previous_mission_id, created_at"
    };
}

macro_rules! task_columns {
    () => {
        "task_id, mission_id, category_id, title, description, points, task_type, difficulty, \
         order_index, is_active, requirements, created_at"
    };
}

macro_rules! enrollment_columns {
    () => {
        "enrollment_id, user_id, mission_id, payment_status, participation_status, \
         amount_paid_cents, enrolled_at"
    };
}

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgGamificationRepository {
    pool: PgPool,
}

impl PgGamificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl CatalogRepository for PgGamificationRepository {
    async fn find_mission(&self, mission_id: MissionId) -> GamificationResult<Option<Mission>> {
        let row = sqlx::query_as::<_, MissionRow>(concat!(
            "SELECT ",
            mission_columns!(),
            " FROM missions WHERE mission_id = $1"
        ))
        .bind(mission_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MissionRow::into_mission))
    }

    async fn list_active_missions(&self) -> GamificationResult<Vec<Mission>> {
        let rows = sqlx::query_as::<_, MissionRow>(concat!(
            "SELECT ",
            mission_columns!(),
            " FROM missions WHERE is_active ORDER BY starts_at NULLS LAST, created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MissionRow::into_mission).collect())
    }

    async fn find_task(&self, task_id: TaskId) -> GamificationResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(concat!(
            "SELECT ",
            task_columns!(),
            " FROM tasks WHERE task_id = $1"
        ))
        .bind(task_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TaskRow::into_task).transpose()
    }

    async fn list_active_tasks(&self, mission_id: MissionId) -> GamificationResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(concat!(
            "SELECT ",
            task_columns!(),
            " FROM tasks WHERE mission_id = $1 AND is_active ORDER BY order_index, created_at"
        ))
        .bind(mission_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }

    async fn find_quiz(&self, quiz_id: QuizId) -> GamificationResult<Option<Quiz>> {
        let row = sqlx::query_as::<_, QuizRow>(
            "SELECT quiz_id, task_id, title, is_active, created_at FROM quizzes WHERE quiz_id = $1",
        )
        .bind(quiz_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(QuizRow::into_quiz))
    }

    async fn find_quiz_for_task(&self, task_id: TaskId) -> GamificationResult<Option<Quiz>> {
        let row = sqlx::query_as::<_, QuizRow>(
            "SELECT quiz_id, task_id, title, is_active, created_at FROM quizzes WHERE task_id = $1",
        )
        .bind(task_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(QuizRow::into_quiz))
    }

    async fn list_questions(&self, quiz_id: QuizId) -> GamificationResult<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT question_id, quiz_id, statement, options, correct_answer, order_index
            FROM questions
            WHERE quiz_id = $1
            ORDER BY order_index
            "#,
        )
        .bind(quiz_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(QuestionRow::into_question).collect())
    }

    async fn create_mission(&self, mission: &Mission) -> GamificationResult<()> {
        sqlx::query(
            r#"
            INSERT INTO missions (
                mission_id, title, description, starts_at, ends_at, price_cents,
                capacity, is_active, previous_mission_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(mission.id.into_uuid())
        .bind(&mission.title)
        .bind(&mission.description)
        .bind(mission.starts_at)
        .bind(mission.ends_at)
        .bind(mission.price_cents)
        .bind(mission.capacity)
        .bind(mission.is_active)
        .bind(mission.previous_mission_id.map(MissionId::into_uuid))
        .bind(mission.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_task(&self, task: &Task) -> GamificationResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (
                task_id, mission_id, category_id, title, description, points, task_type,
                difficulty, order_index, is_active, requirements, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(task.id.into_uuid())
        .bind(task.mission_id.into_uuid())
        .bind(task.category_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.points)
        .bind(task.task_type.code())
        .bind(task.difficulty.code())
        .bind(task.order_index)
        .bind(task.is_active)
        .bind(&task.requirements)
        .bind(task.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_quiz(&self, quiz: &Quiz, questions: &[Question]) -> GamificationResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO quizzes (quiz_id, task_id, title, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(quiz.id.into_uuid())
        .bind(quiz.task_id.into_uuid())
        .bind(&quiz.title)
        .bind(quiz.is_active)
        .bind(quiz.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_violation_as(e, GamificationError::QuizAlreadyExists))?;

        for question in questions {
            let options: Vec<StoredOption> = question
                .options
                .iter()
                .map(|o| StoredOption {
                    label: o.label.clone(),
                    is_correct: o.is_correct,
                })
                .collect();

            sqlx::query(
                r#"
                INSERT INTO questions (
                    question_id, quiz_id, statement, options, correct_answer, order_index
                ) VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(question.id.into_uuid())
            .bind(quiz.id.into_uuid())
            .bind(&question.statement)
            .bind(Json(options))
            .bind(&question.correct_answer)
            .bind(question.order_index)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

impl UserRepository for PgGamificationRepository {
    async fn find_user(&self, user_id: UserId) -> GamificationResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, user_name, email, user_role, is_active, points, total_points,
                   avatar_url, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn list_point_logs(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> GamificationResult<Vec<PointLog>> {
        let rows = sqlx::query_as::<_, PointLogRow>(
            r#"
            SELECT point_log_id, user_id, task_id, validator_kind, validator_id, points,
                   category, description, created_at
            FROM point_logs
            WHERE user_id = $1
            ORDER BY created_at DESC, point_log_id
            LIMIT $2
            "#,
        )
        .bind(user_id.into_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PointLogRow::into_point_log).collect()
    }
}

impl EnrollmentRepository for PgGamificationRepository {
    async fn find_enrollment(
        &self,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<Option<Enrollment>> {
        let row = sqlx::query_as::<_, EnrollmentRow>(concat!(
            "SELECT ",
            enrollment_columns!(),
            " FROM enrollments WHERE user_id = $1 AND mission_id = $2"
        ))
        .bind(user_id.into_uuid())
        .bind(mission_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(EnrollmentRow::into_enrollment).transpose()
    }

    async fn create_enrollment(&self, enrollment: &Enrollment) -> GamificationResult<()> {
        sqlx::query(
            r#"
            INSERT INTO enrollments (
                enrollment_id, user_id, mission_id, payment_status, participation_status,
                amount_paid_cents, enrolled_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(enrollment.id.into_uuid())
        .bind(enrollment.user_id.into_uuid())
        .bind(enrollment.mission_id.into_uuid())
        .bind(enrollment.payment_status.code())
        .bind(enrollment.participation_status.code())
        .bind(enrollment.amount_paid_cents)
        .bind(enrollment.enrolled_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation_as(e, GamificationError::AlreadyEnrolled))?;

        Ok(())
    }

    async fn upsert_confirmed(&self, enrollment: &Enrollment) -> GamificationResult<Enrollment> {
        let row = sqlx::query_as::<_, EnrollmentRow>(concat!(
            r#"
            INSERT INTO enrollments (
                enrollment_id, user_id, mission_id, payment_status, participation_status,
                amount_paid_cents, enrolled_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, mission_id) DO UPDATE SET
                payment_status = EXCLUDED.payment_status,
                participation_status = EXCLUDED.participation_status
            RETURNING "#,
            enrollment_columns!()
        ))
        .bind(enrollment.id.into_uuid())
        .bind(enrollment.user_id.into_uuid())
        .bind(enrollment.mission_id.into_uuid())
        .bind(enrollment.payment_status.code())
        .bind(enrollment.participation_status.code())
        .bind(enrollment.amount_paid_cents)
        .bind(enrollment.enrolled_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_enrollment()
    }

    async fn delete_with_submissions(
        &self,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM enrollments WHERE user_id = $1 AND mission_id = $2")
            .bind(user_id.into_uuid())
            .bind(mission_id.into_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Ok(None);
        }

        let removed = sqlx::query(
            r#"
            DELETE FROM submissions s
            USING tasks t
            WHERE s.task_id = t.task_id AND t.mission_id = $2 AND s.user_id = $1
            "#,
        )
        .bind(user_id.into_uuid())
        .bind(mission_id.into_uuid())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(Some(removed))
    }

    async fn delete_enrollment(
        &self,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<bool> {
        let deleted = sqlx::query("DELETE FROM enrollments WHERE user_id = $1 AND mission_id = $2")
            .bind(user_id.into_uuid())
            .bind(mission_id.into_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}

impl SubmissionRepository for PgGamificationRepository {
    async fn find_submission(
        &self,
        submission_id: SubmissionId,
    ) -> GamificationResult<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(concat!(
            "SELECT ",
            submission_columns!(),
            " FROM submissions WHERE submission_id = $1"
        ))
        .bind(submission_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(SubmissionRow::into_submission).transpose()
    }

    async fn find_for_task(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> GamificationResult<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(concat!(
            "SELECT ",
            submission_columns!(),
            " FROM submissions WHERE user_id = $1 AND task_id = $2"
        ))
        .bind(user_id.into_uuid())
        .bind(task_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(SubmissionRow::into_submission).transpose()
    }

    async fn list_for_mission(
        &self,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<Vec<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT s.submission_id, s.user_id, s.task_id, s.completed, s.points_awarded,
                   s.evidence, s.attempts, s.completed_at, s.validator_kind, s.validator_id,
                   s.validated_at, s.created_at, s.updated_at
            FROM submissions s
            JOIN tasks t ON t.task_id = s.task_id
            WHERE s.user_id = $1 AND t.mission_id = $2
            "#,
        )
        .bind(user_id.into_uuid())
        .bind(mission_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SubmissionRow::into_submission).collect()
    }

    async fn list_pending(&self, limit: i64) -> GamificationResult<Vec<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(concat!(
            "SELECT ",
            submission_columns!(),
            " FROM submissions WHERE completed = FALSE AND validated_at IS NULL",
            " ORDER BY updated_at LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SubmissionRow::into_submission).collect()
    }

    async fn save_attempt(&self, draft: SubmissionDraft) -> GamificationResult<Submission> {
        let mut tx = self.pool.begin().await?;
        let submission = save_attempt_in(&mut *tx, &draft, Utc::now()).await?;
        tx.commit().await?;
        Ok(submission)
    }

    async fn review(
        &self,
        submission_id: SubmissionId,
        reviewer: UserId,
        decision: ReviewDecision,
    ) -> GamificationResult<Option<(Submission, i32)>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SubmissionRow>(concat!(
            "SELECT ",
            submission_columns!(),
            " FROM submissions WHERE submission_id = $1 FOR UPDATE"
        ))
        .bind(submission_id.into_uuid())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let now = Utc::now();
        let mut submission = row.into_submission()?;
        let credit = submission.review(Validator::Staff(reviewer), decision, now);
        let (validator_kind, validator_id) = validator_columns(submission.validator);

        sqlx::query(
            r#"
            UPDATE submissions SET
                completed = $2,
                points_awarded = $3,
                completed_at = $4,
                validator_kind = $5,
                validator_id = $6,
                validated_at = $7,
                updated_at = $8
            WHERE submission_id = $1
            "#,
        )
        .bind(submission.id.into_uuid())
        .bind(submission.completed)
        .bind(submission.points_awarded)
        .bind(submission.completed_at)
        .bind(validator_kind)
        .bind(validator_id)
        .bind(submission.validated_at)
        .bind(submission.updated_at)
        .execute(&mut *tx)
        .await?;

        let credited = match &credit {
            Some(credit) => {
                apply_credit(
                    &mut *tx,
                    submission.user_id,
                    Some(submission.task_id),
                    credit,
                    now,
                )
                .await?;
                credit.points
            }
            None => 0,
        };

        tx.commit().await?;
        Ok(Some((submission, credited)))
    }
}

impl QuizAttemptRepository for PgGamificationRepository {
    async fn record_quiz_attempt(
        &self,
        answers: &[QuizAnswer],
        completion: Option<SubmissionDraft>,
    ) -> GamificationResult<Option<Submission>> {
        let mut tx = self.pool.begin().await?;

        for answer in answers {
            sqlx::query(
                r#"
                INSERT INTO quiz_answers (
                    quiz_answer_id, user_id, quiz_id, question_id, submitted_answer,
                    is_correct, answered_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(answer.id.into_uuid())
            .bind(answer.user_id.into_uuid())
            .bind(answer.quiz_id.into_uuid())
            .bind(answer.question_id.into_uuid())
            .bind(&answer.submitted_answer)
            .bind(answer.is_correct)
            .bind(answer.answered_at)
            .execute(&mut *tx)
            .await?;
        }

        let submission = match completion {
            Some(draft) => Some(save_attempt_in(&mut *tx, &draft, Utc::now()).await?),
            None => None,
        };

        tx.commit().await?;
        Ok(submission)
    }
}

impl RankingRepository for PgGamificationRepository {
    async fn global_ranking(&self, limit: i64) -> GamificationResult<Vec<RankedUser>> {
        let rows = sqlx::query_as::<_, RankedUserRow>(
            r#"
            SELECT user_id, user_name, avatar_url, total_points
            FROM users
            WHERE is_active AND user_role = $1
            ORDER BY total_points DESC, created_at
            LIMIT $2
            "#,
        )
        .bind(UserRole::Participant.code())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| RankedUser {
                user_id: UserId::from_uuid(r.user_id),
                name: r.user_name,
                avatar_url: r.avatar_url,
                total_points: r.total_points,
            })
            .collect())
    }

    async fn mission_top_scorers(&self) -> GamificationResult<Vec<MissionTopScorer>> {
        let rows = sqlx::query_as::<_, MissionTopScorerRow>(
            r#"
            SELECT DISTINCT ON (m.mission_id)
                m.mission_id, m.title AS mission_title,
                u.user_id, u.user_name, u.avatar_url,
                SUM(s.points_awarded)::BIGINT AS points
            FROM submissions s
            JOIN tasks t ON t.task_id = s.task_id
            JOIN missions m ON m.mission_id = t.mission_id
            JOIN users u ON u.user_id = s.user_id
            WHERE s.completed
            GROUP BY m.mission_id, m.title, u.user_id, u.user_name, u.avatar_url
            ORDER BY m.mission_id, points DESC, MIN(s.completed_at)
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| MissionTopScorer {
                mission_id: MissionId::from_uuid(r.mission_id),
                mission_title: r.mission_title,
                user_id: UserId::from_uuid(r.user_id),
                name: r.user_name,
                avatar_url: r.avatar_url,
                points: r.points,
            })
            .collect())
    }

    async fn mission_ranking(
        &self,
        mission_id: MissionId,
        limit: i64,
    ) -> GamificationResult<Vec<MissionScore>> {
        let rows = sqlx::query_as::<_, MissionScoreRow>(
            r#"
            SELECT u.user_id, u.user_name, u.avatar_url,
                   SUM(s.points_awarded)::BIGINT AS points
            FROM submissions s
            JOIN tasks t ON t.task_id = s.task_id
            JOIN users u ON u.user_id = s.user_id
            WHERE s.completed AND t.mission_id = $1
            GROUP BY u.user_id, u.user_name, u.avatar_url
            ORDER BY points DESC, MIN(s.completed_at)
            LIMIT $2
            "#,
        )
        .bind(mission_id.into_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| MissionScore {
                user_id: UserId::from_uuid(r.user_id),
                name: r.user_name,
                avatar_url: r.avatar_url,
                points: r.points,
            })
            .collect())
    }
}

/// Upsert the (user, task) row and apply the draft's credit on `conn`.
///
/// The row is locked first; the conditional `DO UPDATE` also covers a racing
/// first insert, so a completed row is never overwritten.
async fn save_attempt_in(
    conn: &mut PgConnection,
    draft: &SubmissionDraft,
    now: DateTime<Utc>,
) -> GamificationResult<Submission> {
    let existing = sqlx::query_as::<_, SubmissionRow>(concat!(
        "SELECT ",
        submission_columns!(),
        " FROM submissions WHERE user_id = $1 AND task_id = $2 FOR UPDATE"
    ))
    .bind(draft.user_id.into_uuid())
    .bind(draft.task_id.into_uuid())
    .fetch_optional(&mut *conn)
    .await?;

    let submission = match existing {
        Some(row) => {
            let mut submission = row.into_submission()?;
            submission.resubmit(draft, now)?;
            submission
        }
        None => Submission::from_draft(draft, now),
    };
    let (validator_kind, validator_id) = validator_columns(submission.validator);

    let saved = sqlx::query_as::<_, SubmissionRow>(concat!(
        r#"
        INSERT INTO submissions (
            submission_id, user_id, task_id, completed, points_awarded, evidence, attempts,
            completed_at, validator_kind, validator_id, validated_at, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, 1, $7, $8, $9, $10, $11, $11)
        ON CONFLICT (user_id, task_id) DO UPDATE SET
            completed = EXCLUDED.completed,
            points_awarded = EXCLUDED.points_awarded,
            evidence = EXCLUDED.evidence,
            attempts = submissions.attempts + 1,
            completed_at = EXCLUDED.completed_at,
            validator_kind = EXCLUDED.validator_kind,
            validator_id = EXCLUDED.validator_id,
            validated_at = EXCLUDED.validated_at,
            updated_at = EXCLUDED.updated_at
        WHERE submissions.completed = FALSE
        RETURNING "#,
        submission_columns!()
    ))
    .bind(submission.id.into_uuid())
    .bind(submission.user_id.into_uuid())
    .bind(submission.task_id.into_uuid())
    .bind(submission.completed)
    .bind(submission.points_awarded)
    .bind(&submission.evidence)
    .bind(submission.completed_at)
    .bind(validator_kind)
    .bind(validator_id)
    .bind(submission.validated_at)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(GamificationError::TaskAlreadyCompleted)?
    .into_submission()?;

    if let Some(credit) = &draft.credit {
        apply_credit(&mut *conn, saved.user_id, Some(saved.task_id), credit, now).await?;
    }

    Ok(saved)
}

/// Increment both user totals and append the matching ledger row.
async fn apply_credit(
    conn: &mut PgConnection,
    user_id: UserId,
    task_id: Option<TaskId>,
    credit: &PointCredit,
    now: DateTime<Utc>,
) -> GamificationResult<()> {
    let updated = sqlx::query(
        r#"
        UPDATE users
        SET points = points + $2, total_points = total_points + $2, updated_at = $3
        WHERE user_id = $1
        "#,
    )
    .bind(user_id.into_uuid())
    .bind(i64::from(credit.points))
    .bind(now)
    .execute(&mut *conn)
    .await?
    .rows_affected();
    if updated == 0 {
        return Err(GamificationError::UserNotFound);
    }

    let log = PointLog::from_credit(user_id, task_id, credit, now);
    let (validator_kind, validator_id) = log.validator.to_columns();
    sqlx::query(
        r#"
        INSERT INTO point_logs (
            point_log_id, user_id, task_id, validator_kind, validator_id, points,
            category, description, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(log.id.into_uuid())
    .bind(log.user_id.into_uuid())
    .bind(log.task_id.map(TaskId::into_uuid))
    .bind(validator_kind)
    .bind(validator_id)
    .bind(log.points)
    .bind(log.category.code())
    .bind(&log.description)
    .bind(log.created_at)
    .execute(&mut *conn)
    .await?;

    tracing::info!(
        user_id = %user_id,
        points = credit.points,
        category = %credit.category,
        "Points credited"
    );

    Ok(())
}

fn validator_columns(validator: Option<Validator>) -> (Option<&'static str>, Option<Uuid>) {
    match validator.map(|v| v.to_columns()) {
        Some((kind, id)) => (Some(kind), id),
        None => (None, None),
    }
}

fn unique_violation_as(err: sqlx::Error, mapped: GamificationError) -> GamificationError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return mapped;
        }
    }
    GamificationError::Database(err)
}

fn unknown_code(column: &str, code: &str) -> GamificationError {
    GamificationError::Internal(format!("unknown {column} code '{code}'"))
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    user_name: String,
    email: String,
    user_role: String,
    is_active: bool,
    points: i64,
    total_points: i64,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> GamificationResult<User> {
        let role = UserRole::from_code(&self.user_role)
            .ok_or_else(|| unknown_code("user_role", &self.user_role))?;
        Ok(User {
            id: UserId::from_uuid(self.user_id),
            name: self.user_name,
            email: self.email,
            role,
            is_active: self.is_active,
            points: self.points,
            total_points: self.total_points,
            avatar_url: self.avatar_url,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MissionRow {
    mission_id: Uuid,
    title: String,
    description: Option<String>,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    price_cents: i64,
    capacity: Option<i32>,
    is_active: bool,
    previous_mission_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl MissionRow {
    fn into_mission(self) -> Mission {
        Mission {
            id: MissionId::from_uuid(self.mission_id),
            title: self.title,
            description: self.description,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            price_cents: self.price_cents,
            capacity: self.capacity,
            is_active: self.is_active,
            previous_mission_id: self.previous_mission_id.map(MissionId::from_uuid),
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    task_id: Uuid,
    mission_id: Uuid,
    category_id: Option<Uuid>,
    title: String,
    description: Option<String>,
    points: i32,
    task_type: String,
    difficulty: String,
    order_index: i32,
    is_active: bool,
    requirements: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl TaskRow {
    fn into_task(self) -> GamificationResult<Task> {
        let task_type = TaskType::from_code(&self.task_type)
            .ok_or_else(|| unknown_code("task_type", &self.task_type))?;
        let difficulty = TaskDifficulty::from_code(&self.difficulty)
            .ok_or_else(|| unknown_code("difficulty", &self.difficulty))?;
        Ok(Task {
            id: TaskId::from_uuid(self.task_id),
            mission_id: MissionId::from_uuid(self.mission_id),
            category_id: self.category_id,
            title: self.title,
            description: self.description,
            points: self.points,
            task_type,
            difficulty,
            order_index: self.order_index,
            is_active: self.is_active,
            requirements: self.requirements,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct QuizRow {
    quiz_id: Uuid,
    task_id: Uuid,
    title: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl QuizRow {
    fn into_quiz(self) -> Quiz {
        Quiz {
            id: QuizId::from_uuid(self.quiz_id),
            task_id: TaskId::from_uuid(self.task_id),
            title: self.title,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

/// JSONB element of `questions.options`
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredOption {
    label: String,
    is_correct: bool,
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    question_id: Uuid,
    quiz_id: Uuid,
    statement: String,
    options: Json<Vec<StoredOption>>,
    correct_answer: String,
    order_index: i32,
}

impl QuestionRow {
    fn into_question(self) -> Question {
        Question {
            id: QuestionId::from_uuid(self.question_id),
            quiz_id: QuizId::from_uuid(self.quiz_id),
            statement: self.statement,
            options: self
                .options
                .0
                .into_iter()
                .map(|o| QuestionOption {
                    label: o.label,
                    is_correct: o.is_correct,
                })
                .collect(),
            correct_answer: self.correct_answer,
            order_index: self.order_index,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EnrollmentRow {
    enrollment_id: Uuid,
    user_id: Uuid,
    mission_id: Uuid,
    payment_status: String,
    participation_status: String,
    amount_paid_cents: i64,
    enrolled_at: DateTime<Utc>,
}

impl EnrollmentRow {
    fn into_enrollment(self) -> GamificationResult<Enrollment> {
        let payment_status = PaymentStatus::from_code(&self.payment_status)
            .ok_or_else(|| unknown_code("payment_status", &self.payment_status))?;
        let participation_status = ParticipationStatus::from_code(&self.participation_status)
            .ok_or_else(|| unknown_code("participation_status", &self.participation_status))?;
        Ok(Enrollment {
            id: EnrollmentId::from_uuid(self.enrollment_id),
            user_id: UserId::from_uuid(self.user_id),
            mission_id: MissionId::from_uuid(self.mission_id),
            payment_status,
            participation_status,
            amount_paid_cents: self.amount_paid_cents,
            enrolled_at: self.enrolled_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SubmissionRow {
    submission_id: Uuid,
    user_id: Uuid,
    task_id: Uuid,
    completed: bool,
    points_awarded: i32,
    evidence: serde_json::Value,
    attempts: i32,
    completed_at: Option<DateTime<Utc>>,
    validator_kind: Option<String>,
    validator_id: Option<Uuid>,
    validated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SubmissionRow {
    fn into_submission(self) -> GamificationResult<Submission> {
        let validator = match self.validator_kind.as_deref() {
            None => None,
            Some(kind) => Some(
                Validator::from_columns(Some(kind), self.validator_id)
                    .ok_or_else(|| unknown_code("validator_kind", kind))?,
            ),
        };
        Ok(Submission {
            id: SubmissionId::from_uuid(self.submission_id),
            user_id: UserId::from_uuid(self.user_id),
            task_id: TaskId::from_uuid(self.task_id),
            completed: self.completed,
            points_awarded: self.points_awarded,
            evidence: self.evidence,
            attempts: self.attempts,
            completed_at: self.completed_at,
            validator,
            validated_at: self.validated_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PointLogRow {
    point_log_id: Uuid,
    user_id: Uuid,
    task_id: Option<Uuid>,
    validator_kind: String,
    validator_id: Option<Uuid>,
    points: i32,
    category: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl PointLogRow {
    fn into_point_log(self) -> GamificationResult<PointLog> {
        let validator = Validator::from_columns(Some(self.validator_kind.as_str()), self.validator_id)
            .ok_or_else(|| unknown_code("validator_kind", &self.validator_kind))?;
        let category = PointCategory::from_code(&self.category)
            .ok_or_else(|| unknown_code("category", &self.category))?;
        Ok(PointLog {
            id: PointLogId::from_uuid(self.point_log_id),
            user_id: UserId::from_uuid(self.user_id),
            task_id: self.task_id.map(TaskId::from_uuid),
            validator,
            points: self.points,
            category,
            description: self.description,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RankedUserRow {
    user_id: Uuid,
    user_name: String,
    avatar_url: Option<String>,
    total_points: i64,
}

#[derive(sqlx::FromRow)]
struct MissionScoreRow {
    user_id: Uuid,
    user_name: String,
    avatar_url: Option<String>,
    points: i64,
}

#[derive(sqlx::FromRow)]
struct MissionTopScorerRow {
    mission_id: Uuid,
    mission_title: String,
    user_id: Uuid,
    user_name: String,
    avatar_url: Option<String>,
    points: i64,
}
