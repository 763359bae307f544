//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the infra layer.
//! Every method that touches more than one row is atomic.

use crate::domain::entities::{
    Enrollment, Mission, MissionScore, MissionTopScorer, PointLog, Question, Quiz, QuizAnswer,
    RankedUser, ReviewDecision, Submission, SubmissionDraft, Task, User,
};
use crate::error::GamificationResult;
use kernel::id::{MissionId, QuizId, SubmissionId, TaskId, UserId};

/// Missions, tasks and quizzes
#[trait_variant::make(CatalogRepository: Send)]
pub trait LocalCatalogRepository {
    async fn find_mission(&self, mission_id: MissionId) -> GamificationResult<Option<Mission>>;

    async fn list_active_missions(&self) -> GamificationResult<Vec<Mission>>;

    async fn find_task(&self, task_id: TaskId) -> GamificationResult<Option<Task>>;

    /// Active tasks of a mission ordered by `order_index`
    async fn list_active_tasks(&self, mission_id: MissionId) -> GamificationResult<Vec<Task>>;

    async fn find_quiz(&self, quiz_id: QuizId) -> GamificationResult<Option<Quiz>>;

    async fn find_quiz_for_task(&self, task_id: TaskId) -> GamificationResult<Option<Quiz>>;

    /// Questions ordered by `order_index`
    async fn list_questions(&self, quiz_id: QuizId) -> GamificationResult<Vec<Question>>;

    async fn create_mission(&self, mission: &Mission) -> GamificationResult<()>;

    async fn create_task(&self, task: &Task) -> GamificationResult<()>;

    /// Insert a quiz and its questions; a second quiz for the task is a conflict.
    async fn create_quiz(&self, quiz: &Quiz, questions: &[Question]) -> GamificationResult<()>;
}

/// Users and their point ledger
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    async fn find_user(&self, user_id: UserId) -> GamificationResult<Option<User>>;

    /// Newest first
    async fn list_point_logs(&self, user_id: UserId, limit: i64)
    -> GamificationResult<Vec<PointLog>>;
}

#[trait_variant::make(EnrollmentRepository: Send)]
pub trait LocalEnrollmentRepository {
    async fn find_enrollment(
        &self,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<Option<Enrollment>>;

    /// Insert; an existing (user, mission) row is `AlreadyEnrolled`.
    async fn create_enrollment(&self, enrollment: &Enrollment) -> GamificationResult<()>;

    /// Insert, or confirm an existing row keeping its amount paid.
    async fn upsert_confirmed(&self, enrollment: &Enrollment) -> GamificationResult<Enrollment>;

    /// Delete the enrollment and the user's submissions for the mission's
    /// tasks in one transaction. `None` when there was no enrollment.
    async fn delete_with_submissions(
        &self,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<Option<u64>>;

    /// Delete only the enrollment row. `false` when there was none.
    async fn delete_enrollment(
        &self,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<bool>;
}

#[trait_variant::make(SubmissionRepository: Send)]
pub trait LocalSubmissionRepository {
    async fn find_submission(
        &self,
        submission_id: SubmissionId,
    ) -> GamificationResult<Option<Submission>>;

    async fn find_for_task(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> GamificationResult<Option<Submission>>;

    /// The user's submissions for a mission's tasks
    async fn list_for_mission(
        &self,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<Vec<Submission>>;

    /// Not completed and never reviewed, oldest first
    async fn list_pending(&self, limit: i64) -> GamificationResult<Vec<Submission>>;

    /// Upsert the (user, task) row and apply the draft's credit atomically.
    /// A completed row is never overwritten (`TaskAlreadyCompleted`).
    async fn save_attempt(&self, draft: SubmissionDraft) -> GamificationResult<Submission>;

    /// Apply a review and its credit atomically. Returns the updated row and
    /// the points credited, or `None` for an unknown id.
    async fn review(
        &self,
        submission_id: SubmissionId,
        reviewer: UserId,
        decision: ReviewDecision,
    ) -> GamificationResult<Option<(Submission, i32)>>;
}

#[trait_variant::make(QuizAttemptRepository: Send)]
pub trait LocalQuizAttemptRepository {
    /// Insert every answer and, when given, save the completing draft, all
    /// in one transaction.
    async fn record_quiz_attempt(
        &self,
        answers: &[QuizAnswer],
        completion: Option<SubmissionDraft>,
    ) -> GamificationResult<Option<Submission>>;
}

/// Read-only ranking views
#[trait_variant::make(RankingRepository: Send)]
pub trait LocalRankingRepository {
    /// Active participants by `total_points` descending
    async fn global_ranking(&self, limit: i64) -> GamificationResult<Vec<RankedUser>>;

    /// Highest completed-points sum per mission
    async fn mission_top_scorers(&self) -> GamificationResult<Vec<MissionTopScorer>>;

    async fn mission_ranking(
        &self,
        mission_id: MissionId,
        limit: i64,
    ) -> GamificationResult<Vec<MissionScore>>;
}

/// Everything the HTTP layer needs from a single store
pub trait GamificationStore:
    CatalogRepository
    + UserRepository
    + EnrollmentRepository
    + SubmissionRepository
    + QuizAttemptRepository
    + RankingRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> GamificationStore for T where
    T: CatalogRepository
        + UserRepository
        + EnrollmentRepository
        + SubmissionRepository
        + QuizAttemptRepository
        + RankingRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
