//! Domain Entities
//!
//! Core business entities for missions, tasks, quizzes, enrollments,
//! submissions and the point ledger, plus the ranking read models.

use auth::UserRole;
use chrono::{DateTime, Utc};
use kernel::id::{
    EnrollmentId, MissionId, PointLogId, QuestionId, QuizAnswerId, QuizId, SubmissionId, TaskId,
    UserId,
};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::value_objects::{
    ParticipationStatus, PaymentStatus, PointCategory, PublicOption, PublicQuestion,
    QuestionOption, TaskDifficulty, TaskType, Validator,
};
use crate::error::{GamificationError, GamificationResult};

/// Platform user as seen by the gamification core
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    /// Spendable balance
    pub points: i64,
    /// Lifetime earnings, used for ranking
    pub total_points: i64,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            role,
            is_active: true,
            points: 0,
            total_points: 0,
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    /// Whether the user appears in the global ranking
    pub fn is_ranked(&self) -> bool {
        self.is_active && self.role == UserRole::Participant
    }
}

#[derive(Debug, Clone)]
pub struct Mission {
    pub id: MissionId,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// Price in cents
    pub price_cents: i64,
    /// Informational; not enforced on join
    pub capacity: Option<i32>,
    pub is_active: bool,
    /// Ordering hint only
    pub previous_mission_id: Option<MissionId>,
    pub created_at: DateTime<Utc>,
}

impl Mission {
    pub fn new(title: impl Into<String>, price_cents: i64) -> Self {
        Self {
            id: MissionId::new(),
            title: title.into(),
            description: None,
            starts_at: None,
            ends_at: None,
            price_cents,
            capacity: None,
            is_active: true,
            previous_mission_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_free(&self) -> bool {
        self.price_cents <= 0
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub mission_id: MissionId,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub points: i32,
    pub task_type: TaskType,
    pub difficulty: TaskDifficulty,
    pub order_index: i32,
    pub is_active: bool,
    pub requirements: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        mission_id: MissionId,
        title: impl Into<String>,
        points: i32,
        task_type: TaskType,
    ) -> Self {
        Self {
            id: TaskId::new(),
            mission_id,
            category_id: None,
            title: title.into(),
            description: None,
            points,
            task_type,
            difficulty: TaskDifficulty::default(),
            order_index: 0,
            is_active: true,
            requirements: None,
            created_at: Utc::now(),
        }
    }

    /// Active and part of the given mission
    pub fn is_open_in(&self, mission_id: MissionId) -> bool {
        self.is_active && self.mission_id == mission_id
    }
}

#[derive(Debug, Clone)]
pub struct Quiz {
    pub id: QuizId,
    pub task_id: TaskId,
    pub title: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    pub fn new(task_id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id: QuizId::new(),
            task_id,
            title: title.into(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// Quiz question with its answer key. Never serialized to clients.
#[derive(Debug, Clone)]
pub struct Question {
    pub id: QuestionId,
    pub quiz_id: QuizId,
    pub statement: String,
    pub options: Vec<QuestionOption>,
    pub correct_answer: String,
    pub order_index: i32,
}

impl Question {
    /// Build a question whose options are flagged against `correct_answer`.
    pub fn new(
        quiz_id: QuizId,
        statement: impl Into<String>,
        labels: Vec<String>,
        correct_answer: impl Into<String>,
        order_index: i32,
    ) -> Self {
        let correct_answer = correct_answer.into();
        let options = labels
            .into_iter()
            .map(|label| QuestionOption {
                is_correct: label == correct_answer,
                label,
            })
            .collect();
        Self {
            id: QuestionId::new(),
            quiz_id,
            statement: statement.into(),
            options,
            correct_answer,
            order_index,
        }
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }

    pub fn to_public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id,
            statement: self.statement.clone(),
            options: self
                .options
                .iter()
                .map(|o| PublicOption {
                    label: o.label.clone(),
                })
                .collect(),
            order_index: self.order_index,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub mission_id: MissionId,
    pub payment_status: PaymentStatus,
    pub participation_status: ParticipationStatus,
    pub amount_paid_cents: i64,
    pub enrolled_at: DateTime<Utc>,
}

impl Enrollment {
    /// Self-service join: free missions are paid up front.
    pub fn join(user_id: UserId, mission: &Mission) -> Self {
        Self {
            id: EnrollmentId::new(),
            user_id,
            mission_id: mission.id,
            payment_status: if mission.is_free() {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Pending
            },
            participation_status: ParticipationStatus::Enrolled,
            amount_paid_cents: mission.price_cents.max(0),
            enrolled_at: Utc::now(),
        }
    }

    /// Admin force-enroll
    pub fn confirmed(user_id: UserId, mission_id: MissionId) -> Self {
        Self {
            id: EnrollmentId::new(),
            user_id,
            mission_id,
            payment_status: PaymentStatus::Paid,
            participation_status: ParticipationStatus::Confirmed,
            amount_paid_cents: 0,
            enrolled_at: Utc::now(),
        }
    }
}

/// Points to credit alongside a submission change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointCredit {
    pub points: i32,
    pub category: PointCategory,
    pub description: String,
    pub validator: Validator,
}

/// Requested state of the (user, task) submission row.
///
/// Repositories apply a draft atomically: insert or update the row, then
/// apply `credit` to the user's totals and the ledger.
#[derive(Debug, Clone)]
pub struct SubmissionDraft {
    pub user_id: UserId,
    pub task_id: TaskId,
    pub evidence: Value,
    pub completed: bool,
    pub points: i32,
    pub validator: Option<Validator>,
    pub credit: Option<PointCredit>,
}

impl SubmissionDraft {
    /// Evidence awaiting human review
    pub fn pending(user_id: UserId, task_id: TaskId, evidence: Value) -> Self {
        Self {
            user_id,
            task_id,
            evidence,
            completed: false,
            points: 0,
            validator: None,
            credit: None,
        }
    }

    /// Automatically scored attempt; credits `points` when completed.
    pub fn scored(
        user_id: UserId,
        task_id: TaskId,
        evidence: Value,
        points: i32,
        completed: bool,
        category: PointCategory,
        description: String,
    ) -> Self {
        let credit = (completed && points > 0).then(|| PointCredit {
            points,
            category,
            description,
            validator: Validator::System,
        });
        Self {
            user_id,
            task_id,
            evidence,
            completed,
            points,
            validator: Some(Validator::System),
            credit,
        }
    }
}

/// Admin decision on a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve { points: i32 },
    Reject,
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub id: SubmissionId,
    pub user_id: UserId,
    pub task_id: TaskId,
    pub completed: bool,
    pub points_awarded: i32,
    pub evidence: Value,
    pub attempts: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub validator: Option<Validator>,
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// First attempt for (user, task)
    pub fn from_draft(draft: &SubmissionDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: SubmissionId::new(),
            user_id: draft.user_id,
            task_id: draft.task_id,
            completed: draft.completed,
            points_awarded: draft.points,
            evidence: draft.evidence.clone(),
            attempts: 1,
            completed_at: draft.completed.then_some(now),
            validator: draft.validator,
            validated_at: draft.validator.map(|_| now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply another attempt; completed rows are immutable here.
    pub fn resubmit(&mut self, draft: &SubmissionDraft, now: DateTime<Utc>) -> GamificationResult<()> {
        if self.completed {
            return Err(GamificationError::TaskAlreadyCompleted);
        }
        self.attempts += 1;
        self.evidence = draft.evidence.clone();
        self.completed = draft.completed;
        self.points_awarded = draft.points;
        self.completed_at = draft.completed.then_some(now);
        self.validator = draft.validator;
        self.validated_at = draft.validator.map(|_| now);
        self.updated_at = now;
        Ok(())
    }

    /// Record a review and return the credit it grants, if any.
    ///
    /// Approval credits only what exceeds the points already credited for a
    /// completed row. Rejection never reverts credited points, and it resets
    /// `completed`, so approving the same row again credits the full amount a
    /// second time.
    pub fn review(
        &mut self,
        reviewer: Validator,
        decision: ReviewDecision,
        now: DateTime<Utc>,
    ) -> Option<PointCredit> {
        let already_credited = if self.completed { self.points_awarded } else { 0 };
        self.validator = Some(reviewer);
        self.validated_at = Some(now);
        self.updated_at = now;

        match decision {
            ReviewDecision::Approve { points } => {
                self.completed = true;
                self.points_awarded = points;
                self.completed_at = self.completed_at.or(Some(now));
                let delta = points - already_credited;
                (delta > 0).then(|| PointCredit {
                    points: delta,
                    category: PointCategory::TaskCompleted,
                    description: format!("Task approved ({points} points)"),
                    validator: reviewer,
                })
            }
            ReviewDecision::Reject => {
                self.completed = false;
                self.points_awarded = 0;
                self.completed_at = None;
                None
            }
        }
    }

    /// Waiting for a human reviewer
    pub fn is_pending(&self) -> bool {
        !self.completed && self.validated_at.is_none()
    }
}

/// Append-only ledger row
#[derive(Debug, Clone)]
pub struct PointLog {
    pub id: PointLogId,
    pub user_id: UserId,
    pub task_id: Option<TaskId>,
    pub validator: Validator,
    pub points: i32,
    pub category: PointCategory,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl PointLog {
    pub fn from_credit(
        user_id: UserId,
        task_id: Option<TaskId>,
        credit: &PointCredit,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PointLogId::new(),
            user_id,
            task_id,
            validator: credit.validator,
            points: credit.points,
            category: credit.category,
            description: credit.description.clone(),
            created_at: now,
        }
    }
}

/// Append-only record of one submitted quiz answer
#[derive(Debug, Clone)]
pub struct QuizAnswer {
    pub id: QuizAnswerId,
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub question_id: QuestionId,
    pub submitted_answer: String,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

impl QuizAnswer {
    pub fn grade(user_id: UserId, question: &Question, answer: String, now: DateTime<Utc>) -> Self {
        Self {
            id: QuizAnswerId::new(),
            user_id,
            quiz_id: question.quiz_id,
            question_id: question.id,
            is_correct: question.is_correct(&answer),
            submitted_answer: answer,
            answered_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Ranking read models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedUser {
    pub user_id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    pub total_points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionScore {
    pub user_id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionTopScorer {
    pub mission_id: MissionId,
    pub mission_title: String,
    pub user_id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    pub points: i64,
}
