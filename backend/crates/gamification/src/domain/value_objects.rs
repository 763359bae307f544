//! Domain Value Objects
//!
//! Closed vocabularies stored as text codes, the validator sentinel, and the
//! client-safe quiz projection.

use kernel::id::{QuestionId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Generates `code()` / `from_code()` for a text-coded enum.
macro_rules! text_code {
    ($name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        impl $name {
            pub const fn code(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Administrative,
    Knowledge,
    Engagement,
    Social,
    Feedback,
}

text_code!(TaskType {
    Administrative => "administrative",
    Knowledge => "knowledge",
    Engagement => "engagement",
    Social => "social",
    Feedback => "feedback",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskDifficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

text_code!(TaskDifficulty {
    Easy => "easy",
    Medium => "medium",
    Hard => "hard",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

text_code!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    #[default]
    Enrolled,
    /// Set by an admin force-enroll
    Confirmed,
}

text_code!(ParticipationStatus {
    Enrolled => "enrolled",
    Confirmed => "confirmed",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointCategory {
    TaskCompleted,
    QuizEarned,
}

text_code!(PointCategory {
    TaskCompleted => "task_completed",
    QuizEarned => "quiz_earned",
});

/// Who approved or scored a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// Automatic scoring (quizzes)
    System,
    /// A human reviewer
    Staff(UserId),
}

impl Validator {
    pub const SYSTEM_CODE: &'static str = "system";
    pub const STAFF_CODE: &'static str = "staff";

    /// Storage form: `(kind, staff user id)`
    pub fn to_columns(&self) -> (&'static str, Option<Uuid>) {
        match self {
            Validator::System => (Self::SYSTEM_CODE, None),
            Validator::Staff(id) => (Self::STAFF_CODE, Some(id.into_uuid())),
        }
    }

    /// Inverse of [`Validator::to_columns`]; `None` for unreviewed rows.
    pub fn from_columns(kind: Option<&str>, id: Option<Uuid>) -> Option<Self> {
        match (kind, id) {
            (Some(Self::SYSTEM_CODE), _) => Some(Validator::System),
            (Some(Self::STAFF_CODE), Some(id)) => Some(Validator::Staff(UserId::from_uuid(id))),
            _ => None,
        }
    }

    pub fn staff_id(&self) -> Option<UserId> {
        match self {
            Validator::System => None,
            Validator::Staff(id) => Some(*id),
        }
    }
}

/// One answer option with its hidden correctness flag.
///
/// Deliberately not `Serialize`: clients only ever get [`PublicOption`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOption {
    pub label: String,
    pub is_correct: bool,
}

/// Client-safe option
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicOption {
    pub label: String,
}

/// Client-safe question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: QuestionId,
    pub statement: String,
    pub options: Vec<PublicOption>,
    pub order_index: i32,
}

/// Answers embedded in task evidence: `{"answers": {"<question id>": "<answer>"}}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    answers: HashMap<String, String>,
}

impl AnswerSheet {
    /// Extract the answer map from an evidence payload.
    ///
    /// Returns `None` when the payload has no `answers` object. Non-string
    /// scalar answers are compared by their JSON text (`3`, `true`).
    pub fn from_evidence(evidence: &serde_json::Value) -> Option<Self> {
        let map = evidence.get("answers")?.as_object()?;
        let answers = map
            .iter()
            .filter_map(|(question, value)| {
                let answer = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((question.trim().to_ascii_lowercase(), answer))
            })
            .collect();
        Some(Self { answers })
    }

    pub fn answer_for(&self, question_id: QuestionId) -> Option<&str> {
        self.answers
            .get(&question_id.to_string())
            .map(String::as_str)
    }

}

/// Correct answers out of the quiz's question count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

impl QuizScore {
    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.correct == self.total
    }
}
