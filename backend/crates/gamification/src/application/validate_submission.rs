//! Validate Submission Use Case

use crate::domain::entities::{ReviewDecision, Submission};
use crate::domain::repository::SubmissionRepository;
use crate::error::{GamificationError, GamificationResult};
use kernel::id::{SubmissionId, UserId};
use std::sync::Arc;

/// Input DTO for validate submission
#[derive(Debug, Clone)]
pub struct ValidateSubmissionInput {
    pub submission_id: SubmissionId,
    pub validator_id: UserId,
    pub approve: bool,
    /// Points to award on approval; defaults to 0
    pub points: Option<i32>,
}

/// Output DTO for validate submission
#[derive(Debug, Clone)]
pub struct ValidateSubmissionOutput {
    pub submission: Submission,
    /// Points added to the user's totals by this review
    pub credited: i32,
}

/// Validate Submission Use Case
pub struct ValidateSubmissionUseCase<S>
where
    S: SubmissionRepository,
{
    submission_repo: Arc<S>,
}

impl<S> ValidateSubmissionUseCase<S>
where
    S: SubmissionRepository,
{
    pub fn new(submission_repo: Arc<S>) -> Self {
        Self { submission_repo }
    }

    pub async fn execute(
        &self,
        input: ValidateSubmissionInput,
    ) -> GamificationResult<ValidateSubmissionOutput> {
        let decision = if input.approve {
            let points = input.points.unwrap_or(0);
            if points < 0 {
                return Err(GamificationError::InvalidInput(
                    "points must not be negative".to_string(),
                ));
            }
            ReviewDecision::Approve { points }
        } else {
            ReviewDecision::Reject
        };

        let (submission, credited) = self
            .submission_repo
            .review(input.submission_id, input.validator_id, decision)
            .await?
            .ok_or(GamificationError::SubmissionNotFound)?;

        tracing::info!(
            submission_id = %submission.id,
            validator_id = %input.validator_id,
            approved = input.approve,
            points = submission.points_awarded,
            credited = credited,
            "Submission reviewed"
        );

        Ok(ValidateSubmissionOutput {
            submission,
            credited,
        })
    }

    /// Validation queue: never reviewed and not completed, oldest first
    pub async fn pending(&self, limit: i64) -> GamificationResult<Vec<Submission>> {
        self.submission_repo.list_pending(limit.max(1)).await
    }
}
