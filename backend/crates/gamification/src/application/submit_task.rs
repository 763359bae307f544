//! Submit Task Use Case
//!
//! Evidence-based submission. Tasks with a quiz are scored on the spot when
//! the evidence carries an `answers` object; everything else waits for a
//! reviewer.

use crate::domain::entities::{Submission, SubmissionDraft, Task};
use crate::domain::repository::{CatalogRepository, EnrollmentRepository, SubmissionRepository};
use crate::domain::services::{grade_answer_sheet, partial_credit};
use crate::domain::value_objects::{AnswerSheet, PointCategory, QuizScore};
use crate::error::{GamificationError, GamificationResult};
use kernel::id::{MissionId, TaskId, UserId};
use serde_json::Value;
use std::sync::Arc;

/// Input DTO for submit task
#[derive(Debug, Clone)]
pub struct SubmitTaskInput {
    pub user_id: UserId,
    pub mission_id: MissionId,
    pub task_id: TaskId,
    pub evidence: Value,
}

/// Output DTO for submit task
#[derive(Debug, Clone)]
pub struct SubmitTaskOutput {
    pub submission: Submission,
    /// Present when the evidence was auto-scored
    pub score: Option<QuizScore>,
    pub message: String,
}

/// Submit Task Use Case
pub struct SubmitTaskUseCase<C, E, S>
where
    C: CatalogRepository,
    E: EnrollmentRepository,
    S: SubmissionRepository,
{
    catalog_repo: Arc<C>,
    enrollment_repo: Arc<E>,
    submission_repo: Arc<S>,
}

impl<C, E, S> SubmitTaskUseCase<C, E, S>
where
    C: CatalogRepository,
    E: EnrollmentRepository,
    S: SubmissionRepository,
{
    pub fn new(catalog_repo: Arc<C>, enrollment_repo: Arc<E>, submission_repo: Arc<S>) -> Self {
        Self {
            catalog_repo,
            enrollment_repo,
            submission_repo,
        }
    }

    pub async fn execute(&self, input: SubmitTaskInput) -> GamificationResult<SubmitTaskOutput> {
        let task = self
            .catalog_repo
            .find_task(input.task_id)
            .await?
            .filter(|t| t.is_open_in(input.mission_id))
            .ok_or(GamificationError::TaskNotFound)?;

        let enrolled = self
            .enrollment_repo
            .find_enrollment(input.user_id, input.mission_id)
            .await?
            .is_some();
        if !enrolled {
            tracing::warn!(
                user_id = %input.user_id,
                mission_id = %input.mission_id,
                "Submission without enrollment"
            );
            return Err(GamificationError::NotEnrolled);
        }

        let existing = self
            .submission_repo
            .find_for_task(input.user_id, task.id)
            .await?;
        if existing.is_some_and(|s| s.completed) {
            return Err(GamificationError::TaskAlreadyCompleted);
        }

        let score = self.score_evidence(&task, &input.evidence).await?;
        let draft = match score {
            Some(score) => {
                let points = partial_credit(task.points, score);
                SubmissionDraft::scored(
                    input.user_id,
                    task.id,
                    input.evidence,
                    points,
                    points > 0,
                    PointCategory::QuizEarned,
                    format!(
                        "Quiz for '{}': {}/{} correct",
                        task.title, score.correct, score.total
                    ),
                )
            }
            None => SubmissionDraft::pending(input.user_id, task.id, input.evidence),
        };

        let submission = self.submission_repo.save_attempt(draft).await?;

        tracing::info!(
            user_id = %input.user_id,
            task_id = %task.id,
            submission_id = %submission.id,
            attempts = submission.attempts,
            completed = submission.completed,
            points = submission.points_awarded,
            "Task submitted"
        );

        let message = match (score, submission.completed) {
            (_, true) => format!(
                "Task completed! You earned {} points.",
                submission.points_awarded
            ),
            (Some(score), false) => format!(
                "Quiz scored {}/{}. No points earned, try again.",
                score.correct, score.total
            ),
            (None, false) => "Submission received and awaiting validation.".to_string(),
        };

        Ok(SubmitTaskOutput {
            submission,
            score,
            message,
        })
    }

    /// Grade embedded quiz answers against the task's active quiz; `None` when
    /// there is nothing to score.
    async fn score_evidence(
        &self,
        task: &Task,
        evidence: &Value,
    ) -> GamificationResult<Option<QuizScore>> {
        let Some(sheet) = AnswerSheet::from_evidence(evidence) else {
            return Ok(None);
        };
        let Some(quiz) = self
            .catalog_repo
            .find_quiz_for_task(task.id)
            .await?
            .filter(|quiz| quiz.is_active)
        else {
            return Ok(None);
        };
        let questions = self.catalog_repo.list_questions(quiz.id).await?;
        if questions.is_empty() {
            return Ok(None);
        }
        Ok(Some(grade_answer_sheet(&questions, &sheet)))
    }
}
