//! Submit Quiz Use Case
//!
//! Quiz-centric path: every answer is stored, and only a perfect score
//! completes the owning task. Partial scores earn nothing here.

use crate::domain::entities::{QuizAnswer, Submission, SubmissionDraft};
use crate::domain::repository::{CatalogRepository, QuizAttemptRepository, SubmissionRepository};
use crate::domain::value_objects::{PointCategory, QuizScore};
use crate::error::{GamificationError, GamificationResult};
use chrono::Utc;
use kernel::id::{QuestionId, QuizId, UserId};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub answer: String,
}

/// Input DTO for submit quiz
#[derive(Debug, Clone)]
pub struct SubmitQuizInput {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub answers: Vec<SubmittedAnswer>,
}

/// Output DTO for submit quiz
#[derive(Debug, Clone)]
pub struct SubmitQuizOutput {
    pub score: QuizScore,
    pub answers: Vec<QuizAnswer>,
    pub credited: i32,
    pub submission: Option<Submission>,
    pub message: String,
}

/// Submit Quiz Use Case
pub struct SubmitQuizUseCase<C, S, Q>
where
    C: CatalogRepository,
    S: SubmissionRepository,
    Q: QuizAttemptRepository,
{
    catalog_repo: Arc<C>,
    submission_repo: Arc<S>,
    attempt_repo: Arc<Q>,
}

impl<C, S, Q> SubmitQuizUseCase<C, S, Q>
where
    C: CatalogRepository,
    S: SubmissionRepository,
    Q: QuizAttemptRepository,
{
    pub fn new(catalog_repo: Arc<C>, submission_repo: Arc<S>, attempt_repo: Arc<Q>) -> Self {
        Self {
            catalog_repo,
            submission_repo,
            attempt_repo,
        }
    }

    pub async fn execute(&self, input: SubmitQuizInput) -> GamificationResult<SubmitQuizOutput> {
        let quiz = self
            .catalog_repo
            .find_quiz(input.quiz_id)
            .await?
            .filter(|q| q.is_active)
            .ok_or(GamificationError::QuizNotFound)?;

        let task = self.catalog_repo.find_task(quiz.task_id).await?;
        if let Some(task) = &task {
            let existing = self.submission_repo.find_for_task(input.user_id, task.id).await?;
            if existing.is_some_and(|s| s.completed) {
                return Err(GamificationError::QuizAlreadyCompleted);
            }
        }

        let questions = self.catalog_repo.list_questions(quiz.id).await?;
        let by_id: HashMap<QuestionId, _> = questions.iter().map(|q| (q.id, q)).collect();

        let now = Utc::now();
        let mut seen = HashSet::with_capacity(input.answers.len());
        let mut answers = Vec::with_capacity(input.answers.len());
        for submitted in input.answers {
            let question = by_id.get(&submitted.question_id).ok_or_else(|| {
                GamificationError::InvalidInput(format!(
                    "question {} is not part of this quiz",
                    submitted.question_id
                ))
            })?;
            if !seen.insert(submitted.question_id) {
                return Err(GamificationError::InvalidInput(format!(
                    "question {} answered more than once",
                    submitted.question_id
                )));
            }
            answers.push(QuizAnswer::grade(input.user_id, question, submitted.answer, now));
        }

        let score = QuizScore {
            correct: answers.iter().filter(|a| a.is_correct).count(),
            total: questions.len(),
        };

        let completion = match &task {
            Some(task) if score.is_perfect() => Some(SubmissionDraft::scored(
                input.user_id,
                task.id,
                json!({ "quizId": quiz.id, "correct": score.correct, "total": score.total }),
                task.points,
                true,
                PointCategory::QuizEarned,
                format!("Quiz '{}' completed", quiz.title),
            )),
            _ => None,
        };
        let credited = completion
            .as_ref()
            .and_then(|d| d.credit.as_ref())
            .map_or(0, |c| c.points);

        let submission = self
            .attempt_repo
            .record_quiz_attempt(&answers, completion)
            .await?;

        tracing::info!(
            user_id = %input.user_id,
            quiz_id = %quiz.id,
            correct = score.correct,
            total = score.total,
            credited = credited,
            "Quiz submitted"
        );

        let message = if submission.is_some() {
            format!("Perfect score! You earned {credited} points.")
        } else {
            format!("You answered {}/{} correctly.", score.correct, score.total)
        };

        Ok(SubmitQuizOutput {
            score,
            answers,
            credited,
            submission,
            message,
        })
    }
}
