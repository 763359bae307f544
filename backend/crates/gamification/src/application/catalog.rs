//! Catalog Use Cases
//!
//! Mission, task and quiz browsing for participants and curation for admins.

use crate::domain::entities::{Mission, Question, Quiz, Submission, Task};
use crate::domain::repository::{CatalogRepository, SubmissionRepository};
use crate::domain::value_objects::{PublicQuestion, TaskDifficulty, TaskType};
use crate::error::{GamificationError, GamificationResult};
use chrono::{DateTime, Utc};
use kernel::id::{MissionId, QuizId, TaskId, UserId};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A task with the caller's progress on it
#[derive(Debug, Clone)]
pub struct TaskProgress {
    pub task: Task,
    pub quiz_id: Option<QuizId>,
    pub submission: Option<Submission>,
}

/// Client-safe quiz
#[derive(Debug, Clone)]
pub struct QuizView {
    pub quiz: Quiz,
    pub questions: Vec<PublicQuestion>,
}

/// Catalog Query Use Case
pub struct CatalogQueryUseCase<C, S>
where
    C: CatalogRepository,
    S: SubmissionRepository,
{
    catalog_repo: Arc<C>,
    submission_repo: Arc<S>,
}

impl<C, S> CatalogQueryUseCase<C, S>
where
    C: CatalogRepository,
    S: SubmissionRepository,
{
    pub fn new(catalog_repo: Arc<C>, submission_repo: Arc<S>) -> Self {
        Self {
            catalog_repo,
            submission_repo,
        }
    }

    pub async fn missions(&self) -> GamificationResult<Vec<Mission>> {
        self.catalog_repo.list_active_missions().await
    }

    pub async fn mission_tasks(
        &self,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<Vec<TaskProgress>> {
        self.catalog_repo
            .find_mission(mission_id)
            .await?
            .filter(|m| m.is_active)
            .ok_or(GamificationError::MissionNotFound)?;

        let tasks = self.catalog_repo.list_active_tasks(mission_id).await?;
        let mut submissions: HashMap<TaskId, Submission> = self
            .submission_repo
            .list_for_mission(user_id, mission_id)
            .await?
            .into_iter()
            .map(|s| (s.task_id, s))
            .collect();

        let mut progress = Vec::with_capacity(tasks.len());
        for task in tasks {
            let quiz_id = self
                .catalog_repo
                .find_quiz_for_task(task.id)
                .await?
                .filter(|q| q.is_active)
                .map(|q| q.id);
            progress.push(TaskProgress {
                submission: submissions.remove(&task.id),
                quiz_id,
                task,
            });
        }
        Ok(progress)
    }

    pub async fn quiz(&self, quiz_id: QuizId) -> GamificationResult<QuizView> {
        let quiz = self
            .catalog_repo
            .find_quiz(quiz_id)
            .await?
            .filter(|q| q.is_active)
            .ok_or(GamificationError::QuizNotFound)?;
        let questions = self
            .catalog_repo
            .list_questions(quiz.id)
            .await?
            .iter()
            .map(Question::to_public)
            .collect();
        Ok(QuizView { quiz, questions })
    }
}

#[derive(Debug, Clone)]
pub struct NewMission {
    pub title: String,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub price_cents: i64,
    pub capacity: Option<i32>,
    pub previous_mission_id: Option<MissionId>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub points: i32,
    pub task_type: TaskType,
    pub difficulty: TaskDifficulty,
    pub order_index: i32,
    pub requirements: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub statement: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub title: String,
    pub questions: Vec<NewQuestion>,
}

/// Catalog Admin Use Case
pub struct CatalogAdminUseCase<C>
where
    C: CatalogRepository,
{
    catalog_repo: Arc<C>,
}

impl<C> CatalogAdminUseCase<C>
where
    C: CatalogRepository,
{
    pub fn new(catalog_repo: Arc<C>) -> Self {
        Self { catalog_repo }
    }

    pub async fn create_mission(&self, input: NewMission) -> GamificationResult<Mission> {
        let title = required_text(&input.title, "title")?;
        if input.price_cents < 0 {
            return Err(invalid("price must not be negative"));
        }
        if input.capacity.is_some_and(|c| c <= 0) {
            return Err(invalid("capacity must be positive"));
        }
        if let (Some(start), Some(end)) = (input.starts_at, input.ends_at) {
            if end < start {
                return Err(invalid("mission ends before it starts"));
            }
        }

        let mission = Mission {
            description: input.description,
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            capacity: input.capacity,
            previous_mission_id: input.previous_mission_id,
            ..Mission::new(title, input.price_cents)
        };
        self.catalog_repo.create_mission(&mission).await?;

        tracing::info!(mission_id = %mission.id, title = %mission.title, "Mission created");
        Ok(mission)
    }

    pub async fn create_task(
        &self,
        mission_id: MissionId,
        input: NewTask,
    ) -> GamificationResult<Task> {
        self.catalog_repo
            .find_mission(mission_id)
            .await?
            .ok_or(GamificationError::MissionNotFound)?;
        let title = required_text(&input.title, "title")?;
        if input.points < 0 {
            return Err(invalid("points must not be negative"));
        }

        let task = Task {
            description: input.description,
            category_id: input.category_id,
            difficulty: input.difficulty,
            order_index: input.order_index,
            requirements: input.requirements,
            ..Task::new(mission_id, title, input.points, input.task_type)
        };
        self.catalog_repo.create_task(&task).await?;

        tracing::info!(task_id = %task.id, mission_id = %mission_id, "Task created");
        Ok(task)
    }

    pub async fn create_quiz(&self, task_id: TaskId, input: NewQuiz) -> GamificationResult<QuizView> {
        self.catalog_repo
            .find_task(task_id)
            .await?
            .ok_or(GamificationError::TaskNotFound)?;
        let title = required_text(&input.title, "title")?;
        if input.questions.is_empty() {
            return Err(invalid("a quiz needs at least one question"));
        }

        let quiz = Quiz::new(task_id, title);
        let mut questions = Vec::with_capacity(input.questions.len());
        for (i, q) in input.questions.into_iter().enumerate() {
            let statement = required_text(&q.statement, "statement")?;
            if q.options.len() < 2 {
                return Err(invalid("a question needs at least two options"));
            }
            if !q.options.contains(&q.correct_answer) {
                return Err(invalid("correct answer must be one of the options"));
            }
            questions.push(Question::new(
                quiz.id,
                statement,
                q.options,
                q.correct_answer,
                i as i32,
            ));
        }

        self.catalog_repo.create_quiz(&quiz, &questions).await?;

        tracing::info!(
            quiz_id = %quiz.id,
            task_id = %task_id,
            questions = questions.len(),
            "Quiz created"
        );

        Ok(QuizView {
            questions: questions.iter().map(Question::to_public).collect(),
            quiz,
        })
    }
}

fn required_text<'a>(value: &'a str, field: &str) -> GamificationResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(&format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

fn invalid(message: &str) -> GamificationError {
    GamificationError::InvalidInput(message.to_string())
}
