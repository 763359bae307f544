//! In-Memory Repository
//!
//! Process-local store implementing every repository trait. Each operation
//! runs under one mutex, so multi-row writes are atomic the same way the
//! PostgreSQL transactions are. Used by tests and local tooling.

use crate::domain::entities::{
    Enrollment, Mission, MissionScore, MissionTopScorer, PointCredit, PointLog, Question, Quiz,
    QuizAnswer, RankedUser, ReviewDecision, Submission, SubmissionDraft, Task, User,
};
use crate::domain::repository::{
    CatalogRepository, EnrollmentRepository, QuizAttemptRepository, RankingRepository,
    SubmissionRepository, UserRepository,
};
use crate::domain::value_objects::{ParticipationStatus, PaymentStatus, Validator};
use crate::error::{GamificationError, GamificationResult};
use chrono::{DateTime, Utc};
use kernel::id::{MissionId, QuizId, SubmissionId, TaskId, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    missions: Vec<Mission>,
    tasks: Vec<Task>,
    quizzes: Vec<Quiz>,
    questions: Vec<Question>,
    enrollments: Vec<Enrollment>,
    submissions: Vec<Submission>,
    point_logs: Vec<PointLog>,
    quiz_answers: Vec<QuizAnswer>,
}

impl MemoryState {
    fn task_mission(&self, task_id: TaskId) -> Option<MissionId> {
        self.tasks
            .iter()
            .find(|t| t.id == task_id)
            .map(|t| t.mission_id)
    }

    fn save_attempt(
        &mut self,
        draft: &SubmissionDraft,
        now: DateTime<Utc>,
    ) -> GamificationResult<Submission> {
        if draft.credit.is_some() && !self.users.iter().any(|u| u.id == draft.user_id) {
            return Err(GamificationError::UserNotFound);
        }

        let index = self
            .submissions
            .iter()
            .position(|s| s.user_id == draft.user_id && s.task_id == draft.task_id);
        let saved = match index {
            Some(i) => {
                let mut submission = self.submissions[i].clone();
                submission.resubmit(draft, now)?;
                self.submissions[i] = submission.clone();
                submission
            }
            None => {
                let submission = Submission::from_draft(draft, now);
                self.submissions.push(submission.clone());
                submission
            }
        };

        if let Some(credit) = &draft.credit {
            self.apply_credit(saved.user_id, Some(saved.task_id), credit, now)?;
        }
        Ok(saved)
    }

    fn apply_credit(
        &mut self,
        user_id: UserId,
        task_id: Option<TaskId>,
        credit: &PointCredit,
        now: DateTime<Utc>,
    ) -> GamificationResult<()> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(GamificationError::UserNotFound)?;
        user.points += i64::from(credit.points);
        user.total_points += i64::from(credit.points);
        self.point_logs
            .push(PointLog::from_credit(user_id, task_id, credit, now));
        Ok(())
    }

    /// Completed-points sum per user for one mission, in first-completion order
    fn mission_scores(&self, mission_id: MissionId) -> Vec<MissionScore> {
        let mut order: Vec<UserId> = Vec::new();
        let mut sums: HashMap<UserId, i64> = HashMap::new();
        for s in self.submissions.iter().filter(|s| s.completed) {
            if self.task_mission(s.task_id) != Some(mission_id) {
                continue;
            }
            if !sums.contains_key(&s.user_id) {
                order.push(s.user_id);
            }
            *sums.entry(s.user_id).or_default() += i64::from(s.points_awarded);
        }

        let mut scores: Vec<MissionScore> = order
            .into_iter()
            .filter_map(|user_id| {
                let user = self.users.iter().find(|u| u.id == user_id)?;
                Some(MissionScore {
                    user_id,
                    name: user.name.clone(),
                    avatar_url: user.avatar_url.clone(),
                    points: sums.get(&user_id).copied().unwrap_or_default(),
                })
            })
            .collect();
        scores.sort_by(|a, b| b.points.cmp(&a.points));
        scores
    }
}

/// In-memory repository
#[derive(Clone, Default)]
pub struct InMemoryGamificationRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryGamificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> GamificationResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| GamificationError::Internal("memory store lock poisoned".to_string()))
    }

    /// Users are provisioned by the identity service; seed them directly.
    pub fn insert_user(&self, user: User) -> GamificationResult<()> {
        self.lock()?.users.push(user);
        Ok(())
    }

    /// Ledger snapshot in insertion order
    pub fn point_logs(&self) -> GamificationResult<Vec<PointLog>> {
        Ok(self.lock()?.point_logs.clone())
    }

    pub fn quiz_answers(&self) -> GamificationResult<Vec<QuizAnswer>> {
        Ok(self.lock()?.quiz_answers.clone())
    }

    pub fn submissions(&self) -> GamificationResult<Vec<Submission>> {
        Ok(self.lock()?.submissions.clone())
    }
}

impl CatalogRepository for InMemoryGamificationRepository {
    async fn find_mission(&self, mission_id: MissionId) -> GamificationResult<Option<Mission>> {
        let state = self.lock()?;
        Ok(state.missions.iter().find(|m| m.id == mission_id).cloned())
    }

    async fn list_active_missions(&self) -> GamificationResult<Vec<Mission>> {
        let state = self.lock()?;
        Ok(state.missions.iter().filter(|m| m.is_active).cloned().collect())
    }

    async fn find_task(&self, task_id: TaskId) -> GamificationResult<Option<Task>> {
        let state = self.lock()?;
        Ok(state.tasks.iter().find(|t| t.id == task_id).cloned())
    }

    async fn list_active_tasks(&self, mission_id: MissionId) -> GamificationResult<Vec<Task>> {
        let state = self.lock()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| t.mission_id == mission_id && t.is_active)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.order_index);
        Ok(tasks)
    }

    async fn find_quiz(&self, quiz_id: QuizId) -> GamificationResult<Option<Quiz>> {
        let state = self.lock()?;
        Ok(state.quizzes.iter().find(|q| q.id == quiz_id).cloned())
    }

    async fn find_quiz_for_task(&self, task_id: TaskId) -> GamificationResult<Option<Quiz>> {
        let state = self.lock()?;
        Ok(state.quizzes.iter().find(|q| q.task_id == task_id).cloned())
    }

    async fn list_questions(&self, quiz_id: QuizId) -> GamificationResult<Vec<Question>> {
        let state = self.lock()?;
        let mut questions: Vec<Question> = state
            .questions
            .iter()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.order_index);
        Ok(questions)
    }

    async fn create_mission(&self, mission: &Mission) -> GamificationResult<()> {
        self.lock()?.missions.push(mission.clone());
        Ok(())
    }

    async fn create_task(&self, task: &Task) -> GamificationResult<()> {
        let mut state = self.lock()?;
        if !state.missions.iter().any(|m| m.id == task.mission_id) {
            return Err(GamificationError::MissionNotFound);
        }
        state.tasks.push(task.clone());
        Ok(())
    }

    async fn create_quiz(&self, quiz: &Quiz, questions: &[Question]) -> GamificationResult<()> {
        let mut state = self.lock()?;
        if state.quizzes.iter().any(|q| q.task_id == quiz.task_id) {
            return Err(GamificationError::QuizAlreadyExists);
        }
        state.quizzes.push(quiz.clone());
        state.questions.extend_from_slice(questions);
        Ok(())
    }
}

impl UserRepository for InMemoryGamificationRepository {
    async fn find_user(&self, user_id: UserId) -> GamificationResult<Option<User>> {
        let state = self.lock()?;
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn list_point_logs(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> GamificationResult<Vec<PointLog>> {
        let state = self.lock()?;
        Ok(state
            .point_logs
            .iter()
            .rev()
            .filter(|l| l.user_id == user_id)
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}

impl EnrollmentRepository for InMemoryGamificationRepository {
    async fn find_enrollment(
        &self,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<Option<Enrollment>> {
        let state = self.lock()?;
        Ok(state
            .enrollments
            .iter()
            .find(|e| e.user_id == user_id && e.mission_id == mission_id)
            .cloned())
    }

    async fn create_enrollment(&self, enrollment: &Enrollment) -> GamificationResult<()> {
        let mut state = self.lock()?;
        if state
            .enrollments
            .iter()
            .any(|e| e.user_id == enrollment.user_id && e.mission_id == enrollment.mission_id)
        {
            return Err(GamificationError::AlreadyEnrolled);
        }
        state.enrollments.push(enrollment.clone());
        Ok(())
    }

    async fn upsert_confirmed(&self, enrollment: &Enrollment) -> GamificationResult<Enrollment> {
        let mut state = self.lock()?;
        let existing = state
            .enrollments
            .iter_mut()
            .find(|e| e.user_id == enrollment.user_id && e.mission_id == enrollment.mission_id);
        match existing {
            Some(e) => {
                e.participation_status = ParticipationStatus::Confirmed;
                e.payment_status = PaymentStatus::Paid;
                Ok(e.clone())
            }
            None => {
                state.enrollments.push(enrollment.clone());
                Ok(enrollment.clone())
            }
        }
    }

    async fn delete_with_submissions(
        &self,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<Option<u64>> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let before = state.enrollments.len();
        state
            .enrollments
            .retain(|e| !(e.user_id == user_id && e.mission_id == mission_id));
        if state.enrollments.len() == before {
            return Ok(None);
        }

        let mission_tasks: Vec<TaskId> = state
            .tasks
            .iter()
            .filter(|t| t.mission_id == mission_id)
            .map(|t| t.id)
            .collect();
        let before = state.submissions.len();
        state
            .submissions
            .retain(|s| !(s.user_id == user_id && mission_tasks.contains(&s.task_id)));
        Ok(Some((before - state.submissions.len()) as u64))
    }

    async fn delete_enrollment(
        &self,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<bool> {
        let mut state = self.lock()?;
        let before = state.enrollments.len();
        state
            .enrollments
            .retain(|e| !(e.user_id == user_id && e.mission_id == mission_id));
        Ok(state.enrollments.len() != before)
    }
}

impl SubmissionRepository for InMemoryGamificationRepository {
    async fn find_submission(
        &self,
        submission_id: SubmissionId,
    ) -> GamificationResult<Option<Submission>> {
        let state = self.lock()?;
        Ok(state.submissions.iter().find(|s| s.id == submission_id).cloned())
    }

    async fn find_for_task(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> GamificationResult<Option<Submission>> {
        let state = self.lock()?;
        Ok(state
            .submissions
            .iter()
            .find(|s| s.user_id == user_id && s.task_id == task_id)
            .cloned())
    }

    async fn list_for_mission(
        &self,
        user_id: UserId,
        mission_id: MissionId,
    ) -> GamificationResult<Vec<Submission>> {
        let state = self.lock()?;
        Ok(state
            .submissions
            .iter()
            .filter(|s| s.user_id == user_id && state.task_mission(s.task_id) == Some(mission_id))
            .cloned()
            .collect())
    }

    async fn list_pending(&self, limit: i64) -> GamificationResult<Vec<Submission>> {
        let state = self.lock()?;
        let mut pending: Vec<Submission> = state
            .submissions
            .iter()
            .filter(|s| s.is_pending())
            .cloned()
            .collect();
        pending.sort_by_key(|s| s.updated_at);
        pending.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(pending)
    }

    async fn save_attempt(&self, draft: SubmissionDraft) -> GamificationResult<Submission> {
        self.lock()?.save_attempt(&draft, Utc::now())
    }

    async fn review(
        &self,
        submission_id: SubmissionId,
        reviewer: UserId,
        decision: ReviewDecision,
    ) -> GamificationResult<Option<(Submission, i32)>> {
        let mut state = self.lock()?;
        let Some(index) = state.submissions.iter().position(|s| s.id == submission_id) else {
            return Ok(None);
        };

        let now = Utc::now();
        let mut submission = state.submissions[index].clone();
        let credit = submission.review(Validator::Staff(reviewer), decision, now);
        if credit.is_some() && !state.users.iter().any(|u| u.id == submission.user_id) {
            return Err(GamificationError::UserNotFound);
        }

        state.submissions[index] = submission.clone();
        let credited = match &credit {
            Some(credit) => {
                state.apply_credit(submission.user_id, Some(submission.task_id), credit, now)?;
                credit.points
            }
            None => 0,
        };
        Ok(Some((submission, credited)))
    }
}

impl QuizAttemptRepository for InMemoryGamificationRepository {
    async fn record_quiz_attempt(
        &self,
        answers: &[QuizAnswer],
        completion: Option<SubmissionDraft>,
    ) -> GamificationResult<Option<Submission>> {
        let mut state = self.lock()?;
        let submission = completion
            .map(|draft| state.save_attempt(&draft, Utc::now()))
            .transpose()?;
        state.quiz_answers.extend_from_slice(answers);
        Ok(submission)
    }
}

impl RankingRepository for InMemoryGamificationRepository {
    async fn global_ranking(&self, limit: i64) -> GamificationResult<Vec<RankedUser>> {
        let state = self.lock()?;
        let mut ranked: Vec<RankedUser> = state
            .users
            .iter()
            .filter(|u| u.is_ranked())
            .map(|u| RankedUser {
                user_id: u.id,
                name: u.name.clone(),
                avatar_url: u.avatar_url.clone(),
                total_points: u.total_points,
            })
            .collect();
        ranked.sort_by(|a, b| b.total_points.cmp(&a.total_points));
        ranked.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(ranked)
    }

    async fn mission_top_scorers(&self) -> GamificationResult<Vec<MissionTopScorer>> {
        let state = self.lock()?;
        Ok(state
            .missions
            .iter()
            .filter_map(|m| {
                let best = state.mission_scores(m.id).into_iter().next()?;
                Some(MissionTopScorer {
                    mission_id: m.id,
                    mission_title: m.title.clone(),
                    user_id: best.user_id,
                    name: best.name,
                    avatar_url: best.avatar_url,
                    points: best.points,
                })
            })
            .collect())
    }

    async fn mission_ranking(
        &self,
        mission_id: MissionId,
        limit: i64,
    ) -> GamificationResult<Vec<MissionScore>> {
        let state = self.lock()?;
        let mut scores = state.mission_scores(mission_id);
        scores.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(scores)
    }
}
