//! Unit tests for gamification crate
//! Use cases run against the in-memory store; router tests go through the
//! role gate with real signed tokens.

#[cfg(test)]
mod fixtures {
    use crate::domain::entities::{Mission, Question, Quiz, Task, User};
    use crate::domain::repository::CatalogRepository;
    use crate::domain::value_objects::TaskType;
    use crate::infra::memory::InMemoryGamificationRepository;
    use auth::UserRole;
    use std::sync::Arc;

    pub struct Fixture {
        pub repo: Arc<InMemoryGamificationRepository>,
        pub participant: User,
        pub validator: User,
        pub admin: User,
        pub mission: Mission,
        pub task: Task,
    }

    pub async fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryGamificationRepository::new());

        let participant = User::new("Ana", "ana@example.com", UserRole::Participant);
        let validator = User::new("Vic", "vic@example.com", UserRole::Validator);
        let admin = User::new("Ada", "ada@example.com", UserRole::Admin);
        for user in [&participant, &validator, &admin] {
            repo.insert_user(user.clone()).unwrap();
        }

        let mission = Mission::new("Onboarding", 0);
        repo.create_mission(&mission).await.unwrap();

        let task = Task::new(mission.id, "Upload a photo", 10, TaskType::Engagement);
        repo.create_task(&task).await.unwrap();

        Fixture {
            repo,
            participant,
            validator,
            admin,
            mission,
            task,
        }
    }

    /// A quiz task with three questions whose answers are "A", "B", "C".
    pub async fn quiz_task(fx: &Fixture, points: i32) -> (Task, Quiz, Vec<Question>) {
        let task = Task::new(fx.mission.id, "Basics quiz", points, TaskType::Knowledge);
        fx.repo.create_task(&task).await.unwrap();

        let quiz = Quiz::new(task.id, "Basics");
        let labels = || vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let questions = vec![
            Question::new(quiz.id, "First?", labels(), "A", 0),
            Question::new(quiz.id, "Second?", labels(), "B", 1),
            Question::new(quiz.id, "Third?", labels(), "C", 2),
        ];
        fx.repo.create_quiz(&quiz, &questions).await.unwrap();

        (task, quiz, questions)
    }

    pub async fn another_user(fx: &Fixture, name: &str) -> User {
        let user = User::new(name, format!("{name}@example.com"), UserRole::Participant);
        fx.repo.insert_user(user.clone()).unwrap();
        user
    }
}

#[cfg(test)]
mod submission_tests {
    use super::fixtures::*;
    use crate::application::enrollment::JoinMissionUseCase;
    use crate::application::submit_task::{SubmitTaskInput, SubmitTaskUseCase};
    use crate::application::validate_submission::{
        ValidateSubmissionInput, ValidateSubmissionUseCase,
    };
    use crate::domain::entities::{Question, Quiz, SubmissionDraft, Task};
    use crate::domain::repository::{CatalogRepository, SubmissionRepository, UserRepository};
    use crate::domain::value_objects::{PointCategory, TaskType, Validator};
    use crate::error::GamificationError;
    use kernel::id::{MissionId, SubmissionId, TaskId, UserId};
    use serde_json::{Value, json};
    use tokio_test::{assert_err, assert_ok};

    async fn join(fx: &Fixture, user_id: UserId) {
        JoinMissionUseCase::new(fx.repo.clone(), fx.repo.clone())
            .execute(user_id, fx.mission.id)
            .await
            .unwrap();
    }

    async fn submit(
        fx: &Fixture,
        user_id: UserId,
        mission_id: MissionId,
        task_id: TaskId,
        evidence: Value,
    ) -> Result<crate::application::submit_task::SubmitTaskOutput, GamificationError> {
        SubmitTaskUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.repo.clone())
            .execute(SubmitTaskInput {
                user_id,
                mission_id,
                task_id,
                evidence,
            })
            .await
    }

    async fn review(
        fx: &Fixture,
        submission_id: SubmissionId,
        approve: bool,
        points: Option<i32>,
    ) -> Result<crate::application::validate_submission::ValidateSubmissionOutput, GamificationError>
    {
        ValidateSubmissionUseCase::new(fx.repo.clone())
            .execute(ValidateSubmissionInput {
                submission_id,
                validator_id: fx.validator.id,
                approve,
                points,
            })
            .await
    }

    async fn totals(fx: &Fixture, user_id: UserId) -> (i64, i64) {
        let user = fx.repo.find_user(user_id).await.unwrap().unwrap();
        (user.points, user.total_points)
    }

    #[tokio::test]
    async fn test_submit_requires_enrollment() {
        let fx = fixture().await;
        let err = assert_err!(
            submit(&fx, fx.participant.id, fx.mission.id, fx.task.id, json!({})).await
        );
        assert!(matches!(err, GamificationError::NotEnrolled));
        assert!(fx.repo.submissions().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_task_must_belong_to_mission_and_be_active() {
        let fx = fixture().await;
        join(&fx, fx.participant.id).await;

        let err = assert_err!(
            submit(&fx, fx.participant.id, MissionId::new(), fx.task.id, json!({})).await
        );
        assert!(matches!(err, GamificationError::TaskNotFound));

        let inactive = Task {
            is_active: false,
            ..Task::new(fx.mission.id, "Retired", 5, TaskType::Social)
        };
        fx.repo.create_task(&inactive).await.unwrap();
        let err = assert_err!(
            submit(&fx, fx.participant.id, fx.mission.id, inactive.id, json!({})).await
        );
        assert!(matches!(err, GamificationError::TaskNotFound));
    }

    #[tokio::test]
    async fn test_evidence_waits_for_validation() {
        let fx = fixture().await;
        join(&fx, fx.participant.id).await;

        let out = assert_ok!(
            submit(&fx, fx.participant.id, fx.mission.id, fx.task.id, json!({"url": "a"})).await
        );
        assert!(!out.submission.completed);
        assert_eq!(out.submission.points_awarded, 0);
        assert_eq!(out.submission.attempts, 1);
        assert!(out.score.is_none());

        let out = assert_ok!(
            submit(&fx, fx.participant.id, fx.mission.id, fx.task.id, json!({"url": "b"})).await
        );
        assert_eq!(out.submission.attempts, 2);
        assert_eq!(out.submission.evidence, json!({"url": "b"}));
        assert_eq!(fx.repo.submissions().unwrap().len(), 1);

        assert_eq!(totals(&fx, fx.participant.id).await, (0, 0));
        assert!(fx.repo.point_logs().unwrap().is_empty());

        let pending = fx.repo.list_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, out.submission.id);
    }

    #[tokio::test]
    async fn test_approval_credits_once_with_log() {
        let fx = fixture().await;
        join(&fx, fx.participant.id).await;
        let out = submit(&fx, fx.participant.id, fx.mission.id, fx.task.id, json!({}))
            .await
            .unwrap();

        let reviewed = assert_ok!(review(&fx, out.submission.id, true, Some(10)).await);
        assert!(reviewed.submission.completed);
        assert_eq!(reviewed.credited, 10);
        assert_eq!(
            reviewed.submission.validator,
            Some(Validator::Staff(fx.validator.id))
        );
        assert_eq!(totals(&fx, fx.participant.id).await, (10, 10));

        let logs = fx.repo.point_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].points, 10);
        assert_eq!(logs[0].category, PointCategory::TaskCompleted);
        assert_eq!(logs[0].task_id, Some(fx.task.id));
        assert!(fx.repo.list_pending(10).await.unwrap().is_empty());

        // Re-approval only credits the increase
        let reviewed = assert_ok!(review(&fx, out.submission.id, true, Some(15)).await);
        assert_eq!(reviewed.credited, 5);
        assert_eq!(totals(&fx, fx.participant.id).await, (15, 15));

        let reviewed = assert_ok!(review(&fx, out.submission.id, true, Some(15)).await);
        assert_eq!(reviewed.credited, 0);
        assert_eq!(fx.repo.point_logs().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_completed_task_rejects_resubmission() {
        let fx = fixture().await;
        join(&fx, fx.participant.id).await;
        let out = submit(&fx, fx.participant.id, fx.mission.id, fx.task.id, json!({}))
            .await
            .unwrap();
        review(&fx, out.submission.id, true, Some(10)).await.unwrap();

        let err = assert_err!(
            submit(&fx, fx.participant.id, fx.mission.id, fx.task.id, json!({"again": true}))
                .await
        );
        assert!(matches!(err, GamificationError::TaskAlreadyCompleted));

        let stored = fx.repo.find_submission(out.submission.id).await.unwrap().unwrap();
        assert_eq!(stored.attempts, 1);
        assert!(stored.completed);
        assert_eq!(totals(&fx, fx.participant.id).await, (10, 10));
    }

    #[tokio::test]
    async fn test_repository_refuses_to_overwrite_completed_row() {
        let fx = fixture().await;
        let draft = SubmissionDraft::scored(
            fx.participant.id,
            fx.task.id,
            json!({}),
            10,
            true,
            PointCategory::QuizEarned,
            "done".to_string(),
        );

        assert_ok!(fx.repo.save_attempt(draft.clone()).await);
        let err = assert_err!(fx.repo.save_attempt(draft).await);
        assert!(matches!(err, GamificationError::TaskAlreadyCompleted));

        assert_eq!(fx.repo.point_logs().unwrap().len(), 1);
        assert_eq!(totals(&fx, fx.participant.id).await, (10, 10));
    }

    #[tokio::test]
    async fn test_reject_keeps_credited_points() {
        let fx = fixture().await;
        join(&fx, fx.participant.id).await;
        let out = submit(&fx, fx.participant.id, fx.mission.id, fx.task.id, json!({}))
            .await
            .unwrap();
        review(&fx, out.submission.id, true, Some(10)).await.unwrap();

        let rejected = assert_ok!(review(&fx, out.submission.id, false, None).await);
        assert!(!rejected.submission.completed);
        assert_eq!(rejected.submission.points_awarded, 0);
        assert!(rejected.submission.validated_at.is_some());
        assert_eq!(rejected.credited, 0);
        assert_eq!(totals(&fx, fx.participant.id).await, (10, 10));

        // Rejected work can be resubmitted and goes back to the queue
        let again = assert_ok!(
            submit(&fx, fx.participant.id, fx.mission.id, fx.task.id, json!({"v": 2})).await
        );
        assert_eq!(again.submission.attempts, 2);
        assert!(again.submission.is_pending());
    }

    #[tokio::test]
    async fn test_validate_errors() {
        let fx = fixture().await;
        let err = assert_err!(review(&fx, SubmissionId::new(), true, Some(5)).await);
        assert!(matches!(err, GamificationError::SubmissionNotFound));

        join(&fx, fx.participant.id).await;
        let out = submit(&fx, fx.participant.id, fx.mission.id, fx.task.id, json!({}))
            .await
            .unwrap();
        let err = assert_err!(review(&fx, out.submission.id, true, Some(-1)).await);
        assert!(matches!(err, GamificationError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_approve_without_points_completes_with_zero() {
        let fx = fixture().await;
        join(&fx, fx.participant.id).await;
        let out = submit(&fx, fx.participant.id, fx.mission.id, fx.task.id, json!({}))
            .await
            .unwrap();

        let reviewed = assert_ok!(review(&fx, out.submission.id, true, None).await);
        assert!(reviewed.submission.completed);
        assert_eq!(reviewed.credited, 0);
        assert!(fx.repo.point_logs().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_evidence_quiz_partial_credit() {
        let fx = fixture().await;
        let (task, _quiz, questions) = quiz_task(&fx, 10).await;
        join(&fx, fx.participant.id).await;

        let evidence = json!({
            "answers": {
                questions[0].id.to_string(): "A",
                questions[1].id.to_string(): "B",
                questions[2].id.to_string(): "A",
            }
        });
        let out = assert_ok!(
            submit(&fx, fx.participant.id, fx.mission.id, task.id, evidence).await
        );

        let score = out.score.unwrap();
        assert_eq!((score.correct, score.total), (2, 3));
        assert!(out.submission.completed);
        assert_eq!(out.submission.points_awarded, 7);
        assert_eq!(out.submission.validator, Some(Validator::System));
        assert_eq!(totals(&fx, fx.participant.id).await, (7, 7));

        let logs = fx.repo.point_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].category, PointCategory::QuizEarned);
        assert_eq!(logs[0].validator, Validator::System);
    }

    #[tokio::test]
    async fn test_evidence_quiz_zero_score_not_completed() {
        let fx = fixture().await;
        let (task, _quiz, questions) = quiz_task(&fx, 10).await;
        join(&fx, fx.participant.id).await;

        let evidence = json!({ "answers": { questions[0].id.to_string(): "C" } });
        let out = assert_ok!(
            submit(&fx, fx.participant.id, fx.mission.id, task.id, evidence).await
        );
        assert!(!out.submission.completed);
        assert_eq!(out.submission.points_awarded, 0);
        assert!(fx.repo.point_logs().unwrap().is_empty());

        // A later perfect attempt still completes the task
        let evidence = json!({
            "answers": {
                questions[0].id.to_string(): "A",
                questions[1].id.to_string(): "B",
                questions[2].id.to_string(): "C",
            }
        });
        let out = assert_ok!(
            submit(&fx, fx.participant.id, fx.mission.id, task.id, evidence).await
        );
        assert_eq!(out.submission.attempts, 2);
        assert_eq!(out.submission.points_awarded, 10);
    }

    async fn assert_left_for_review(
        fx: &Fixture,
        out: &crate::application::submit_task::SubmitTaskOutput,
    ) {
        assert!(out.score.is_none());
        assert!(!out.submission.completed);
        assert_eq!(out.submission.points_awarded, 0);
        assert_eq!(out.submission.validator, None);
        assert!(fx.repo.point_logs().unwrap().is_empty());
        assert_eq!(totals(fx, out.submission.user_id).await, (0, 0));

        let pending = fx.repo.list_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, out.submission.id);
    }

    #[tokio::test]
    async fn test_inactive_quiz_evidence_waits_for_validation() {
        let fx = fixture().await;
        let task = Task::new(fx.mission.id, "Retired quiz", 10, TaskType::Knowledge);
        fx.repo.create_task(&task).await.unwrap();
        let quiz = Quiz {
            is_active: false,
            ..Quiz::new(task.id, "Retired")
        };
        let question = Question::new(quiz.id, "Only?", vec!["A".to_string()], "A", 0);
        fx.repo.create_quiz(&quiz, &[question.clone()]).await.unwrap();
        join(&fx, fx.participant.id).await;

        let evidence = json!({ "answers": { question.id.to_string(): "A" } });
        let out = assert_ok!(
            submit(&fx, fx.participant.id, fx.mission.id, task.id, evidence).await
        );
        assert_left_for_review(&fx, &out).await;
        assert_eq!(out.message, "Submission received and awaiting validation.");
    }

    #[tokio::test]
    async fn test_evidence_for_empty_quiz_is_not_scored() {
        let fx = fixture().await;
        let task = Task::new(fx.mission.id, "Empty quiz", 10, TaskType::Knowledge);
        fx.repo.create_task(&task).await.unwrap();
        fx.repo
            .create_quiz(&Quiz::new(task.id, "Empty"), &[])
            .await
            .unwrap();
        join(&fx, fx.participant.id).await;

        let out = assert_ok!(
            submit(&fx, fx.participant.id, fx.mission.id, task.id, json!({"answers": {}})).await
        );
        assert_left_for_review(&fx, &out).await;
    }

    #[tokio::test]
    async fn test_staff_review_reads_back_with_reviewer() {
        let fx = fixture().await;
        join(&fx, fx.participant.id).await;
        let out = submit(&fx, fx.participant.id, fx.mission.id, fx.task.id, json!({}))
            .await
            .unwrap();
        review(&fx, out.submission.id, false, None).await.unwrap();

        let stored = fx
            .repo
            .find_submission(out.submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.validator, Some(Validator::Staff(fx.validator.id)));
        assert!(stored.validated_at.is_some());
        assert!(!stored.is_pending());
        assert!(fx.repo.list_pending(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reapproval_after_rejection_credits_again() {
        let fx = fixture().await;
        join(&fx, fx.participant.id).await;
        let out = submit(&fx, fx.participant.id, fx.mission.id, fx.task.id, json!({}))
            .await
            .unwrap();

        review(&fx, out.submission.id, true, Some(10)).await.unwrap();
        review(&fx, out.submission.id, false, None).await.unwrap();
        let again = assert_ok!(review(&fx, out.submission.id, true, Some(10)).await);

        assert_eq!(again.credited, 10);
        assert_eq!(totals(&fx, fx.participant.id).await, (20, 20));
        assert_eq!(fx.repo.point_logs().unwrap().len(), 2);
    }
}

#[cfg(test)]
mod quiz_tests {
    use super::fixtures::*;
    use crate::application::submit_quiz::{SubmitQuizInput, SubmitQuizUseCase, SubmittedAnswer};
    use crate::domain::entities::Question;
    use crate::domain::repository::{CatalogRepository, UserRepository};
    use crate::domain::value_objects::PointCategory;
    use crate::error::GamificationError;
    use kernel::id::{QuestionId, QuizId, UserId};
    use tokio_test::{assert_err, assert_ok};

    fn answers(questions: &[Question], values: &[&str]) -> Vec<SubmittedAnswer> {
        questions
            .iter()
            .zip(values)
            .map(|(q, v)| SubmittedAnswer {
                question_id: q.id,
                answer: v.to_string(),
            })
            .collect()
    }

    async fn submit_quiz(
        fx: &Fixture,
        user_id: UserId,
        quiz_id: QuizId,
        answers: Vec<SubmittedAnswer>,
    ) -> Result<crate::application::submit_quiz::SubmitQuizOutput, GamificationError> {
        SubmitQuizUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.repo.clone())
            .execute(SubmitQuizInput {
                user_id,
                quiz_id,
                answers,
            })
            .await
    }

    #[tokio::test]
    async fn test_perfect_quiz_credits_task_points_once() {
        let fx = fixture().await;
        let (task, quiz, questions) = quiz_task(&fx, 30).await;

        let out = assert_ok!(
            submit_quiz(&fx, fx.participant.id, quiz.id, answers(&questions, &["A", "B", "C"]))
                .await
        );
        assert_eq!((out.score.correct, out.score.total), (3, 3));
        assert_eq!(out.credited, 30);
        let submission = out.submission.unwrap();
        assert!(submission.completed);
        assert_eq!(submission.task_id, task.id);

        let user = fx.repo.find_user(fx.participant.id).await.unwrap().unwrap();
        assert_eq!(user.total_points, 30);
        let logs = fx.repo.point_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].category, PointCategory::QuizEarned);

        let err = assert_err!(
            submit_quiz(&fx, fx.participant.id, quiz.id, answers(&questions, &["A", "B", "C"]))
                .await
        );
        assert!(matches!(err, GamificationError::QuizAlreadyCompleted));
        assert_eq!(fx.repo.quiz_answers().unwrap().len(), 3);
        assert_eq!(fx.repo.point_logs().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_partial_quiz_grants_nothing_but_stores_answers() {
        let fx = fixture().await;
        let (_task, quiz, questions) = quiz_task(&fx, 30).await;

        let out = assert_ok!(
            submit_quiz(&fx, fx.participant.id, quiz.id, answers(&questions, &["A", "B", "A"]))
                .await
        );
        assert_eq!((out.score.correct, out.score.total), (2, 3));
        assert_eq!(out.credited, 0);
        assert!(out.submission.is_none());
        assert!(fx.repo.submissions().unwrap().is_empty());

        // Answers are appended, never upserted
        submit_quiz(&fx, fx.participant.id, quiz.id, answers(&questions, &["A"]))
            .await
            .unwrap();
        let stored = fx.repo.quiz_answers().unwrap();
        assert_eq!(stored.len(), 4);
        assert_eq!(stored.iter().filter(|a| a.is_correct).count(), 3);
    }

    #[tokio::test]
    async fn test_answering_subset_is_not_perfect() {
        let fx = fixture().await;
        let (_task, quiz, questions) = quiz_task(&fx, 30).await;

        let out = assert_ok!(
            submit_quiz(&fx, fx.participant.id, quiz.id, answers(&questions, &["A", "B"])).await
        );
        assert_eq!((out.score.correct, out.score.total), (2, 3));
        assert_eq!(out.credited, 0);
    }

    #[tokio::test]
    async fn test_foreign_or_duplicate_answers_rejected() {
        let fx = fixture().await;
        let (_task, quiz, questions) = quiz_task(&fx, 30).await;

        let mut foreign = answers(&questions, &["A"]);
        foreign.push(SubmittedAnswer {
            question_id: QuestionId::new(),
            answer: "A".into(),
        });
        let err = assert_err!(submit_quiz(&fx, fx.participant.id, quiz.id, foreign).await);
        assert!(matches!(err, GamificationError::InvalidInput(_)));

        let mut duplicate = answers(&questions, &["A", "B", "C"]);
        duplicate.push(SubmittedAnswer {
            question_id: questions[0].id,
            answer: "B".into(),
        });
        let err = assert_err!(submit_quiz(&fx, fx.participant.id, quiz.id, duplicate).await);
        assert!(matches!(err, GamificationError::InvalidInput(_)));

        assert!(fx.repo.quiz_answers().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inactive_or_missing_quiz_not_found() {
        let fx = fixture().await;
        let err = assert_err!(submit_quiz(&fx, fx.participant.id, QuizId::new(), vec![]).await);
        assert!(matches!(err, GamificationError::QuizNotFound));

        let task = crate::domain::entities::Task::new(
            fx.mission.id,
            "Hidden",
            5,
            crate::domain::value_objects::TaskType::Knowledge,
        );
        fx.repo.create_task(&task).await.unwrap();
        let quiz = crate::domain::entities::Quiz {
            is_active: false,
            ..crate::domain::entities::Quiz::new(task.id, "Hidden")
        };
        fx.repo.create_quiz(&quiz, &[]).await.unwrap();

        let err = assert_err!(submit_quiz(&fx, fx.participant.id, quiz.id, vec![]).await);
        assert!(matches!(err, GamificationError::QuizNotFound));
    }
}

#[cfg(test)]
mod enrollment_tests {
    use super::fixtures::*;
    use crate::application::enrollment::{
        AddParticipantUseCase, JoinMissionUseCase, LeaveMissionUseCase, RemoveParticipantUseCase,
    };
    use crate::application::submit_task::{SubmitTaskInput, SubmitTaskUseCase};
    use crate::application::validate_submission::{
        ValidateSubmissionInput, ValidateSubmissionUseCase,
    };
    use crate::domain::entities::Mission;
    use crate::domain::repository::{
        CatalogRepository, EnrollmentRepository, SubmissionRepository, UserRepository,
    };
    use crate::domain::value_objects::{ParticipationStatus, PaymentStatus};
    use crate::error::GamificationError;
    use kernel::id::{MissionId, UserId};
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn join_use_case(fx: &Fixture) -> JoinMissionUseCase<
        crate::InMemoryGamificationRepository,
        crate::InMemoryGamificationRepository,
    > {
        JoinMissionUseCase::new(fx.repo.clone(), fx.repo.clone())
    }

    async fn complete_task(fx: &Fixture, user_id: UserId, points: i32) {
        let out = SubmitTaskUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.repo.clone())
            .execute(SubmitTaskInput {
                user_id,
                mission_id: fx.mission.id,
                task_id: fx.task.id,
                evidence: json!({}),
            })
            .await
            .unwrap();
        ValidateSubmissionUseCase::new(fx.repo.clone())
            .execute(ValidateSubmissionInput {
                submission_id: out.submission.id,
                validator_id: fx.admin.id,
                approve: true,
                points: Some(points),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_join_rules() {
        let fx = fixture().await;
        let join = join_use_case(&fx);

        let enrollment = assert_ok!(join.execute(fx.participant.id, fx.mission.id).await);
        assert_eq!(enrollment.participation_status, ParticipationStatus::Enrolled);
        assert_eq!(enrollment.payment_status, PaymentStatus::Paid);

        let err = assert_err!(join.execute(fx.participant.id, fx.mission.id).await);
        assert!(matches!(err, GamificationError::AlreadyEnrolled));

        let err = assert_err!(join.execute(fx.participant.id, MissionId::new()).await);
        assert!(matches!(err, GamificationError::MissionUnavailable));

        let closed = Mission {
            is_active: false,
            ..Mission::new("Closed", 0)
        };
        fx.repo.create_mission(&closed).await.unwrap();
        let err = assert_err!(join.execute(fx.participant.id, closed.id).await);
        assert!(matches!(err, GamificationError::MissionUnavailable));

        let paid = Mission::new("Premium", 2500);
        fx.repo.create_mission(&paid).await.unwrap();
        let enrollment = assert_ok!(join.execute(fx.participant.id, paid.id).await);
        assert_eq!(enrollment.payment_status, PaymentStatus::Pending);
        assert_eq!(enrollment.amount_paid_cents, 2500);
    }

    #[tokio::test]
    async fn test_leave_cascades_submissions_but_keeps_points() {
        let fx = fixture().await;
        join_use_case(&fx)
            .execute(fx.participant.id, fx.mission.id)
            .await
            .unwrap();
        complete_task(&fx, fx.participant.id, 10).await;

        let leave = LeaveMissionUseCase::new(fx.repo.clone());
        let removed = assert_ok!(leave.execute(fx.participant.id, fx.mission.id).await);
        assert_eq!(removed, 1);

        assert!(
            fx.repo
                .find_enrollment(fx.participant.id, fx.mission.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            fx.repo
                .find_for_task(fx.participant.id, fx.task.id)
                .await
                .unwrap()
                .is_none()
        );
        let user = fx.repo.find_user(fx.participant.id).await.unwrap().unwrap();
        assert_eq!(user.total_points, 10);
        assert_eq!(fx.repo.point_logs().unwrap().len(), 1);

        let err = assert_err!(leave.execute(fx.participant.id, fx.mission.id).await);
        assert!(matches!(err, GamificationError::EnrollmentNotFound));
    }

    #[tokio::test]
    async fn test_admin_add_participant() {
        let fx = fixture().await;
        let add = AddParticipantUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.repo.clone());

        let enrollment = assert_ok!(add.execute(fx.admin.id, fx.participant.id, fx.mission.id).await);
        assert_eq!(enrollment.participation_status, ParticipationStatus::Confirmed);
        assert_eq!(enrollment.payment_status, PaymentStatus::Paid);
        assert_eq!(enrollment.amount_paid_cents, 0);

        // Force-enrolled users can participate
        complete_task(&fx, fx.participant.id, 4).await;

        let err = assert_err!(add.execute(fx.admin.id, UserId::new(), fx.mission.id).await);
        assert!(matches!(err, GamificationError::UserNotFound));
        let err = assert_err!(add.execute(fx.admin.id, fx.participant.id, MissionId::new()).await);
        assert!(matches!(err, GamificationError::MissionNotFound));
    }

    #[tokio::test]
    async fn test_admin_add_updates_existing_enrollment() {
        let fx = fixture().await;
        let paid = Mission::new("Premium", 2500);
        fx.repo.create_mission(&paid).await.unwrap();
        join_use_case(&fx)
            .execute(fx.participant.id, paid.id)
            .await
            .unwrap();

        let add = AddParticipantUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.repo.clone());
        let enrollment = assert_ok!(add.execute(fx.admin.id, fx.participant.id, paid.id).await);
        assert_eq!(enrollment.participation_status, ParticipationStatus::Confirmed);
        assert_eq!(enrollment.payment_status, PaymentStatus::Paid);
        assert_eq!(enrollment.amount_paid_cents, 2500);
    }

    #[tokio::test]
    async fn test_admin_remove_keeps_submissions() {
        let fx = fixture().await;
        join_use_case(&fx)
            .execute(fx.participant.id, fx.mission.id)
            .await
            .unwrap();
        complete_task(&fx, fx.participant.id, 10).await;

        let remove = RemoveParticipantUseCase::new(fx.repo.clone());
        assert_ok!(remove.execute(fx.admin.id, fx.participant.id, fx.mission.id).await);
        assert!(
            fx.repo
                .find_for_task(fx.participant.id, fx.task.id)
                .await
                .unwrap()
                .is_some()
        );

        let err = assert_err!(remove.execute(fx.admin.id, fx.participant.id, fx.mission.id).await);
        assert!(matches!(err, GamificationError::EnrollmentNotFound));
    }
}

#[cfg(test)]
mod ranking_tests {
    use super::fixtures::*;
    use crate::application::config::GamificationConfig;
    use crate::application::enrollment::AddParticipantUseCase;
    use crate::application::ranking::RankingUseCase;
    use crate::application::submit_task::{SubmitTaskInput, SubmitTaskUseCase};
    use crate::application::validate_submission::{
        ValidateSubmissionInput, ValidateSubmissionUseCase,
    };
    use crate::domain::entities::{Mission, Task, User};
    use crate::domain::repository::CatalogRepository;
    use crate::domain::value_objects::TaskType;
    use crate::error::GamificationError;
    use auth::UserRole;
    use kernel::id::{MissionId, TaskId, UserId};
    use serde_json::json;
    use std::sync::Arc;

    async fn award(fx: &Fixture, user_id: UserId, mission_id: MissionId, task_id: TaskId, points: i32) {
        AddParticipantUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.repo.clone())
            .execute(fx.admin.id, user_id, mission_id)
            .await
            .unwrap();
        let out = SubmitTaskUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.repo.clone())
            .execute(SubmitTaskInput {
                user_id,
                mission_id,
                task_id,
                evidence: json!({}),
            })
            .await
            .unwrap();
        ValidateSubmissionUseCase::new(fx.repo.clone())
            .execute(ValidateSubmissionInput {
                submission_id: out.submission.id,
                validator_id: fx.admin.id,
                approve: true,
                points: Some(points),
            })
            .await
            .unwrap();
    }

    fn ranking(
        fx: &Fixture,
        config: GamificationConfig,
    ) -> RankingUseCase<crate::InMemoryGamificationRepository, crate::InMemoryGamificationRepository>
    {
        RankingUseCase::new(fx.repo.clone(), fx.repo.clone(), Arc::new(config))
    }

    #[tokio::test]
    async fn test_global_ranking_orders_active_participants() {
        let fx = fixture().await;
        let bob = another_user(&fx, "bob").await;
        let cy = another_user(&fx, "cy").await;
        let dormant = User {
            is_active: false,
            ..User::new("zed", "zed@example.com", UserRole::Participant)
        };
        fx.repo.insert_user(dormant.clone()).unwrap();

        award(&fx, bob.id, fx.mission.id, fx.task.id, 30).await;
        award(&fx, fx.participant.id, fx.mission.id, fx.task.id, 10).await;
        award(&fx, fx.admin.id, fx.mission.id, fx.task.id, 99).await;

        let ranked = ranking(&fx, GamificationConfig::default()).global().await.unwrap();
        let ids: Vec<UserId> = ranked.iter().map(|r| r.user_id).collect();
        assert_eq!(ids, vec![bob.id, fx.participant.id, cy.id]);
        assert_eq!(ranked[0].total_points, 30);
        assert!(!ids.contains(&fx.admin.id));
        assert!(!ids.contains(&dormant.id));

        let ranked = ranking(&fx, GamificationConfig::with_ranking_limits(2, 5))
            .global()
            .await
            .unwrap();
        assert_eq!(ranked.len(), 2);
    }

    #[tokio::test]
    async fn test_mission_ranking_top_five_with_current_user() {
        let fx = fixture().await;
        let mut users = Vec::new();
        for (i, name) in ["u1", "u2", "u3", "u4", "u5", "u6"].iter().enumerate() {
            let user = another_user(&fx, name).await;
            award(&fx, user.id, fx.mission.id, fx.task.id, (i as i32 + 1) * 10).await;
            users.push(user);
        }

        let entries = ranking(&fx, GamificationConfig::default())
            .mission(fx.mission.id, users[5].id)
            .await
            .unwrap();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].position, 1);
        assert_eq!(entries[0].score.user_id, users[5].id);
        assert_eq!(entries[0].score.points, 60);
        assert!(entries[0].is_current_user);
        assert!(entries[1..].iter().all(|e| !e.is_current_user));
        assert!(!entries.iter().any(|e| e.score.user_id == users[0].id));

        let err = ranking(&fx, GamificationConfig::default())
            .mission(MissionId::new(), users[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, GamificationError::MissionNotFound));
    }

    #[tokio::test]
    async fn test_top_scorer_per_mission() {
        let fx = fixture().await;
        let bob = another_user(&fx, "bob").await;

        let second = Mission::new("Advanced", 0);
        fx.repo.create_mission(&second).await.unwrap();
        let second_task = Task::new(second.id, "Essay", 50, TaskType::Feedback);
        fx.repo.create_task(&second_task).await.unwrap();
        let extra_task = Task::new(fx.mission.id, "Bonus", 5, TaskType::Social);
        fx.repo.create_task(&extra_task).await.unwrap();

        award(&fx, bob.id, fx.mission.id, fx.task.id, 10).await;
        award(&fx, fx.participant.id, fx.mission.id, fx.task.id, 8).await;
        award(&fx, fx.participant.id, fx.mission.id, extra_task.id, 5).await;
        award(&fx, bob.id, second.id, second_task.id, 50).await;

        let tops = ranking(&fx, GamificationConfig::default())
            .top_per_mission()
            .await
            .unwrap();
        assert_eq!(tops.len(), 2);

        let first = tops.iter().find(|t| t.mission_id == fx.mission.id).unwrap();
        assert_eq!(first.user_id, fx.participant.id);
        assert_eq!(first.points, 13);

        let other = tops.iter().find(|t| t.mission_id == second.id).unwrap();
        assert_eq!(other.user_id, bob.id);
        assert_eq!(other.mission_title, "Advanced");
    }
}

#[cfg(test)]
mod catalog_tests {
    use super::fixtures::*;
    use crate::application::catalog::{
        CatalogAdminUseCase, CatalogQueryUseCase, NewMission, NewQuestion, NewQuiz,
    };
    use crate::application::profile::ProfileUseCase;
    use crate::application::submit_quiz::{SubmitQuizInput, SubmitQuizUseCase, SubmittedAnswer};
    use crate::error::GamificationError;
    use tokio_test::{assert_err, assert_ok};

    fn question(correct: &str) -> NewQuestion {
        NewQuestion {
            statement: "Pick one".into(),
            options: vec!["yes".into(), "no".into()],
            correct_answer: correct.into(),
        }
    }

    #[tokio::test]
    async fn test_create_quiz_validation() {
        let fx = fixture().await;
        let admin = CatalogAdminUseCase::new(fx.repo.clone());

        let err = assert_err!(
            admin
                .create_quiz(
                    fx.task.id,
                    NewQuiz {
                        title: "Check".into(),
                        questions: vec![question("maybe")],
                    },
                )
                .await
        );
        assert!(matches!(err, GamificationError::InvalidInput(_)));

        let view = assert_ok!(
            admin
                .create_quiz(
                    fx.task.id,
                    NewQuiz {
                        title: "Check".into(),
                        questions: vec![question("yes"), question("no")],
                    },
                )
                .await
        );
        assert_eq!(view.questions.len(), 2);
        assert_eq!(view.questions[1].order_index, 1);

        let err = assert_err!(
            admin
                .create_quiz(
                    fx.task.id,
                    NewQuiz {
                        title: "Again".into(),
                        questions: vec![question("yes")],
                    },
                )
                .await
        );
        assert!(matches!(err, GamificationError::QuizAlreadyExists));
    }

    #[tokio::test]
    async fn test_quiz_view_hides_answer_key() {
        let fx = fixture().await;
        let (_task, quiz, _questions) = quiz_task(&fx, 10).await;

        let view = CatalogQueryUseCase::new(fx.repo.clone(), fx.repo.clone())
            .quiz(quiz.id)
            .await
            .unwrap();
        assert_eq!(view.questions.len(), 3);

        let json = serde_json::to_string(&view.questions).unwrap();
        assert!(!json.contains("correct"));
        assert!(!json.contains("isCorrect"));
        assert!(json.contains("\"label\":\"A\""));
    }

    #[tokio::test]
    async fn test_create_mission_validation() {
        let fx = fixture().await;
        let admin = CatalogAdminUseCase::new(fx.repo.clone());
        let new_mission = |title: &str, price| NewMission {
            title: title.into(),
            description: None,
            starts_at: None,
            ends_at: None,
            price_cents: price,
            capacity: None,
            previous_mission_id: Some(fx.mission.id),
        };

        assert!(matches!(
            admin.create_mission(new_mission("  ", 0)).await,
            Err(GamificationError::InvalidInput(_))
        ));
        assert!(matches!(
            admin.create_mission(new_mission("Next", -1)).await,
            Err(GamificationError::InvalidInput(_))
        ));

        let mission = assert_ok!(admin.create_mission(new_mission(" Next ", 900)).await);
        assert_eq!(mission.title, "Next");
        assert_eq!(mission.previous_mission_id, Some(fx.mission.id));

        let missions = CatalogQueryUseCase::new(fx.repo.clone(), fx.repo.clone())
            .missions()
            .await
            .unwrap();
        assert_eq!(missions.len(), 2);
    }

    #[tokio::test]
    async fn test_mission_tasks_show_progress_and_point_history() {
        let fx = fixture().await;
        let (task, quiz, questions) = quiz_task(&fx, 12).await;

        SubmitQuizUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.repo.clone())
            .execute(SubmitQuizInput {
                user_id: fx.participant.id,
                quiz_id: quiz.id,
                answers: questions
                    .iter()
                    .map(|q| SubmittedAnswer {
                        question_id: q.id,
                        answer: q.correct_answer.clone(),
                    })
                    .collect(),
            })
            .await
            .unwrap();

        let tasks = CatalogQueryUseCase::new(fx.repo.clone(), fx.repo.clone())
            .mission_tasks(fx.participant.id, fx.mission.id)
            .await
            .unwrap();
        assert_eq!(tasks.len(), 2);
        let quiz_row = tasks.iter().find(|t| t.task.id == task.id).unwrap();
        assert_eq!(quiz_row.quiz_id, Some(quiz.id));
        assert!(quiz_row.submission.as_ref().is_some_and(|s| s.completed));
        let plain_row = tasks.iter().find(|t| t.task.id == fx.task.id).unwrap();
        assert!(plain_row.submission.is_none());

        let profile = ProfileUseCase::new(fx.repo.clone());
        let me = profile.me(fx.participant.id).await.unwrap();
        assert_eq!(me.points, 12);
        let history = profile.point_history(fx.participant.id, 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].points, 12);
    }
}

#[cfg(test)]
mod router_tests {
    use super::fixtures::*;
    use crate::application::config::GamificationConfig;
    use crate::domain::entities::User;
    use crate::presentation::router::gamification_router_generic;
    use auth::application::token::sign_token;
    use auth::{AuthConfig, Identity};
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use chrono::Utc;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct TestApp {
        fx: Fixture,
        auth: Arc<AuthConfig>,
        router: Router,
    }

    async fn app() -> TestApp {
        let fx = fixture().await;
        let auth = Arc::new(AuthConfig::with_random_secret());
        let router = gamification_router_generic(
            (*fx.repo).clone(),
            GamificationConfig::default(),
            auth.clone(),
        );
        TestApp { fx, auth, router }
    }

    fn bearer(auth: &AuthConfig, user: &User) -> String {
        let exp = Utc::now().timestamp_millis() + auth.token_ttl_ms();
        let token = sign_token(&Identity::new(user.id, user.role, exp), &auth.token_secret);
        format!("Bearer {token}")
    }

    async fn call(
        app: &TestApp,
        method: Method,
        uri: &str,
        user: Option<&User>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, bearer(&app.auth, user));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = app().await;
        let (status, body) = call(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_member_routes_require_token() {
        let app = app().await;
        let (status, body) = call(&app, Method::GET, "/missions", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["title"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_role_allow_lists() {
        let app = app().await;
        let participant = app.fx.participant.clone();
        let validator = app.fx.validator.clone();
        let admin = app.fx.admin.clone();

        let (status, _) = call(
            &app,
            Method::GET,
            "/admin/submissions/pending",
            Some(&participant),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(
            &app,
            Method::GET,
            "/admin/submissions/pending",
            Some(&validator),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let mission_body = json!({ "title": "New mission", "priceCents": 0 });
        let (status, _) = call(
            &app,
            Method::POST,
            "/admin/missions",
            Some(&validator),
            Some(mission_body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(
            &app,
            Method::POST,
            "/admin/missions",
            Some(&admin),
            Some(mission_body),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["title"], "New mission");
    }

    #[tokio::test]
    async fn test_join_and_submit_over_http() {
        let app = app().await;
        let participant = app.fx.participant.clone();
        let mission_id = app.fx.mission.id;
        let task_id = app.fx.task.id;
        let submit_uri = format!("/missions/{mission_id}/tasks/{task_id}/submit");

        let (status, body) = call(
            &app,
            Method::POST,
            &submit_uri,
            Some(&participant),
            Some(json!({ "evidence": { "url": "https://img" } })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["title"], "Forbidden");

        let join_uri = format!("/missions/{mission_id}/join");
        let (status, body) = call(&app, Method::POST, &join_uri, Some(&participant), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["participationStatus"], "enrolled");

        let (status, _) = call(&app, Method::POST, &join_uri, Some(&participant), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = call(
            &app,
            Method::POST,
            &submit_uri,
            Some(&participant),
            Some(json!({ "evidence": { "url": "https://img" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["submission"]["attempts"], 1);
        assert_eq!(body["submission"]["completed"], false);

        let (status, body) = call(&app, Method::DELETE, &join_uri, Some(&participant), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removedSubmissions"], 1);
    }

    #[tokio::test]
    async fn test_quiz_endpoint_never_exposes_answers() {
        let app = app().await;
        let (_task, quiz, _questions) = quiz_task(&app.fx, 10).await;
        let participant = app.fx.participant.clone();

        let (status, body) = call(
            &app,
            Method::GET,
            &format!("/quizzes/{}", quiz.id),
            Some(&participant),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["questions"].as_array().unwrap().len(), 3);
        let text = body.to_string();
        assert!(!text.contains("correct"));
        assert!(!text.contains("isCorrect"));
    }

    #[tokio::test]
    async fn test_unknown_mission_ranking_is_not_found() {
        let app = app().await;
        let participant = app.fx.participant.clone();
        let (status, body) = call(
            &app,
            Method::GET,
            &format!("/ranking/missions/{}", kernel::id::MissionId::new()),
            Some(&participant),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["title"], "Not Found");
    }
}
