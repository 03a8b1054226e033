use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use quiz_core::model::{
    CourseId, EmailCapture, Question, QuestionId, SessionStateError, ShareId, TestResult,
};
use quiz_core::time::fixed_now;
use quiz_core::{PerformanceTier, PostTestGate, SessionConfig, TickOutcome};
use services::{AnswerOutcome, Clock, QuestionRunner, SessionError, SessionLoopService};
use storage::repository::{
    EmailCaptureRepository, EmailCaptureRow, InMemoryRepository, QuestionBank, RowId,
    StorageError, TestResultRepository, TestResultRow,
};

fn question(id: &str, correct: usize, topic: &str) -> Question {
    Question::new(
        QuestionId::new(id),
        format!("Prompt {id}"),
        vec!["A".into(), "B".into(), "C".into(), "D".into()],
        correct,
        "Explanation",
        topic,
    )
    .unwrap()
}

async fn seeded_repo() -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    repo.replace_questions(
        &CourseId::new("acca"),
        &[question("q1", 0, "Audit"), question("q2", 1, "Tax")],
    )
    .await
    .unwrap();
    repo
}

fn loop_service(
    repo: &InMemoryRepository,
    gate: PostTestGate,
    captures: Arc<dyn EmailCaptureRepository>,
    results: Arc<dyn TestResultRepository>,
) -> SessionLoopService {
    SessionLoopService::new(
        Clock::fixed(fixed_now()),
        SessionConfig::default().with_post_test_gate(gate),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        captures,
        results,
    )
}

#[tokio::test]
async fn two_question_session_through_email_gate() {
    let repo = seeded_repo().await;
    let svc = loop_service(
        &repo,
        PostTestGate::EmailCapture,
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );

    let mut active = svc.start_session(&CourseId::new("acca")).await.unwrap();
    assert_eq!(active.progress().label(), "Question 1 of 2");
    assert_eq!(active.course().name(), "ACCA");

    let mut first = active.begin_question().unwrap();
    first.select_option(0).unwrap();
    first.submit().unwrap();
    let outcome = svc.record_answer(&mut active, &first).await.unwrap();
    assert_eq!(outcome, AnswerOutcome::Next { index: 1 });

    let mut second = active.begin_question().unwrap();
    assert!(matches!(second.elapse(90), TickOutcome::TimedOut(_)));
    let outcome = svc.record_answer(&mut active, &second).await.unwrap();
    assert_eq!(outcome, AnswerOutcome::AwaitingEmail);
    assert!(active.results_view().is_none());

    let report = active.report().unwrap();
    assert_eq!(report.score, 1);
    assert_eq!(report.percentage, 50);
    assert_eq!(report.tier, PerformanceTier::Fair);
    assert_eq!(report.weak_topics, vec!["Tax".to_string()]);

    let err = svc.submit_email(&mut active, "not-an-email").await.unwrap_err();
    assert!(matches!(err, SessionError::Capture(_)));
    assert!(active.is_awaiting_email());
    assert!(active.capture_id().is_none());

    let result_id = svc
        .submit_email(&mut active, "  Student@Example.com ")
        .await
        .unwrap();
    assert!(active.is_complete());

    let captures = repo.list_captures().await.unwrap();
    assert_eq!(captures.len(), 1);
    assert_eq!(captures[0].capture.percentage(), 50);
    assert_eq!(captures[0].capture.course_name(), "ACCA");

    let view = active.results_view().unwrap();
    let share_id = view.share_id.unwrap();
    let stored = repo.get_result_by_share_id(share_id).await.unwrap();
    assert_eq!(stored.answers()[1].selected_answer_index(), -1);
    assert_eq!(view.review.len(), 2);
    assert_eq!(svc.finalize_result(&mut active).await.unwrap(), result_id);
}

#[tokio::test]
async fn no_gate_completes_on_last_answer() {
    let repo = seeded_repo().await;
    let svc = loop_service(
        &repo,
        PostTestGate::None,
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    let mut active = svc.start_session(&CourseId::new("acca")).await.unwrap();

    for choice in [0, 1] {
        let mut interaction = active.begin_question().unwrap();
        interaction.select_option(choice).unwrap();
        interaction.submit().unwrap();
        svc.record_answer(&mut active, &interaction).await.unwrap();
    }

    assert!(active.is_complete());
    assert!(active.result_id().is_some());
    assert_eq!(active.results_view().unwrap().tier, PerformanceTier::Excellent);
    assert!(matches!(
        svc.submit_email(&mut active, "a@b.co").await,
        Err(SessionError::GateNotEmail)
    ));
    assert!(repo.list_captures().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_bank_is_not_available() {
    let repo = InMemoryRepository::new();
    let svc = loop_service(
        &repo,
        PostTestGate::EmailCapture,
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    let err = svc
        .start_session(&CourseId::new("nclex-rn"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::EmptyBank { .. }));
}

#[tokio::test]
async fn email_before_last_answer_is_refused() {
    let repo = seeded_repo().await;
    let svc = loop_service(
        &repo,
        PostTestGate::EmailCapture,
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    let mut active = svc.start_session(&CourseId::new("acca")).await.unwrap();
    let err = svc.submit_email(&mut active, "a@b.co").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::State(SessionStateError::NotAwaitingGate)
    ));
}

#[tokio::test]
async fn retake_starts_from_scratch() {
    let repo = seeded_repo().await;
    let svc = loop_service(
        &repo,
        PostTestGate::None,
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    let mut active = svc.start_session(&CourseId::new("acca")).await.unwrap();
    let mut interaction = active.begin_question().unwrap();
    interaction.select_option(2).unwrap();
    interaction.submit().unwrap();
    svc.record_answer(&mut active, &interaction).await.unwrap();

    let fresh = svc.retake(&active).await.unwrap();
    assert!(fresh.session().answers().is_empty());
    assert_eq!(fresh.session().score(), 0);
    assert_eq!(fresh.session().current_question_index(), 0);
    assert!(fresh.result_id().is_none());
}

#[tokio::test]
async fn shuffled_session_keeps_every_question() {
    let repo = seeded_repo().await;
    let svc = loop_service(
        &repo,
        PostTestGate::None,
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    )
    .with_shuffle_questions(true);
    let active = svc.start_session(&CourseId::new("acca")).await.unwrap();
    let mut ids: Vec<&str> = active
        .session()
        .questions()
        .iter()
        .map(|q| q.id().as_str())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, ["q1", "q2"]);
}

// ─── FAILING BACKENDS ───────────────────────────────────────────────────────

/// Fails the first `failures` writes, then delegates.
struct Flaky {
    inner: InMemoryRepository,
    failures: AtomicU32,
}

impl Flaky {
    fn new(inner: InMemoryRepository, failures: u32) -> Self {
        Self {
            inner,
            failures: AtomicU32::new(failures),
        }
    }

    fn should_fail(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl EmailCaptureRepository for Flaky {
    async fn append_capture(&self, capture: &EmailCapture) -> Result<RowId, StorageError> {
        if self.should_fail() {
            return Err(StorageError::Connection("offline".into()));
        }
        self.inner.append_capture(capture).await
    }

    async fn list_captures(&self) -> Result<Vec<EmailCaptureRow>, StorageError> {
        self.inner.list_captures().await
    }

    async fn list_captures_by_email(
        &self,
        email: &str,
    ) -> Result<Vec<EmailCaptureRow>, StorageError> {
        self.inner.list_captures_by_email(email).await
    }
}

#[async_trait]
impl TestResultRepository for Flaky {
    async fn append_result(&self, result: &TestResult) -> Result<RowId, StorageError> {
        if self.should_fail() {
            return Err(StorageError::Connection("offline".into()));
        }
        self.inner.append_result(result).await
    }

    async fn get_result_by_share_id(&self, share_id: ShareId) -> Result<TestResult, StorageError> {
        self.inner.get_result_by_share_id(share_id).await
    }

    async fn list_results(&self, limit: u32) -> Result<Vec<TestResultRow>, StorageError> {
        self.inner.list_results(limit).await
    }
}

async fn answer_all(svc: &SessionLoopService, active: &mut services::ActiveSession) {
    while let Some(mut interaction) = active.begin_question() {
        interaction.select_option(0).unwrap();
        interaction.submit().unwrap();
        svc.record_answer(active, &interaction).await.unwrap();
    }
}

#[tokio::test]
async fn capture_failure_is_retryable_without_losing_answers() {
    let repo = seeded_repo().await;
    let svc = loop_service(
        &repo,
        PostTestGate::EmailCapture,
        Arc::new(Flaky::new(repo.clone(), 1)),
        Arc::new(repo.clone()),
    );
    let mut active = svc.start_session(&CourseId::new("acca")).await.unwrap();
    answer_all(&svc, &mut active).await;

    let err = svc.submit_email(&mut active, "a@example.com").await.unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));
    assert!(active.is_awaiting_email());
    assert_eq!(active.session().answers().len(), 2);

    svc.submit_email(&mut active, "a@example.com").await.unwrap();
    assert!(active.is_complete());
    assert_eq!(repo.list_captures().await.unwrap().len(), 1);
}

#[tokio::test]
async fn result_failure_does_not_duplicate_the_capture() {
    let repo = seeded_repo().await;
    let svc = loop_service(
        &repo,
        PostTestGate::EmailCapture,
        Arc::new(repo.clone()),
        Arc::new(Flaky::new(repo.clone(), 1)),
    );
    let mut active = svc.start_session(&CourseId::new("acca")).await.unwrap();
    answer_all(&svc, &mut active).await;

    assert!(svc.submit_email(&mut active, "a@example.com").await.is_err());
    let share_id = active.result().unwrap().share_id();

    svc.submit_email(&mut active, "a@example.com").await.unwrap();
    assert_eq!(repo.list_captures().await.unwrap().len(), 1);
    assert_eq!(active.result().unwrap().share_id(), share_id);
    assert_eq!(repo.list_results(10).await.unwrap().len(), 1);
}

// ─── TIMER ──────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn unanswered_question_auto_submits_when_time_runs_out() {
    let repo = InMemoryRepository::new();
    repo.replace_questions(&CourseId::new("teas"), &[question("only", 2, "Math")])
        .await
        .unwrap();
    let svc = loop_service(
        &repo,
        PostTestGate::None,
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    let mut active = svc.start_session(&CourseId::new("teas")).await.unwrap();
    assert_eq!(active.course().name(), "TEAS");

    let mut runner = QuestionRunner::start(active.begin_question().unwrap());
    let reveal = loop {
        let tick = runner.next_tick().await.unwrap();
        if let TickOutcome::TimedOut(reveal) = runner.apply_tick(&tick) {
            break reveal;
        }
    };
    assert!(reveal.timed_out);
    assert_eq!(reveal.correct_index, 2);
    assert!(!runner.is_timer_running());

    let interaction = runner.into_interaction();
    let outcome = svc.record_answer(&mut active, &interaction).await.unwrap();
    assert!(matches!(outcome, AnswerOutcome::Completed { .. }));

    let view = active.results_view().unwrap();
    assert_eq!(view.score, 0);
    assert_eq!(view.percentage, 0);
    assert_eq!(view.tier, PerformanceTier::NeedsImprovement);
    assert_eq!(view.review[0].selected, None);
}
