use std::sync::Arc;

use rand::seq::SliceRandom;

use quiz_core::model::{
    Course, CourseId, EmailCaptureDraft, Question, SessionAdvance, SessionStateError,
    TestResult, TestSession,
};
use quiz_core::{PostTestGate, QuestionInteraction, SessionConfig};
use storage::repository::{
    CourseRepository, EmailCaptureRepository, QuestionBank, RowId, TestResultRepository,
};

use super::active::ActiveSession;
use crate::Clock;
use crate::error::SessionError;

/// What happened after recording an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Another question is up at this index.
    Next { index: usize },
    /// All questions answered; the email gate is waiting.
    AwaitingEmail,
    /// Session completed and its result persisted under this id.
    Completed { result_id: RowId },
}

/// Orchestrates session start, answering, the post-test gate and persistence.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    config: SessionConfig,
    courses: Arc<dyn CourseRepository>,
    questions: Arc<dyn QuestionBank>,
    captures: Arc<dyn EmailCaptureRepository>,
    results: Arc<dyn TestResultRepository>,
    shuffle_questions: bool,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        config: SessionConfig,
        courses: Arc<dyn CourseRepository>,
        questions: Arc<dyn QuestionBank>,
        captures: Arc<dyn EmailCaptureRepository>,
        results: Arc<dyn TestResultRepository>,
    ) -> Self {
        Self {
            clock,
            config,
            courses,
            questions,
            captures,
            results,
            shuffle_questions: false,
        }
    }

    #[must_use]
    pub fn with_shuffle_questions(mut self, shuffle_questions: bool) -> Self {
        self.shuffle_questions = shuffle_questions;
        self
    }

    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Course details, or a placeholder named after the id when the catalog
    /// does not list it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on backend failures.
    pub async fn course(&self, course_id: &CourseId) -> Result<Course, SessionError> {
        Ok(self
            .courses
            .get_course(course_id)
            .await?
            .unwrap_or_else(|| Course::placeholder(course_id)))
    }

    /// All courses in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on backend failures.
    pub async fn list_courses(&self) -> Result<Vec<Course>, SessionError> {
        Ok(self.courses.list_courses().await?)
    }

    /// Start a new session for the given course.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyBank` when the course has no questions and
    /// `SessionError::Storage` for backend failures.
    pub async fn start_session(&self, course_id: &CourseId) -> Result<ActiveSession, SessionError> {
        let course = self.course(course_id).await?;
        let questions = self.load_questions(course_id).await?;
        let session = TestSession::initialize(course_id.clone(), questions).map_err(empty_bank)?;
        log::info!(
            "started session for {course_id} with {} questions",
            session.total_questions()
        );
        Ok(ActiveSession::new(
            course,
            session,
            self.config,
            self.clock.now(),
        ))
    }

    /// Retake: a brand new session for the same course. Nothing from
    /// `previous` is carried over.
    ///
    /// # Errors
    ///
    /// Same as [`SessionLoopService::start_session`].
    pub async fn retake(&self, previous: &ActiveSession) -> Result<ActiveSession, SessionError> {
        let course_id = previous.course_id().clone();
        let questions = self.load_questions(&course_id).await?;
        let session = TestSession::reset(course_id.clone(), questions).map_err(empty_bank)?;
        log::info!("retake for {course_id}");
        Ok(ActiveSession::new(
            previous.course.clone(),
            session,
            self.config,
            self.clock.now(),
        ))
    }

    /// Record the submitted interaction's answer and move the session on.
    ///
    /// With no post-test gate the session completes immediately and its
    /// result is persisted. If that write fails the session stays completed
    /// in memory and [`SessionLoopService::finalize_result`] retries it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Interaction` if the interaction is still
    /// answering, `SessionError::State` for a stale or extra answer, and
    /// `SessionError::Storage` when persisting the result fails.
    pub async fn record_answer(
        &self,
        active: &mut ActiveSession,
        interaction: &QuestionInteraction,
    ) -> Result<AnswerOutcome, SessionError> {
        let answer = interaction.advance()?;
        log::debug!(
            "answer for {}: selected={} correct={}",
            answer.question_id(),
            answer.selected_answer_index(),
            answer.correct()
        );

        match active.session.submit_answer(answer)? {
            SessionAdvance::Next { index } => Ok(AnswerOutcome::Next { index }),
            SessionAdvance::AwaitingGate => match active.config.post_test_gate() {
                PostTestGate::EmailCapture => {
                    log::info!("{} waiting for email capture", active.course_id());
                    Ok(AnswerOutcome::AwaitingEmail)
                }
                PostTestGate::None => {
                    let result_id = self.complete(active).await?;
                    Ok(AnswerOutcome::Completed { result_id })
                }
            },
        }
    }

    /// Submit the email gate: validate, store the capture once, complete the
    /// session and persist its result.
    ///
    /// Safe to call again after a failure: validation errors leave everything
    /// untouched, and ids already written are reused.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::GateNotEmail` when the session has no email
    /// gate, `SessionError::State` while questions remain,
    /// `SessionError::Capture` for an invalid email and
    /// `SessionError::Storage` when a write fails.
    pub async fn submit_email(
        &self,
        active: &mut ActiveSession,
        email: &str,
    ) -> Result<RowId, SessionError> {
        if active.config.post_test_gate() != PostTestGate::EmailCapture {
            return Err(SessionError::GateNotEmail);
        }
        if !active.session.all_answered() {
            return Err(SessionError::State(SessionStateError::NotAwaitingGate));
        }

        if active.capture_id.is_none() {
            let capture = EmailCaptureDraft {
                course_id: active.course_id().clone(),
                course_name: active.course.name().to_owned(),
                email: email.to_owned(),
                score: active.session.score(),
                total_questions: active.session.total_questions(),
            }
            .validate(self.clock.now())?;

            let id = self.captures.append_capture(&capture).await.map_err(|e| {
                log::warn!("email capture for {} failed: {e}", active.course_id());
                e
            })?;
            log::info!("captured email for {} as #{id}", active.course_id());
            active.capture_id = Some(id);
        }

        self.complete(active).await
    }

    /// Retry result persistence after a completed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::State` if the session is not complete and
    /// `SessionError::Storage` if persistence fails.
    pub async fn finalize_result(&self, active: &mut ActiveSession) -> Result<RowId, SessionError> {
        if let Some(id) = active.result_id {
            return Ok(id);
        }
        if !active.session.completed() {
            return Err(SessionError::State(SessionStateError::NotAwaitingGate));
        }
        self.persist_result(active).await
    }

    async fn complete(&self, active: &mut ActiveSession) -> Result<RowId, SessionError> {
        active.session.finalize_completion()?;
        if active.completed_at.is_none() {
            active.completed_at = Some(self.clock.now());
        }
        self.persist_result(active).await
    }

    async fn persist_result(&self, active: &mut ActiveSession) -> Result<RowId, SessionError> {
        if let Some(id) = active.result_id {
            return Ok(id);
        }
        let completed_at = active.completed_at.unwrap_or_else(|| self.clock.now());
        // Built once so a retry keeps the same share id.
        let result = match active.result.take() {
            Some(result) => result,
            None => TestResult::from_session(&active.session, completed_at)?,
        };
        let stored = self.results.append_result(&result).await;
        active.result = Some(result);
        let id = stored.map_err(|e| {
            log::warn!("saving result for {} failed: {e}", active.course_id());
            e
        })?;
        log::info!(
            "session for {} completed: {}/{} in {}s",
            active.course_id(),
            active.session.score(),
            active.session.total_questions(),
            self.clock.seconds_since(active.started_at)
        );
        active.result_id = Some(id);
        Ok(id)
    }

    async fn load_questions(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<Question>, SessionError> {
        let mut questions = self.questions.questions_for_course(course_id).await?;
        if self.shuffle_questions {
            questions.shuffle(&mut rand::rng());
        }
        Ok(questions)
    }
}

fn empty_bank(err: SessionStateError) -> SessionError {
    match err {
        SessionStateError::EmptyBank { course_id } => {
            log::warn!("no questions for {course_id}");
            SessionError::EmptyBank { course_id }
        }
        other => SessionError::State(other),
    }
}
