use chrono::{DateTime, Utc};

use quiz_core::model::{Course, CourseId, Question, TestResult, TestSession};
use quiz_core::{QuestionInteraction, ResultsReport, SessionConfig};
use storage::repository::RowId;

use super::progress::SessionProgress;
use super::view::ResultsView;

/// A running test: the session controller plus everything the services layer
/// tracks around it.
///
/// Persistence ids are recorded here so that retries never write twice.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub(crate) course: Course,
    pub(crate) session: TestSession,
    pub(crate) config: SessionConfig,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) completed_at: Option<DateTime<Utc>>,
    pub(crate) capture_id: Option<RowId>,
    pub(crate) result: Option<TestResult>,
    pub(crate) result_id: Option<RowId>,
}

impl ActiveSession {
    pub(crate) fn new(
        course: Course,
        session: TestSession,
        config: SessionConfig,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            course,
            session,
            config,
            started_at,
            completed_at: None,
            capture_id: None,
            result: None,
            result_id: None,
        }
    }

    #[must_use]
    pub fn course(&self) -> &Course {
        &self.course
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        self.session.course_id()
    }

    #[must_use]
    pub fn session(&self) -> &TestSession {
        &self.session
    }

    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn capture_id(&self) -> Option<RowId> {
        self.capture_id
    }

    #[must_use]
    pub fn result_id(&self) -> Option<RowId> {
        self.result_id
    }

    /// The result record built at completion, persisted or not.
    #[must_use]
    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.current_question()
    }

    /// Interaction state for the current question, with the configured time
    /// limit. `None` once every question is answered.
    #[must_use]
    pub fn begin_question(&self) -> Option<QuestionInteraction> {
        self.current_question()
            .map(|q| QuestionInteraction::new(q.clone(), self.config.time_limit_secs()))
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress::from_session(&self.session)
    }

    /// Score summary; available from the post-test gate onward.
    #[must_use]
    pub fn report(&self) -> Option<ResultsReport> {
        ResultsReport::from_session(&self.session)
    }

    /// Full results screen; only once the session is completed.
    #[must_use]
    pub fn results_view(&self) -> Option<ResultsView> {
        if !self.session.completed() {
            return None;
        }
        let share_id = self.result.as_ref().map(TestResult::share_id);
        ResultsView::build(&self.course, &self.session, share_id)
    }

    #[must_use]
    pub fn is_awaiting_email(&self) -> bool {
        self.session.is_awaiting_gate()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.session.completed()
    }
}
