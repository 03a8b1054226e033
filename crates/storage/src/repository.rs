use async_trait::async_trait;
use quiz_core::model::{Course, CourseId, EmailCapture, Question, ShareId, TestResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Storage row identifier (`SQLite` rowid).
pub type RowId = i64;

/// A stored email capture with its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCaptureRow {
    pub id: RowId,
    pub capture: EmailCapture,
}

/// A stored test result with its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResultRow {
    pub id: RowId,
    pub result: TestResult,
}

/// Course catalog.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist or update a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Fetch a course by ID; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError>;

    /// All courses ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;
}

/// Ordered question sets per course.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Replace the full question set of a course, keeping the given order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the questions cannot be stored.
    async fn replace_questions(
        &self,
        course_id: &CourseId,
        questions: &[Question],
    ) -> Result<(), StorageError>;

    /// Questions for a course in their stored order. Empty when the course has
    /// none (or is unknown).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn questions_for_course(&self, course_id: &CourseId)
    -> Result<Vec<Question>, StorageError>;
}

/// Email captures from the post-test gate.
#[async_trait]
pub trait EmailCaptureRepository: Send + Sync {
    /// Append a capture and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the capture cannot be stored.
    async fn append_capture(&self, capture: &EmailCapture) -> Result<RowId, StorageError>;

    /// All captures, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_captures(&self) -> Result<Vec<EmailCaptureRow>, StorageError>;

    /// Captures for one address, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_captures_by_email(
        &self,
        email: &str,
    ) -> Result<Vec<EmailCaptureRow>, StorageError>;
}

/// Historical results of completed sessions.
#[async_trait]
pub trait TestResultRepository: Send + Sync {
    /// Append a result and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the share id is already taken.
    async fn append_result(&self, result: &TestResult) -> Result<RowId, StorageError>;

    /// Look up a result by its public share id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no result has this share id.
    async fn get_result_by_share_id(&self, share_id: ShareId) -> Result<TestResult, StorageError>;

    /// Most recent results first, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_results(&self, limit: u32) -> Result<Vec<TestResultRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
    questions: Arc<Mutex<HashMap<CourseId, Vec<Question>>>>,
    captures: Arc<Mutex<Vec<EmailCaptureRow>>>,
    results: Arc<Mutex<Vec<TestResultRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn next_row_id(len: usize) -> Result<RowId, StorageError> {
    RowId::try_from(len + 1).map_err(|_| StorageError::Serialization("row id overflow".into()))
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = self.courses.lock().map_err(poisoned)?;
        guard.insert(course.id().clone(), course.clone());
        Ok(())
    }

    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        let mut courses: Vec<Course> = guard.values().cloned().collect();
        courses.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(courses)
    }
}

#[async_trait]
impl QuestionBank for InMemoryRepository {
    async fn replace_questions(
        &self,
        course_id: &CourseId,
        questions: &[Question],
    ) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        guard.insert(course_id.clone(), questions.to_vec());
        Ok(())
    }

    async fn questions_for_course(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.get(course_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl EmailCaptureRepository for InMemoryRepository {
    async fn append_capture(&self, capture: &EmailCapture) -> Result<RowId, StorageError> {
        let mut guard = self.captures.lock().map_err(poisoned)?;
        let id = next_row_id(guard.len())?;
        guard.push(EmailCaptureRow {
            id,
            capture: capture.clone(),
        });
        Ok(id)
    }

    async fn list_captures(&self) -> Result<Vec<EmailCaptureRow>, StorageError> {
        let guard = self.captures.lock().map_err(poisoned)?;
        Ok(guard.iter().rev().cloned().collect())
    }

    async fn list_captures_by_email(
        &self,
        email: &str,
    ) -> Result<Vec<EmailCaptureRow>, StorageError> {
        let guard = self.captures.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .rev()
            .filter(|row| row.capture.email().eq_ignore_ascii_case(email))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TestResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &TestResult) -> Result<RowId, StorageError> {
        let mut guard = self.results.lock().map_err(poisoned)?;
        if guard
            .iter()
            .any(|row| row.result.share_id() == result.share_id())
        {
            return Err(StorageError::Conflict);
        }
        let id = next_row_id(guard.len())?;
        guard.push(TestResultRow {
            id,
            result: result.clone(),
        });
        Ok(id)
    }

    async fn get_result_by_share_id(&self, share_id: ShareId) -> Result<TestResult, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        guard
            .iter()
            .find(|row| row.result.share_id() == share_id)
            .map(|row| row.result.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_results(&self, limit: u32) -> Result<Vec<TestResultRow>, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub questions: Arc<dyn QuestionBank>,
    pub captures: Arc<dyn EmailCaptureRepository>,
    pub results: Arc<dyn TestResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            courses: Arc::new(repo.clone()),
            questions: Arc::new(repo.clone()),
            captures: Arc::new(repo.clone()),
            results: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Answer, EmailCaptureDraft, QuestionId, TestSession};
    use quiz_core::time::fixed_now;

    fn question(id: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            "Prompt",
            vec!["A".into(), "B".into()],
            0,
            "",
            "Topic",
        )
        .unwrap()
    }

    fn finished_result() -> TestResult {
        let q = question("q1");
        let mut session = TestSession::initialize(CourseId::new("acca"), vec![q.clone()]).unwrap();
        session.submit_answer(Answer::grade(&q, Some(0))).unwrap();
        session.finalize_completion().unwrap();
        TestResult::from_session(&session, fixed_now()).unwrap()
    }

    #[tokio::test]
    async fn question_order_is_preserved() {
        let repo = InMemoryRepository::new();
        let course = CourseId::new("acca");
        let questions = vec![question("q2"), question("q1"), question("q3")];
        repo.replace_questions(&course, &questions).await.unwrap();

        let fetched = repo.questions_for_course(&course).await.unwrap();
        let ids: Vec<&str> = fetched.iter().map(|q| q.id().as_str()).collect();
        assert_eq!(ids, ["q2", "q1", "q3"]);
    }

    #[tokio::test]
    async fn unknown_course_has_empty_bank() {
        let repo = InMemoryRepository::new();
        let fetched = repo
            .questions_for_course(&CourseId::new("missing"))
            .await
            .unwrap();
        assert!(fetched.is_empty());
    }

    #[tokio::test]
    async fn captures_list_newest_first() {
        let repo = InMemoryRepository::new();
        for email in ["a@example.com", "b@example.com"] {
            let capture = EmailCaptureDraft {
                course_id: CourseId::new("acca"),
                course_name: "ACCA".into(),
                email: email.into(),
                score: 1,
                total_questions: 2,
            }
            .validate(fixed_now())
            .unwrap();
            repo.append_capture(&capture).await.unwrap();
        }

        let rows = repo.list_captures().await.unwrap();
        assert_eq!(rows[0].capture.email(), "b@example.com");
        assert_eq!(rows[1].id, 1);

        let by_email = repo.list_captures_by_email("A@example.com").await.unwrap();
        assert_eq!(by_email.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_share_id_conflicts() {
        let repo = InMemoryRepository::new();
        let result = finished_result();
        repo.append_result(&result).await.unwrap();
        let err = repo.append_result(&result).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        let fetched = repo.get_result_by_share_id(result.share_id()).await.unwrap();
        assert_eq!(fetched, result);
    }
}
