//! Bundled sample catalog used by the `seed` binary and tests.

use quiz_core::model::{Course, CourseError, CourseId, Question, QuestionError, QuestionId};
use serde::Deserialize;
use thiserror::Error;

use crate::repository::{Storage, StorageError};

const SAMPLE_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error("question {id}: {source}")]
    Question {
        id: String,
        #[source]
        source: QuestionError,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    courses: Vec<CourseEntry>,
}

#[derive(Debug, Deserialize)]
struct CourseEntry {
    id: String,
    name: String,
    description: String,
    study_plan_url: Option<String>,
    #[serde(default)]
    questions: Vec<QuestionEntry>,
}

#[derive(Debug, Deserialize)]
struct QuestionEntry {
    id: String,
    prompt: String,
    options: Vec<String>,
    correct_answer_index: usize,
    explanation: String,
    topic: String,
}

/// A course together with its ordered question set.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub course: Course,
    pub questions: Vec<Question>,
}

/// Parse a catalog document.
///
/// # Errors
///
/// Returns `CatalogError` for malformed JSON or entries that fail validation.
pub fn parse_catalog(json: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
    let file: CatalogFile = serde_json::from_str(json)?;
    file.courses
        .into_iter()
        .map(|entry| {
            let course_id = CourseId::new(entry.id);
            let course = Course::new(
                course_id,
                entry.name,
                entry.description,
                entry.study_plan_url.as_deref(),
            )?;
            let questions = entry
                .questions
                .into_iter()
                .map(|q| {
                    let id = q.id.clone();
                    Question::new(
                        QuestionId::new(q.id),
                        q.prompt,
                        q.options,
                        q.correct_answer_index,
                        q.explanation,
                        q.topic,
                    )
                    .map_err(|source| CatalogError::Question { id, source })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CatalogEntry { course, questions })
        })
        .collect()
}

/// The catalog shipped with the crate.
///
/// # Errors
///
/// Returns `CatalogError` if the bundled file fails to parse.
pub fn sample_catalog() -> Result<Vec<CatalogEntry>, CatalogError> {
    parse_catalog(SAMPLE_CATALOG)
}

/// Write every course and its questions into `storage`. Returns the number of
/// courses loaded.
///
/// # Errors
///
/// Returns `CatalogError::Storage` if a write fails.
pub async fn load_into(
    storage: &Storage,
    entries: &[CatalogEntry],
) -> Result<usize, CatalogError> {
    for entry in entries {
        storage.courses.upsert_course(&entry.course).await?;
        storage
            .questions
            .replace_questions(entry.course.id(), &entry.questions)
            .await?;
        log::debug!(
            "loaded course {} with {} questions",
            entry.course.id(),
            entry.questions.len()
        );
    }
    Ok(entries.len())
}
