use quiz_core::model::{Answer, QuestionId};
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn usize_from_i64(field: &'static str, v: i64) -> Result<usize, StorageError> {
    usize::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn i64_from_usize(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

/// JSON shape of one answer in `test_results.answers`.
///
/// `selected_answer` keeps the `-1` sentinel for "no answer".
#[derive(Debug, Serialize, Deserialize)]
struct StoredAnswer {
    question_id: String,
    selected_answer: i64,
    correct: bool,
}

pub(crate) fn answers_to_json(answers: &[Answer]) -> Result<String, StorageError> {
    let stored: Vec<StoredAnswer> = answers
        .iter()
        .map(|a| StoredAnswer {
            question_id: a.question_id().as_str().to_owned(),
            selected_answer: a.selected_answer_index(),
            correct: a.correct(),
        })
        .collect();
    serde_json::to_string(&stored).map_err(ser)
}

pub(crate) fn answers_from_json(raw: &str) -> Result<Vec<Answer>, StorageError> {
    let stored: Vec<StoredAnswer> = serde_json::from_str(raw).map_err(ser)?;
    Ok(stored
        .into_iter()
        .map(|a| Answer::from_sentinel(QuestionId::new(a.question_id), a.selected_answer, a.correct))
        .collect())
}

pub(crate) fn options_to_json(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

pub(crate) fn options_from_json(raw: &str) -> Result<Vec<String>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}
