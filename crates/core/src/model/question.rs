use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question topic cannot be empty")]
    EmptyTopic,

    #[error("a question needs at least two options, got {count}")]
    TooFewOptions { count: usize },

    #[error("correct answer index {index} is outside 0..{len}")]
    CorrectIndexOutOfRange { index: usize, len: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_answer_index: usize,
    explanation: String,
    topic: String,
}

impl Question {
    /// Build a question, checking option count and the correct index.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt or topic is blank, fewer than two
    /// options are given, or the correct index does not point at an option.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer_index: usize,
        explanation: impl Into<String>,
        topic: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        let topic = topic.into();

        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if topic.trim().is_empty() {
            return Err(QuestionError::EmptyTopic);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                count: options.len(),
            });
        }
        if correct_answer_index >= options.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: correct_answer_index,
                len: options.len(),
            });
        }

        Ok(Self {
            id,
            prompt,
            options,
            correct_answer_index,
            explanation: explanation.into(),
            topic: topic.trim().to_owned(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct_answer_index(&self) -> usize {
        self.correct_answer_index
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Whether `selected` matches the correct option. `None` is never correct.
    #[must_use]
    pub fn is_correct(&self, selected: Option<usize>) -> bool {
        selected == Some(self.correct_answer_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Option {i}")).collect()
    }

    #[test]
    fn rejects_single_option() {
        let err = Question::new(QuestionId::new("q"), "Prompt", options(1), 0, "", "Topic")
            .unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions { count: 1 });
    }

    #[test]
    fn rejects_correct_index_past_options() {
        let err = Question::new(QuestionId::new("q"), "Prompt", options(4), 4, "", "Topic")
            .unwrap_err();
        assert_eq!(err, QuestionError::CorrectIndexOutOfRange { index: 4, len: 4 });
    }

    #[test]
    fn unanswered_is_never_correct() {
        let q = Question::new(QuestionId::new("q"), "Prompt", options(3), 0, "", "Topic").unwrap();
        assert!(!q.is_correct(None));
        assert!(q.is_correct(Some(0)));
        assert!(!q.is_correct(Some(2)));
    }
}
