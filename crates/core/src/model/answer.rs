use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::question::Question;

/// Persisted/displayed value for "no option chosen" (timeout without a selection).
pub const NO_ANSWER: i64 = -1;

/// The finalized decision for one question. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    question_id: QuestionId,
    selected: Option<usize>,
    correct: bool,
}

impl Answer {
    /// Grade `selected` against `question`.
    #[must_use]
    pub fn grade(question: &Question, selected: Option<usize>) -> Self {
        Self {
            question_id: question.id().clone(),
            selected,
            correct: question.is_correct(selected),
        }
    }

    /// Rebuild an answer whose correctness was already decided elsewhere
    /// (the interaction unit, or a stored record).
    #[must_use]
    pub fn from_parts(question_id: QuestionId, selected: Option<usize>, correct: bool) -> Self {
        Self {
            question_id,
            selected,
            correct: correct && selected.is_some(),
        }
    }

    /// Decode the `-1` sentinel form used by storage.
    #[must_use]
    pub fn from_sentinel(question_id: QuestionId, selected_answer_index: i64, correct: bool) -> Self {
        let selected = usize::try_from(selected_answer_index).ok();
        Self::from_parts(question_id, selected, correct)
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Selected index with `NO_ANSWER` standing in for "nothing chosen".
    #[must_use]
    pub fn selected_answer_index(&self) -> i64 {
        self.selected
            .and_then(|i| i64::try_from(i).ok())
            .unwrap_or(NO_ANSWER)
    }

    #[must_use]
    pub fn correct(&self) -> bool {
        self.correct
    }

    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.selected.is_none()
    }
}
