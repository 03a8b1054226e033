use thiserror::Error;

use crate::model::answer::Answer;
use crate::model::ids::{CourseId, QuestionId};
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("no questions available for course {course_id}")]
    EmptyBank { course_id: CourseId },

    #[error("too many questions for a single session: {len}")]
    TooManyQuestions { len: usize },

    #[error("answer for {got} submitted while {expected} is current")]
    OutOfOrder { expected: QuestionId, got: QuestionId },

    #[error("all questions have already been answered")]
    NotAnswering,

    #[error("session is not waiting for completion")]
    NotAwaitingGate,
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Questions are still being answered.
    Answering,
    /// Every question is answered; the post-test gate has not finished yet.
    AwaitingGate,
    /// Terminal. Results may be shown.
    Completed,
}

/// What happened to the session after an answer was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAdvance {
    /// Moved on to the question at `index`.
    Next { index: usize },
    /// That was the last question.
    AwaitingGate,
}

/// One attempt at a course's fixed question set.
///
/// Mutated only through `submit_answer` and `finalize_completion`; a retake
/// replaces the whole value via `reset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSession {
    course_id: CourseId,
    questions: Vec<Question>,
    current_question_index: usize,
    answers: Vec<Answer>,
    score: u32,
    phase: SessionPhase,
}

impl TestSession {
    /// Start a session over `questions`.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::EmptyBank` when `questions` is empty, which
    /// callers present as "test not available".
    pub fn initialize(
        course_id: CourseId,
        questions: Vec<Question>,
    ) -> Result<Self, SessionStateError> {
        if questions.is_empty() {
            return Err(SessionStateError::EmptyBank { course_id });
        }
        if u32::try_from(questions.len()).is_err() {
            return Err(SessionStateError::TooManyQuestions {
                len: questions.len(),
            });
        }

        Ok(Self {
            course_id,
            questions,
            current_question_index: 0,
            answers: Vec::new(),
            score: 0,
            phase: SessionPhase::Answering,
        })
    }

    /// Retake: a brand new session, nothing carried over from `self`.
    ///
    /// # Errors
    ///
    /// Same as [`TestSession::initialize`].
    pub fn reset(
        course_id: CourseId,
        questions: Vec<Question>,
    ) -> Result<Self, SessionStateError> {
        Self::initialize(course_id, questions)
    }

    /// Record the answer for the current question and move forward.
    ///
    /// A mismatched question id is a caller bug. Debug builds panic; release
    /// builds refuse the answer and leave the session unchanged.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::NotAnswering` once every question has an
    /// answer, and `SessionStateError::OutOfOrder` for a stale submission.
    pub fn submit_answer(&mut self, answer: Answer) -> Result<SessionAdvance, SessionStateError> {
        if self.phase != SessionPhase::Answering {
            return Err(SessionStateError::NotAnswering);
        }
        let Some(current) = self.current_question() else {
            return Err(SessionStateError::NotAnswering);
        };
        if current.id() != answer.question_id() {
            debug_assert!(
                false,
                "answer for {} submitted while {} is current",
                answer.question_id(),
                current.id()
            );
            return Err(SessionStateError::OutOfOrder {
                expected: current.id().clone(),
                got: answer.question_id().clone(),
            });
        }

        if answer.correct() {
            self.score += 1;
        }
        self.answers.push(answer);

        if self.answers.len() == self.questions.len() {
            self.phase = SessionPhase::AwaitingGate;
            Ok(SessionAdvance::AwaitingGate)
        } else {
            self.current_question_index += 1;
            Ok(SessionAdvance::Next {
                index: self.current_question_index,
            })
        }
    }

    /// Mark the session complete after the post-test gate (if any) succeeds.
    ///
    /// Calling it again on a completed session is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::NotAwaitingGate` while questions remain.
    pub fn finalize_completion(&mut self) -> Result<(), SessionStateError> {
        match self.phase {
            SessionPhase::Answering => Err(SessionStateError::NotAwaitingGate),
            SessionPhase::AwaitingGate | SessionPhase::Completed => {
                self.phase = SessionPhase::Completed;
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// The question awaiting an answer, if any.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase == SessionPhase::Answering {
            self.questions.get(self.current_question_index)
        } else {
            None
        }
    }

    #[must_use]
    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        // checked in `initialize`
        u32::try_from(self.questions.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_awaiting_gate(&self) -> bool {
        self.phase == SessionPhase::AwaitingGate
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    /// True once every question has an answer, gate or not.
    #[must_use]
    pub fn all_answered(&self) -> bool {
        self.answers.len() == self.questions.len()
    }
}
