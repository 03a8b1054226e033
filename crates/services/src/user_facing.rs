//! One-line messages and a single recovery action for errors shown to a
//! test taker or an administrator.

use quiz_core::InteractionError;
use quiz_core::model::{CaptureError, SessionStateError};

use crate::error::{AdminError, SessionError};

/// What the user can do next after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Go back to the course list.
    ReturnHome,
    /// Try the same action again; nothing was lost.
    Retry,
    /// Correct the input and resubmit.
    EditInput,
    /// Supply valid credentials.
    Authenticate,
}

impl Recovery {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Recovery::ReturnHome => "Back to courses",
            Recovery::Retry => "Try again",
            Recovery::EditInput => "Fix and resubmit",
            Recovery::Authenticate => "Check the admin key",
        }
    }
}

pub trait UserFacing {
    fn user_message(&self) -> String;
    fn recovery(&self) -> Recovery;
}

impl UserFacing for SessionError {
    fn user_message(&self) -> String {
        match self {
            SessionError::EmptyBank { .. } => NOT_AVAILABLE.into(),
            SessionError::GateNotEmail => "This test does not ask for an email.".into(),
            SessionError::State(e) => state_message(e).into(),
            SessionError::Interaction(e) => interaction_message(e).into(),
            SessionError::Capture(e) => capture_message(e).into(),
            SessionError::TestResult(_) => {
                "Your results could not be recorded. Please take the test again.".into()
            }
            SessionError::Storage(_) => {
                "We could not save your results. Your answers are kept, please retry.".into()
            }
        }
    }

    fn recovery(&self) -> Recovery {
        match self {
            SessionError::Capture(CaptureError::EmptyEmail | CaptureError::InvalidEmail(_))
            | SessionError::Interaction(
                InteractionError::NothingSelected | InteractionError::OptionOutOfRange { .. },
            ) => Recovery::EditInput,
            SessionError::Storage(_) => Recovery::Retry,
            SessionError::EmptyBank { .. }
            | SessionError::GateNotEmail
            | SessionError::State(_)
            | SessionError::Interaction(_)
            | SessionError::Capture(_)
            | SessionError::TestResult(_) => Recovery::ReturnHome,
        }
    }
}

const NOT_AVAILABLE: &str = "This test is not available yet. Please pick another course.";

fn state_message(e: &SessionStateError) -> &'static str {
    match e {
        SessionStateError::EmptyBank { .. } => NOT_AVAILABLE,
        SessionStateError::TooManyQuestions { .. } => "This test is too large to run.",
        SessionStateError::OutOfOrder { .. } => {
            "That answer belongs to another question. Please answer the one shown."
        }
        SessionStateError::NotAnswering => "Every question has already been answered.",
        SessionStateError::NotAwaitingGate => "Finish every question first.",
        _ => "This test cannot continue from here.",
    }
}

fn interaction_message(e: &InteractionError) -> &'static str {
    match e {
        InteractionError::AlreadySubmitted => "That question has already been answered.",
        InteractionError::NotSubmitted => "Submit an answer before moving on.",
        InteractionError::NothingSelected => "Pick an option first, or wait for the timer.",
        InteractionError::OptionOutOfRange { .. } => "That option is not on the list.",
        _ => "That answer could not be recorded.",
    }
}

fn capture_message(e: &CaptureError) -> &'static str {
    match e {
        CaptureError::EmptyEmail => "Please enter your email.",
        CaptureError::InvalidEmail(_) => "That email address does not look right.",
        CaptureError::EmptyCourseName
        | CaptureError::NoQuestions
        | CaptureError::ScoreExceedsTotal { .. } => {
            "Your score could not be prepared for sending."
        }
        _ => "Your email could not be saved.",
    }
}

impl UserFacing for AdminError {
    fn user_message(&self) -> String {
        match self {
            AdminError::NotConfigured => "Admin access is disabled on this installation.".into(),
            AdminError::Unauthorized => "Access denied.".into(),
            AdminError::UnknownFormat(raw) => format!("Unknown export format '{raw}'."),
            AdminError::Json(_) | AdminError::Csv(_) | AdminError::Storage(_) => {
                "Export failed, please try again.".into()
            }
        }
    }

    fn recovery(&self) -> Recovery {
        match self {
            AdminError::NotConfigured => Recovery::ReturnHome,
            AdminError::Unauthorized => Recovery::Authenticate,
            AdminError::UnknownFormat(_) => Recovery::EditInput,
            AdminError::Json(_) | AdminError::Csv(_) | AdminError::Storage(_) => {
                Recovery::Retry
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{CourseId, QuestionId, TestResultError};
    use storage::repository::StorageError;

    #[test]
    fn empty_bank_sends_user_home() {
        let err = SessionError::EmptyBank {
            course_id: CourseId::new("nclex-rn"),
        };
        assert_eq!(err.recovery(), Recovery::ReturnHome);
        assert!(err.user_message().contains("not available"));
    }

    #[test]
    fn storage_failures_are_retryable() {
        let err = SessionError::Storage(StorageError::Connection("down".into()));
        assert_eq!(err.recovery(), Recovery::Retry);
    }

    #[test]
    fn bad_email_asks_for_new_input() {
        let err = SessionError::Capture(CaptureError::InvalidEmail("x".into()));
        assert_eq!(err.recovery(), Recovery::EditInput);
        assert_eq!(AdminError::Unauthorized.recovery(), Recovery::Authenticate);
    }

    #[test]
    fn no_message_leaks_the_internal_error_text() {
        let errors = vec![
            SessionError::EmptyBank {
                course_id: CourseId::new("nclex-rn"),
            },
            SessionError::GateNotEmail,
            SessionError::State(SessionStateError::EmptyBank {
                course_id: CourseId::new("acca"),
            }),
            SessionError::State(SessionStateError::TooManyQuestions { len: 70_000 }),
            SessionError::State(SessionStateError::OutOfOrder {
                expected: QuestionId::new("q1"),
                got: QuestionId::new("q2"),
            }),
            SessionError::State(SessionStateError::NotAnswering),
            SessionError::State(SessionStateError::NotAwaitingGate),
            SessionError::Interaction(InteractionError::AlreadySubmitted),
            SessionError::Interaction(InteractionError::NotSubmitted),
            SessionError::Interaction(InteractionError::NothingSelected),
            SessionError::Interaction(InteractionError::OptionOutOfRange { index: 7, len: 4 }),
            SessionError::Capture(CaptureError::EmptyEmail),
            SessionError::Capture(CaptureError::InvalidEmail("nope".into())),
            SessionError::Capture(CaptureError::EmptyCourseName),
            SessionError::Capture(CaptureError::NoQuestions),
            SessionError::Capture(CaptureError::ScoreExceedsTotal { score: 3, total: 2 }),
            SessionError::TestResult(TestResultError::NotCompleted),
            SessionError::TestResult(TestResultError::AnswerCountMismatch {
                answers: 1,
                total: 2,
            }),
            SessionError::TestResult(TestResultError::ScoreMismatch {
                score: 2,
                correct: 1,
            }),
            SessionError::Storage(StorageError::Connection("pool timed out".into())),
        ];
        for err in errors {
            let message = err.user_message();
            assert!(!message.is_empty());
            assert!(
                !message.contains(&err.to_string()),
                "{message:?} repeats {err}"
            );
            assert!(!message.contains("Something went wrong"));
        }
    }

    #[test]
    fn out_of_order_answer_gets_a_fixed_sentence() {
        let err = SessionError::State(SessionStateError::OutOfOrder {
            expected: QuestionId::new("q1"),
            got: QuestionId::new("q2"),
        });
        let message = err.user_message();
        assert!(!message.contains("q1"));
        assert!(!message.contains("q2"));
        assert_eq!(err.recovery(), Recovery::ReturnHome);
    }
}
