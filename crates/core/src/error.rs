use thiserror::Error;

use crate::config::ConfigError;
use crate::interaction::InteractionError;
use crate::model::{
    CaptureError, CourseError, QuestionError, SessionStateError, TestResultError,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Session(#[from] SessionStateError),
    #[error(transparent)]
    Interaction(#[from] InteractionError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    TestResult(#[from] TestResultError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
