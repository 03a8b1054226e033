mod answer;
mod capture;
mod course;
mod ids;
mod question;
mod session;
mod test_result;

pub use ids::{CourseId, ParseIdError, QuestionId, ShareId};

pub use answer::{Answer, NO_ANSWER};
pub use capture::{CaptureError, EmailCapture, EmailCaptureDraft};
pub use course::{Course, CourseError, DEFAULT_STUDY_PLAN_URL};
pub use question::{Question, QuestionError};
pub use session::{SessionAdvance, SessionPhase, SessionStateError, TestSession};
pub use test_result::{TestResult, TestResultError};
