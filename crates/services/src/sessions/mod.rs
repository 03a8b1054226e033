mod active;
pub mod countdown;
mod progress;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use active::ActiveSession;
pub use countdown::{CountdownHandle, CountdownTick, QuestionRunner};
pub use progress::SessionProgress;
pub use view::{QuestionReview, ResultsView};
pub use workflow::{AnswerOutcome, SessionLoopService};
