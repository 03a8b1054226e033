#![forbid(unsafe_code)]

pub mod admin;
pub mod app_services;
pub mod error;
pub mod sessions;
pub mod user_facing;

pub use quiz_core::Clock;
pub use sessions as session;

pub use admin::{AdminService, ExportFormat};
pub use app_services::AppServices;
pub use error::{AdminError, AppServicesError, SessionError};
pub use sessions::{
    ActiveSession, AnswerOutcome, CountdownHandle, CountdownTick, QuestionReview, QuestionRunner,
    ResultsView, SessionLoopService, SessionProgress,
};
pub use user_facing::{Recovery, UserFacing};
