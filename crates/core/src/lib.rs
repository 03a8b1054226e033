#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod interaction;
pub mod model;
pub mod results;
pub mod time;

pub use config::{ConfigError, PostTestGate, SessionConfig};
pub use error::Error;
pub use interaction::{
    DEFAULT_TIME_LIMIT_SECS, InteractionError, InteractionPhase, LOW_TIME_WARNING_SECS,
    QuestionInteraction, Reveal, TickOutcome, format_countdown,
};
pub use results::{PerformanceTier, ResultsReport, TopicStats, percentage};
pub use time::Clock;
