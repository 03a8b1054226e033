use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interaction::DEFAULT_TIME_LIMIT_SECS;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("time limit must be > 0 seconds")]
    ZeroTimeLimit,

    #[error("unknown post-test gate: {0} (expected `none` or `email`)")]
    UnknownGate(String),
}

/// Step run between the last answer and marking the session complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostTestGate {
    /// Complete right after the last answer.
    None,
    /// Hold results until an email address is captured.
    #[default]
    EmailCapture,
}

impl FromStr for PostTestGate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "email" | "email_capture" | "email-capture" => Ok(Self::EmailCapture),
            _ => Err(ConfigError::UnknownGate(s.to_owned())),
        }
    }
}

impl fmt::Display for PostTestGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::EmailCapture => f.write_str("email"),
        }
    }
}

/// Settings fixed when a session is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    time_limit_secs: u32,
    post_test_gate: PostTestGate,
}

impl SessionConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroTimeLimit` when `time_limit_secs` is 0.
    pub fn new(time_limit_secs: u32, post_test_gate: PostTestGate) -> Result<Self, ConfigError> {
        if time_limit_secs == 0 {
            return Err(ConfigError::ZeroTimeLimit);
        }
        Ok(Self {
            time_limit_secs,
            post_test_gate,
        })
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn post_test_gate(&self) -> PostTestGate {
        self.post_test_gate
    }

    #[must_use]
    pub fn with_post_test_gate(mut self, gate: PostTestGate) -> Self {
        self.post_test_gate = gate;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            post_test_gate: PostTestGate::default(),
        }
    }
}
