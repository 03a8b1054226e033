use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::CourseId;
use crate::results::percentage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CaptureError {
    #[error("email address is required")]
    EmptyEmail,

    #[error("email address is not valid: {0}")]
    InvalidEmail(String),

    #[error("course name cannot be empty")]
    EmptyCourseName,

    #[error("a test needs at least one question")]
    NoQuestions,

    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },
}

/// Unvalidated summary submitted through the post-test email gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCaptureDraft {
    pub course_id: CourseId,
    pub course_name: String,
    pub email: String,
    pub score: u32,
    pub total_questions: u32,
}

impl EmailCaptureDraft {
    /// Validate the draft into a storable capture.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError` for a blank or malformed email, a blank course
    /// name, zero questions, or a score above the question count.
    pub fn validate(self, captured_at: DateTime<Utc>) -> Result<EmailCapture, CaptureError> {
        let email = normalize_email(&self.email)?;
        let course_name = self.course_name.trim().to_owned();
        if course_name.is_empty() {
            return Err(CaptureError::EmptyCourseName);
        }
        if self.total_questions == 0 {
            return Err(CaptureError::NoQuestions);
        }
        if self.score > self.total_questions {
            return Err(CaptureError::ScoreExceedsTotal {
                score: self.score,
                total: self.total_questions,
            });
        }

        Ok(EmailCapture {
            email,
            course_id: self.course_id,
            course_name,
            score: self.score,
            total_questions: self.total_questions,
            percentage: percentage(self.score, self.total_questions),
            captured_at,
        })
    }
}

fn normalize_email(raw: &str) -> Result<String, CaptureError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(CaptureError::EmptyEmail);
    }
    let invalid = || CaptureError::InvalidEmail(email.to_owned());
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return Err(invalid());
    };
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(email.to_owned())
}

/// A validated email capture, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailCapture {
    email: String,
    course_id: CourseId,
    course_name: String,
    score: u32,
    total_questions: u32,
    percentage: u32,
    captured_at: DateTime<Utc>,
}

impl EmailCapture {
    /// Rehydrate a capture from storage, re-checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError` if the stored values no longer validate.
    pub fn from_persisted(
        email: String,
        course_id: CourseId,
        course_name: String,
        score: u32,
        total_questions: u32,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, CaptureError> {
        EmailCaptureDraft {
            course_id,
            course_name,
            email,
            score,
            total_questions,
        }
        .validate(captured_at)
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn course_name(&self) -> &str {
        &self.course_name
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    #[must_use]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}
