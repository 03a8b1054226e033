use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answer::Answer;
use crate::model::ids::{CourseId, ShareId};
use crate::model::session::TestSession;
use crate::results::percentage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestResultError {
    #[error("session is not completed")]
    NotCompleted,

    #[error("answer count ({answers}) does not match total questions ({total})")]
    AnswerCountMismatch { answers: usize, total: u32 },

    #[error("score ({score}) does not match correct answers ({correct})")]
    ScoreMismatch { score: u32, correct: u32 },
}

/// Historical record of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    course_id: CourseId,
    score: u32,
    total_questions: u32,
    answers: Vec<Answer>,
    completed_at: DateTime<Utc>,
    share_id: ShareId,
}

impl TestResult {
    /// Snapshot a completed session.
    ///
    /// # Errors
    ///
    /// Returns `TestResultError::NotCompleted` unless the session is completed.
    pub fn from_session(
        session: &TestSession,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, TestResultError> {
        if !session.completed() {
            return Err(TestResultError::NotCompleted);
        }
        Ok(Self {
            course_id: session.course_id().clone(),
            score: session.score(),
            total_questions: session.total_questions(),
            answers: session.answers().to_vec(),
            completed_at,
            share_id: ShareId::generate(),
        })
    }

    /// Rehydrate a stored result.
    ///
    /// # Errors
    ///
    /// Returns `TestResultError` when the answers disagree with the stored
    /// totals.
    pub fn from_persisted(
        course_id: CourseId,
        score: u32,
        total_questions: u32,
        answers: Vec<Answer>,
        completed_at: DateTime<Utc>,
        share_id: ShareId,
    ) -> Result<Self, TestResultError> {
        if u32::try_from(answers.len()).ok() != Some(total_questions) {
            return Err(TestResultError::AnswerCountMismatch {
                answers: answers.len(),
                total: total_questions,
            });
        }
        let correct = answers.iter().filter(|a| a.correct()).count();
        let correct = u32::try_from(correct).unwrap_or(u32::MAX);
        if correct != score {
            return Err(TestResultError::ScoreMismatch { score, correct });
        }

        Ok(Self {
            course_id,
            score,
            total_questions,
            answers,
            completed_at,
            share_id,
        })
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
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
        percentage(self.score, self.total_questions)
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn share_id(&self) -> ShareId {
        self.share_id
    }
}
