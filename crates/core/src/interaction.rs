//! Per-question interaction: option selection, countdown and submission.
//!
//! The state machine is driven by explicit ticks so it stays deterministic.
//! Wall-clock scheduling lives with the caller (see the services countdown
//! handle), which must drop its timer whenever the displayed question changes.

use thiserror::Error;

use crate::model::{Answer, Question, QuestionId};

/// Default per-question time limit, in seconds.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 90;

/// Remaining time at or below which the countdown is shown as urgent.
pub const LOW_TIME_WARNING_SECS: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InteractionError {
    #[error("answer already submitted")]
    AlreadySubmitted,

    #[error("answer not submitted yet")]
    NotSubmitted,

    #[error("nothing selected; pick an option or wait for the timer")]
    NothingSelected,

    #[error("option {index} does not exist (question has {len} options)")]
    OptionOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionPhase {
    Answering,
    Submitted,
}

/// What the question shows after submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reveal {
    pub correct_index: usize,
    pub selected: Option<usize>,
    pub correct: bool,
    pub timed_out: bool,
}

impl Reveal {
    /// The user's choice when it was wrong, for highlighting.
    #[must_use]
    pub fn wrong_choice(&self) -> Option<usize> {
        self.selected.filter(|_| !self.correct)
    }
}

/// Result of feeding elapsed time into the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still answering with this many seconds left.
    Running { remaining: u32 },
    /// Time ran out and the answer was submitted automatically.
    TimedOut(Reveal),
    /// Already submitted; the tick had no effect.
    Idle,
}

/// Interaction state for the question currently on screen.
#[derive(Debug, Clone)]
pub struct QuestionInteraction {
    question: Question,
    selected: Option<usize>,
    phase: InteractionPhase,
    time_limit_secs: u32,
    remaining_secs: u32,
    timed_out: bool,
}

impl QuestionInteraction {
    /// Fresh state for `question`: nothing selected, full countdown.
    #[must_use]
    pub fn new(question: Question, time_limit_secs: u32) -> Self {
        Self {
            question,
            selected: None,
            phase: InteractionPhase::Answering,
            time_limit_secs,
            remaining_secs: time_limit_secs,
            timed_out: false,
        }
    }

    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        self.question.id()
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn phase(&self) -> InteractionPhase {
        self.phase
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn is_low_on_time(&self) -> bool {
        self.phase == InteractionPhase::Answering && self.remaining_secs <= LOW_TIME_WARNING_SECS
    }

    /// Choose an option. Ignored once the answer is submitted.
    ///
    /// # Errors
    ///
    /// Returns `InteractionError::OptionOutOfRange` for an index past the
    /// question's options.
    pub fn select_option(&mut self, index: usize) -> Result<(), InteractionError> {
        if self.phase == InteractionPhase::Submitted {
            return Ok(());
        }
        let len = self.question.option_count();
        if index >= len {
            return Err(InteractionError::OptionOutOfRange { index, len });
        }
        self.selected = Some(index);
        Ok(())
    }

    /// One second elapsed.
    pub fn tick(&mut self) -> TickOutcome {
        self.elapse(1)
    }

    /// `secs` seconds elapsed at once, e.g. after the host suspended timers.
    ///
    /// The countdown saturates at zero and auto-submits at most once.
    pub fn elapse(&mut self, secs: u32) -> TickOutcome {
        if self.phase == InteractionPhase::Submitted {
            return TickOutcome::Idle;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(secs);
        if self.remaining_secs > 0 {
            return TickOutcome::Running {
                remaining: self.remaining_secs,
            };
        }
        self.timed_out = true;
        TickOutcome::TimedOut(self.lock_in())
    }

    /// Manual submission of the selected option.
    ///
    /// # Errors
    ///
    /// Returns `InteractionError::AlreadySubmitted` on a second submit and
    /// `InteractionError::NothingSelected` when no option is chosen and time
    /// remains.
    pub fn submit(&mut self) -> Result<Reveal, InteractionError> {
        if self.phase == InteractionPhase::Submitted {
            return Err(InteractionError::AlreadySubmitted);
        }
        if self.selected.is_none() && self.remaining_secs > 0 {
            return Err(InteractionError::NothingSelected);
        }
        Ok(self.lock_in())
    }

    fn lock_in(&mut self) -> Reveal {
        self.phase = InteractionPhase::Submitted;
        self.reveal_unchecked()
    }

    fn reveal_unchecked(&self) -> Reveal {
        Reveal {
            correct_index: self.question.correct_answer_index(),
            selected: self.selected,
            correct: self.question.is_correct(self.selected),
            timed_out: self.timed_out,
        }
    }

    /// What to show once submitted; `None` while answering.
    #[must_use]
    pub fn reveal(&self) -> Option<Reveal> {
        (self.phase == InteractionPhase::Submitted).then(|| self.reveal_unchecked())
    }

    /// Hand the finalized answer to the session controller.
    ///
    /// # Errors
    ///
    /// Returns `InteractionError::NotSubmitted` while still answering.
    pub fn advance(&self) -> Result<Answer, InteractionError> {
        if self.phase != InteractionPhase::Submitted {
            return Err(InteractionError::NotSubmitted);
        }
        Ok(Answer::grade(&self.question, self.selected))
    }
}

/// `m:ss` rendering of a countdown.
#[must_use]
pub fn format_countdown(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
