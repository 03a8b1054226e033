//! Per-question countdown driven by a tokio task.
//!
//! A `CountdownHandle` lives exactly as long as one question is being
//! answered. Dropping it aborts the task, so every exit path (submit, next
//! question, quit, retake) stops the timer.

use std::time::Duration;

use quiz_core::model::QuestionId;
use quiz_core::{InteractionError, QuestionInteraction, Reveal, TickOutcome};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

const TICK: Duration = Duration::from_secs(1);
const TICK_BUFFER: usize = 8;

/// One elapsed second for the named question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownTick {
    pub question_id: QuestionId,
}

/// Owns the ticking task; aborts it on drop.
#[derive(Debug)]
pub struct CountdownHandle {
    question_id: QuestionId,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    /// Start sending one tick per second to `tx`. Must be called inside a
    /// tokio runtime.
    #[must_use]
    pub fn spawn(question_id: QuestionId, tx: mpsc::Sender<CountdownTick>) -> Self {
        let id = question_id.clone();
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK, TICK);
            loop {
                interval.tick().await;
                let tick = CountdownTick {
                    question_id: id.clone(),
                };
                if tx.send(tick).await.is_err() {
                    break;
                }
            }
        });
        Self { question_id, task }
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A question on screen: its interaction state plus the running timer.
///
/// The timer and its channel are released as soon as the interaction is
/// submitted, by hand or by timeout.
#[derive(Debug)]
pub struct QuestionRunner {
    interaction: QuestionInteraction,
    countdown: Option<(CountdownHandle, mpsc::Receiver<CountdownTick>)>,
}

impl QuestionRunner {
    /// Show `interaction` and start its countdown.
    #[must_use]
    pub fn start(interaction: QuestionInteraction) -> Self {
        let (tx, rx) = mpsc::channel(TICK_BUFFER);
        let handle = CountdownHandle::spawn(interaction.question_id().clone(), tx);
        log::debug!(
            "countdown started for {} ({}s)",
            interaction.question_id(),
            interaction.time_limit_secs()
        );
        Self {
            interaction,
            countdown: Some((handle, rx)),
        }
    }

    /// Runner with no background timer; time only moves through `elapse`.
    #[must_use]
    pub fn without_timer(interaction: QuestionInteraction) -> Self {
        Self {
            interaction,
            countdown: None,
        }
    }

    #[must_use]
    pub fn interaction(&self) -> &QuestionInteraction {
        &self.interaction
    }

    #[must_use]
    pub fn is_timer_running(&self) -> bool {
        self.countdown.is_some()
    }

    /// Waits for the next tick. Pends forever once the timer is stopped, so
    /// it can sit in a `select!` next to user input.
    pub async fn next_tick(&mut self) -> Option<CountdownTick> {
        match self.countdown.as_mut() {
            Some((_, rx)) => rx.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Apply a tick. Ticks for any other question are dropped.
    pub fn apply_tick(&mut self, tick: &CountdownTick) -> TickOutcome {
        if tick.question_id != *self.interaction.question_id() {
            log::debug!("dropping stale tick for {}", tick.question_id);
            return TickOutcome::Idle;
        }
        let outcome = self.interaction.tick();
        self.settle(outcome)
    }

    /// Apply several elapsed seconds at once (host suspension).
    pub fn elapse(&mut self, secs: u32) -> TickOutcome {
        let outcome = self.interaction.elapse(secs);
        self.settle(outcome)
    }

    /// # Errors
    ///
    /// Propagates `InteractionError` for an out-of-range index.
    pub fn select_option(&mut self, index: usize) -> Result<(), InteractionError> {
        self.interaction.select_option(index)
    }

    /// Manual submit; stops the timer.
    ///
    /// # Errors
    ///
    /// Propagates `InteractionError` from the interaction.
    pub fn submit(&mut self) -> Result<Reveal, InteractionError> {
        let reveal = self.interaction.submit()?;
        self.stop();
        Ok(reveal)
    }

    /// Stop the timer without submitting (quit).
    pub fn stop(&mut self) {
        if self.countdown.take().is_some() {
            log::debug!("countdown stopped for {}", self.interaction.question_id());
        }
    }

    #[must_use]
    pub fn into_interaction(self) -> QuestionInteraction {
        self.interaction
    }

    fn settle(&mut self, outcome: TickOutcome) -> TickOutcome {
        if let TickOutcome::TimedOut(_) = outcome {
            log::info!("question {} timed out", self.interaction.question_id());
            self.stop();
        }
        outcome
    }
}
