//! Countdown schedule for the active effect
//!
//! The schedule is the logical half of the 1 Hz timer. Whatever drives it
//! (a tokio interval, a test loop) receives a [`TickToken`] on start and
//! presents it on every tick; a token from a stopped or replaced timer is
//! rejected, so a torn-down timer can never tick a newer effect.

use std::time::Duration;

use figura_core::EffectId;
use tracing::{debug, warn};

/// Default countdown period
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Proof that a tick belongs to the currently armed timer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickToken {
    pub effect: EffectId,
    pub generation: u64,
}

/// Outcome of [`CountdownSchedule::reconcile`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleChange {
    /// Nothing to do; the armed target already matches
    Unchanged,
    /// A new timer was armed (possibly replacing another one)
    Started(TickToken),
    /// The timer was torn down
    Stopped(TickToken),
}

/// Countdown schedule - at most one armed timer at a time
#[derive(Debug)]
pub struct CountdownSchedule {
    armed: Option<TickToken>,
    generation: u64,
    period: Duration,
}

impl CountdownSchedule {
    pub fn new() -> Self {
        Self::with_period(DEFAULT_TICK_PERIOD)
    }

    /// A zero period falls back to [`DEFAULT_TICK_PERIOD`]
    pub fn with_period(period: Duration) -> Self {
        let period = if period.is_zero() {
            warn!("zero countdown period, using {:?}", DEFAULT_TICK_PERIOD);
            DEFAULT_TICK_PERIOD
        } else {
            period
        };
        CountdownSchedule {
            armed: None,
            generation: 0,
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Arm a timer for `effect`, replacing any armed one
    pub fn start(&mut self, effect: EffectId) -> TickToken {
        self.generation += 1;
        let token = TickToken {
            effect,
            generation: self.generation,
        };
        self.armed = Some(token);
        debug!(%effect, generation = token.generation, "countdown armed");
        token
    }

    /// Tear down the armed timer, if any
    pub fn stop(&mut self) -> Option<TickToken> {
        let stopped = self.armed.take();
        if let Some(token) = stopped {
            debug!(effect = %token.effect, generation = token.generation, "countdown stopped");
        }
        stopped
    }

    /// Move the schedule toward `desired`.
    ///
    /// Only a change of target arms a new timer; asking again for the
    /// already-armed effect is a no-op, so metadata updates never re-arm.
    pub fn reconcile(&mut self, desired: Option<EffectId>) -> ScheduleChange {
        let current = self.armed.map(|t| t.effect);
        if current == desired {
            return ScheduleChange::Unchanged;
        }

        match desired {
            Some(effect) => ScheduleChange::Started(self.start(effect)),
            None => match self.stop() {
                Some(token) => ScheduleChange::Stopped(token),
                None => ScheduleChange::Unchanged,
            },
        }
    }

    /// Whether a tick carrying `token` should be honoured
    pub fn accepts(&self, token: TickToken) -> bool {
        self.armed == Some(token)
    }

    pub fn token(&self) -> Option<TickToken> {
        self.armed
    }

    pub fn armed_for(&self) -> Option<EffectId> {
        self.armed.map(|t| t.effect)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for CountdownSchedule {
    fn default() -> Self {
        Self::new()
    }
}
