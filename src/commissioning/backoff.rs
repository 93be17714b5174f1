//! Rejoin backoff bookkeeping.
//!
//! The first failure after a reset waits the start delay; each further
//! failure multiplies the delay by the backoff factor while tries remain.
//! Once the tries are used up the delay is pinned to the maximum and the
//! node keeps retrying at that rate forever.
//!
//! ```text
//!  tries=3, start=D, factor=2
//!
//!  failure   1    2    3    4    5 …
//!  delay     D    2D   4D   max  max
//!  left      2    1    0    0    0
//! ```

use crate::config::NodeConfig;

/// Retry budget and current rejoin delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffState {
    attempts_remaining: u8,
    current_delay_ms: u32,
    initial_attempts: u8,
    start_delay_ms: u32,
    max_delay_ms: u32,
    /// Factor scaled by 1000 to keep the struct `Eq`.
    factor_milli: u32,
}

impl BackoffState {
    pub fn new(tries: u8, start_delay_ms: u32, factor: f32, max_delay_ms: u32) -> Self {
        let start_delay_ms = start_delay_ms.min(max_delay_ms);
        Self {
            attempts_remaining: tries,
            current_delay_ms: start_delay_ms,
            initial_attempts: tries,
            start_delay_ms,
            max_delay_ms,
            factor_milli: (factor.max(1.0) * 1000.0) as u32,
        }
    }

    pub fn from_config(config: &NodeConfig) -> Self {
        Self::new(
            config.rejoin_tries,
            config.rejoin_start_delay_ms,
            config.rejoin_backoff_factor,
            config.rejoin_max_delay_ms,
        )
    }

    /// Restore the initial retry budget and delay.
    pub fn reset(&mut self) {
        self.attempts_remaining = self.initial_attempts;
        self.current_delay_ms = self.start_delay_ms;
    }

    /// A (re)connection succeeded.
    pub fn on_success(&mut self) {
        self.reset();
    }

    /// A rejoin attempt failed.  Returns the delay to wait before the next one.
    pub fn on_failure(&mut self) -> u32 {
        if self.attempts_remaining > 0 {
            // The first failure since a reset uses the start delay as-is.
            if self.attempts_remaining < self.initial_attempts {
                self.current_delay_ms = self.grow(self.current_delay_ms);
            }
            self.attempts_remaining -= 1;
        } else {
            self.current_delay_ms = self.max_delay_ms;
        }
        self.current_delay_ms
    }

    pub fn attempts_remaining(&self) -> u8 {
        self.attempts_remaining
    }

    pub fn current_delay_ms(&self) -> u32 {
        self.current_delay_ms
    }

    pub fn max_delay_ms(&self) -> u32 {
        self.max_delay_ms
    }

    /// Whether the state equals what [`reset`](Self::reset) produces.
    pub fn is_initial(&self) -> bool {
        self.attempts_remaining == self.initial_attempts && self.current_delay_ms == self.start_delay_ms
    }

    fn grow(&self, delay_ms: u32) -> u32 {
        let grown = (u64::from(delay_ms) * u64::from(self.factor_milli)) / 1000;
        grown.clamp(u64::from(delay_ms), u64::from(self.max_delay_ms)) as u32
    }
}
