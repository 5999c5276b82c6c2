//! Delta computation for cumulative counters.

use std::time::{Duration, Instant};

/// Last accepted reading of a cumulative counter
#[derive(Debug, Clone, Copy)]
pub struct RateState {
    pub last_cumulative: u64,
    pub last_at: Instant,
}

/// Result of a non-seeding observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delta {
    /// Counter increase since the previous observation, `0` after a reset
    pub value: u64,
    /// Wall time covered by `value`
    pub elapsed: Duration,
    /// The counter went backwards (device reset or wraparound)
    pub reset: bool,
}

impl Delta {
    pub fn per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.value as f64 / secs
        } else {
            0.0
        }
    }
}

/// Turns a monotonically increasing counter into per-tick deltas.
///
/// A counter that goes backwards is treated as reset: that tick yields `0`
/// and the new reading becomes the baseline.
#[derive(Debug, Clone, Default)]
pub struct RateCounter {
    state: Option<RateState>,
}

impl RateCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&RateState> {
        self.state.as_ref()
    }

    /// Record `current` and return the delta since the previous observation.
    ///
    /// The first observation only seeds the baseline and returns `None`.
    pub fn observe(&mut self, current: u64) -> Option<Delta> {
        self.observe_at(current, Instant::now())
    }

    pub fn observe_at(&mut self, current: u64, now: Instant) -> Option<Delta> {
        let previous = self.state.replace(RateState {
            last_cumulative: current,
            last_at: now,
        })?;

        let elapsed = now.saturating_duration_since(previous.last_at);
        let delta = match current.checked_sub(previous.last_cumulative) {
            Some(value) => Delta {
                value,
                elapsed,
                reset: false,
            },
            None => Delta {
                value: 0,
                elapsed,
                reset: true,
            },
        };
        Some(delta)
    }
}
