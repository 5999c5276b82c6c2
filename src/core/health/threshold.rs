//! Threshold classification.
//!
//! Maps a sampled value and a pair of thresholds onto an event state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a single sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Ok,
    Warning,
    Critical,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Ok => "ok",
            State::Warning => "warning",
            State::Critical => "critical",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the thresholds is the bad side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Higher values are worse (loads, usage fractions, byte counts)
    #[default]
    Rising,
    /// Lower values are worse (availability)
    Falling,
}

/// Warning and critical thresholds of a reporter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub warn: f64,
    pub critical: f64,
    pub direction: Direction,
}

impl Thresholds {
    pub const fn rising(warn: f64, critical: f64) -> Self {
        Self {
            warn,
            critical,
            direction: Direction::Rising,
        }
    }

    pub const fn falling(warn: f64, critical: f64) -> Self {
        Self {
            warn,
            critical,
            direction: Direction::Falling,
        }
    }

    /// Thresholds that never alert; the reporter exists for metric export only.
    pub const fn never() -> Self {
        Self::rising(f64::INFINITY, f64::INFINITY)
    }

    pub fn classify(&self, value: f64) -> State {
        match self.direction {
            Direction::Rising => classify(value, self.warn, self.critical),
            Direction::Falling => classify_falling(value, self.warn, self.critical),
        }
    }
}

/// Classify `value` against rising thresholds.
///
/// Critical is checked first and both comparisons are inclusive, so a value
/// sitting exactly on a threshold counts as the worse state. `NaN` compares
/// false against both and lands on [`State::Ok`]. `warn > critical` is
/// accepted and evaluated literally.
pub fn classify(value: f64, warn: f64, critical: f64) -> State {
    if value >= critical {
        State::Critical
    } else if value >= warn {
        State::Warning
    } else {
        State::Ok
    }
}

/// Mirror of [`classify`] for thresholds where lower values are worse.
pub fn classify_falling(value: f64, warn: f64, critical: f64) -> State {
    if value <= critical {
        State::Critical
    } else if value <= warn {
        State::Warning
    } else {
        State::Ok
    }
}
