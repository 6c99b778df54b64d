//! Stopwatches for phase timing.
//!
//! A stopwatch accumulates time over any number of start/stop runs until it
//! is reset. [`WallStopwatch`] measures monotonic wall-clock time;
//! [`NoopStopwatch`] has the same interface and does nothing, so timing can
//! be compiled out by choosing the type.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Length of one unit in nanoseconds
    pub fn nanos(&self) -> u64 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60 * 1_000_000_000,
            TimeUnit::Hours => 3_600 * 1_000_000_000,
            TimeUnit::Days => 86_400 * 1_000_000_000,
        }
    }

    /// Express `duration` in this unit
    pub fn of(&self, duration: Duration) -> f64 {
        duration.as_nanos() as f64 / self.nanos() as f64
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Microseconds => "µs",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "min",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

pub trait Stopwatch: Default + Send {
    /// Start or resume; no effect if running
    fn start(&mut self);

    /// Pause and add the current run to the total; no effect if stopped
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Accumulated time, including the current run
    fn elapsed_duration(&self) -> Duration;

    /// Stop and forget all accumulated time
    fn reset(&mut self);

    fn elapsed(&self, unit: TimeUnit) -> f64 {
        unit.of(self.elapsed_duration())
    }

    /// `"<label> <value> <unit>"`
    fn format(&self, label: &str, unit: TimeUnit) -> String {
        format!("{} {:.3} {}", label, self.elapsed(unit), unit)
    }
}

#[derive(Debug, Clone, Default)]
pub struct WallStopwatch {
    accumulated: Duration,
    started: Option<Instant>,
}

impl Stopwatch for WallStopwatch {
    fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.accumulated += started.elapsed();
        }
    }

    fn is_running(&self) -> bool {
        self.started.is_some()
    }

    fn elapsed_duration(&self) -> Duration {
        match self.started {
            Some(started) => self.accumulated + started.elapsed(),
            None => self.accumulated,
        }
    }

    fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.started = None;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStopwatch;

impl Stopwatch for NoopStopwatch {
    fn start(&mut self) {}

    fn stop(&mut self) {}

    fn is_running(&self) -> bool {
        false
    }

    fn elapsed_duration(&self) -> Duration {
        Duration::ZERO
    }

    fn reset(&mut self) {}
}

/// Stopwatch backing fine-grained timers, real only with `detailed-timers`
#[cfg(feature = "detailed-timers")]
pub type DetailedStopwatch = WallStopwatch;

#[cfg(not(feature = "detailed-timers"))]
pub type DetailedStopwatch = NoopStopwatch;
