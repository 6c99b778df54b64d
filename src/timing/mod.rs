//! Phase timing.

pub mod stopwatch;

pub use stopwatch::{DetailedStopwatch, NoopStopwatch, Stopwatch, TimeUnit, WallStopwatch};
