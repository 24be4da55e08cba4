//! Simulation time model.
//!
//! # Design
//!
//! The fleet runs in real threads, so every simulated wait is an actual
//! suspension.  Durations are expressed in abstract **time units** (the unit
//! used by idle timeouts, charge waits and pick/drop times) and converted to
//! wall-clock time through a single `TimeScale`:
//!
//!   wall = units * unit
//!
//! Tests run with a 1 ms unit; demos typically use 10 ms.

use std::time::Duration;

/// Converts simulated time units into wall-clock `Duration`s.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeScale {
    /// Wall-clock length of one simulated time unit.
    pub unit: Duration,
}

impl TimeScale {
    pub const fn new(unit: Duration) -> Self {
        Self { unit }
    }

    pub const fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Wall-clock duration of `units` simulated units.  Negative or NaN input
    /// is treated as zero.
    #[inline]
    pub fn wall(&self, units: f64) -> Duration {
        if units.is_nan() || units <= 0.0 {
            return Duration::ZERO;
        }
        // Rounded in nanoseconds so whole-unit multiples stay exact.
        Duration::from_nanos((self.unit.as_nanos() as f64 * units).round() as u64)
    }

    /// How many simulated units `elapsed` represents.
    #[inline]
    pub fn units(&self, elapsed: Duration) -> f64 {
        if self.unit.is_zero() {
            return 0.0;
        }
        elapsed.as_secs_f64() / self.unit.as_secs_f64()
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::from_millis(10)
    }
}

impl std::fmt::Display for TimeScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "1 unit = {:?}", self.unit)
    }
}
