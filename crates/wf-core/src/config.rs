//! Fleet-wide tunables.

use std::time::Duration;

use crate::{CoreError, CoreResult, TimeScale};

/// Top-level fleet configuration.
///
/// Typically built in code or loaded from JSON by the application crate and
/// passed to the fleet builder.  All durations are in simulated time units;
/// `time_unit_ms` maps them to wall-clock time.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FleetConfig {
    /// Wall-clock milliseconds per simulated time unit.  Default: 10.
    pub time_unit_ms: u64,

    /// Travel time per cell of Euclidean distance.  Default: 1.0.
    pub move_units_per_distance: f64,

    /// Battery percentage drained per cell of Euclidean distance.
    /// Default: 0.5.
    pub battery_per_distance: f64,

    /// Below this battery percentage a robot finishing a task is sent to
    /// charge instead of idling.  Default: 30.0.
    pub low_battery_threshold: f64,

    /// How long an idle robot waits on its inbox before asking to charge.
    /// Default: 30.
    pub idle_timeout_units: u64,

    /// Bounded wait of a Go-Wait-for-Charge task at the charging station.
    /// Default: 20.
    pub charge_wait_units: u64,

    /// Fixed duration of a pick.  Default: 2.
    pub pick_units: u64,

    /// Fixed duration of a drop.  Default: 2.
    pub drop_units: u64,

    /// Charge time per missing battery percent.  Default: 0.1.
    pub charge_units_per_percent: f64,

    /// Idle-timeout charge requests are ignored for robots at or above this
    /// battery level.  Default: 100.0 (only full robots stay put).
    pub idle_charge_below: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            time_unit_ms:             10,
            move_units_per_distance:  1.0,
            battery_per_distance:     0.5,
            low_battery_threshold:    30.0,
            idle_timeout_units:       30,
            charge_wait_units:        20,
            pick_units:               2,
            drop_units:               2,
            charge_units_per_percent: 0.1,
            idle_charge_below:        100.0,
        }
    }
}

impl FleetConfig {
    /// Reject configurations the simulation cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.time_unit_ms == 0 {
            return Err(CoreError::Config("time_unit_ms must be positive".into()));
        }
        for (name, value) in [
            ("move_units_per_distance", self.move_units_per_distance),
            ("battery_per_distance", self.battery_per_distance),
            ("charge_units_per_percent", self.charge_units_per_percent),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::Config(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("low_battery_threshold", self.low_battery_threshold),
            ("idle_charge_below", self.idle_charge_below),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(CoreError::Config(format!(
                    "{name} must be within 0..=100, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// The `TimeScale` for this run.
    pub fn time_scale(&self) -> TimeScale {
        TimeScale::from_millis(self.time_unit_ms)
    }

    /// Wall-clock idle timeout of a robot agent.
    pub fn idle_timeout(&self) -> Duration {
        self.time_scale().wall(self.idle_timeout_units as f64)
    }

    /// Wall-clock bound of a charge wait.
    pub fn charge_wait(&self) -> Duration {
        self.time_scale().wall(self.charge_wait_units as f64)
    }

    /// Battery percentage needed to cover `distance` cells.
    #[inline]
    pub fn energy_for(&self, distance: f64) -> f64 {
        distance * self.battery_per_distance
    }
}
