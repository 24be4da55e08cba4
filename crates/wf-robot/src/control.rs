//! The callbacks a robot makes into whoever runs the fleet.
//!
//! Task scripts and the agent loop never talk to a concrete dispatcher; they
//! go through [`FleetControl`].  This keeps `wf-robot` free of dispatcher
//! types and lets tests drive a robot with a scripted stand-in.

use std::time::Duration;

use wf_core::{FleetConfig, GridPos, ProductId, RobotId};
use wf_spatial::{Route, SpatialResult};
use wf_station::{Station, StationKind};

use crate::{Robot, Task, TaskResult};

/// How long a station request may block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StationWait {
    /// Block until a station frees up (mandatory requests).
    Forever,
    /// Give up after the duration (optional requests).
    Timeout(Duration),
}

/// Services the fleet provides to robots.
///
/// # Thread safety
///
/// One implementation is shared by every robot thread.
pub trait FleetControl: Send + Sync {
    fn config(&self) -> &FleetConfig;

    /// Shortest route from the robot's current position to `target`.
    fn request_path(&self, robot: &Robot, target: GridPos) -> SpatialResult<Route>;

    /// Take any free station of `kind`.
    ///
    /// `Ok(None)` only for [`StationWait::Timeout`] when nothing freed in
    /// time.  The wait is cancelled by [`Robot::interrupt`].
    fn request_station(
        &self,
        kind:  StationKind,
        robot: &Robot,
        wait:  StationWait,
    ) -> TaskResult<Option<Station>>;

    /// Take exactly `station`, blocking until its holder releases it.
    fn acquire_station(&self, station: Station, robot: &Robot) -> TaskResult<Station>;

    /// Give a held station back.  Never blocks on dispatcher bookkeeping
    /// longer than the hand-off itself.
    fn release_station(&self, station: Station);

    /// Called exactly once per task taken from the inbox.
    fn report_finished(&self, robot: RobotId, task: &Task, succeeded: bool);

    /// Called when the robot's inbox stayed empty for the idle timeout.
    fn idle_timeout_requests_charge(&self, robot: RobotId);

    fn increase_quantity(&self, product: ProductId, amount: u32) -> TaskResult<()>;
}

/// A held station that goes back to its pool when dropped.
///
/// Scripts hold one across every step that may fail, so an error or a
/// cancellation can never leak the station.
pub struct StationLease<'a> {
    station: Option<Station>,
    control: &'a dyn FleetControl,
}

impl<'a> StationLease<'a> {
    pub fn new(station: Station, control: &'a dyn FleetControl) -> Self {
        Self { station: Some(station), control }
    }

    pub fn station(&self) -> Option<Station> {
        self.station
    }

    /// Release now instead of at end of scope.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(station) = self.station.take() {
            self.control.release_station(station);
        }
    }
}

impl Drop for StationLease<'_> {
    fn drop(&mut self) {
        self.release_inner();
    }
}
