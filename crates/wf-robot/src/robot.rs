//! The robot: shared identity, mutable status, inbox and primitives.
//!
//! A `Robot` is shared through an `Arc` between its agent thread and the
//! dispatcher.  Only the agent thread (through the primitives below) changes
//! position, battery and state; the dispatcher reads them for matching and
//! pushes tasks into the inbox.
//!
//! # Primitives
//!
//! | Primitive    | Suspends for                               | State    |
//! |--------------|--------------------------------------------|----------|
//! | `move_along` | step distance × `move_units_per_distance`  | Moving   |
//! | `pick`       | `pick_units`                               | Picking  |
//! | `drop_off`   | `drop_units`                               | Packing  |
//! | `charge`     | missing % × `charge_units_per_percent`     | Charging |
//!
//! Every suspension sleeps on the robot's [`CancelToken`], so
//! [`Robot::interrupt`] aborts it with [`Interrupted`] and leaves position and
//! battery at their last consistent values.

use std::sync::{Mutex, MutexGuard};

use tracing::trace;

use wf_core::{BlockingQueue, CancelToken, FleetConfig, GridPos, Interrupted, RobotId, TaskId};
use wf_spatial::Route;

use crate::state::clamp_battery;
use crate::{RobotState, RobotStatus, Task};

pub struct Robot {
    id:     RobotId,
    home:   GridPos,
    status: Mutex<RobotStatus>,
    inbox:  BlockingQueue<Task>,
    cancel: CancelToken,
}

impl Robot {
    /// A robot parked at `home` with the given battery level.
    pub fn new(id: RobotId, home: GridPos, battery: f64) -> Self {
        Self {
            id,
            home,
            status: Mutex::new(RobotStatus::new(home, battery)),
            inbox:  BlockingQueue::new(),
            cancel: CancelToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RobotStatus> {
        self.status.lock().expect("robot status mutex poisoned")
    }

    // ── Read accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> RobotId {
        self.id
    }

    pub fn home(&self) -> GridPos {
        self.home
    }

    pub fn position(&self) -> GridPos {
        self.lock().position
    }

    pub fn battery(&self) -> f64 {
        self.lock().battery
    }

    pub fn state(&self) -> RobotState {
        self.lock().state
    }

    pub fn active_task(&self) -> Option<TaskId> {
        self.lock().active_task
    }

    /// Consistent copy of position, battery, state and active task.
    pub fn snapshot(&self) -> RobotStatus {
        self.lock().clone()
    }

    // ── Inbox and cancellation ────────────────────────────────────────────

    /// Queue a task for this robot.  Returns it back if the inbox is closed.
    pub fn assign(&self, task: Task) -> Result<(), Task> {
        self.inbox.push(task)
    }

    pub fn inbox(&self) -> &BlockingQueue<Task> {
        &self.inbox
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Abort whatever suspension the robot is in.  The running task fails
    /// with a cancellation.  An interrupt raised while the robot is idle is
    /// dropped when the next task is taken from the inbox.
    pub fn interrupt(&self) {
        self.cancel.cancel();
    }

    /// Clear an interrupt left over from before the current task.  Once the
    /// inbox is closed the flag is raised again, since shutdown closes the
    /// inbox before it interrupts.
    pub(crate) fn clear_stale_interrupt(&self) {
        self.cancel.reset();
        if self.inbox.is_closed() {
            self.cancel.cancel();
        }
    }

    // ── Status transitions (agent thread only) ────────────────────────────

    pub(crate) fn set_state(&self, state: RobotState) {
        self.lock().state = state;
    }

    pub(crate) fn begin_task(&self, task: TaskId) {
        self.lock().active_task = Some(task);
    }

    pub(crate) fn end_task(&self) {
        let mut status = self.lock();
        status.active_task = None;
        status.state = RobotState::Idle;
    }

    // ── Primitives ────────────────────────────────────────────────────────

    /// Walk `route` one cell at a time.
    ///
    /// Each step suspends for its Euclidean length times
    /// `move_units_per_distance`, then commits the new position and drains
    /// `battery_per_distance` per cell.  An interrupted step is not
    /// committed.
    pub fn move_along(&self, route: &Route, config: &FleetConfig) -> Result<(), Interrupted> {
        if route.is_trivial() {
            return Ok(());
        }
        self.set_state(RobotState::Moving);
        let scale = config.time_scale();
        let mut prev = self.position();
        for &cell in &route.cells {
            let step = prev.euclidean_to(cell);
            self.cancel.sleep(scale.wall(step * config.move_units_per_distance))?;
            let mut status = self.lock();
            status.position = cell;
            status.battery = clamp_battery(status.battery - config.energy_for(step));
            prev = cell;
        }
        trace!(robot = %self.id, to = %prev, battery = self.battery(), "route completed");
        Ok(())
    }

    pub fn pick(&self, config: &FleetConfig) -> Result<(), Interrupted> {
        self.set_state(RobotState::Picking);
        self.cancel.sleep(config.time_scale().wall(config.pick_units as f64))
    }

    pub fn drop_off(&self, config: &FleetConfig) -> Result<(), Interrupted> {
        self.set_state(RobotState::Packing);
        self.cancel.sleep(config.time_scale().wall(config.drop_units as f64))
    }

    /// Charge to 100%.
    ///
    /// On interruption the battery keeps the charge gained so far, in
    /// proportion to the time actually spent.
    pub fn charge(&self, config: &FleetConfig) -> Result<(), Interrupted> {
        self.set_state(RobotState::Charging);
        let start = self.battery();
        let missing = 100.0 - start;
        let scale = config.time_scale();
        match self.cancel.sleep(scale.wall(missing * config.charge_units_per_percent)) {
            Ok(()) => {
                self.lock().battery = 100.0;
                Ok(())
            }
            Err(interrupted) => {
                let gained = if config.charge_units_per_percent > 0.0 {
                    scale.units(interrupted.elapsed) / config.charge_units_per_percent
                } else {
                    missing
                };
                self.lock().battery = clamp_battery(start + gained.min(missing));
                Err(interrupted)
            }
        }
    }
}

impl std::fmt::Debug for Robot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Robot")
            .field("id", &self.id)
            .field("home", &self.home)
            .field("status", &self.snapshot())
            .finish()
    }
}
