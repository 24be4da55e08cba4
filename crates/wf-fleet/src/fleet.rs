//! The running fleet: one thread per robot plus the dispatch loop.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use wf_core::{ProductId, RobotId, StationId, TaskId};
use wf_dispatch::{DispatchResult, Dispatcher};
use wf_robot::{FleetControl, Robot, RobotAgent, Task};
use wf_spatial::{AStarRouter, Router};
use wf_station::{StationKind, StationPool};

use crate::{FleetError, FleetResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    Built,
    Running,
    Stopped,
}

/// A dispatcher together with the threads that drive it.
///
/// Create via [`FleetBuilder`][crate::FleetBuilder].  Dropping a running
/// fleet shuts it down and joins every thread.
pub struct Fleet<R: Router + 'static = AStarRouter> {
    dispatcher:    Arc<Dispatcher<R>>,
    agents:        Vec<RobotAgent>,
    dispatch_loop: Option<JoinHandle<()>>,
    phase:         Phase,
}

impl<R: Router + 'static> Fleet<R> {
    pub(crate) fn new(dispatcher: Dispatcher<R>) -> Self {
        Self {
            dispatcher:    Arc::new(dispatcher),
            agents:        Vec::new(),
            dispatch_loop: None,
            phase:         Phase::Built,
        }
    }

    /// Spawn one agent thread per robot and the dispatch loop thread.
    pub fn start(&mut self) -> FleetResult<()> {
        if self.phase != Phase::Built {
            return Err(FleetError::AlreadyStarted);
        }
        self.phase = Phase::Running;

        let control: Arc<dyn FleetControl> = Arc::clone(&self.dispatcher) as Arc<dyn FleetControl>;
        for robot in self.dispatcher.robots() {
            let agent = RobotAgent::spawn(Arc::clone(robot), Arc::clone(&control)).map_err(
                |source| FleetError::Spawn { what: format!("robot {}", robot.id()), source },
            )?;
            self.agents.push(agent);
        }

        let dispatcher = Arc::clone(&self.dispatcher);
        let handle = thread::Builder::new()
            .name("dispatcher".into())
            .spawn(move || dispatcher.run_dispatch_loop())
            .map_err(|source| FleetError::Spawn { what: "dispatcher".into(), source })?;
        self.dispatch_loop = Some(handle);

        info!(robots = self.agents.len(), "fleet started");
        Ok(())
    }

    /// Close every queue, interrupt the robots and join all threads.
    /// Calling it again is a no-op.
    pub fn shutdown(&mut self) {
        if self.phase == Phase::Stopped {
            return;
        }
        self.phase = Phase::Stopped;
        self.dispatcher.shutdown();

        if let Some(handle) = self.dispatch_loop.take() {
            if handle.join().is_err() {
                warn!("dispatch loop panicked");
            }
        }
        for agent in self.agents.drain(..) {
            let id = agent.robot().id();
            if agent.join().is_err() {
                warn!(robot = %id, "robot agent panicked");
            }
        }
        info!("fleet stopped");
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Poll until nothing is queued or pending and every robot is
    /// available.  Returns `false` if `timeout` elapses first.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let poll = self.dispatcher.config().time_scale().wall(1.0).max(Duration::from_millis(1));
        loop {
            if self.is_idle() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(poll);
        }
    }

    /// Nothing queued, nothing pending, every robot available.
    pub fn is_idle(&self) -> bool {
        self.dispatcher.submission_len() == 0
            && self.dispatcher.pending_tasks().is_empty()
            && self.dispatcher.available_robots().len() == self.dispatcher.robots().len()
    }

    // ── Pass-through API ──────────────────────────────────────────────────

    pub fn dispatcher(&self) -> &Arc<Dispatcher<R>> {
        &self.dispatcher
    }

    pub fn create_order(&self, product: ProductId, quantity: u32) -> DispatchResult<TaskId> {
        self.dispatcher.create_order(product, quantity)
    }

    pub fn create_stock(
        &self,
        loading:  StationId,
        product:  ProductId,
        quantity: u32,
    ) -> DispatchResult<TaskId> {
        self.dispatcher.create_stock(loading, product, quantity)
    }

    pub fn pending_tasks(&self) -> Vec<Task> {
        self.dispatcher.pending_tasks()
    }

    pub fn available_robots(&self) -> Vec<RobotId> {
        self.dispatcher.available_robots()
    }

    pub fn charge_waiters(&self) -> Vec<RobotId> {
        self.dispatcher.charge_waiters()
    }

    pub fn robot(&self, id: RobotId) -> Option<&Arc<Robot>> {
        self.dispatcher.robot(id)
    }

    pub fn robots(&self) -> &[Arc<Robot>] {
        self.dispatcher.robots()
    }

    pub fn pool(&self, kind: StationKind) -> &StationPool {
        self.dispatcher.pool(kind)
    }
}

impl<R: Router + 'static> Drop for Fleet<R> {
    fn drop(&mut self) {
        if self.phase == Phase::Running {
            self.shutdown();
        }
    }
}
