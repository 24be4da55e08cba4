//! The per-robot execution thread.
//!
//! ```text
//! loop:
//!   pop inbox (bounded by the idle timeout)
//!     task      → clear stale interrupt → execute script (panics caught) → report outcome
//!     timed out → idle_timeout_requests_charge
//!     closed    → exit
//! ```

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use wf_core::Popped;

use crate::{FleetControl, Robot, Task, TaskError, script};

/// Handle to a running robot thread.
pub struct RobotAgent {
    robot:  Arc<Robot>,
    handle: JoinHandle<()>,
}

impl RobotAgent {
    /// Start the agent loop for `robot` on a thread named `robot-<id>`.
    pub fn spawn(robot: Arc<Robot>, control: Arc<dyn FleetControl>) -> io::Result<Self> {
        let thread_robot = Arc::clone(&robot);
        let handle = thread::Builder::new()
            .name(format!("robot-{}", robot.id().0))
            .spawn(move || run_agent(&thread_robot, control.as_ref()))?;
        Ok(Self { robot, handle })
    }

    pub fn robot(&self) -> &Arc<Robot> {
        &self.robot
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the loop to exit.  It exits once the robot's inbox is closed.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

/// The agent loop, run on the calling thread until the inbox closes.
pub fn run_agent(robot: &Robot, control: &dyn FleetControl) {
    debug!(robot = %robot.id(), "agent started");
    loop {
        match robot.inbox().pop_timeout(control.config().idle_timeout()) {
            Popped::Item(task) => {
                robot.clear_stale_interrupt();
                run_task(robot, control, task);
            }
            Popped::TimedOut => {
                debug!(robot = %robot.id(), battery = robot.battery(), "idle timeout");
                control.idle_timeout_requests_charge(robot.id());
            }
            Popped::Closed => break,
        }
    }
    debug!(robot = %robot.id(), "agent stopped");
}

/// Execute one task and report it, whatever happens inside the script.
pub fn run_task(robot: &Robot, control: &dyn FleetControl, task: Task) {
    robot.begin_task(task.id);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| script::execute(&task, robot, control)))
        .unwrap_or_else(|payload| Err(TaskError::Panicked(panic_message(payload.as_ref()))));

    match &outcome {
        Ok(()) => info!(
            robot = %robot.id(),
            task = %task.id,
            kind = task.kind.label(),
            battery = robot.battery(),
            "task finished"
        ),
        Err(err) => warn!(
            robot = %robot.id(),
            task = %task.id,
            kind = task.kind.label(),
            error = %err,
            "task failed"
        ),
    }

    robot.end_task();
    control.report_finished(robot.id(), &task, outcome.is_ok());
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
