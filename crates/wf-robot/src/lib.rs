//! `wf-robot`: robots, tasks, and the thread that runs each robot.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`state`]   | `RobotState`, `RobotStatus`                               |
//! | [`robot`]   | `Robot`: status, inbox, cancel token, primitives         |
//! | [`task`]    | `Task`, `TaskKind` (the five task variants)               |
//! | [`control`] | `FleetControl` callbacks, `StationWait`, `StationLease`   |
//! | [`script`]  | `execute`: per-variant task scripts                      |
//! | [`agent`]   | `RobotAgent` thread and its loop                          |
//! | [`error`]   | `TaskError`, `TaskResult<T>`                              |
//!
//! # Failure model
//!
//! A script failure of any kind (no route, charge timeout, cancellation,
//! even a panic) ends the task, is reported to the fleet as
//! `succeeded = false`, and the agent goes back to its inbox.

pub mod agent;
pub mod control;
pub mod error;
pub mod robot;
pub mod script;
pub mod state;
pub mod task;


pub use agent::{RobotAgent, run_agent, run_task};
pub use control::{FleetControl, StationLease, StationWait};
pub use error::{TaskError, TaskResult};
pub use robot::Robot;
pub use script::execute;
pub use state::{RobotState, RobotStatus, clamp_battery};
pub use task::{Task, TaskKind};
