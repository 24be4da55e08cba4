//! `wf-core`: foundational types for the warehouse fleet dispatcher.
//!
//! This crate is a dependency of every other `wf-*` crate.  It intentionally
//! has no `wf-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `RobotId`, `StationId`, `ProductId`, `TaskId`         |
//! | [`geo`]         | `GridPos`, Euclidean and octile distances             |
//! | [`time`]        | `TimeScale` (simulated units → wall-clock)            |
//! | [`cancel`]      | `CancelToken`, interruptible sleeps, cancel watchers  |
//! | [`queue`]       | `BlockingQueue<T>`: closeable FIFO with timeouts     |
//! | [`config`]      | `FleetConfig`                                         |
//! | [`rng`]         | `SimRng` (seeded workload generation)                 |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids, positions, config.  |

pub mod cancel;
pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod queue;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use cancel::{CancelToken, Interrupted, Notify, Watch};
pub use config::FleetConfig;
pub use error::{CoreError, CoreResult};
pub use geo::{DIAGONAL_COST, GridPos, STRAIGHT_COST};
pub use ids::{ProductId, RobotId, StationId, TaskId};
pub use queue::{BlockingQueue, Popped};
pub use rng::SimRng;
pub use time::TimeScale;
