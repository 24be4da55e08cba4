//! `wf-dispatch`: the equipment manager.
//!
//! Consumes submitted work, matches it to the nearest battery-feasible idle
//! robot, keeps the pending queue, and decides what each robot does next
//! when it reports back (pending work, charging, or returning home).
//!
//! # Crate layout
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`dispatcher`] | `Dispatcher<R: Router>`, implements `FleetControl`     |
//! | [`inventory`]  | `InventoryStore` contract, `MemoryInventory`           |
//! | [`observer`]   | `DispatchObserver`, `NoopObserver`                     |
//! | [`error`]      | `DispatchError`, `DispatchResult<T>`                   |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | Evaluates robot feasibility on Rayon's thread pool.       |
//! | `serde`    | Propagates serde derives to ids, tasks and config.        |

pub mod dispatcher;
pub mod error;
pub mod inventory;
pub mod observer;

#[cfg(test)]
mod tests;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, DispatchResult};
pub use inventory::{InventoryStore, MemoryInventory};
pub use observer::{DispatchObserver, NoopObserver};
