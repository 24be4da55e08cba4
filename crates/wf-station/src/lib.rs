//! `wf-station`: stations and the bounded pools robots acquire them from.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`station`] | `Station`, `StationKind`                                   |
//! | [`pool`]    | `StationPool`: exclusive take/put, timeouts, hand-off     |
//! | [`error`]   | `StationError`, `StationResult<T>`                         |
//!
//! # Exclusivity
//!
//! A station is either in its pool's free list or held by exactly one
//! caller.  `put` of a station that is not currently held is rejected, so a
//! double release can never make one station available twice.

pub mod error;
pub mod pool;
pub mod station;


pub use error::{StationError, StationResult};
pub use pool::{Release, StationPool};
pub use station::{Station, StationKind};
