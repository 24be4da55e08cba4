//! `wf-spatial`: warehouse floor grid and routing.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                    |
//! |------------|-------------------------------------------------------------|
//! | [`cell`]   | `Cell`, `Occupant`                                          |
//! | [`map`]    | `GridMap` (immutable), `GridMapBuilder`                     |
//! | [`layout`] | `FloorPlan`: ASCII floor description → map + positions     |
//! | [`router`] | `Router` trait, `Route`, `AStarRouter`                      |
//! | [`error`]  | `SpatialError`, `SpatialResult<T>`                          |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod cell;
pub mod error;
pub mod layout;
pub mod map;
pub mod router;


pub use cell::{Cell, Occupant};
pub use error::{SpatialError, SpatialResult};
pub use layout::FloorPlan;
pub use map::{GridMap, GridMapBuilder};
pub use router::{AStarRouter, Route, Router};
