//! `wf-fleet`: runs a warehouse fleet.
//!
//! Wires a [`FloorPlan`][wf_spatial::FloorPlan] and a
//! [`FleetConfig`][wf_core::FleetConfig] into a dispatcher plus one thread
//! per robot, and tears everything down again.
//!
//! # Threads
//!
//! ```text
//! caller ──create_order/create_stock──▶ submission queue
//!                                            │
//!                              "dispatcher" thread: run_dispatch_loop
//!                                            │ assign
//!                                            ▼
//!                "robot-N" threads: inbox ─▶ task script ─▶ report_finished
//! ```
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use wf_core::{FleetConfig, ProductId};
//! use wf_fleet::FleetBuilder;
//! use wf_spatial::FloorPlan;
//!
//! let mut fleet = FleetBuilder::new(FleetConfig::default(), FloorPlan::parse(FLOOR)?)
//!     .inventory(Arc::new(inventory))
//!     .build()?;
//! fleet.start()?;
//! fleet.create_order(ProductId(1), 1)?;
//! fleet.wait_idle(Duration::from_secs(5));
//! fleet.shutdown();
//! ```

pub mod builder;
pub mod error;
pub mod fleet;


pub use builder::FleetBuilder;
pub use error::{FleetError, FleetResult};
pub use fleet::Fleet;
