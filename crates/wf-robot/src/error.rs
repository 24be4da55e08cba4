use std::time::Duration;

use thiserror::Error;

use wf_core::{GridPos, Interrupted};
use wf_spatial::SpatialError;
use wf_station::StationError;

/// Why a task script did not complete.
///
/// Every variant is reported to the dispatcher as `succeeded = false`; none
/// of them stops the robot's agent loop.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task was cancelled")]
    Cancelled,

    #[error("no charging station became free within {0:?}")]
    ChargeTimeout(Duration),

    #[error("no route from {from} to {to}")]
    NoRoute { from: GridPos, to: GridPos },

    #[error("routing failed: {0}")]
    Spatial(SpatialError),

    #[error("station error: {0}")]
    Station(StationError),

    #[error("inventory update failed: {0}")]
    Inventory(String),

    #[error("task script panicked: {0}")]
    Panicked(String),
}

impl From<Interrupted> for TaskError {
    fn from(_: Interrupted) -> Self {
        TaskError::Cancelled
    }
}

impl From<SpatialError> for TaskError {
    fn from(err: SpatialError) -> Self {
        match err {
            SpatialError::NoRoute { from, to } => TaskError::NoRoute { from, to },
            other => TaskError::Spatial(other),
        }
    }
}

impl From<StationError> for TaskError {
    fn from(err: StationError) -> Self {
        match err {
            StationError::Cancelled => TaskError::Cancelled,
            other => TaskError::Station(other),
        }
    }
}

pub type TaskResult<T> = Result<T, TaskError>;
