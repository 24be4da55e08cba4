//! Spatial-subsystem error type.

use thiserror::Error;

use wf_core::GridPos;

/// Errors produced by `wf-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: GridPos, to: GridPos },

    #[error("position {0} is outside the map")]
    OutOfBounds(GridPos),

    #[error("cell {0} is already occupied")]
    AlreadyOccupied(GridPos),

    #[error("floor plan line {line}: unknown cell symbol {symbol:?}")]
    UnknownSymbol { line: usize, symbol: char },

    #[error("floor plan is empty")]
    EmptyPlan,

    #[error("floor plan line {line} has width {got}, expected {expected}")]
    RaggedRow { line: usize, expected: usize, got: usize },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
