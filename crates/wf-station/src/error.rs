use thiserror::Error;

use wf_core::StationId;

use crate::StationKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StationError {
    #[error("station {0} is not part of this pool")]
    Unknown(StationId),

    #[error("station {station} is a {got} station, pool holds {expected} stations")]
    WrongKind {
        station:  StationId,
        expected: StationKind,
        got:      StationKind,
    },

    #[error("station {0} was released but is not held")]
    NotHeld(StationId),

    #[error("station wait was cancelled")]
    Cancelled,
}

pub type StationResult<T> = Result<T, StationError>;
