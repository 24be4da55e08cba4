use std::io;

use thiserror::Error;

use wf_core::CoreError;
use wf_dispatch::DispatchError;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("floor plan has no robots")]
    NoRobots,

    #[error("{what} length {got} does not match robot count {expected}")]
    RobotCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error("fleet was already started")]
    AlreadyStarted,

    #[error("failed to spawn {what} thread: {source}")]
    Spawn {
        what:   String,
        #[source]
        source: io::Error,
    },

    #[error("configuration error: {0}")]
    Core(#[from] CoreError),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

pub type FleetResult<T> = Result<T, FleetError>;
