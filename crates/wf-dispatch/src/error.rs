use thiserror::Error;

use wf_core::{CoreError, ProductId, StationId};
use wf_spatial::SpatialError;
use wf_station::StationError;

/// Errors returned synchronously by the dispatcher.  When one of these is
/// returned, nothing was queued.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("quantity must be positive")]
    ZeroQuantity,

    #[error("unknown product {0}")]
    UnknownProduct(ProductId),

    #[error("insufficient stock of {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product:   ProductId,
        requested: u32,
        available: u32,
    },

    #[error("stock of {product} would overflow")]
    QuantityOverflow { product: ProductId },

    #[error("unknown loading station {0}")]
    UnknownLoadingStation(StationId),

    #[error("dispatcher is shut down")]
    ShutDown,

    #[error("configuration error: {0}")]
    Core(#[from] CoreError),

    #[error("floor error: {0}")]
    Spatial(#[from] SpatialError),

    #[error("station error: {0}")]
    Station(#[from] StationError),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
