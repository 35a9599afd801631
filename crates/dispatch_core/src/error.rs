//! Dispatcher error type.
//!
//! Only lookup failures and bad configuration surface as errors. Unknown
//! bidders, thin fleets and impassable routes degrade to a default instead
//! (ignored bid, flat price, deferred allocation).

use thiserror::Error;

use crate::area::{Coord, TaxiId, WorldId};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("node {0} is outside the service area")]
    UnknownNode(Coord),

    #[error("taxi {0} is not registered with this dispatcher")]
    UnknownTaxi(TaxiId),

    #[error("call from world {got} reached a dispatcher owned by world {expected}")]
    ForeignWorld { expected: WorldId, got: WorldId },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
