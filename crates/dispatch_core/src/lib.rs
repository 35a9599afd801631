pub mod area;
pub mod allocation;
pub mod board;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fare;
pub mod fleet;
pub mod map;
pub mod pricing;
pub mod runner;
pub mod systems;
pub mod telemetry;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use area::{Commitment, Coord, PassengerState, ServiceArea, TaxiId, TaxiSnapshot, Tick, WorldId};
pub use dispatcher::{Dispatcher, TickSummary};
pub use error::{DispatchError, DispatchResult};
