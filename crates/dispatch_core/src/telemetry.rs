//! Dispatcher counters. Owned by the [`Dispatcher`](crate::Dispatcher) and
//! only updated by it; everything starts at zero.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchTelemetry {
    /// Sum of all payments received.
    pub revenue: u64,
    pub fares_recorded: u64,
    pub fares_cancelled: u64,
    pub fares_priced: u64,
    /// Fares priced at the flat rate (gridlock or too few available taxis).
    pub flat_priced: u64,
    pub fares_allocated: u64,
    pub bids_recorded: u64,
    /// Bids from unregistered taxis or for origins with no open fare.
    pub bids_ignored: u64,
}

impl DispatchTelemetry {
    /// Average received payment per allocated fare.
    pub fn revenue_per_allocation(&self) -> Option<f64> {
        if self.fares_allocated == 0 {
            return None;
        }
        Some(self.revenue as f64 / self.fares_allocated as f64)
    }
}
