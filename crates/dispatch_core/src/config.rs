//! Dispatcher configuration: pricing constants, the allocation response
//! window and the per-taxi commitment cap.
//!
//! Every field has a default, so a JSON file only needs the keys it changes:
//!
//! ```json
//! { "pricing": { "flat_fare": 200, "seed": 7 }, "allocation": { "response_window_ticks": 5 } }
//! ```

use std::path::Path;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, DispatchResult};

/// Constants of the pricing heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Starting point of every auctioned price.
    pub base_fare: u64,
    /// Charged when the route is impassable or too few taxis could bid.
    pub flat_fare: u64,
    /// Added once per taxi whose projected completion time signals congestion.
    pub congestion_surcharge: u64,
    /// A projection counts as congested above `congestion_factor` times the
    /// fare's own travel time.
    pub congestion_factor: u64,
    /// Lower bound (inclusive) of the per-bidder noise draw.
    pub noise_min: u64,
    /// Upper bound (exclusive) of the per-bidder noise draw.
    pub noise_max: u64,
    /// Seed for the pricing RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_fare: 10,
            flat_fare: 150,
            congestion_surcharge: 7,
            congestion_factor: 2,
            noise_min: 10,
            noise_max: 15,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Ticks taxis get to bid. A fare is allocated once
    /// `now - calltime > response_window_ticks`.
    pub response_window_ticks: u64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            response_window_ticks: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct DispatchConfig {
    /// Concurrent fares a taxi may hold. Taxis below the cap count as
    /// available when pricing.
    pub max_commitments: usize,
    pub pricing: PricingConfig,
    pub allocation: AllocationConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_commitments: 2,
            pricing: PricingConfig::default(),
            allocation: AllocationConfig::default(),
        }
    }
}

impl DispatchConfig {
    pub fn from_json_str(raw: &str) -> DispatchResult<Self> {
        let config: DispatchConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> DispatchResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> DispatchResult<()> {
        if self.max_commitments == 0 {
            return Err(DispatchError::Config(
                "max_commitments must be at least 1".to_string(),
            ));
        }
        if self.pricing.noise_min >= self.pricing.noise_max {
            return Err(DispatchError::Config(format!(
                "noise_min ({}) must be below noise_max ({})",
                self.pricing.noise_min, self.pricing.noise_max
            )));
        }
        if self.pricing.congestion_factor == 0 {
            return Err(DispatchError::Config(
                "congestion_factor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.pricing.seed = Some(seed);
        self
    }

    pub fn with_flat_fare(mut self, flat_fare: u64) -> Self {
        self.pricing.flat_fare = flat_fare;
        self
    }

    pub fn with_base_fare(mut self, base_fare: u64) -> Self {
        self.pricing.base_fare = base_fare;
        self
    }

    pub fn with_response_window(mut self, ticks: u64) -> Self {
        self.allocation.response_window_ticks = ticks;
        self
    }

    pub fn with_max_commitments(mut self, max_commitments: usize) -> Self {
        self.max_commitments = max_commitments;
        self
    }
}
