//! Fare pricing heuristic.
//!
//! Formula for an auctioned fare:
//!
//! `price = base + surcharge * congested + travel + noise_draw * expected_bids`
//!
//! where `congested` counts taxis whose projected completion time exceeds
//! `congestion_factor * travel`, and `expected_bids` is drawn uniformly from
//! `0..available`. A flat price applies when the route is impassable or when
//! fewer than two taxis could bid at all.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::area::{ServiceArea, TaxiSnapshot};
use crate::config::{DispatchConfig, PricingConfig};
use crate::fare::FareEntry;

/// Auctions need at least this many available taxis.
pub const MIN_AVAILABLE_FOR_AUCTION: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatReason {
    /// The world reported the route as impassable.
    Gridlocked,
    TooFewAvailable { available: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteBasis {
    Flat(FlatReason),
    Auction {
        travel_time: u64,
        available: usize,
        congested: usize,
        noise: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FareQuote {
    pub price: u64,
    pub basis: QuoteBasis,
}

impl FareQuote {
    pub fn is_flat(&self) -> bool {
        matches!(self.basis, QuoteBasis::Flat(_))
    }
}

/// Projected ticks until `taxi` could finish a fare of `travel` ticks.
/// `None` when the taxi carries a passenger but the projection cannot be
/// formed (no planned stop, or an unreachable leg).
fn projected_completion(taxi: &TaxiSnapshot, travel: u64, area: &dyn ServiceArea) -> Option<u64> {
    if !taxi.has_passenger {
        return Some(travel);
    }
    match taxi.commitments.as_slice() {
        [] => None,
        [_] => {
            let next = taxi.next_stop()?;
            Some(area.travel_time(taxi.location, next)?.saturating_add(travel))
        }
        [_, second, ..] => {
            let next = taxi.next_stop()?;
            let current = area.travel_time(taxi.location, next)?;
            let onward = area.travel_time(next, second.destination)?;
            Some(current.saturating_add(travel).saturating_add(onward))
        }
    }
}

/// Prices `fare` against the current fleet, drawing noise from `rng`.
/// An empty noise band (`noise_min >= noise_max`) charges `noise_min` per
/// expected bid.
pub fn compute_quote<R: Rng>(
    config: &PricingConfig,
    max_commitments: usize,
    fare: &FareEntry,
    area: &dyn ServiceArea,
    fleet: &[TaxiSnapshot],
    rng: &mut R,
) -> FareQuote {
    let Some(travel) = area.travel_time(fare.origin(), fare.destination()) else {
        return FareQuote {
            price: config.flat_fare,
            basis: QuoteBasis::Flat(FlatReason::Gridlocked),
        };
    };

    let available = fleet
        .iter()
        .filter(|taxi| taxi.is_available(max_commitments))
        .count();
    if available < MIN_AVAILABLE_FOR_AUCTION {
        return FareQuote {
            price: config.flat_fare,
            basis: QuoteBasis::Flat(FlatReason::TooFewAvailable { available }),
        };
    }

    let threshold = travel.saturating_mul(config.congestion_factor);
    let congested = fleet
        .iter()
        .filter_map(|taxi| projected_completion(taxi, travel, area))
        .filter(|projection| *projection > threshold)
        .count();

    let expected_bids = rng.gen_range(0..available as u64);
    let per_bid = if config.noise_min < config.noise_max {
        rng.gen_range(config.noise_min..config.noise_max)
    } else {
        config.noise_min
    };
    let noise = per_bid.saturating_mul(expected_bids);
    let surcharge = config.congestion_surcharge.saturating_mul(congested as u64);

    FareQuote {
        price: config
            .base_fare
            .saturating_add(surcharge)
            .saturating_add(travel)
            .saturating_add(noise),
        basis: QuoteBasis::Auction {
            travel_time: travel,
            available,
            congested,
            noise,
        },
    }
}

/// Owns the pricing constants and the RNG the noise term is drawn from.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    config: PricingConfig,
    max_commitments: usize,
    rng: StdRng,
}

impl PricingEngine {
    /// Seeds from `config.pricing.seed`, or from entropy when unset.
    pub fn new(config: &DispatchConfig) -> Self {
        let rng = match config.pricing.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: &DispatchConfig, rng: StdRng) -> Self {
        Self {
            config: config.pricing,
            max_commitments: config.max_commitments,
            rng,
        }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn quote(&mut self, fare: &FareEntry, area: &dyn ServiceArea, fleet: &[TaxiSnapshot]) -> FareQuote {
        compute_quote(
            &self.config,
            self.max_commitments,
            fare,
            area,
            fleet,
            &mut self.rng,
        )
    }

    pub fn price(&mut self, fare: &FareEntry, area: &dyn ServiceArea, fleet: &[TaxiSnapshot]) -> u64 {
        self.quote(fare, area, fleet).price
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::area::{Commitment, Coord};
    use crate::fare::FareKey;
    use crate::test_helpers::TestArea;

    const ORIGIN: Coord = Coord::new(0, 0);
    const DEST: Coord = Coord::new(20, 0);

    fn fare() -> FareEntry {
        FareEntry::new(FareKey::new(ORIGIN, DEST, 0))
    }

    fn idle_fleet(n: usize) -> Vec<TaxiSnapshot> {
        (0..n).map(|i| TaxiSnapshot::idle(Coord::new(i as i32, 1))).collect()
    }

    fn zero_rng() -> StepRng {
        StepRng::new(0, 0)
    }

    #[test]
    fn gridlock_charges_flat_fare() {
        let mut area = TestArea::grid(25, 3);
        area.set_gridlocked(true);
        let quote = compute_quote(
            &PricingConfig::default(),
            2,
            &fare(),
            &area,
            &idle_fleet(3),
            &mut zero_rng(),
        );
        assert_eq!(quote.price, 150);
        assert_eq!(quote.basis, QuoteBasis::Flat(FlatReason::Gridlocked));
    }

    #[test]
    fn fewer_than_two_available_charges_flat_fare() {
        let area = TestArea::grid(25, 3);
        let quote = compute_quote(
            &PricingConfig::default(),
            2,
            &fare(),
            &area,
            &idle_fleet(1),
            &mut zero_rng(),
        );
        assert_eq!(quote.price, 150);
        assert_eq!(
            quote.basis,
            QuoteBasis::Flat(FlatReason::TooFewAvailable { available: 1 })
        );
    }

    #[test]
    fn auction_price_is_base_plus_travel_with_pinned_noise() {
        let area = TestArea::grid(25, 3);
        let quote = compute_quote(
            &PricingConfig::default(),
            2,
            &fare(),
            &area,
            &idle_fleet(3),
            &mut zero_rng(),
        );
        assert_eq!(quote.price, 10 + 20);
        assert_eq!(
            quote.basis,
            QuoteBasis::Auction {
                travel_time: 20,
                available: 3,
                congested: 0,
                noise: 0,
            }
        );
    }

    #[test]
    fn congested_taxis_add_surcharge() {
        let area = TestArea::grid(25, 25);
        let far = Coord::new(0, 24);
        let commitment = Commitment {
            origin: Coord::new(0, 2),
            destination: far,
        };
        let mut fleet = idle_fleet(2);
        // 24 ticks to its drop-off plus the 20-tick fare exceeds 2 * 20.
        fleet.push(TaxiSnapshot::carrying(ORIGIN, vec![far], vec![commitment]));
        // 2 ticks to its drop-off keeps it under the threshold.
        fleet.push(TaxiSnapshot::carrying(
            ORIGIN,
            vec![Coord::new(2, 0)],
            vec![commitment],
        ));

        let quote = compute_quote(
            &PricingConfig::default(),
            2,
            &fare(),
            &area,
            &fleet,
            &mut zero_rng(),
        );
        assert_eq!(quote.price, 10 + 7 + 20);
    }

    #[test]
    fn full_taxis_count_the_second_dropoff_and_are_unavailable() {
        let area = TestArea::grid(25, 25);
        let first = Commitment {
            origin: ORIGIN,
            destination: Coord::new(1, 0),
        };
        let second = Commitment {
            origin: Coord::new(1, 0),
            destination: Coord::new(1, 20),
        };
        let mut fleet = idle_fleet(2);
        // 1 + 20 + 20 = 41 > 40.
        fleet.push(TaxiSnapshot::carrying(
            ORIGIN,
            vec![Coord::new(1, 0)],
            vec![first, second],
        ));

        let quote = compute_quote(
            &PricingConfig::default(),
            2,
            &fare(),
            &area,
            &fleet,
            &mut zero_rng(),
        );
        match quote.basis {
            QuoteBasis::Auction {
                available,
                congested,
                ..
            } => {
                assert_eq!(available, 2);
                assert_eq!(congested, 1);
            }
            other => panic!("expected auction, got {other:?}"),
        }
    }

    #[test]
    fn noise_stays_within_band_scaled_by_available_taxis() {
        let area = TestArea::grid(25, 3);
        let fleet = idle_fleet(4);
        let mut engine = PricingEngine::new(&DispatchConfig::default().with_seed(11));
        for _ in 0..200 {
            let price = engine.price(&fare(), &area, &fleet);
            assert!(price >= 30, "price {price} below base + travel");
            assert!(price <= 30 + 14 * 3, "price {price} above noise band");
        }
    }

    #[test]
    fn empty_noise_band_uses_its_lower_bound() {
        let area = TestArea::grid(25, 3);
        let config = PricingConfig {
            noise_min: 12,
            noise_max: 12,
            ..PricingConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let mut noises = Vec::new();
        for _ in 0..50 {
            let quote = compute_quote(&config, 2, &fare(), &area, &idle_fleet(4), &mut rng);
            match quote.basis {
                QuoteBasis::Auction { noise, .. } => noises.push(noise),
                other => panic!("expected auction, got {other:?}"),
            }
        }
        assert!(noises.iter().all(|n| [0, 12, 24, 36].contains(n)));
        assert!(noises.iter().any(|n| *n > 0));
    }

    #[test]
    fn huge_travel_costs_saturate_instead_of_overflowing() {
        let mut map = crate::map::ServiceMap::new();
        for node in [ORIGIN, DEST, Coord::new(0, 1)] {
            map.insert_node(node);
        }
        map.connect(ORIGIN, DEST, u64::MAX / 2).expect("road");
        map.connect(ORIGIN, Coord::new(0, 1), u64::MAX / 2).expect("road");
        let area = TestArea::with_map(map);
        let commitment = Commitment {
            origin: ORIGIN,
            destination: Coord::new(0, 1),
        };
        let fleet = vec![
            TaxiSnapshot::idle(ORIGIN),
            TaxiSnapshot::idle(DEST),
            TaxiSnapshot::carrying(DEST, vec![ORIGIN], vec![commitment, commitment]),
        ];
        // The full taxi's projection saturates and counts as congested.
        let quote = compute_quote(&PricingConfig::default(), 2, &fare(), &area, &fleet, &mut zero_rng());
        assert_eq!(quote.price, 10 + 7 + u64::MAX / 2);
    }

    #[test]
    fn same_seed_gives_same_prices() {
        let area = TestArea::grid(25, 3);
        let fleet = idle_fleet(5);
        let config = DispatchConfig::default().with_seed(99);
        let mut first = PricingEngine::new(&config);
        let mut second = PricingEngine::new(&config);
        let a: Vec<u64> = (0..20).map(|_| first.price(&fare(), &area, &fleet)).collect();
        let b: Vec<u64> = (0..20).map(|_| second.price(&fare(), &area, &fleet)).collect();
        assert_eq!(a, b);
    }
}
