//! Bid elimination: narrows a fare's bidders to a single winner.
//!
//! Two filters run in sequence:
//!
//! 1. **Availability** (hard): if any bidder is without a passenger, every
//!    bidder carrying one is dropped.
//! 2. **Detour** (soft): the bidder with the smallest detour cost to the
//!    fare's destination wins; ties go to the earliest bid.
//!
//! This is a one-fare-at-a-time heuristic. It is not fair: taxis that keep
//! losing on distance can starve. Solving all open fares against all taxis
//! as one assignment problem would do better.

use crate::area::{Coord, ServiceArea, TaxiId, TaxiSnapshot, Tick};
use crate::fleet::TaxiRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Award {
    /// Registry index of the winner.
    pub index: usize,
    pub taxi: TaxiId,
    /// Detour cost that won the fare.
    pub cost: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationOutcome {
    Awarded(Award),
    /// Fare missing, already assigned, or nobody has bid yet.
    NotOpen,
    /// Bidders are still inside their response window.
    NotDue,
    /// No bidder resolves to a taxi the world still knows.
    NoCandidates,
    /// Every remaining candidate has an unreachable detour.
    NoEligible,
}

impl AllocationOutcome {
    pub fn award(&self) -> Option<Award> {
        match self {
            AllocationOutcome::Awarded(award) => Some(*award),
            _ => None,
        }
    }

    /// True when the fare stays open and should be reconsidered next tick.
    pub fn is_deferred(&self) -> bool {
        matches!(
            self,
            AllocationOutcome::NotDue | AllocationOutcome::NoCandidates | AllocationOutcome::NoEligible
        )
    }
}

/// Whether a fare called at `calltime` has waited out the response window.
pub fn response_window_elapsed(calltime: Tick, now: Tick, window: u64) -> bool {
    now.saturating_sub(calltime) > window
}

#[derive(Debug, Clone)]
struct Candidate {
    index: usize,
    taxi: TaxiId,
    snapshot: TaxiSnapshot,
}

fn resolve_candidates(bidders: &[usize], registry: &TaxiRegistry, area: &dyn ServiceArea) -> Vec<Candidate> {
    bidders
        .iter()
        .filter_map(|&index| {
            let taxi = registry.get(index)?;
            let snapshot = area.taxi(taxi)?;
            Some(Candidate {
                index,
                taxi,
                snapshot,
            })
        })
        .collect()
}

fn prefer_idle(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    if candidates.iter().any(|c| !c.snapshot.has_passenger) {
        candidates.retain(|c| !c.snapshot.has_passenger);
    }
    candidates
}

/// Ticks until `taxi` could be at `destination`: via its current drop-off
/// when carrying a passenger, directly otherwise.
fn detour_cost(taxi: &TaxiSnapshot, destination: Coord, area: &dyn ServiceArea) -> Option<u64> {
    if taxi.has_passenger {
        let dropoff = taxi.dropoff();
        let to_dropoff = area.travel_time(taxi.location, dropoff)?;
        let onward = area.travel_time(dropoff, destination)?;
        Some(to_dropoff.saturating_add(onward))
    } else {
        area.travel_time(taxi.location, destination)
    }
}

/// Picks the winning bidder for a fare bound for `destination`.
///
/// Bidder indices that no longer resolve (unknown to the registry or to the
/// world) are skipped rather than treated as errors.
pub fn select_winner(
    bidders: &[usize],
    registry: &TaxiRegistry,
    area: &dyn ServiceArea,
    destination: Coord,
) -> AllocationOutcome {
    let candidates = resolve_candidates(bidders, registry, area);
    if candidates.is_empty() {
        return AllocationOutcome::NoCandidates;
    }

    let mut best: Option<Award> = None;
    for candidate in prefer_idle(candidates) {
        let Some(cost) = detour_cost(&candidate.snapshot, destination, area) else {
            continue;
        };
        match best {
            Some(current) if cost >= current.cost => {}
            _ => {
                best = Some(Award {
                    index: candidate.index,
                    taxi: candidate.taxi,
                    cost,
                })
            }
        }
    }

    best.map(AllocationOutcome::Awarded)
        .unwrap_or(AllocationOutcome::NoEligible)
}
