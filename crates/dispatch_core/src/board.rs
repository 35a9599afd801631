//! Fare board: every live fare, indexed by `(origin, destination, calltime)`.
//!
//! A single ordered map keyed by [`FareKey`] stands in for an
//! origin → destination → time nesting. Key order already groups fares by
//! origin and destination and sorts each group by call time, so:
//!
//! - traversal yields older fares first inside every route without sorting;
//! - there are no intermediate maps that could be left empty after a removal,
//!   so an origin or route is present iff at least one fare lives there.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::area::{Coord, Tick};
use crate::fare::{FareEntry, FareKey};

#[derive(Debug, Clone, Default)]
pub struct FareBoard {
    fares: BTreeMap<FareKey, FareEntry>,
}

fn origin_range(origin: Coord) -> RangeInclusive<FareKey> {
    FareKey::new(origin, Coord::MIN, Tick::MIN)..=FareKey::new(origin, Coord::MAX, Tick::MAX)
}

fn route_range(origin: Coord, destination: Coord) -> RangeInclusive<FareKey> {
    FareKey::new(origin, destination, Tick::MIN)..=FareKey::new(origin, destination, Tick::MAX)
}

impl FareBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fresh unpriced fare, replacing whatever sat at the same key.
    /// Returns the replaced fare.
    pub fn record(&mut self, key: FareKey) -> Option<FareEntry> {
        self.fares.insert(key, FareEntry::new(key))
    }

    /// Inserts a fully formed entry, replacing whatever sat at its key.
    pub fn insert(&mut self, entry: FareEntry) -> Option<FareEntry> {
        self.fares.insert(entry.key(), entry)
    }

    pub fn remove(&mut self, key: &FareKey) -> Option<FareEntry> {
        self.fares.remove(key)
    }

    pub fn get(&self, key: &FareKey) -> Option<&FareEntry> {
        self.fares.get(key)
    }

    pub fn get_mut(&mut self, key: &FareKey) -> Option<&mut FareEntry> {
        self.fares.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.fares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fares.is_empty()
    }

    pub fn contains_origin(&self, origin: Coord) -> bool {
        self.fares.range(origin_range(origin)).next().is_some()
    }

    pub fn contains_route(&self, origin: Coord, destination: Coord) -> bool {
        self.fares
            .range(route_range(origin, destination))
            .next()
            .is_some()
    }

    /// First unassigned fare under `origin`, scanning destinations then call
    /// times in ascending order.
    pub fn first_open_mut(&mut self, origin: Coord) -> Option<&mut FareEntry> {
        self.fares
            .range_mut(origin_range(origin))
            .map(|(_, fare)| fare)
            .find(|fare| !fare.is_assigned())
    }

    /// Fares of one route, oldest first.
    pub fn bucket(&self, origin: Coord, destination: Coord) -> impl Iterator<Item = &FareEntry> {
        self.fares
            .range(route_range(origin, destination))
            .map(|(_, fare)| fare)
    }

    /// All fares in key order.
    pub fn iter(&self) -> impl Iterator<Item = &FareEntry> {
        self.fares.values()
    }

    /// Snapshot of all keys in traversal order, for passes that mutate the
    /// board while walking it.
    pub fn keys(&self) -> Vec<FareKey> {
        self.fares.keys().copied().collect()
    }

    /// Distinct origins with at least one live fare.
    pub fn origins(&self) -> Vec<Coord> {
        let mut origins: Vec<Coord> = self.fares.keys().map(|key| key.origin).collect();
        origins.dedup();
        origins
    }

    /// Fares still waiting for a taxi (priced or not).
    pub fn open_count(&self) -> usize {
        self.fares.values().filter(|fare| !fare.is_assigned()).count()
    }
}
