use std::fmt;

use crate::area::{Coord, Tick};

/// Natural key of a fare. Ordering is origin, then destination, then call
/// time, so a sorted map of keys walks each route's fares oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FareKey {
    pub origin: Coord,
    pub destination: Coord,
    pub calltime: Tick,
}

impl FareKey {
    pub fn new(origin: Coord, destination: Coord, calltime: Tick) -> Self {
        Self {
            origin,
            destination,
            calltime,
        }
    }
}

impl fmt::Display for FareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}@{}", self.origin, self.destination, self.calltime)
    }
}

/// Where a fare sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FareStatus {
    Unpriced,
    Open,
    Assigned,
}

/// One fare on the board: identity plus allocation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FareEntry {
    key: FareKey,
    /// `None` until the pricing pass has run for this fare.
    pub price: Option<u64>,
    /// Registry index of the taxi that won the fare.
    pub taxi: Option<usize>,
    bidders: Vec<usize>,
}

impl FareEntry {
    pub fn new(key: FareKey) -> Self {
        Self {
            key,
            price: None,
            taxi: None,
            bidders: Vec::new(),
        }
    }

    pub fn key(&self) -> FareKey {
        self.key
    }

    pub fn origin(&self) -> Coord {
        self.key.origin
    }

    pub fn destination(&self) -> Coord {
        self.key.destination
    }

    pub fn calltime(&self) -> Tick {
        self.key.calltime
    }

    pub fn status(&self) -> FareStatus {
        match (self.price, self.taxi) {
            (_, Some(_)) => FareStatus::Assigned,
            (None, None) => FareStatus::Unpriced,
            (Some(_), None) => FareStatus::Open,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.taxi.is_some()
    }

    /// Bidders in the order their bids arrived.
    pub fn bidders(&self) -> &[usize] {
        &self.bidders
    }

    /// Adds a bidder. A repeat bid from the same taxi keeps its first slot.
    pub fn add_bidder(&mut self, taxi_index: usize) -> bool {
        if self.bidders.contains(&taxi_index) {
            return false;
        }
        self.bidders.push(taxi_index);
        true
    }

    /// Ticks elapsed since the fare called in.
    pub fn age(&self, now: Tick) -> u64 {
        now.saturating_sub(self.key.calltime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> FareKey {
        FareKey::new(Coord::new(0, 0), Coord::new(4, 0), 7)
    }

    #[test]
    fn status_walks_unpriced_open_assigned() {
        let mut fare = FareEntry::new(key());
        assert_eq!(fare.status(), FareStatus::Unpriced);
        fare.price = Some(42);
        assert_eq!(fare.status(), FareStatus::Open);
        fare.taxi = Some(0);
        assert_eq!(fare.status(), FareStatus::Assigned);
    }

    #[test]
    fn bidders_keep_arrival_order_without_duplicates() {
        let mut fare = FareEntry::new(key());
        assert!(fare.add_bidder(2));
        assert!(fare.add_bidder(0));
        assert!(!fare.add_bidder(2));
        assert_eq!(fare.bidders(), &[2, 0]);
    }

    #[test]
    fn keys_order_by_origin_destination_then_time() {
        let a = Coord::new(0, 0);
        let b = Coord::new(1, 0);
        let mut keys = vec![
            FareKey::new(b, a, 1),
            FareKey::new(a, b, 9),
            FareKey::new(a, b, 3),
            FareKey::new(a, a, 5),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                FareKey::new(a, a, 5),
                FareKey::new(a, b, 3),
                FareKey::new(a, b, 9),
                FareKey::new(b, a, 1),
            ]
        );
    }

    #[test]
    fn age_saturates_before_calltime() {
        let fare = FareEntry::new(key());
        assert_eq!(fare.age(5), 0);
        assert_eq!(fare.age(11), 4);
    }
}
