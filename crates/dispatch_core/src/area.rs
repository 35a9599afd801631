//! World boundary: the types and trait through which the dispatcher sees the
//! service area, the clock and the fleet.
//!
//! The dispatcher never owns taxi or map state. Every pricing and allocation
//! pass reads a fresh [`TaxiSnapshot`] from the [`ServiceArea`], and every
//! outbound notification (broadcast, award, cancellation) goes back through
//! it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Simulation time in ticks.
pub type Tick = u64;

/// Location key of a node in the service-area graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const MIN: Coord = Coord {
        x: i32::MIN,
        y: i32::MIN,
    };
    pub const MAX: Coord = Coord {
        x: i32::MAX,
        y: i32::MAX,
    };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Stable identity of a taxi as known to the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaxiId(pub u64);

impl fmt::Display for TaxiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "taxi#{}", self.0)
    }
}

/// Identity of the world a dispatcher belongs to. Calls carrying another
/// world's id are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldId(pub u32);

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world#{}", self.0)
    }
}

/// A fare already allocated to a taxi.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commitment {
    pub origin: Coord,
    pub destination: Coord,
}

/// How many fares a taxi is currently committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassengerState {
    Idle,
    OneFare,
    TwoFares,
}

/// Read-only view of one taxi, taken at the start of a pricing or
/// allocation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxiSnapshot {
    pub location: Coord,
    /// A passenger is on board right now.
    pub has_passenger: bool,
    /// Upcoming stops in travel order. The last stop is the current drop-off.
    pub route: Vec<Coord>,
    /// Allocated fares, oldest first. Never more than two.
    pub commitments: Vec<Commitment>,
}

impl TaxiSnapshot {
    pub fn idle(location: Coord) -> Self {
        Self {
            location,
            has_passenger: false,
            route: Vec::new(),
            commitments: Vec::new(),
        }
    }

    /// A taxi carrying the passenger of `commitments[0]` along `route`.
    pub fn carrying(location: Coord, route: Vec<Coord>, commitments: Vec<Commitment>) -> Self {
        Self {
            location,
            has_passenger: true,
            route,
            commitments,
        }
    }

    pub fn passenger_state(&self) -> PassengerState {
        match self.commitments.len() {
            0 => PassengerState::Idle,
            1 => PassengerState::OneFare,
            _ => PassengerState::TwoFares,
        }
    }

    /// True while the taxi can still take on another commitment.
    pub fn is_available(&self, max_commitments: usize) -> bool {
        self.commitments.len() < max_commitments
    }

    pub fn next_stop(&self) -> Option<Coord> {
        self.route.first().copied()
    }

    /// Where the current passenger gets off; the taxi's own location when it
    /// has no planned route.
    pub fn dropoff(&self) -> Coord {
        self.route.last().copied().unwrap_or(self.location)
    }
}

/// Everything the dispatcher consumes from, and reports back to, the world
/// that owns it.
pub trait ServiceArea {
    fn world_id(&self) -> WorldId;

    /// Current simulation tick.
    fn sim_time(&self) -> Tick;

    /// Whether `at` is a node of the service area.
    fn has_node(&self, at: Coord) -> bool;

    /// Estimated travel time in ticks. `None` means the route is currently
    /// impassable (gridlock) or one of the nodes is unknown.
    fn travel_time(&self, from: Coord, to: Coord) -> Option<u64>;

    /// Current snapshot of a taxi, `None` if the world no longer knows it.
    fn taxi(&self, taxi: TaxiId) -> Option<TaxiSnapshot>;

    /// Announce a priced fare to the fleet. Returns how many taxis heard it.
    fn broadcast_fare(&mut self, origin: Coord, destination: Coord, price: u64) -> usize;

    /// Tell `taxi` it won the fare waiting at `origin`.
    fn allocate_fare(&mut self, origin: Coord, taxi: TaxiId);

    /// Tell `taxi` the fare waiting at `origin` was abandoned.
    fn cancel_fare(&mut self, origin: Coord, taxi: TaxiId);
}
