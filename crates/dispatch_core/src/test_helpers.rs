//! Test helpers: an in-memory [`ServiceArea`] with a grid map, a settable
//! clock and recorded outbound calls.

use std::collections::BTreeMap;

use bevy_ecs::prelude::Resource;

use crate::area::{Coord, ServiceArea, TaxiId, TaxiSnapshot, Tick, WorldId};
use crate::map::ServiceMap;

/// World id every [`TestArea`] starts with.
pub const TEST_WORLD: WorldId = WorldId(1);

/// A `broadcast_fare` call as seen by the area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Broadcast {
    pub origin: Coord,
    pub destination: Coord,
    pub price: u64,
}

#[derive(Debug, Clone, Resource)]
pub struct TestArea {
    world: WorldId,
    now: Tick,
    map: ServiceMap,
    taxis: BTreeMap<TaxiId, TaxiSnapshot>,
    gridlocked: bool,
    pub broadcasts: Vec<Broadcast>,
    pub allocations: Vec<(Coord, TaxiId)>,
    pub cancellations: Vec<(Coord, TaxiId)>,
}

impl TestArea {
    pub fn with_map(map: ServiceMap) -> Self {
        Self {
            world: TEST_WORLD,
            now: 0,
            map,
            taxis: BTreeMap::new(),
            gridlocked: false,
            broadcasts: Vec::new(),
            allocations: Vec::new(),
            cancellations: Vec::new(),
        }
    }

    /// `width` x `height` grid where every step costs one tick, so travel
    /// time equals Manhattan distance.
    pub fn grid(width: i32, height: i32) -> Self {
        Self::with_map(ServiceMap::grid(width, height, 1))
    }

    pub fn with_world_id(mut self, world: WorldId) -> Self {
        self.world = world;
        self
    }

    pub fn set_time(&mut self, now: Tick) {
        self.now = now;
    }

    pub fn advance(&mut self) {
        self.now += 1;
    }

    /// When set, every travel-time query reports the route impassable.
    pub fn set_gridlocked(&mut self, gridlocked: bool) {
        self.gridlocked = gridlocked;
    }

    pub fn place_taxi(&mut self, taxi: TaxiId, snapshot: TaxiSnapshot) {
        self.taxis.insert(taxi, snapshot);
    }

    pub fn remove_taxi(&mut self, taxi: TaxiId) -> Option<TaxiSnapshot> {
        self.taxis.remove(&taxi)
    }

    pub fn taxi_mut(&mut self, taxi: TaxiId) -> Option<&mut TaxiSnapshot> {
        self.taxis.get_mut(&taxi)
    }

    pub fn map_mut(&mut self) -> &mut ServiceMap {
        &mut self.map
    }
}

impl ServiceArea for TestArea {
    fn world_id(&self) -> WorldId {
        self.world
    }

    fn sim_time(&self) -> Tick {
        self.now
    }

    fn has_node(&self, at: Coord) -> bool {
        self.map.contains(at)
    }

    fn travel_time(&self, from: Coord, to: Coord) -> Option<u64> {
        if self.gridlocked {
            return None;
        }
        self.map.travel_time(from, to)
    }

    fn taxi(&self, taxi: TaxiId) -> Option<TaxiSnapshot> {
        self.taxis.get(&taxi).cloned()
    }

    fn broadcast_fare(&mut self, origin: Coord, destination: Coord, price: u64) -> usize {
        self.broadcasts.push(Broadcast {
            origin,
            destination,
            price,
        });
        self.taxis.len()
    }

    fn allocate_fare(&mut self, origin: Coord, taxi: TaxiId) {
        self.allocations.push((origin, taxi));
    }

    fn cancel_fare(&mut self, origin: Coord, taxi: TaxiId) {
        self.cancellations.push((origin, taxi));
    }
}
