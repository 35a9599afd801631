//! Reference service map: a weighted, directed road graph over [`Coord`]
//! nodes with cached shortest travel times.
//!
//! Worlds that do not carry their own routing can answer
//! [`ServiceArea::travel_time`](crate::area::ServiceArea::travel_time) from a
//! `ServiceMap`. Maps can be built incrementally (node by node, road by road)
//! or merged from another map with [`ServiceMap::import`].

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use pathfinding::prelude::dijkstra;

use crate::area::Coord;
use crate::error::{DispatchError, DispatchResult};

/// Cached origin/destination pairs (unreachable pairs are cached too).
const TRAVEL_CACHE_CAPACITY: usize = 4_096;

pub struct ServiceMap {
    roads: BTreeMap<Coord, BTreeMap<Coord, u64>>,
    cache: Mutex<LruCache<(Coord, Coord), Option<u64>>>,
}

fn new_cache() -> Mutex<LruCache<(Coord, Coord), Option<u64>>> {
    Mutex::new(LruCache::new(
        NonZeroUsize::new(TRAVEL_CACHE_CAPACITY).expect("cache size must be non-zero"),
    ))
}

impl Default for ServiceMap {
    fn default() -> Self {
        Self {
            roads: BTreeMap::new(),
            cache: new_cache(),
        }
    }
}

impl Clone for ServiceMap {
    fn clone(&self) -> Self {
        Self {
            roads: self.roads.clone(),
            cache: new_cache(),
        }
    }
}

impl fmt::Debug for ServiceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceMap")
            .field("nodes", &self.roads.len())
            .field("roads", &self.road_count())
            .finish()
    }
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A `width` x `height` grid with two-way roads of `cost` ticks between
    /// horizontally and vertically adjacent nodes.
    pub fn grid(width: i32, height: i32, cost: u64) -> Self {
        let mut map = Self::new();
        for x in 0..width {
            for y in 0..height {
                map.insert_node(Coord::new(x, y));
            }
        }
        for x in 0..width {
            for y in 0..height {
                let here = Coord::new(x, y);
                if x + 1 < width {
                    map.link(here, Coord::new(x + 1, y), cost);
                    map.link(Coord::new(x + 1, y), here, cost);
                }
                if y + 1 < height {
                    map.link(here, Coord::new(x, y + 1), cost);
                    map.link(Coord::new(x, y + 1), here, cost);
                }
            }
        }
        map
    }

    /// Adds a node with no roads. Returns false if it already existed.
    pub fn insert_node(&mut self, at: Coord) -> bool {
        if self.roads.contains_key(&at) {
            return false;
        }
        self.roads.insert(at, BTreeMap::new());
        self.invalidate();
        true
    }

    /// Adds (or re-prices) a one-way road. Both ends must already be nodes.
    pub fn add_road(&mut self, from: Coord, to: Coord, cost: u64) -> DispatchResult<()> {
        for node in [from, to] {
            if !self.contains(node) {
                return Err(DispatchError::UnknownNode(node));
            }
        }
        self.link(from, to, cost);
        Ok(())
    }

    /// Adds a two-way road.
    pub fn connect(&mut self, a: Coord, b: Coord, cost: u64) -> DispatchResult<()> {
        self.add_road(a, b, cost)?;
        self.add_road(b, a, cost)
    }

    /// Closes a one-way road. Returns false if there was no such road.
    pub fn remove_road(&mut self, from: Coord, to: Coord) -> bool {
        let removed = self
            .roads
            .get_mut(&from)
            .and_then(|roads| roads.remove(&to))
            .is_some();
        if removed {
            self.invalidate();
        }
        removed
    }

    /// Merges `other` into this map. Nodes are unioned; where both maps have
    /// the same road, `other`'s cost wins.
    pub fn import(&mut self, other: &ServiceMap) {
        for (node, roads) in &other.roads {
            let entry = self.roads.entry(*node).or_default();
            for (to, cost) in roads {
                entry.insert(*to, *cost);
            }
        }
        for node in other.roads.values().flat_map(|roads| roads.keys()) {
            self.roads.entry(*node).or_default();
        }
        self.invalidate();
    }

    pub fn contains(&self, at: Coord) -> bool {
        self.roads.contains_key(&at)
    }

    pub fn node_count(&self) -> usize {
        self.roads.len()
    }

    pub fn road_count(&self) -> usize {
        self.roads.values().map(BTreeMap::len).sum()
    }

    /// Roads leaving `at` with their costs.
    pub fn neighbours(&self, at: Coord) -> impl Iterator<Item = (Coord, u64)> + '_ {
        self.roads
            .get(&at)
            .into_iter()
            .flat_map(|roads| roads.iter().map(|(to, cost)| (*to, *cost)))
    }

    /// Shortest travel time from `from` to `to`, `None` when either node is
    /// unknown or no road sequence connects them.
    pub fn travel_time(&self, from: Coord, to: Coord) -> Option<u64> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(0);
        }

        let key = (from, to);
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(cached) = cache.get(&key) {
                return *cached;
            }
        }

        let result = self.shortest_travel_time(from, to);
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, result);
        }
        result
    }

    fn shortest_travel_time(&self, from: Coord, to: Coord) -> Option<u64> {
        dijkstra(
            &from,
            |node| self.neighbours(*node).collect::<Vec<_>>(),
            |node| *node == to,
        )
        .map(|(_, cost)| cost)
    }

    fn link(&mut self, from: Coord, to: Coord, cost: u64) {
        self.roads.entry(from).or_default().insert(to, cost);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        if let Ok(cache) = self.cache.get_mut() {
            cache.clear();
        }
    }
}
