//! The dispatcher: owns the fare board and drives pricing and allocation
//! once per tick.
//!
//! Every fare moves through `Unpriced -> Open -> Assigned`, or leaves the
//! board early when the world cancels it. Event handlers (`record_fare`,
//! `cancel_fare`, `record_bid`, `recv_payment`) mutate the board
//! synchronously; [`Dispatcher::on_tick`] then walks the board in key order,
//! so within a route older fares are always priced and allocated first.
//!
//! All calls are expected to be serialized by the world. Nothing here locks.

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::allocation::{response_window_elapsed, select_winner, AllocationOutcome};
use crate::area::{Coord, ServiceArea, TaxiId, TaxiSnapshot, Tick, WorldId};
use crate::board::FareBoard;
use crate::config::DispatchConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::fare::{FareEntry, FareKey};
use crate::fleet::TaxiRegistry;
use crate::pricing::{FareQuote, PricingEngine};
use crate::telemetry::DispatchTelemetry;

/// What one control-loop pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub priced: usize,
    pub allocated: usize,
    /// Fares with bidders that stayed open this tick.
    pub deferred: usize,
}

#[derive(Debug, Resource)]
pub struct Dispatcher {
    world: WorldId,
    config: DispatchConfig,
    taxis: TaxiRegistry,
    board: FareBoard,
    pricing: PricingEngine,
    telemetry: DispatchTelemetry,
}

impl Dispatcher {
    /// Builds a dispatcher after checking `config`.
    pub fn try_new(world: WorldId, config: DispatchConfig) -> DispatchResult<Self> {
        config.validate()?;
        Ok(Self::new(world, config))
    }

    /// Builds a dispatcher without checking `config`. An empty noise band
    /// prices with `noise_min` rather than failing.
    pub fn new(world: WorldId, config: DispatchConfig) -> Self {
        Self {
            world,
            pricing: PricingEngine::new(&config),
            config,
            taxis: TaxiRegistry::new(),
            board: FareBoard::new(),
            telemetry: DispatchTelemetry::default(),
        }
    }

    /// Registers `taxis` in order.
    pub fn with_taxis(mut self, taxis: impl IntoIterator<Item = TaxiId>) -> Self {
        for taxi in taxis {
            self.taxis.register(taxi);
        }
        self
    }

    /// Replaces the pricing RNG, e.g. to pin the noise term.
    pub fn with_pricing_rng(mut self, rng: StdRng) -> Self {
        self.pricing = PricingEngine::with_rng(&self.config, rng);
        self
    }

    pub fn world(&self) -> WorldId {
        self.world
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn board(&self) -> &FareBoard {
        &self.board
    }

    pub fn taxis(&self) -> &TaxiRegistry {
        &self.taxis
    }

    pub fn telemetry(&self) -> &DispatchTelemetry {
        &self.telemetry
    }

    pub fn fare(&self, origin: Coord, destination: Coord, calltime: Tick) -> Option<&FareEntry> {
        self.board.get(&FareKey::new(origin, destination, calltime))
    }

    /// The world-side identity of the taxi a fare was given to.
    pub fn assigned_taxi(&self, fare: &FareEntry) -> Option<TaxiId> {
        fare.taxi.and_then(|index| self.taxis.get(index))
    }

    fn check_world(&self, area: &dyn ServiceArea) -> DispatchResult<()> {
        let got = area.world_id();
        if got != self.world {
            warn!(expected = %self.world, %got, "Call from foreign world rejected");
            return Err(DispatchError::ForeignWorld {
                expected: self.world,
                got,
            });
        }
        Ok(())
    }

    fn check_nodes(area: &dyn ServiceArea, nodes: &[Coord]) -> DispatchResult<()> {
        match nodes.iter().find(|node| !area.has_node(**node)) {
            Some(node) => Err(DispatchError::UnknownNode(*node)),
            None => Ok(()),
        }
    }

    // ── Knowledge base ───────────────────────────────────────────────────────

    /// Makes `taxi` known. Returns its registry index; registering twice is
    /// harmless.
    pub fn add_taxi(&mut self, taxi: TaxiId) -> usize {
        self.taxis.register(taxi)
    }

    pub fn taxi_index(&self, taxi: TaxiId) -> DispatchResult<usize> {
        self.taxis
            .index_of(taxi)
            .ok_or(DispatchError::UnknownTaxi(taxi))
    }

    /// Adopts a fare that a previous dispatcher already priced and allocated.
    /// The taxi is registered if this dispatcher did not know it yet.
    pub fn handover(
        &mut self,
        area: &dyn ServiceArea,
        key: FareKey,
        taxi: TaxiId,
        price: u64,
    ) -> DispatchResult<()> {
        self.check_world(area)?;
        Self::check_nodes(area, &[key.origin, key.destination])?;

        let index = self.taxis.register(taxi);
        let mut entry = FareEntry::new(key);
        entry.price = Some(price);
        entry.taxi = Some(index);
        self.board.insert(entry);
        self.telemetry.fares_recorded += 1;
        info!(fare = %key, %taxi, price, "Fare handed over");
        Ok(())
    }

    // ── World events ─────────────────────────────────────────────────────────

    /// Records a new fare request. A request at an existing
    /// `(origin, destination, time)` replaces the earlier fare.
    pub fn record_fare(
        &mut self,
        area: &dyn ServiceArea,
        origin: Coord,
        destination: Coord,
        time: Tick,
    ) -> DispatchResult<()> {
        self.check_world(area)?;
        Self::check_nodes(area, &[origin, destination])?;

        let key = FareKey::new(origin, destination, time);
        if self.board.record(key).is_some() {
            debug!(fare = %key, "Fare re-announced; previous entry replaced");
        }
        self.telemetry.fares_recorded += 1;
        Ok(())
    }

    /// Drops a fare. The taxi it was allocated to, if any, is told the
    /// commitment is void. Returns the removed fare; absent fares are a no-op.
    pub fn cancel_fare(
        &mut self,
        area: &mut dyn ServiceArea,
        origin: Coord,
        destination: Coord,
        calltime: Tick,
    ) -> DispatchResult<Option<FareEntry>> {
        self.check_world(area)?;

        let key = FareKey::new(origin, destination, calltime);
        let Some(fare) = self.board.remove(&key) else {
            return Ok(None);
        };
        self.telemetry.fares_cancelled += 1;
        info!(fare = %key, "Fare cancelled");

        if let Some(taxi) = self.assigned_taxi(&fare) {
            area.cancel_fare(origin, taxi);
        }
        Ok(Some(fare))
    }

    /// Registers a bid from `taxi` on the open fare at `origin`.
    ///
    /// The first unassigned fare under `origin` (by destination, then call
    /// time) takes the bid; the world only lets one fare per origin be open
    /// at a time. Bids from unregistered taxis, or for origins with no open
    /// fare, are dropped without error. Returns the fare that took the bid.
    pub fn record_bid(&mut self, origin: Coord, taxi: TaxiId) -> Option<FareKey> {
        let Some(index) = self.taxis.index_of(taxi) else {
            debug!(%taxi, %origin, "Bid from unknown taxi ignored");
            self.telemetry.bids_ignored += 1;
            return None;
        };
        let Some(fare) = self.board.first_open_mut(origin) else {
            debug!(%taxi, %origin, "Bid with no open fare ignored");
            self.telemetry.bids_ignored += 1;
            return None;
        };

        if fare.add_bidder(index) {
            self.telemetry.bids_recorded += 1;
        }
        Some(fare.key())
    }

    /// Books a payment for a completed fare.
    pub fn recv_payment(&mut self, area: &dyn ServiceArea, amount: u64) -> DispatchResult<()> {
        self.check_world(area)?;
        self.telemetry.revenue += amount;
        Ok(())
    }

    // ── Control loop ─────────────────────────────────────────────────────────

    fn fleet_snapshot(&self, area: &dyn ServiceArea) -> Vec<TaxiSnapshot> {
        self.taxis
            .iter()
            .filter_map(|(_, taxi)| area.taxi(taxi))
            .collect()
    }

    /// Prices `key` and broadcasts it. No-op for missing or priced fares, so a
    /// fare's price is written at most once.
    fn price_fare(
        &mut self,
        area: &mut dyn ServiceArea,
        key: FareKey,
        fleet: &[TaxiSnapshot],
    ) -> Option<FareQuote> {
        let fare = self.board.get(&key)?;
        if fare.price.is_some() {
            return None;
        }
        let quote = self.pricing.quote(fare, area, fleet);
        self.board.get_mut(&key)?.price = Some(quote.price);

        self.telemetry.fares_priced += 1;
        if quote.is_flat() {
            self.telemetry.flat_priced += 1;
        }
        let listeners = area.broadcast_fare(key.origin, key.destination, quote.price);
        info!(fare = %key, price = quote.price, basis = ?quote.basis, listeners, "Fare priced");
        Some(quote)
    }

    /// Runs bid elimination for one fare once its response window has passed.
    /// Unpriced fares are not open yet. Deferred outcomes leave the fare open
    /// for the next tick.
    pub fn allocate_fare(&mut self, area: &mut dyn ServiceArea, key: FareKey) -> AllocationOutcome {
        let Some(fare) = self.board.get(&key) else {
            return AllocationOutcome::NotOpen;
        };
        if fare.price.is_none() || fare.is_assigned() || fare.bidders().is_empty() {
            return AllocationOutcome::NotOpen;
        }
        let now = area.sim_time();
        if !response_window_elapsed(key.calltime, now, self.config.allocation.response_window_ticks) {
            return AllocationOutcome::NotDue;
        }

        let outcome = select_winner(fare.bidders(), &self.taxis, area, key.destination);
        match outcome {
            AllocationOutcome::Awarded(award) => {
                if let Some(fare) = self.board.get_mut(&key) {
                    fare.taxi = Some(award.index);
                }
                self.telemetry.fares_allocated += 1;
                area.allocate_fare(key.origin, award.taxi);
                info!(fare = %key, taxi = %award.taxi, detour = award.cost, now, "Fare allocated");
            }
            deferred => {
                debug!(fare = %key, outcome = ?deferred, now, "Allocation deferred");
            }
        }
        outcome
    }

    /// One control-loop pass: price every unpriced fare, then try to allocate
    /// every open fare that has bids. A fare priced in this pass waits for the
    /// next one before it can be allocated.
    pub fn on_tick(&mut self, area: &mut dyn ServiceArea) -> DispatchResult<TickSummary> {
        self.check_world(area)?;

        let mut summary = TickSummary::default();
        let mut fleet: Option<Vec<TaxiSnapshot>> = None;

        for key in self.board.keys() {
            let Some(fare) = self.board.get(&key) else {
                continue;
            };
            if fare.price.is_none() {
                let snapshot = fleet.get_or_insert_with(|| self.fleet_snapshot(area));
                if self.price_fare(area, key, snapshot).is_some() {
                    summary.priced += 1;
                }
            } else if !fare.is_assigned() && !fare.bidders().is_empty() {
                match self.allocate_fare(area, key) {
                    AllocationOutcome::Awarded(_) => summary.allocated += 1,
                    outcome if outcome.is_deferred() => summary.deferred += 1,
                    _ => {}
                }
            }
        }

        if summary != TickSummary::default() {
            debug!(
                tick = area.sim_time(),
                priced = summary.priced,
                allocated = summary.allocated,
                deferred = summary.deferred,
                "Dispatch tick"
            );
        }
        Ok(summary)
    }
}
