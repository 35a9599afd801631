//! Drive a small city through the dispatch schedule and print telemetry.
//!
//! Run with: RUST_LOG=dispatch_core=debug cargo run -p dispatch_core --example dispatch_run

use bevy_ecs::prelude::{Mut, World};
use dispatch_core::area::{Commitment, Coord, ServiceArea, TaxiId, TaxiSnapshot};
use dispatch_core::config::DispatchConfig;
use dispatch_core::dispatcher::Dispatcher;
use dispatch_core::runner::dispatch_schedule;
use dispatch_core::test_helpers::TestArea;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

const GRID: i32 = 30;
const NUM_TAXIS: u64 = 12;
const TICKS: u64 = 120;
/// Taxis within this many ticks of a fare's origin bid on it.
const BID_RADIUS: u64 = 15;

fn random_node(rng: &mut StdRng) -> Coord {
    Coord::new(rng.gen_range(0..GRID), rng.gen_range(0..GRID))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let mut rng = StdRng::seed_from_u64(123);
    let mut area = TestArea::grid(GRID, GRID);
    for id in 0..NUM_TAXIS {
        area.place_taxi(TaxiId(id), TaxiSnapshot::idle(random_node(&mut rng)));
    }
    let dispatcher = Dispatcher::new(area.world_id(), DispatchConfig::default().with_seed(123))
        .with_taxis((0..NUM_TAXIS).map(TaxiId));

    let mut world = World::new();
    world.insert_resource(area);
    world.insert_resource(dispatcher);
    let mut schedule = dispatch_schedule::<TestArea>();

    // Trips in progress: taxi, destination, arrival tick, price.
    let mut trips: Vec<(TaxiId, Coord, u64, u64)> = Vec::new();
    let mut seen_broadcasts = 0;
    let mut seen_allocations = 0;

    for now in 0..TICKS {
        world.resource_scope(|world, mut dispatcher: Mut<Dispatcher>| {
            let mut area = world.resource_mut::<TestArea>();
            area.set_time(now);

            if now % 4 == 0 {
                let origin = random_node(&mut rng);
                let destination = random_node(&mut rng);
                if let Err(err) = dispatcher.record_fare(&*area, origin, destination, now) {
                    eprintln!("fare rejected: {err}");
                }
            }

            trips.retain(|&(taxi, destination, arrival, price)| {
                if arrival > now {
                    return true;
                }
                area.place_taxi(taxi, TaxiSnapshot::idle(destination));
                if let Err(err) = dispatcher.recv_payment(&*area, price) {
                    eprintln!("payment rejected: {err}");
                }
                false
            });
        });

        schedule.run(&mut world);

        world.resource_scope(|world, mut dispatcher: Mut<Dispatcher>| {
            let mut area = world.resource_mut::<TestArea>();

            // Idle taxis near a freshly broadcast fare bid on it.
            let broadcasts = area.broadcasts[seen_broadcasts..].to_vec();
            seen_broadcasts = area.broadcasts.len();
            for broadcast in broadcasts {
                for id in 0..NUM_TAXIS {
                    let Some(snapshot) = area.taxi(TaxiId(id)) else {
                        continue;
                    };
                    let close = area
                        .travel_time(snapshot.location, broadcast.origin)
                        .is_some_and(|t| t <= BID_RADIUS);
                    if close && !snapshot.has_passenger {
                        dispatcher.record_bid(broadcast.origin, TaxiId(id));
                    }
                }
            }

            // Winners drive to the origin and on to the destination.
            let allocations = area.allocations[seen_allocations..].to_vec();
            seen_allocations = area.allocations.len();
            for (origin, taxi) in allocations {
                // The same taxi may have won older fares from this origin.
                let Some(fare) = dispatcher
                    .board()
                    .iter()
                    .filter(|f| f.origin() == origin && dispatcher.assigned_taxi(f) == Some(taxi))
                    .max_by_key(|f| f.calltime())
                else {
                    continue;
                };
                let destination = fare.destination();
                let price = fare.price.unwrap_or_default();
                let Some(snapshot) = area.taxi(taxi) else {
                    continue;
                };
                let duration = area
                    .travel_time(snapshot.location, origin)
                    .zip(area.travel_time(origin, destination))
                    .map(|(pickup, ride)| pickup + ride)
                    .unwrap_or(0);
                area.place_taxi(
                    taxi,
                    TaxiSnapshot::carrying(
                        snapshot.location,
                        vec![origin, destination],
                        vec![Commitment {
                            origin,
                            destination,
                        }],
                    ),
                );
                trips.push((taxi, destination, now + duration, price));
            }
        });
    }

    let dispatcher = world.resource::<Dispatcher>();
    println!(
        "--- Dispatch run ({} taxis, {} ticks, seed 123) ---",
        NUM_TAXIS, TICKS
    );
    println!("Fares left on the board: {}", dispatcher.board().len());
    println!("Fares still open: {}", dispatcher.board().open_count());
    match serde_json::to_string_pretty(dispatcher.telemetry()) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("telemetry not serializable: {err}"),
    }
    if let Some(avg) = dispatcher.telemetry().revenue_per_allocation() {
        println!("Revenue per allocation: {avg:.1}");
    }
}
