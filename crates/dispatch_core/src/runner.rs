//! Tick runner: drives the dispatch schedule against an ECS `World`.
//!
//! The world owns the clock. After every schedule run the caller's `advance`
//! hook moves the area resource forward one tick (and can apply whatever
//! else the world does between ticks: moving taxis, placing bids).

use bevy_ecs::prelude::{Resource, Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;

use crate::area::ServiceArea;
use crate::dispatcher::Dispatcher;
use crate::systems::{dispatch_tick_system, has_open_fares};

/// Schedule with the dispatch control loop for area type `A`. The loop is
/// skipped on ticks where the board has no open fare.
pub fn dispatch_schedule<A: ServiceArea + Resource>() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(dispatch_tick_system::<A>.run_if(has_open_fares));
    schedule
}

/// Runs `ticks` dispatch passes, calling `advance` on the area after each.
pub fn run_ticks<A, F>(world: &mut World, schedule: &mut Schedule, ticks: u64, mut advance: F)
where
    A: ServiceArea + Resource,
    F: FnMut(&mut A),
{
    for _ in 0..ticks {
        schedule.run(world);
        let mut area = world.resource_mut::<A>();
        advance(&mut *area);
    }
}

/// Runs dispatch passes until no open fare is left or `max_ticks` is hit.
/// Returns the number of ticks executed.
pub fn run_until_settled<A, F>(
    world: &mut World,
    schedule: &mut Schedule,
    max_ticks: u64,
    mut advance: F,
) -> u64
where
    A: ServiceArea + Resource,
    F: FnMut(&mut A),
{
    let mut ticks = 0;
    while ticks < max_ticks && open_fares(world) > 0 {
        schedule.run(world);
        let mut area = world.resource_mut::<A>();
        advance(&mut *area);
        ticks += 1;
    }
    ticks
}

fn open_fares(world: &World) -> usize {
    world
        .get_resource::<Dispatcher>()
        .map(|d| d.board().open_count())
        .unwrap_or(0)
}
