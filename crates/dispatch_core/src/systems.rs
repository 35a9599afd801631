//! ECS integration: the dispatcher control loop as a `bevy_ecs` system.
//!
//! The [`Dispatcher`] and the world's [`ServiceArea`] both live in the ECS
//! `World` as resources. The scheduler hands the system exclusive access to
//! both, which serializes every board mutation.

use bevy_ecs::prelude::{Res, ResMut, Resource};
use tracing::warn;

use crate::area::ServiceArea;
use crate::dispatcher::{Dispatcher, TickSummary};

/// Result of the most recent dispatch pass. Optional; insert it to observe
/// ticks from outside the schedule.
#[derive(Debug, Clone, Copy, Default, Resource)]
pub struct LastDispatchTick(pub TickSummary);

/// Run condition: the board has at least one fare waiting for a taxi.
pub fn has_open_fares(dispatcher: Option<Res<Dispatcher>>) -> bool {
    dispatcher
        .map(|d| d.board().open_count() > 0)
        .unwrap_or(false)
}

pub fn dispatch_tick_system<A: ServiceArea + Resource>(
    mut dispatcher: ResMut<Dispatcher>,
    mut area: ResMut<A>,
    last: Option<ResMut<LastDispatchTick>>,
) {
    match dispatcher.on_tick(&mut *area) {
        Ok(summary) => {
            if let Some(mut last) = last {
                last.0 = summary;
            }
        }
        Err(err) => warn!(%err, "Dispatch tick skipped"),
    }
}
