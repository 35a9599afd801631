use bevy_ecs::prelude::{Schedule, World};
use dispatch_core::runner::{dispatch_schedule, run_ticks, run_until_settled};
use dispatch_core::test_helpers::TestArea;

/// Owns a reusable dispatch schedule so tests can step or drain the board.
pub struct DispatchRunner {
    schedule: Schedule,
}

impl Default for DispatchRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchRunner {
    pub fn new() -> Self {
        Self {
            schedule: dispatch_schedule::<TestArea>(),
        }
    }

    /// Runs `ticks` passes, advancing the area clock after each.
    pub fn step(&mut self, world: &mut World, ticks: u64) {
        run_ticks::<TestArea, _>(world, &mut self.schedule, ticks, TestArea::advance);
    }

    /// Runs until every fare is assigned or `max_ticks` passes have run.
    pub fn settle(&mut self, world: &mut World, max_ticks: u64) -> u64 {
        run_until_settled::<TestArea, _>(world, &mut self.schedule, max_ticks, TestArea::advance)
    }
}
