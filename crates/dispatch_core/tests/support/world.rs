use bevy_ecs::prelude::World;
use dispatch_core::area::{Commitment, Coord, ServiceArea, TaxiId, TaxiSnapshot};
use dispatch_core::config::DispatchConfig;
use dispatch_core::dispatcher::Dispatcher;
use dispatch_core::systems::LastDispatchTick;
use dispatch_core::test_helpers::TestArea;

/// Builder for a reproducible area plus a dispatcher that knows its fleet.
#[derive(Debug)]
pub struct TestDispatchBuilder {
    area: TestArea,
    config: DispatchConfig,
    fleet: Vec<TaxiId>,
}

impl TestDispatchBuilder {
    /// `width` x `height` unit-cost grid with a seeded dispatcher.
    pub fn grid(width: i32, height: i32) -> Self {
        Self {
            area: TestArea::grid(width, height),
            config: DispatchConfig::default().with_seed(42),
            fleet: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Places an idle taxi and registers it with the dispatcher.
    pub fn idle_taxi(mut self, id: u64, at: Coord) -> Self {
        self.area.place_taxi(TaxiId(id), TaxiSnapshot::idle(at));
        self.fleet.push(TaxiId(id));
        self
    }

    /// Places a taxi carrying one passenger towards `dropoff`.
    pub fn busy_taxi(mut self, id: u64, at: Coord, dropoff: Coord) -> Self {
        let snapshot = TaxiSnapshot::carrying(
            at,
            vec![dropoff],
            vec![Commitment {
                origin: at,
                destination: dropoff,
            }],
        );
        self.area.place_taxi(TaxiId(id), snapshot);
        self.fleet.push(TaxiId(id));
        self
    }

    pub fn build(self) -> (TestArea, Dispatcher) {
        let dispatcher = Dispatcher::new(self.area.world_id(), self.config).with_taxis(self.fleet);
        (self.area, dispatcher)
    }

    /// Moves the area and dispatcher into a fresh ECS world.
    pub fn build_world(self) -> World {
        let (area, dispatcher) = self.build();
        let mut world = World::new();
        world.insert_resource(area);
        world.insert_resource(dispatcher);
        world.insert_resource(LastDispatchTick::default());
        world
    }
}

/// Runs one dispatch pass at every tick in `from..=to`.
pub fn tick_through(dispatcher: &mut Dispatcher, area: &mut TestArea, from: u64, to: u64) {
    for now in from..=to {
        area.set_time(now);
        dispatcher.on_tick(area).expect("dispatch tick");
    }
}
