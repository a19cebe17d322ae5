use flood_transit::simulation::{
    demo_scenario, ConnectionId, FloodModel, Position, RouteNum, Scenario, SimConfig, SimTime,
    SimWorld, StopId, TripOutcome,
};

/// Origin 1 and interchange 2, both high and dry, joined by a road at 5m.
/// Stop 3 offers a dry detour; stop 4 hangs off the interchange.
fn low_road_scenario(departure: SimTime) -> Scenario {
    let mut builder = Scenario::builder();
    builder
        .stop(1, "Origin", Position::new(0.0, 0.0), 30.0)
        .stop(2, "Interchange", Position::new(0.0, 1.0), 30.0)
        .stop(3, "Ridge", Position::new(1.0, 0.5), 30.0)
        .stop(4, "Hollow", Position::new(0.0, 2.0), 30.0)
        .connection(1, 2, 60.0, 5.0)
        .connection(1, 3, 100.0, 30.0)
        .connection(3, 2, 100.0, 30.0)
        .connection(2, 4, 100.0, 30.0)
        .origin(1)
        .interchange(2)
        .route(1, &[], 600.0)
        .departure(1, departure);
    builder.build().unwrap()
}

fn config() -> SimConfig {
    SimConfig {
        flood: FloodModel::new(0.0, 20.0, 14400.0),
        ..SimConfig::default()
    }
    .with_seconds_per_tick(60.0)
}

#[test]
fn test_low_road_invalidated_when_water_reaches_it() {
    let mut world = SimWorld::new(low_road_scenario(0.0), config()).unwrap();

    let walk = world.get_walk(RouteNum(1), 3480.0).unwrap();
    assert_eq!(walk.len(), 1);

    // Arrival at 3600s is when the water reaches 5m
    assert!(world.get_walk(RouteNum(1), 3540.0).is_none());
    assert!(matches!(world.cached_walk(RouteNum(1)), Some(None)));

    // Abandoned routes stay abandoned
    assert!(world.get_walk(RouteNum(1), 0.0).is_none());
}

#[test]
fn test_tick_abandons_flooded_route_before_next_departure() {
    let mut world = SimWorld::new(low_road_scenario(10_000.0), config()).unwrap();

    while world.time() < 3480.0 {
        world.tick();
    }
    assert_eq!(world.time(), 3480.0);
    assert!(matches!(world.cached_walk(RouteNum(1)), Some(Some(_))));

    // Leaving at 3540s would reach the low road's end as the water hits 5m
    world.tick();
    assert!(matches!(world.cached_walk(RouteNum(1)), Some(None)));
}

#[test]
fn test_tick_reroutes_on_flood_tick() {
    let config = config().with_disaster_resistance(true);
    let mut world = SimWorld::new(low_road_scenario(10_000.0), config).unwrap();

    while world.time() < 3480.0 {
        world.tick();
    }
    let cached = world.cached_walk(RouteNum(1)).cloned().flatten().unwrap();
    assert_eq!(cached.len(), 1);

    world.tick();
    let cached = world.cached_walk(RouteNum(1)).cloned().flatten().unwrap();
    assert_eq!(cached.len(), 2);
}

#[test]
fn test_connection_flooded_through_its_end_stop() {
    let mut builder = Scenario::builder();
    builder
        .stop(1, "Origin", Position::new(0.0, 0.0), 30.0)
        .stop(2, "Interchange", Position::new(0.0, 1.0), 30.0)
        .stop(3, "Creek", Position::new(0.0, 2.0), 3.0)
        .connection(1, 2, 60.0, 5.0)
        .connection(2, 3, 60.0, 25.0)
        .origin(1)
        .interchange(2);
    let mut world = SimWorld::new(builder.build().unwrap(), config()).unwrap();
    assert!(world.flooded_connections().is_empty());

    while world.time() < 2880.0 {
        world.tick();
    }
    assert!((world.water_level() - 4.0).abs() < 1e-9);
    assert!(world.is_stop_flooded(StopId(3)));
    assert!(world.is_connection_flooded(ConnectionId(1)));
    assert!(!world.is_connection_flooded(ConnectionId(0)));
    assert_eq!(world.flooded_connections(), vec![ConnectionId(1)]);
}

#[test]
fn test_disaster_resistant_reroutes_over_ridge() {
    let config = config().with_disaster_resistance(true);
    let mut world = SimWorld::new(low_road_scenario(0.0), config).unwrap();

    assert_eq!(world.get_walk(RouteNum(1), 0.0).unwrap().len(), 1);
    let detour = world.get_walk(RouteNum(1), 3540.0).unwrap();
    assert_eq!(detour.len(), 2);
    assert!(detour.is_valid(StopId(1), &world.network, &world.config.flood, 3540.0, 600.0));
}

#[test]
fn test_unreachable_required_stop_abandons_route() {
    let mut builder = Scenario::builder();
    builder
        .stop(1, "Origin", Position::new(0.0, 0.0), 30.0)
        .stop(2, "Interchange", Position::new(0.0, 1.0), 30.0)
        .stop(3, "Island", Position::new(5.0, 5.0), 30.0)
        .connection(1, 2, 60.0, 30.0)
        .origin(1)
        .interchange(2)
        .route(1, &[3], 600.0)
        .departure(1, 0.0)
        .demand(1, 1, 2, 4);
    let mut world = SimWorld::new(builder.build().unwrap(), config()).unwrap();

    assert!(matches!(world.cached_walk(RouteNum(1)), Some(None)));

    let outcomes = world.run_to_completion();
    assert_eq!(world.buses_without_walk, 1);
    assert_eq!(outcomes.stranded, 4);
    assert_eq!(world.queued_at(StopId(1)), 4);
    assert!(world.get_walk(RouteNum(1), 0.0).is_none());
}

#[test]
fn test_full_bus_leaves_passenger_for_next_bus() {
    let mut builder = Scenario::builder();
    builder
        .stop(1, "Origin", Position::new(0.0, 0.0), 30.0)
        .stop(2, "Interchange", Position::new(0.0, 1.0), 30.0)
        .connection(1, 2, 60.0, 30.0)
        .origin(1)
        .interchange(2)
        .route(1, &[], 600.0)
        .departure(1, 0.0)
        .departure(1, 120.0)
        .demand(1, 1, 2, 3);
    let config = config().with_bus_capacity(2);
    let mut world = SimWorld::new(builder.build().unwrap(), config).unwrap();

    world.tick();
    let snapshots = world.bus_snapshots();
    assert_eq!(snapshots[0].passengers, 2);
    assert_eq!(snapshots[1].passengers, 0);
    // The first two in the queue got the seats
    assert_eq!(world.queued_at(StopId(1)), 1);
    assert!(world.passengers[2].arrived_at.is_none());

    // The second bus picks up the one left behind
    world.tick();
    let snapshots = world.bus_snapshots();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].passengers, 1);
    assert_eq!(world.queued_at(StopId(1)), 0);

    let outcomes = world.run_to_completion();
    assert_eq!(outcomes.arrived_preferred, 3);
    assert_eq!(outcomes.stranded, 0);
    assert_eq!(world.passengers[2].outcome(), TripOutcome::Preferred);
}

#[test]
fn test_passenger_off_walk_alights_at_closest_stop() {
    let mut builder = Scenario::builder();
    builder
        .stop(1, "Origin", Position::new(0.0, 0.0), 30.0)
        .stop(2, "Middle", Position::new(0.0, 1.0), 30.0)
        .stop(3, "Interchange", Position::new(0.0, 2.0), 30.0)
        .stop(4, "Spur", Position::new(1.0, 1.0), 30.0)
        .connection(1, 2, 60.0, 30.0)
        .connection(2, 3, 60.0, 30.0)
        .connection(2, 4, 100.0, 30.0)
        .origin(1)
        .interchange(3)
        .route(1, &[2], 600.0)
        .departure(1, 0.0)
        .demand(1, 1, 4, 1);
    let mut world = SimWorld::new(builder.build().unwrap(), config()).unwrap();

    let outcomes = world.run_to_completion();
    let passenger = &world.passengers[0];
    assert_eq!(passenger.fallback_destination, Some(StopId(2)));
    assert_eq!(passenger.arrived_at, Some(StopId(2)));
    assert_eq!(outcomes.arrived_fallback, 1);
    let minutes = outcomes.mean_fallback_minutes.unwrap();
    assert!((minutes - 100.0 / 60.0).abs() < 1e-9);
}

#[test]
fn test_buses_never_exceed_capacity() {
    let scenario = demo_scenario(11).unwrap();
    let config = SimConfig::default()
        .with_bus_capacity(5)
        .with_disaster_resistance(true);
    let mut world = SimWorld::new(scenario, config).unwrap();

    while !world.is_complete() {
        world.tick();
        for bus in world.bus_snapshots() {
            assert!(bus.passengers <= 5, "bus {:?} overloaded", bus.id);
        }
    }
}

#[test]
fn test_demo_outcomes_are_consistent() {
    let scenario = demo_scenario(5).unwrap();
    let total = scenario.total_demand();
    let config = SimConfig::default().with_disaster_resistance(true);
    let mut world = SimWorld::new(scenario, config).unwrap();

    let outcomes = world.run_to_completion();
    assert_eq!(outcomes.total, total);
    assert_eq!(
        outcomes.arrived_preferred + outcomes.arrived_fallback + outcomes.stranded,
        total
    );

    for passenger in &world.passengers {
        match passenger.outcome() {
            TripOutcome::Fallback => {
                assert_eq!(passenger.arrived_at, passenger.fallback_destination);
            }
            TripOutcome::Preferred => {
                assert_eq!(passenger.arrived_at, Some(passenger.destination));
            }
            TripOutcome::Stranded => assert!(passenger.arrived_at.is_none()),
        }
    }
}
