//! Main simulation world that ties everything together
//!
//! Owns the network, the walk cache and the bus/passenger arenas, and drives
//! the tick loop: advance the clock, raise the water, revalidate the walks of
//! active routes, then move every bus.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use super::bus::{BusState, SimBus};
use super::config::SimConfig;
use super::network::SimNetwork;
use super::passenger::SimPassenger;
use super::scenario::Scenario;
use super::search::WalkSearch;
use super::shortest_paths::ShortestPathTable;
use super::stats::PassengerOutcomes;
use super::types::{
    BusId, Connection, ConnectionId, PassengerId, Position, Route, RouteNum, SimTime, StopId,
};
use super::walk::Walk;
use super::walk_cache::WalkCache;

/// Result of a bus update indicating what the world should do with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusUpdateResult {
    Continue,
    Finished,
}

/// Read-only view of a bus for reporting and rendering
#[derive(Debug, Clone, PartialEq)]
pub struct BusSnapshot {
    pub id: BusId,
    pub route: RouteNum,
    pub state: BusState,
    pub position: Position,
    pub current_stop: StopId,
    pub passengers: usize,
}

/// The main simulation world
pub struct SimWorld {
    /// Stop/connection graph
    pub network: SimNetwork,

    /// Minimum travel times between all stops
    pub shortest_paths: ShortestPathTable,

    pub routes: BTreeMap<RouteNum, Route>,

    pub config: SimConfig,

    origin: StopId,
    interchange: StopId,

    walk_cache: WalkCache,

    /// Buses still scheduled or running
    pub buses: BTreeMap<BusId, SimBus>,

    /// Every passenger, indexed by `PassengerId`
    pub passengers: Vec<SimPassenger>,

    /// Passengers waiting at each stop, in arrival order
    stop_queues: HashMap<StopId, VecDeque<PassengerId>>,

    /// Simulation time
    pub time: SimTime,

    water_level: f64,

    pub buses_completed: usize,

    /// Buses that found no usable walk when due to depart
    pub buses_without_walk: usize,
}

impl SimWorld {
    pub fn new(scenario: Scenario, config: SimConfig) -> Result<Self> {
        if !(config.seconds_per_tick > 0.0) {
            anyhow::bail!(
                "seconds per tick must be positive, got {}",
                config.seconds_per_tick
            );
        }

        let Scenario {
            network,
            origin,
            interchange,
            routes,
            departures,
            demand,
        } = scenario;

        let shortest_paths = ShortestPathTable::compute(&network);

        let mut walk_cache = WalkCache::new(config.disaster_resistant, config.trail);
        {
            let search = WalkSearch::new(
                &network,
                &shortest_paths,
                &config.flood,
                interchange,
                config.disaster_resistant,
            );
            walk_cache.prime(routes.values(), &search, 0.0);
        }

        let origin_position = *network
            .get_stop_position(origin)
            .context("Origin stop not found")?;

        let mut buses = BTreeMap::new();
        for (index, departure) in departures.iter().enumerate() {
            let id = BusId(index);
            buses.insert(
                id,
                SimBus::new(
                    id,
                    departure.route,
                    origin,
                    origin_position,
                    departure.time.into_inner(),
                    config.bus_capacity,
                ),
            );
        }

        let mut passengers = Vec::new();
        let mut stop_queues: HashMap<StopId, VecDeque<PassengerId>> = HashMap::new();
        for entry in &demand {
            for _ in 0..entry.count {
                let id = PassengerId(passengers.len());
                passengers.push(SimPassenger::new(id, entry.route, entry.origin, entry.destination));
                stop_queues.entry(entry.origin).or_default().push_back(id);
            }
        }

        info!(
            "World ready: {} routes, {} buses, {} passengers",
            routes.len(),
            buses.len(),
            passengers.len()
        );

        let water_level = config.flood.water_level(0.0);

        Ok(Self {
            network,
            shortest_paths,
            routes,
            config,
            origin,
            interchange,
            walk_cache,
            buses,
            passengers,
            stop_queues,
            time: 0.0,
            water_level,
            buses_completed: 0,
            buses_without_walk: 0,
        })
    }

    pub fn origin(&self) -> StopId {
        self.origin
    }

    pub fn interchange(&self) -> StopId {
        self.interchange
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn water_level(&self) -> f64 {
        self.water_level
    }

    /// Walk `route` should use when leaving the origin at `time`.
    ///
    /// May re-search or abandon the route per the reroute policy.
    pub fn get_walk(&mut self, route: RouteNum, time: SimTime) -> Option<Walk> {
        let route = self.routes.get(&route)?;
        let search = WalkSearch::new(
            &self.network,
            &self.shortest_paths,
            &self.config.flood,
            self.interchange,
            self.config.disaster_resistant,
        );
        self.walk_cache
            .get_walk(route, time, &self.network, &self.config.flood, &search)
    }

    /// Cached walk state for a route without revalidating it
    pub fn cached_walk(&self, route: RouteNum) -> Option<&Option<Walk>> {
        self.walk_cache.cached(route)
    }

    /// Number of passengers waiting at a stop
    pub fn queued_at(&self, stop: StopId) -> usize {
        self.stop_queues.get(&stop).map_or(0, VecDeque::len)
    }

    pub fn is_stop_flooded(&self, stop: StopId) -> bool {
        self.network
            .get_stop(stop)
            .is_some_and(|stop| self.config.flood.is_stop_flooded(stop, self.time))
    }

    /// A connection is flooded when its roadway or either end stop is
    pub fn is_connection_flooded(&self, connection: ConnectionId) -> bool {
        self.network
            .get_connection(connection)
            .is_some_and(|c| self.connection_unusable(c))
    }

    fn connection_unusable(&self, connection: &Connection) -> bool {
        self.config.flood.is_connection_flooded(connection, self.time)
            || [connection.stop_a, connection.stop_b]
                .into_iter()
                .any(|stop| self.is_stop_flooded(stop))
    }

    pub fn flooded_stops(&self) -> Vec<StopId> {
        self.network
            .stops()
            .iter()
            .filter(|stop| self.config.flood.is_stop_flooded(stop, self.time))
            .map(|stop| stop.id)
            .collect()
    }

    pub fn flooded_connections(&self) -> Vec<ConnectionId> {
        self.network
            .connections()
            .iter()
            .filter(|c| self.connection_unusable(c))
            .map(|c| c.id)
            .collect()
    }

    pub fn bus_snapshots(&self) -> Vec<BusSnapshot> {
        self.buses
            .values()
            .map(|bus| BusSnapshot {
                id: bus.id,
                route: bus.route,
                state: bus.state,
                position: bus.position,
                current_stop: bus.current_stop,
                passengers: bus.passengers.len(),
            })
            .collect()
    }

    /// All buses done, or the time horizon reached
    pub fn is_complete(&self) -> bool {
        self.buses.is_empty() || self.time >= self.config.end_time
    }

    pub fn passenger_outcomes(&self) -> PassengerOutcomes {
        PassengerOutcomes::from_passengers(&self.passengers, &self.shortest_paths)
    }

    /// Main simulation tick
    pub fn tick(&mut self) {
        let delta_secs = self.config.seconds_per_tick;
        self.time += delta_secs;
        self.water_level = self.config.flood.water_level(self.time);

        self.refresh_walks();
        self.update_buses(delta_secs);
    }

    /// Revalidates the cached walk of every route that still has a bus
    /// scheduled or running, so flooding is acted on the tick it happens.
    fn refresh_walks(&mut self) {
        let active: BTreeSet<RouteNum> = self.buses.values().map(|bus| bus.route).collect();
        for route in active {
            self.get_walk(route, self.time);
        }
    }

    /// Ticks until complete and returns the passenger outcomes
    pub fn run_to_completion(&mut self) -> PassengerOutcomes {
        while !self.is_complete() {
            self.tick();
        }
        info!("=== SIMULATION COMPLETE ===");
        info!("Elapsed time: {:.0}s", self.time);
        info!("Buses completed: {}", self.buses_completed);
        info!("Buses without a walk: {}", self.buses_without_walk);
        self.passenger_outcomes()
    }

    /// Update all buses in the simulation
    fn update_buses(&mut self, delta_secs: f64) {
        let bus_ids: Vec<BusId> = self.buses.keys().copied().collect();

        for bus_id in bus_ids {
            let Some(mut bus) = self.buses.remove(&bus_id) else {
                continue;
            };

            match self.update_bus(&mut bus, delta_secs) {
                Ok(BusUpdateResult::Continue) => {
                    self.buses.insert(bus_id, bus);
                }
                Ok(BusUpdateResult::Finished) => {
                    if !bus.passengers.is_empty() {
                        debug!(
                            "Bus {:?} finished with {} passengers stranded aboard",
                            bus_id.0,
                            bus.passengers.len()
                        );
                    }
                    self.buses_completed += 1;
                }
                Err(e) => {
                    warn!("Bus {:?} on {} retired: {:#}", bus_id.0, bus.route, e);
                    self.buses_completed += 1;
                }
            }
        }
    }

    fn update_bus(&mut self, bus: &mut SimBus, delta_secs: f64) -> Result<BusUpdateResult> {
        let stops_to_visit = match bus.state {
            BusState::Scheduled => {
                if !bus.is_due(self.time) {
                    return Ok(BusUpdateResult::Continue);
                }
                let route = self.routes.get(&bus.route).context("Route not found")?;
                let search = WalkSearch::new(
                    &self.network,
                    &self.shortest_paths,
                    &self.config.flood,
                    self.interchange,
                    self.config.disaster_resistant,
                );
                let walk = self.walk_cache.get_walk(
                    route,
                    self.time,
                    &self.network,
                    &self.config.flood,
                    &search,
                );
                if walk.is_none() {
                    self.buses_without_walk += 1;
                    debug!("Bus {:?} on {} has no walk", bus.id.0, bus.route);
                } else {
                    debug!("Bus {:?} on {} departs at t={:.0}s", bus.id.0, bus.route, self.time);
                }
                bus.depart(walk, &self.network)?
            }
            BusState::Departed => bus.advance(delta_secs, &self.network)?,
            BusState::Done => return Ok(BusUpdateResult::Finished),
        };

        for stop in stops_to_visit {
            let visit = bus.visit_stop(
                stop,
                &mut self.passengers,
                self.stop_queues.get_mut(&stop),
                &self.shortest_paths,
            );
            if visit.alighted > 0 || visit.boarded > 0 {
                debug!(
                    "Bus {:?} at {}: {} off, {} on",
                    bus.id.0, stop, visit.alighted, visit.boarded
                );
            }
        }

        if bus.is_done() {
            Ok(BusUpdateResult::Finished)
        } else {
            Ok(BusUpdateResult::Continue)
        }
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Flood Transit Summary ===");
        println!(
            "Origin: {}, Interchange: {}",
            self.origin(),
            self.interchange()
        );
        println!(
            "Time: {:.0}s, Water level: {:.2}m",
            self.time, self.water_level
        );
        println!(
            "Stops: {}, Connections: {}",
            self.network.stop_count(),
            self.network.connection_count()
        );
        println!(
            "Active buses: {}, Completed: {}",
            self.buses.len(),
            self.buses_completed
        );

        println!("--- Routes ---");
        for number in self.routes.keys() {
            let status = match self.walk_cache.cached(*number) {
                Some(Some(walk)) => format!(
                    "{} connections, {:.0} min nominal",
                    walk.len(),
                    walk.nominal_duration(&self.network) / 60.0
                ),
                Some(None) => "no walk".to_string(),
                None => "not searched".to_string(),
            };
            println!("  {}: {}", number, status);
        }

        let departed: Vec<&SimBus> = self
            .buses
            .values()
            .filter(|bus| bus.state == BusState::Departed)
            .collect();
        if !departed.is_empty() {
            println!("--- Buses en route ---");
            for bus in departed {
                println!(
                    "  Bus {:?} ({}): at ({:.4}, {:.4}), passengers={}/{}, connections_remaining={}",
                    bus.id.0,
                    bus.route,
                    bus.position.lat,
                    bus.position.lon,
                    bus.passengers.len(),
                    bus.capacity,
                    bus.remaining_connections()
                );
            }
        }

        let flooded = self.flooded_stops();
        if !flooded.is_empty() {
            let names: Vec<&str> = flooded
                .iter()
                .filter_map(|id| self.network.get_stop(*id))
                .map(|stop| stop.name.as_str())
                .collect();
            println!("--- Flooded stops ---");
            println!("  {}", names.join(", "));
        }
        println!(
            "Flooded connections: {}/{}",
            self.flooded_connections().len(),
            self.network.connection_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::scenario::demo_scenario;

    #[test]
    fn rejects_non_positive_tick() {
        let scenario = demo_scenario(1).unwrap();
        let config = SimConfig::default().with_seconds_per_tick(0.0);
        assert!(SimWorld::new(scenario, config).is_err());
    }

    #[test]
    fn demo_world_runs_to_completion() {
        let scenario = demo_scenario(3).unwrap();
        let total = scenario.total_demand();
        let mut world = SimWorld::new(scenario, SimConfig::default()).unwrap();

        assert!(world.routes.keys().all(|r| matches!(world.cached_walk(*r), Some(Some(_)))));

        let outcomes = world.run_to_completion();
        assert!(world.is_complete());
        assert_eq!(outcomes.total, total);
        assert_eq!(
            outcomes.arrived_preferred + outcomes.arrived_fallback + outcomes.stranded,
            total
        );
        assert!(outcomes.arrived_preferred > 0);
    }

    #[test]
    fn water_level_follows_clock() {
        let scenario = demo_scenario(3).unwrap();
        let mut world = SimWorld::new(scenario, SimConfig::default()).unwrap();
        for _ in 0..30 {
            world.tick();
        }
        assert_eq!(world.time, 3600.0);
        assert!((world.water_level() - 5.0).abs() < 1e-9);
        // Indooroopilly Rd sits at 4m
        assert!(world.is_stop_flooded(StopId(9)));
        assert!(world.flooded_stops().contains(&StopId(9)));
    }
}
