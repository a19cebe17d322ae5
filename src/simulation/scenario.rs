//! Scenario input: stops, connections, routes, bus schedule and demand
//!
//! Data loaders feed a [`ScenarioBuilder`]; `build` validates every reference
//! so a scenario that reaches the simulation never points at a missing stop
//! or route.

use anyhow::{Context, Result};
use log::info;
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use sorted_vec::SortedVec;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::elevation::ElevationLookup;
use super::error::{ScenarioError, ScenarioResult};
use super::network::SimNetwork;
use super::types::{Position, Route, RouteNum, SimTime, Stop, StopId};

/// A scheduled bus departure from the origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Departure {
    pub time: OrderedFloat<SimTime>,
    pub route: RouteNum,
}

/// Number of riders wanting to travel `origin` -> `destination` on `route`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Demand {
    pub route: RouteNum,
    pub origin: StopId,
    pub destination: StopId,
    pub count: usize,
}

#[derive(Debug, Clone)]
struct ConnectionSpec {
    a: StopId,
    b: StopId,
    travel_time: f64,
    elevation: f64,
}

#[derive(Debug, Clone)]
struct RouteSpec {
    number: RouteNum,
    required: Vec<StopId>,
    max_walk_duration: f64,
}

/// A validated scenario, ready to simulate
pub struct Scenario {
    pub network: SimNetwork,
    pub origin: StopId,
    pub interchange: StopId,
    pub routes: BTreeMap<RouteNum, Route>,
    /// Departures in time order
    pub departures: SortedVec<Departure>,
    pub demand: Vec<Demand>,
}

impl Scenario {
    pub fn builder() -> ScenarioBuilder {
        ScenarioBuilder::default()
    }

    pub fn total_demand(&self) -> usize {
        self.demand.iter().map(|d| d.count).sum()
    }
}

#[derive(Default)]
pub struct ScenarioBuilder {
    stops: Vec<Stop>,
    connections: Vec<ConnectionSpec>,
    routes: Vec<RouteSpec>,
    departures: Vec<Departure>,
    demand: Vec<Demand>,
    origin: Option<StopId>,
    interchange: Option<StopId>,
}

impl ScenarioBuilder {
    pub fn stop(
        &mut self,
        id: u32,
        name: &str,
        position: Position,
        elevation: f64,
    ) -> &mut Self {
        self.stops.push(Stop {
            id: StopId(id),
            name: name.to_string(),
            position,
            elevation,
        });
        self
    }

    /// Adds a stop whose elevation comes from `lookup`
    pub fn stop_at(
        &mut self,
        id: u32,
        name: &str,
        position: Position,
        lookup: &mut impl ElevationLookup,
    ) -> Result<&mut Self> {
        let elevation = lookup
            .elevation(position)
            .with_context(|| format!("Elevation lookup failed for stop {}", id))?;
        Ok(self.stop(id, name, position, elevation))
    }

    pub fn connection(&mut self, a: u32, b: u32, travel_time: f64, elevation: f64) -> &mut Self {
        self.connections.push(ConnectionSpec {
            a: StopId(a),
            b: StopId(b),
            travel_time,
            elevation,
        });
        self
    }

    /// Adds a connection whose elevation is looked up at the roadway midpoint
    pub fn connection_via(
        &mut self,
        a: u32,
        b: u32,
        travel_time: f64,
        lookup: &mut impl ElevationLookup,
    ) -> Result<&mut Self> {
        let position_of = |id: u32| {
            self.stops
                .iter()
                .find(|stop| stop.id == StopId(id))
                .map(|stop| stop.position)
                .ok_or_else(|| ScenarioError::UnknownStop {
                    stop: StopId(id),
                    context: "connection".to_string(),
                })
        };
        let midpoint = position_of(a)?.midpoint(&position_of(b)?);
        let elevation = lookup
            .elevation(midpoint)
            .with_context(|| format!("Elevation lookup failed for connection {}-{}", a, b))?;
        Ok(self.connection(a, b, travel_time, elevation))
    }

    /// Sets the fixed origin every route starts from
    pub fn origin(&mut self, id: u32) -> &mut Self {
        self.origin = Some(StopId(id));
        self
    }

    /// Sets the fixed interchange every route ends at
    pub fn interchange(&mut self, id: u32) -> &mut Self {
        self.interchange = Some(StopId(id));
        self
    }

    /// Adds a route; the origin and interchange are always required
    pub fn route(&mut self, number: u32, required: &[u32], max_walk_duration: f64) -> &mut Self {
        self.routes.push(RouteSpec {
            number: RouteNum(number),
            required: required.iter().copied().map(StopId).collect(),
            max_walk_duration,
        });
        self
    }

    pub fn departure(&mut self, route: u32, time: SimTime) -> &mut Self {
        self.departures.push(Departure {
            time: OrderedFloat(time),
            route: RouteNum(route),
        });
        self
    }

    /// Departures every `headway` seconds from `first` up to and including `last`.
    ///
    /// A series that cannot end degrades to the single departure at `first`.
    pub fn departures_every(&mut self, route: u32, first: SimTime, last: SimTime, headway: f64) -> &mut Self {
        if !(headway > 0.0) || !headway.is_finite() || !first.is_finite() || !last.is_finite() {
            return self.departure(route, first);
        }
        let mut time = first;
        while time <= last {
            self.departure(route, time);
            time += headway;
        }
        self
    }

    pub fn demand(&mut self, route: u32, origin: u32, destination: u32, count: usize) -> &mut Self {
        self.demand.push(Demand {
            route: RouteNum(route),
            origin: StopId(origin),
            destination: StopId(destination),
            count,
        });
        self
    }

    /// Validates all references and builds the network
    pub fn build(self) -> ScenarioResult<Scenario> {
        let mut network = SimNetwork::new();
        for stop in self.stops {
            network.add_stop(stop)?;
        }
        for spec in &self.connections {
            network.add_connection(spec.a, spec.b, spec.travel_time, spec.elevation)?;
        }

        let origin = self.origin.ok_or(ScenarioError::MissingTerminal("origin"))?;
        let interchange = self
            .interchange
            .ok_or(ScenarioError::MissingTerminal("interchange"))?;
        let check_stop = |stop: StopId, context: String| {
            if network.contains_stop(stop) {
                Ok(())
            } else {
                Err(ScenarioError::UnknownStop { stop, context })
            }
        };
        check_stop(origin, "origin".to_string())?;
        check_stop(interchange, "interchange".to_string())?;

        let mut routes = BTreeMap::new();
        for spec in self.routes {
            if routes.contains_key(&spec.number) {
                return Err(ScenarioError::DuplicateRoute(spec.number));
            }
            if !spec.max_walk_duration.is_finite() || spec.max_walk_duration <= 0.0 {
                return Err(ScenarioError::InvalidWalkBudget {
                    route: spec.number,
                    duration: spec.max_walk_duration,
                });
            }
            let mut required = BTreeSet::from([origin, interchange]);
            for stop in spec.required {
                check_stop(stop, spec.number.to_string())?;
                required.insert(stop);
            }
            routes.insert(
                spec.number,
                Route {
                    number: spec.number,
                    origin,
                    required_stops: required,
                    max_walk_duration: spec.max_walk_duration,
                },
            );
        }

        let known_routes: HashSet<RouteNum> = routes.keys().copied().collect();
        for departure in &self.departures {
            if !departure.time.into_inner().is_finite() {
                return Err(ScenarioError::InvalidDepartureTime {
                    route: departure.route,
                    time: departure.time.into_inner(),
                });
            }
            if !known_routes.contains(&departure.route) {
                return Err(ScenarioError::UnknownRoute {
                    route: departure.route,
                    context: "bus schedule".to_string(),
                });
            }
        }
        for demand in &self.demand {
            if !known_routes.contains(&demand.route) {
                return Err(ScenarioError::UnknownRoute {
                    route: demand.route,
                    context: "passenger demand".to_string(),
                });
            }
            check_stop(demand.origin, "passenger demand".to_string())?;
            check_stop(demand.destination, "passenger demand".to_string())?;
        }

        Ok(Scenario {
            network,
            origin,
            interchange,
            routes,
            departures: SortedVec::from_unsorted(self.departures),
            demand: self.demand,
        })
    }
}

/// Chancellors Place, the origin of every demo route
pub const DEMO_ORIGIN: u32 = 1799;
/// Indooroopilly interchange, where every demo route ends
pub const DEMO_INTERCHANGE: u32 = 2205;

/// Demo routes: number, stops in service order, walk budget in minutes
const DEMO_ROUTES: [(u32, &[u32], f64); 4] = [
    (414, &[1, 2, 3, 9], 47.0),
    (427, &[4, 5, 7], 38.0),
    (428, &[1, 3, 6, 8], 42.0),
    (432, &[4, 6, 7], 37.0),
];

/// A small network between a university campus and a shopping-centre
/// interchange, with low-lying roads that flood part way through the run.
///
/// Passenger demand is drawn from a seeded RNG so runs are reproducible.
pub fn demo_scenario(seed: u64) -> ScenarioResult<Scenario> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = Scenario::builder();

    builder
        .stop(DEMO_ORIGIN, "Chancellors Place", Position::new(-27.4975, 153.0137), 25.0)
        .stop(1, "Sir Fred Schonell Dr", Position::new(-27.4960, 153.0080), 12.0)
        .stop(2, "Carmody Rd", Position::new(-27.4990, 153.0020), 8.0)
        .stop(3, "Swann Rd", Position::new(-27.5010, 152.9960), 18.0)
        .stop(4, "Ironside", Position::new(-27.4930, 153.0010), 30.0)
        .stop(5, "Toowong Village", Position::new(-27.4850, 152.9920), 6.0)
        .stop(6, "Coonan St", Position::new(-27.4960, 152.9860), 14.0)
        .stop(7, "Taringa Station", Position::new(-27.4910, 152.9790), 22.0)
        .stop(8, "Moggill Rd", Position::new(-27.4975, 152.9780), 10.0)
        .stop(9, "Indooroopilly Rd", Position::new(-27.5030, 152.9830), 4.0)
        .stop(DEMO_INTERCHANGE, "Indooroopilly Interchange", Position::new(-27.4990, 152.9730), 28.0)
        .origin(DEMO_ORIGIN)
        .interchange(DEMO_INTERCHANGE);

    let links: [(u32, u32, f64, f64); 15] = [
        (DEMO_ORIGIN, 1, 180.0, 20.0),
        (1, 2, 240.0, 9.0),
        (2, 3, 300.0, 15.0),
        (3, 9, 360.0, 5.0),
        (9, DEMO_INTERCHANGE, 300.0, 7.0),
        (DEMO_ORIGIN, 4, 240.0, 26.0),
        (4, 5, 420.0, 7.0),
        (5, 7, 360.0, 18.0),
        (7, DEMO_INTERCHANGE, 240.0, 24.0),
        (4, 6, 480.0, 16.0),
        (6, 7, 300.0, 13.0),
        (6, 8, 240.0, 11.0),
        (8, DEMO_INTERCHANGE, 180.0, 12.0),
        (3, 6, 300.0, 15.0),
        (1, 4, 200.0, 14.0),
    ];
    for (a, b, time, elevation) in links {
        builder.connection(a, b, time, elevation);
    }

    for (number, stops, budget_minutes) in DEMO_ROUTES {
        builder
            .route(number, stops, budget_minutes * 60.0)
            .departures_every(number, 0.0, 2.0 * 60.0 * 60.0, 20.0 * 60.0);

        let mut service: Vec<u32> = Vec::with_capacity(stops.len() + 2);
        service.push(DEMO_ORIGIN);
        service.extend_from_slice(stops);
        service.push(DEMO_INTERCHANGE);
        for (i, &from) in service.iter().enumerate() {
            for &to in &service[i + 1..] {
                let count = rng.random_range(0..12);
                if count > 0 {
                    builder.demand(number, from, to, count);
                }
            }
        }
    }

    let scenario = builder.build()?;
    info!(
        "Demo scenario: {} stops, {} connections, {} routes, {} departures, {} passengers",
        scenario.network.stop_count(),
        scenario.network.connection_count(),
        scenario.routes.len(),
        scenario.departures.len(),
        scenario.total_demand()
    );
    Ok(scenario)
}
