//! Flood-aware bus simulation
//!
//! This module contains the routing and simulation logic: the stop network,
//! walk search under a rising flood, the per-route walk cache, and the
//! tick-driven bus and passenger model. It runs headless and can be tested
//! from the console.

mod bus;
mod config;
mod elevation;
mod error;
mod flood;
mod network;
mod passenger;
mod scenario;
mod search;
mod shortest_paths;
mod stats;
mod types;
mod walk;
mod walk_cache;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use bus::{BusState, SimBus, StopVisit};
#[allow(unused_imports)]
pub use config::{SimConfig, DEFAULT_END_TIME, DEFAULT_SECONDS_PER_TICK};
#[allow(unused_imports)]
pub use elevation::{ElevationCache, ElevationLookup, FlatElevation};
#[allow(unused_imports)]
pub use error::{ScenarioError, ScenarioResult};
#[allow(unused_imports)]
pub use flood::FloodModel;
#[allow(unused_imports)]
pub use network::SimNetwork;
#[allow(unused_imports)]
pub use passenger::{SimPassenger, TripOutcome};
#[allow(unused_imports)]
pub use scenario::{
    demo_scenario, Demand, Departure, Scenario, ScenarioBuilder, DEMO_INTERCHANGE, DEMO_ORIGIN,
};
#[allow(unused_imports)]
pub use search::{SearchOutcome, WalkSearch, MAX_CONNECTION_REUSE};
#[allow(unused_imports)]
pub use shortest_paths::{ShortestPathTable, UNREACHABLE};
#[allow(unused_imports)]
pub use stats::PassengerOutcomes;
#[allow(unused_imports)]
pub use types::{
    BusId, Connection, ConnectionId, PassengerId, Position, Route, RouteNum, SimTime, Stop,
    StopId, DEFAULT_BUS_CAPACITY,
};
#[allow(unused_imports)]
pub use walk::Walk;
#[allow(unused_imports)]
pub use walk_cache::WalkCache;
pub use world::{BusSnapshot, BusUpdateResult, SimWorld};
