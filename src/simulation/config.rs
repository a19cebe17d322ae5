//! Simulation parameters

use super::flood::FloodModel;
use super::types::{SimTime, DEFAULT_BUS_CAPACITY};

/// Default simulated seconds per tick
pub const DEFAULT_SECONDS_PER_TICK: f64 = 120.0;

/// Default simulation horizon: four hours
pub const DEFAULT_END_TIME: SimTime = 4.0 * 60.0 * 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub flood: FloodModel,
    pub seconds_per_tick: f64,
    /// The run is complete once the clock reaches this time
    pub end_time: SimTime,
    /// Re-search walks when the cached one floods instead of abandoning the route
    pub disaster_resistant: bool,
    /// Forbid any connection from appearing twice in a searched walk
    pub trail: bool,
    pub bus_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            flood: FloodModel::default(),
            seconds_per_tick: DEFAULT_SECONDS_PER_TICK,
            end_time: DEFAULT_END_TIME,
            disaster_resistant: false,
            trail: true,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}

impl SimConfig {
    pub fn with_disaster_resistance(mut self, enabled: bool) -> Self {
        self.disaster_resistant = enabled;
        self
    }

    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    pub fn with_seconds_per_tick(mut self, seconds: f64) -> Self {
        self.seconds_per_tick = seconds;
        self
    }
}
