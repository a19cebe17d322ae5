//! Flood model: water level as a function of elapsed time
//!
//! The level rises linearly from `start_level` to `end_level` over `duration`
//! seconds and is clamped at `end_level` afterwards.

use super::types::{Connection, SimTime, Stop};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloodModel {
    /// Water level at time zero, in metres
    pub start_level: f64,
    /// Water level once the flood has fully risen, in metres
    pub end_level: f64,
    /// Seconds taken to rise from `start_level` to `end_level`
    pub duration: SimTime,
}

impl FloodModel {
    pub fn new(start_level: f64, end_level: f64, duration: SimTime) -> Self {
        Self {
            start_level,
            end_level,
            duration,
        }
    }

    /// Water level at the given elapsed time
    pub fn water_level(&self, time: SimTime) -> f64 {
        if time <= 0.0 {
            return self.start_level;
        }
        if self.duration <= 0.0 || time >= self.duration {
            return self.end_level;
        }
        let rise = (self.end_level - self.start_level) * (time / self.duration);
        (self.start_level + rise).min(self.end_level)
    }

    /// A location is flooded out once the water reaches its elevation
    pub fn is_flooded(&self, elevation: f64, time: SimTime) -> bool {
        elevation <= self.water_level(time)
    }

    pub fn is_stop_flooded(&self, stop: &Stop, time: SimTime) -> bool {
        self.is_flooded(stop.elevation, time)
    }

    pub fn is_connection_flooded(&self, connection: &Connection, time: SimTime) -> bool {
        self.is_flooded(connection.elevation, time)
    }

    /// Checks a single hop along `connection` into `destination`, leaving at
    /// `departure`.
    ///
    /// Both the roadway and the destination stop are tested at the predicted
    /// arrival time. Returns the arrival time if the hop can be made.
    pub fn step_arrival(
        &self,
        connection: &Connection,
        destination: &Stop,
        departure: SimTime,
    ) -> Option<SimTime> {
        let arrival = departure + connection.travel_time;
        let level = self.water_level(arrival);
        if connection.elevation <= level || destination.elevation <= level {
            return None;
        }
        Some(arrival)
    }
}

impl Default for FloodModel {
    fn default() -> Self {
        Self::new(0.0, 20.0, 4.0 * 60.0 * 60.0)
    }
}
