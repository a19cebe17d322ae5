//! Core types for the flood transit simulation
//!
//! Identifiers, geographic positions and the static network records.

use std::collections::BTreeSet;
use std::fmt;

/// External identifier of a stop, as supplied by the scenario data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopId(pub u32);

/// Index of a connection in the network's connection arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub usize);

/// Bus route number (e.g. 414)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteNum(pub u32);

/// Index of a bus in the world's bus arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusId(pub usize);

/// Index of a passenger in the world's passenger arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassengerId(pub usize);

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stop {}", self.0)
    }
}

impl fmt::Display for RouteNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route {}", self.0)
    }
}

/// Simulation time in seconds since the start of the run
pub type SimTime = f64;

/// A geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn lerp(&self, other: &Position, t: f64) -> Position {
        Position {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }

    /// Point halfway between two positions (used for roadway elevation lookups)
    pub fn midpoint(&self, other: &Position) -> Position {
        self.lerp(other, 0.5)
    }
}

/// A bus stop: vertex of the network graph
#[derive(Debug, Clone)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub position: Position,
    /// Ground elevation in metres
    pub elevation: f64,
}

/// An undirected, time-weighted link between two stops
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub stop_a: StopId,
    pub stop_b: StopId,
    /// Nominal traversal time in seconds
    pub travel_time: f64,
    /// Elevation of the roadway midpoint in metres
    pub elevation: f64,
}

impl Connection {
    /// The stop at the other end of this connection, if `from` is an endpoint
    pub fn other_end(&self, from: StopId) -> Option<StopId> {
        if from == self.stop_a {
            Some(self.stop_b)
        } else if from == self.stop_b {
            Some(self.stop_a)
        } else {
            None
        }
    }
}

/// A bus line: every walk for it must start at `origin` and visit all
/// `required_stops` (in any order) before finishing at the interchange
#[derive(Debug, Clone)]
pub struct Route {
    pub number: RouteNum,
    pub origin: StopId,
    pub required_stops: BTreeSet<StopId>,
    /// Ceiling on the duration of any walk for this route, in seconds
    pub max_walk_duration: f64,
}

/// Default number of seats on a bus
pub const DEFAULT_BUS_CAPACITY: usize = 60;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_interpolates_between_endpoints() {
        let a = Position::new(-27.0, 153.0);
        let b = Position::new(-28.0, 152.0);
        let mid = a.lerp(&b, 0.25);
        assert!((mid.lat - -27.25).abs() < 1e-9);
        assert!((mid.lon - 152.75).abs() < 1e-9);
        assert_eq!(a.midpoint(&b), a.lerp(&b, 0.5));
    }

    #[test]
    fn other_end_only_answers_for_endpoints() {
        let connection = Connection {
            id: ConnectionId(0),
            stop_a: StopId(1),
            stop_b: StopId(2),
            travel_time: 60.0,
            elevation: 10.0,
        };
        assert_eq!(connection.other_end(StopId(1)), Some(StopId(2)));
        assert_eq!(connection.other_end(StopId(2)), Some(StopId(1)));
        assert_eq!(connection.other_end(StopId(3)), None);
    }
}
