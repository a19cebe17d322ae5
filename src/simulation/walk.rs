//! Walks: ordered connection sequences starting at a route's origin

use anyhow::{Context, Result};

use super::flood::FloodModel;
use super::network::SimNetwork;
use super::types::{ConnectionId, SimTime, StopId};

/// An ordered sequence of connections from a route's origin.
///
/// Consecutive connections share an endpoint; the stop sequence is recovered
/// by walking the connections from the origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Walk {
    connections: Vec<ConnectionId>,
}

impl Walk {
    pub fn new(connections: Vec<ConnectionId>) -> Self {
        Self { connections }
    }

    pub fn connections(&self) -> &[ConnectionId] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Number of times `connection` appears in the walk
    pub fn occurrences(&self, connection: ConnectionId) -> usize {
        self.connections.iter().filter(|&&c| c == connection).count()
    }

    /// Returns a copy of this walk extended by one connection
    pub fn extended(&self, connection: ConnectionId) -> Walk {
        let mut connections = Vec::with_capacity(self.connections.len() + 1);
        connections.extend_from_slice(&self.connections);
        connections.push(connection);
        Walk { connections }
    }

    /// Stops visited in order, starting with `origin`
    pub fn stops(&self, origin: StopId, network: &SimNetwork) -> Result<Vec<StopId>> {
        let mut stops = Vec::with_capacity(self.connections.len() + 1);
        let mut current = origin;
        stops.push(current);

        for &connection_id in &self.connections {
            let connection = network
                .get_connection(connection_id)
                .with_context(|| format!("Connection {:?} not found", connection_id))?;
            current = connection.other_end(current).with_context(|| {
                format!(
                    "Connection {:?} does not continue the walk from {:?}",
                    connection_id, current
                )
            })?;
            stops.push(current);
        }

        Ok(stops)
    }

    /// Total nominal travel time ignoring flooding
    pub fn nominal_duration(&self, network: &SimNetwork) -> f64 {
        self.connections
            .iter()
            .filter_map(|&id| network.get_connection(id))
            .map(|connection| connection.travel_time)
            .sum()
    }

    /// Replays the walk from `origin` leaving at `start_time`.
    ///
    /// Every step is checked against the flood at its own arrival time and
    /// the cumulative time must stay within `budget`. Returns the arrival time
    /// at the final stop, or `None` as soon as a step fails.
    pub fn replay(
        &self,
        origin: StopId,
        network: &SimNetwork,
        flood: &FloodModel,
        start_time: SimTime,
        budget: f64,
    ) -> Option<SimTime> {
        let mut time = start_time;
        let mut current = origin;

        for &connection_id in &self.connections {
            let connection = network.get_connection(connection_id)?;
            let next = connection.other_end(current)?;
            let next_stop = network.get_stop(next)?;

            time = flood.step_arrival(connection, next_stop, time)?;
            if time - start_time > budget {
                return None;
            }
            current = next;
        }

        Some(time)
    }

    pub fn is_valid(
        &self,
        origin: StopId,
        network: &SimNetwork,
        flood: &FloodModel,
        start_time: SimTime,
        budget: f64,
    ) -> bool {
        self.replay(origin, network, flood, start_time, budget).is_some()
    }
}
