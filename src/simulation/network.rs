//! Stop/connection graph of the bus network
//!
//! Connections are undirected; the graph is built once from a validated
//! scenario and is read-only for the rest of the run.

use anyhow::{Context, Result};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;

use super::error::{ScenarioError, ScenarioResult};
use super::types::{Connection, ConnectionId, Position, Stop, StopId};

/// Edge data for the network graph
#[derive(Debug, Clone, Copy)]
pub struct ConnectionEdge {
    pub connection_id: ConnectionId,
    pub travel_time: f64,
}

impl ConnectionEdge {
    pub fn from_connection(connection: &Connection) -> Self {
        Self {
            connection_id: connection.id,
            travel_time: connection.travel_time,
        }
    }
}

/// Bus network graph
#[derive(Default)]
pub struct SimNetwork {
    /// The underlying petgraph undirected graph
    graph: UnGraph<StopId, ConnectionEdge>,

    /// Maps stop IDs to their node indices in the graph
    stop_to_node: HashMap<StopId, NodeIndex>,

    /// Storage for stop data, in insertion order
    stops: Vec<Stop>,

    /// Maps stop IDs to their index in `stops`
    stop_index: HashMap<StopId, usize>,

    /// Connection arena, indexed by `ConnectionId`
    connections: Vec<Connection>,

    /// Cached incident connections per stop, in insertion order
    adjacency: HashMap<StopId, Vec<ConnectionId>>,
}

impl SimNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stop to the network graph
    pub fn add_stop(&mut self, stop: Stop) -> ScenarioResult<()> {
        if self.stop_to_node.contains_key(&stop.id) {
            return Err(ScenarioError::DuplicateStop(stop.id));
        }

        let node_index = self.graph.add_node(stop.id);
        self.stop_to_node.insert(stop.id, node_index);
        self.stop_index.insert(stop.id, self.stops.len());
        self.adjacency.insert(stop.id, Vec::new());
        self.stops.push(stop);
        Ok(())
    }

    /// Adds an undirected connection between two existing stops
    pub fn add_connection(
        &mut self,
        stop_a: StopId,
        stop_b: StopId,
        travel_time: f64,
        elevation: f64,
    ) -> ScenarioResult<ConnectionId> {
        if stop_a == stop_b {
            return Err(ScenarioError::SelfLoop(stop_a));
        }
        if !travel_time.is_finite() || travel_time <= 0.0 {
            return Err(ScenarioError::InvalidTravelTime {
                a: stop_a,
                b: stop_b,
                time: travel_time,
            });
        }

        let node_a = self.node_for(stop_a, "connection")?;
        let node_b = self.node_for(stop_b, "connection")?;

        if self.graph.find_edge(node_a, node_b).is_some() {
            return Err(ScenarioError::DuplicateConnection(stop_a, stop_b));
        }

        let id = ConnectionId(self.connections.len());
        let connection = Connection {
            id,
            stop_a,
            stop_b,
            travel_time,
            elevation,
        };
        self.graph
            .add_edge(node_a, node_b, ConnectionEdge::from_connection(&connection));
        self.connections.push(connection);

        self.adjacency.entry(stop_a).or_default().push(id);
        self.adjacency.entry(stop_b).or_default().push(id);

        Ok(id)
    }

    fn node_for(&self, stop: StopId, context: &str) -> ScenarioResult<NodeIndex> {
        self.stop_to_node
            .get(&stop)
            .copied()
            .ok_or_else(|| ScenarioError::UnknownStop {
                stop,
                context: context.to_string(),
            })
    }

    /// Gets a stop by ID
    pub fn get_stop(&self, stop_id: StopId) -> Option<&Stop> {
        self.stop_index.get(&stop_id).map(|&index| &self.stops[index])
    }

    pub fn contains_stop(&self, stop_id: StopId) -> bool {
        self.stop_to_node.contains_key(&stop_id)
    }

    /// Gets the position of a stop
    pub fn get_stop_position(&self, stop_id: StopId) -> Option<&Position> {
        self.get_stop(stop_id).map(|stop| &stop.position)
    }

    /// Gets a connection by ID
    pub fn get_connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(connection_id.0)
    }

    /// Finds the connection joining two stops, in either direction
    pub fn find_connection_between(&self, a: StopId, b: StopId) -> Result<ConnectionId> {
        let node_a = self
            .stop_to_node
            .get(&a)
            .ok_or_else(|| anyhow::anyhow!("Stop {:?} not found", a))?;
        let node_b = self
            .stop_to_node
            .get(&b)
            .ok_or_else(|| anyhow::anyhow!("Stop {:?} not found", b))?;

        let edge = self
            .graph
            .find_edge(*node_a, *node_b)
            .with_context(|| format!("No connection between {:?} and {:?}", a, b))?;

        Ok(self.graph[edge].connection_id)
    }

    /// Connections incident to a stop; empty for unknown stops
    pub fn connections_for_stop(&self, stop_id: StopId) -> &[ConnectionId] {
        self.adjacency
            .get(&stop_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All stops, in the order they were added
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// All connections, indexed by `ConnectionId`
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub(crate) fn graph(&self) -> &UnGraph<StopId, ConnectionEdge> {
        &self.graph
    }

    pub(crate) fn node_index(&self, stop_id: StopId) -> Option<NodeIndex> {
        self.stop_to_node.get(&stop_id).copied()
    }

    /// Get number of stops
    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    /// Get number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
