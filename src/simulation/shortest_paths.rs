//! All-pairs minimum travel times between stops
//!
//! One Dijkstra run per source stop over the static connection times. Flooding
//! is ignored, so the table is a lower bound on any flood-constrained travel
//! time and serves as the walk search heuristic.

use log::debug;
use petgraph::algo::dijkstra;
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use super::network::SimNetwork;
use super::types::StopId;

/// Distance reported for stop pairs with no path between them
pub const UNREACHABLE: f64 = f64::INFINITY;

#[derive(Debug, Clone, Default)]
pub struct ShortestPathTable {
    min_time: HashMap<StopId, HashMap<StopId, f64>>,
}

impl ShortestPathTable {
    /// Computes the table for every stop in the network
    pub fn compute(network: &SimNetwork) -> Self {
        let graph = network.graph();
        let mut min_time = HashMap::with_capacity(network.stop_count());

        for stop in network.stops() {
            let Some(source) = network.node_index(stop.id) else {
                continue;
            };

            let settled = dijkstra(graph, source, None, |edge| edge.weight().travel_time);

            let row: HashMap<StopId, f64> = settled
                .into_iter()
                .map(|(node, time)| (graph[node], time))
                .collect();
            min_time.insert(stop.id, row);
        }

        debug!(
            "Computed shortest path table for {} stops",
            network.stop_count()
        );

        Self { min_time }
    }

    /// Minimum travel time from `from` to `to`, or [`UNREACHABLE`]
    pub fn distance(&self, from: StopId, to: StopId) -> f64 {
        self.min_time
            .get(&from)
            .and_then(|row| row.get(&to))
            .copied()
            .unwrap_or(UNREACHABLE)
    }

    pub fn is_reachable(&self, from: StopId, to: StopId) -> bool {
        self.distance(from, to).is_finite()
    }
}
