//! Flood-aware walk search
//!
//! Best-first search from a route's origin to the interchange. Nodes are
//! expanded in order of elapsed time plus the shortest-path distance to the
//! interchange; a node is a solution once it stands at the interchange having
//! visited every required stop of the route. Steps are pruned when flooded at
//! their arrival time, when they would blow the route's time budget, or when
//! they reuse a connection too often.

use log::debug;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};

use super::flood::FloodModel;
use super::network::SimNetwork;
use super::shortest_paths::ShortestPathTable;
use super::types::{Route, SimTime, StopId};
use super::walk::Walk;

/// Most times a connection may appear in a walk outside trail mode
pub const MAX_CONNECTION_REUSE: usize = 2;

/// Result of a walk search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Reaches the interchange having visited every required stop
    Complete(Walk),
    /// Best-effort walk to the interchange missing some required stops
    /// (disaster-resistant mode only)
    Partial(Walk),
    NotFound,
}

impl SearchOutcome {
    pub fn into_walk(self) -> Option<Walk> {
        match self {
            SearchOutcome::Complete(walk) | SearchOutcome::Partial(walk) => Some(walk),
            SearchOutcome::NotFound => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, SearchOutcome::Complete(_))
    }
}

/// An open node of the search
#[derive(Debug, Clone)]
struct SearchNode {
    stop: StopId,
    /// Seconds since the search departure time
    elapsed: f64,
    walk: Walk,
    visited_required: BTreeSet<StopId>,
    /// Elapsed time plus heuristic
    priority: OrderedFloat<f64>,
    /// Insertion order; breaks priority ties first-in-first-out
    sequence: u64,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchNode {}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchNode {
    // BinaryHeap is a max-heap: invert so the lowest priority pops first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Search engine over a read-only network
pub struct WalkSearch<'a> {
    network: &'a SimNetwork,
    shortest_paths: &'a ShortestPathTable,
    flood: &'a FloodModel,
    interchange: StopId,
    disaster_resistant: bool,
}

impl<'a> WalkSearch<'a> {
    pub fn new(
        network: &'a SimNetwork,
        shortest_paths: &'a ShortestPathTable,
        flood: &'a FloodModel,
        interchange: StopId,
        disaster_resistant: bool,
    ) -> Self {
        Self {
            network,
            shortest_paths,
            flood,
            interchange,
            disaster_resistant,
        }
    }

    fn heuristic(&self, stop: StopId) -> f64 {
        self.shortest_paths.distance(stop, self.interchange)
    }

    fn is_complete(&self, node: &SearchNode, route: &Route) -> bool {
        node.stop == self.interchange && route.required_stops.is_subset(&node.visited_required)
    }

    /// Searches for a walk for `route` leaving its origin at `departure`.
    ///
    /// In trail mode no connection may be used twice.
    pub fn search(&self, route: &Route, departure: SimTime, trail: bool) -> SearchOutcome {
        let budget = route.max_walk_duration;
        let mut sequence = 0u64;

        let mut root_visited = BTreeSet::new();
        if route.required_stops.contains(&route.origin) {
            root_visited.insert(route.origin);
        }
        let root = SearchNode {
            stop: route.origin,
            elapsed: 0.0,
            walk: Walk::default(),
            visited_required: root_visited,
            priority: OrderedFloat(self.heuristic(route.origin)),
            sequence,
        };

        let mut open = BinaryHeap::new();
        open.push(root);
        let mut best_incomplete: Option<SearchNode> = None;
        let mut expanded = 0usize;

        while let Some(node) = open.pop() {
            expanded += 1;

            if self.is_complete(&node, route) {
                debug!(
                    "{}: found walk of {} connections ({:.0}s) after {} expansions",
                    route.number,
                    node.walk.len(),
                    node.elapsed,
                    expanded
                );
                return SearchOutcome::Complete(node.walk);
            }

            if node.stop == self.interchange {
                let improves = best_incomplete
                    .as_ref()
                    .map_or(true, |best| {
                        node.visited_required.len() > best.visited_required.len()
                    });
                if improves {
                    best_incomplete = Some(node.clone());
                }
            }

            for &connection_id in self.network.connections_for_stop(node.stop) {
                let previous_uses = node.walk.occurrences(connection_id);
                if trail && previous_uses > 0 {
                    continue;
                }
                if previous_uses + 1 > MAX_CONNECTION_REUSE {
                    continue;
                }

                let Some(connection) = self.network.get_connection(connection_id) else {
                    continue;
                };
                let Some(next_stop) = connection.other_end(node.stop) else {
                    continue;
                };
                let Some(stop) = self.network.get_stop(next_stop) else {
                    continue;
                };

                let Some(arrival) =
                    self.flood
                        .step_arrival(connection, stop, departure + node.elapsed)
                else {
                    continue;
                };
                let next_elapsed = arrival - departure;
                if next_elapsed > budget {
                    continue;
                }

                let priority = next_elapsed + self.heuristic(next_stop);
                if priority > budget {
                    continue;
                }

                let mut visited_required = node.visited_required.clone();
                if route.required_stops.contains(&next_stop) {
                    visited_required.insert(next_stop);
                }

                sequence += 1;
                open.push(SearchNode {
                    stop: next_stop,
                    elapsed: next_elapsed,
                    walk: node.walk.extended(connection_id),
                    visited_required,
                    priority: OrderedFloat(priority),
                    sequence,
                });
            }
        }

        debug!(
            "{}: no complete walk from t={:.0}s after {} expansions",
            route.number, departure, expanded
        );

        match best_incomplete {
            Some(best) if self.disaster_resistant => SearchOutcome::Partial(best.walk),
            _ => SearchOutcome::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::types::{ConnectionId, Position, RouteNum, Stop};

    const O: StopId = StopId(1);
    const A: StopId = StopId(2);
    const B: StopId = StopId(3);
    const I: StopId = StopId(4);
    const C: StopId = StopId(5);

    /// O - A - I main line, with B hanging off A and a low detour O - C - I
    fn network() -> SimNetwork {
        let mut network = SimNetwork::new();
        for (id, elevation) in [(O, 30.0), (A, 30.0), (B, 30.0), (I, 30.0), (C, 30.0)] {
            network
                .add_stop(Stop {
                    id,
                    name: String::new(),
                    position: Position::default(),
                    elevation,
                })
                .unwrap();
        }
        network.add_connection(O, A, 300.0, 30.0).unwrap(); // 0
        network.add_connection(A, I, 300.0, 30.0).unwrap(); // 1
        network.add_connection(A, B, 200.0, 30.0).unwrap(); // 2
        network.add_connection(O, C, 250.0, 2.0).unwrap(); // 3
        network.add_connection(C, I, 250.0, 30.0).unwrap(); // 4
        network
    }

    fn route(required: &[StopId], budget: f64) -> Route {
        Route {
            number: RouteNum(414),
            origin: O,
            required_stops: required.iter().copied().collect(),
            max_walk_duration: budget,
        }
    }

    fn search(
        network: &SimNetwork,
        route: &Route,
        departure: SimTime,
        trail: bool,
        disaster_resistant: bool,
    ) -> SearchOutcome {
        let table = ShortestPathTable::compute(network);
        let flood = FloodModel::default();
        WalkSearch::new(network, &table, &flood, I, disaster_resistant)
            .search(route, departure, trail)
    }

    #[test]
    fn prefers_fastest_walk_covering_required_stops() {
        let network = network();
        let outcome = search(&network, &route(&[O, I], 3600.0), 0.0, false, false);
        assert_eq!(
            outcome,
            SearchOutcome::Complete(Walk::new(vec![ConnectionId(3), ConnectionId(4)]))
        );

        let outcome = search(&network, &route(&[O, A, I], 3600.0), 0.0, false, false);
        assert_eq!(
            outcome,
            SearchOutcome::Complete(Walk::new(vec![ConnectionId(0), ConnectionId(1)]))
        );
    }

    #[test]
    fn dead_end_required_stop_needs_connection_reuse() {
        let network = network();
        let r = route(&[O, A, B, I], 3600.0);

        let walk = search(&network, &r, 0.0, false, false)
            .into_walk()
            .expect("walk with backtracking");
        assert_eq!(
            walk.connections(),
            &[ConnectionId(0), ConnectionId(2), ConnectionId(2), ConnectionId(1)]
        );

        // trail mode forbids the A-B-A backtrack
        assert_eq!(search(&network, &r, 0.0, true, false), SearchOutcome::NotFound);
    }

    #[test]
    fn flooded_detour_is_avoided() {
        let network = network();
        // O-C road (2m) floods at 1440s
        let outcome = search(&network, &route(&[O, I], 3600.0), 1500.0, false, false);
        assert_eq!(
            outcome,
            SearchOutcome::Complete(Walk::new(vec![ConnectionId(0), ConnectionId(1)]))
        );
    }

    #[test]
    fn budget_prunes_walks() {
        let network = network();
        let r = route(&[O, A, I], 500.0);
        assert_eq!(search(&network, &r, 0.0, false, false), SearchOutcome::NotFound);
    }

    #[test]
    fn disaster_mode_falls_back_to_best_partial_walk() {
        let network = network();
        let r = route(&[O, A, B, I], 3600.0);
        let outcome = search(&network, &r, 0.0, true, true);
        match outcome {
            SearchOutcome::Partial(walk) => {
                let stops = walk.stops(O, &network).unwrap();
                assert_eq!(stops.last(), Some(&I));
                assert!(stops.contains(&A));
            }
            other => panic!("expected partial walk, got {:?}", other),
        }
    }

    #[test]
    fn unreachable_interchange_is_not_found_even_in_disaster_mode() {
        let network = network();
        let table = ShortestPathTable::compute(&network);
        // rises above every stop and road in the network
        let flood = FloodModel::new(0.0, 40.0, 3600.0);
        let outcome = WalkSearch::new(&network, &table, &flood, I, true).search(
            &route(&[O, I], 3600.0),
            4000.0,
            false,
        );
        assert_eq!(outcome, SearchOutcome::NotFound);
    }

    #[test]
    fn returned_walks_replay_within_budget_and_cover_required_stops() {
        let network = network();
        let flood = FloodModel::default();
        for departure in [0.0, 600.0, 1500.0, 3000.0] {
            for trail in [false, true] {
                let r = route(&[O, A, B, I], 3600.0);
                let outcome = search(&network, &r, departure, trail, false);
                if let SearchOutcome::Complete(walk) = outcome {
                    assert!(walk.is_valid(O, &network, &flood, departure, r.max_walk_duration));
                    let stops = walk.stops(O, &network).unwrap();
                    assert!(r.required_stops.iter().all(|s| stops.contains(s)));
                    if trail {
                        let unique: BTreeSet<_> = walk.connections().iter().collect();
                        assert_eq!(unique.len(), walk.len());
                    }
                }
            }
        }
    }
}
