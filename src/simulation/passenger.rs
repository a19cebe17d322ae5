//! Passengers waiting for, riding and leaving buses

use super::shortest_paths::ShortestPathTable;
use super::types::{PassengerId, RouteNum, StopId};

/// How a passenger's trip ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripOutcome {
    /// Alighted at the stop they wanted
    Preferred,
    /// Alighted at the nearest reachable stop instead
    Fallback,
    /// Never alighted (still queued, or aboard when the run ended)
    Stranded,
}

#[derive(Debug, Clone)]
pub struct SimPassenger {
    pub id: PassengerId,
    pub route: RouteNum,
    pub origin: StopId,
    pub destination: StopId,
    /// Only set when `destination` is not on the boarded bus's walk
    pub fallback_destination: Option<StopId>,
    /// Stop the passenger alighted at, once they have
    pub arrived_at: Option<StopId>,
}

impl SimPassenger {
    pub fn new(id: PassengerId, route: RouteNum, origin: StopId, destination: StopId) -> Self {
        Self {
            id,
            route,
            origin,
            destination,
            fallback_destination: None,
            arrived_at: None,
        }
    }

    /// Called when boarding a bus that can reach `reachable` (in walk order).
    ///
    /// If the preferred destination is unreachable, picks the reachable stop
    /// closest to it by travel time; the first one wins ties.
    pub fn assign_destination(&mut self, reachable: &[StopId], shortest_paths: &ShortestPathTable) {
        if reachable.contains(&self.destination) {
            self.fallback_destination = None;
            return;
        }

        let mut best: Option<(StopId, f64)> = None;
        for &stop in reachable {
            let distance = shortest_paths.distance(stop, self.destination);
            if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                best = Some((stop, distance));
            }
        }
        self.fallback_destination = best.map(|(stop, _)| stop);
    }

    pub fn should_alight(&self, stop: StopId) -> bool {
        stop == self.destination || self.fallback_destination == Some(stop)
    }

    pub fn outcome(&self) -> TripOutcome {
        match self.arrived_at {
            Some(stop) if stop == self.destination => TripOutcome::Preferred,
            Some(_) => TripOutcome::Fallback,
            None => TripOutcome::Stranded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::network::SimNetwork;
    use crate::simulation::types::{Position, Stop};

    /// Line 1 - 2 - 3 - 4
    fn table() -> ShortestPathTable {
        let mut network = SimNetwork::new();
        for id in 1..=4 {
            network
                .add_stop(Stop {
                    id: StopId(id),
                    name: String::new(),
                    position: Position::default(),
                    elevation: 10.0,
                })
                .unwrap();
        }
        for id in 1..4 {
            network
                .add_connection(StopId(id), StopId(id + 1), 60.0 * id as f64, 10.0)
                .unwrap();
        }
        ShortestPathTable::compute(&network)
    }

    #[test]
    fn reachable_destination_gets_no_fallback() {
        let mut passenger = SimPassenger::new(PassengerId(0), RouteNum(1), StopId(1), StopId(3));
        passenger.assign_destination(&[StopId(1), StopId(2), StopId(3)], &table());
        assert_eq!(passenger.fallback_destination, None);
        assert!(passenger.should_alight(StopId(3)));
        assert!(!passenger.should_alight(StopId(2)));
    }

    #[test]
    fn unreachable_destination_falls_back_to_nearest_stop() {
        let mut passenger = SimPassenger::new(PassengerId(0), RouteNum(1), StopId(1), StopId(4));
        passenger.assign_destination(&[StopId(1), StopId(2)], &table());
        assert_eq!(passenger.fallback_destination, Some(StopId(2)));
        assert!(passenger.should_alight(StopId(2)));

        passenger.arrived_at = Some(StopId(2));
        assert_eq!(passenger.outcome(), TripOutcome::Fallback);
    }

    #[test]
    fn outcome_tracks_arrival() {
        let mut passenger = SimPassenger::new(PassengerId(0), RouteNum(1), StopId(1), StopId(4));
        assert_eq!(passenger.outcome(), TripOutcome::Stranded);
        passenger.arrived_at = Some(StopId(4));
        assert_eq!(passenger.outcome(), TripOutcome::Preferred);
    }
}
