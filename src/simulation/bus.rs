//! Bus movement and boarding logic

use anyhow::{Context, Result};
use std::collections::VecDeque;

use super::network::SimNetwork;
use super::passenger::SimPassenger;
use super::shortest_paths::ShortestPathTable;
use super::types::{BusId, ConnectionId, PassengerId, Position, RouteNum, SimTime, StopId};
use super::walk::Walk;

/// Lifecycle of a bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusState {
    /// Waiting for its departure time
    Scheduled,
    /// Travelling along its walk
    Departed,
    /// Walk finished (or never usable); ready to be removed
    Done,
}

/// What happened at a single stop visit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopVisit {
    pub alighted: usize,
    pub boarded: usize,
}

/// A bus running one scheduled departure of a route
#[derive(Debug, Clone)]
pub struct SimBus {
    pub id: BusId,
    pub route: RouteNum,
    pub departure_time: SimTime,
    pub capacity: usize,
    pub state: BusState,
    pub position: Position,
    /// Passengers currently aboard, in boarding order
    pub passengers: Vec<PassengerId>,
    /// The stop the bus is at, or last left
    pub current_stop: StopId,
    /// Connections still to traverse; the head is the one in progress
    walk: VecDeque<ConnectionId>,
    /// Seconds spent on the connection in progress
    hop_elapsed: f64,
    /// Stops visited so far, in order
    visited_stops: Vec<StopId>,
    /// Every stop on the walk taken at departure, in walk order without repeats
    reachable_stops: Vec<StopId>,
}

impl SimBus {
    pub fn new(
        id: BusId,
        route: RouteNum,
        origin: StopId,
        origin_position: Position,
        departure_time: SimTime,
        capacity: usize,
    ) -> Self {
        Self {
            id,
            route,
            departure_time,
            capacity,
            state: BusState::Scheduled,
            position: origin_position,
            passengers: Vec::new(),
            current_stop: origin,
            walk: VecDeque::new(),
            hop_elapsed: 0.0,
            visited_stops: Vec::new(),
            reachable_stops: Vec::new(),
        }
    }

    pub fn is_due(&self, now: SimTime) -> bool {
        self.state == BusState::Scheduled && now >= self.departure_time
    }

    pub fn is_done(&self) -> bool {
        self.state == BusState::Done
    }

    pub fn visited_stops(&self) -> &[StopId] {
        &self.visited_stops
    }

    pub fn reachable_stops(&self) -> &[StopId] {
        &self.reachable_stops
    }

    pub fn remaining_connections(&self) -> usize {
        self.walk.len()
    }

    pub fn free_seats(&self) -> usize {
        self.capacity.saturating_sub(self.passengers.len())
    }

    /// Starts the bus on its working copy of `walk`.
    ///
    /// Returns the stops to visit right away (the origin), or nothing if the
    /// walk is missing or empty, in which case the bus is done.
    pub fn depart(&mut self, walk: Option<Walk>, network: &SimNetwork) -> Result<Vec<StopId>> {
        let walk = match walk {
            Some(walk) if !walk.is_empty() => walk,
            _ => {
                self.state = BusState::Done;
                return Ok(Vec::new());
            }
        };

        let mut reachable = Vec::new();
        for stop in walk.stops(self.current_stop, network)? {
            if !reachable.contains(&stop) {
                reachable.push(stop);
            }
        }

        self.reachable_stops = reachable;
        self.walk = walk.connections().iter().copied().collect();
        self.hop_elapsed = 0.0;
        self.state = BusState::Departed;
        self.visited_stops.push(self.current_stop);
        if let Some(position) = network.get_stop_position(self.current_stop) {
            self.position = *position;
        }

        Ok(vec![self.current_stop])
    }

    /// Moves the bus `delta_secs` further along its walk.
    ///
    /// Several connections may be completed in one call. Returns the stops
    /// arrived at, in order; the bus is done once the walk is exhausted.
    pub fn advance(&mut self, delta_secs: f64, network: &SimNetwork) -> Result<Vec<StopId>> {
        let mut arrivals = Vec::new();
        if self.state != BusState::Departed {
            return Ok(arrivals);
        }

        self.hop_elapsed += delta_secs;

        while let Some(&connection_id) = self.walk.front() {
            let connection = network
                .get_connection(connection_id)
                .context("Connection not found")?;
            if self.hop_elapsed < connection.travel_time {
                break;
            }

            let next_stop = connection
                .other_end(self.current_stop)
                .context("Walk is not contiguous")?;
            self.hop_elapsed -= connection.travel_time;
            self.walk.pop_front();
            self.current_stop = next_stop;
            self.visited_stops.push(next_stop);
            arrivals.push(next_stop);
        }

        let start_pos = *network
            .get_stop_position(self.current_stop)
            .context("Current stop not found")?;

        match self.walk.front() {
            None => {
                self.state = BusState::Done;
                self.hop_elapsed = 0.0;
                self.position = start_pos;
            }
            Some(&connection_id) => {
                let connection = network
                    .get_connection(connection_id)
                    .context("Connection not found")?;
                let target = connection
                    .other_end(self.current_stop)
                    .context("Walk is not contiguous")?;
                let end_pos = *network
                    .get_stop_position(target)
                    .context("Target stop not found")?;
                let progress_ratio = self.hop_elapsed / connection.travel_time;
                self.position = start_pos.lerp(&end_pos, progress_ratio);
            }
        }

        Ok(arrivals)
    }

    /// Lets riders off at `stop`, then boards waiting riders of this route in
    /// queue order until the bus is full.
    pub fn visit_stop(
        &mut self,
        stop: StopId,
        passengers: &mut [SimPassenger],
        queue: Option<&mut VecDeque<PassengerId>>,
        shortest_paths: &ShortestPathTable,
    ) -> StopVisit {
        let mut visit = StopVisit::default();

        self.passengers.retain(|id| match passengers.get_mut(id.0) {
            Some(passenger) if passenger.should_alight(stop) => {
                passenger.arrived_at = Some(stop);
                visit.alighted += 1;
                false
            }
            _ => true,
        });

        let Some(queue) = queue else {
            return visit;
        };

        let mut seats = self.free_seats();
        let mut still_waiting = VecDeque::with_capacity(queue.len());
        for passenger_id in queue.drain(..) {
            let boards = seats > 0
                && passengers
                    .get(passenger_id.0)
                    .is_some_and(|p| p.route == self.route);
            if !boards {
                still_waiting.push_back(passenger_id);
                continue;
            }
            if let Some(passenger) = passengers.get_mut(passenger_id.0) {
                passenger.assign_destination(&self.reachable_stops, shortest_paths);
            }
            self.passengers.push(passenger_id);
            seats -= 1;
            visit.boarded += 1;
        }
        *queue = still_waiting;

        visit
    }
}
