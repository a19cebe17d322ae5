//! Per-route walk cache and reroute policy
//!
//! Each route remembers the last walk computed for it. A cached walk is reused
//! while it still replays cleanly against the flood; once it fails, the route
//! is either re-searched (disaster-resistant mode) or abandoned for good.

use log::{info, warn};
use std::collections::HashMap;

use super::flood::FloodModel;
use super::network::SimNetwork;
use super::search::WalkSearch;
use super::types::{Route, RouteNum, SimTime};
use super::walk::Walk;

#[derive(Debug, Clone, Default)]
pub struct WalkCache {
    /// `None` marks a route with no walk; it is never searched again
    entries: HashMap<RouteNum, Option<Walk>>,
    disaster_resistant: bool,
    trail: bool,
}

impl WalkCache {
    pub fn new(disaster_resistant: bool, trail: bool) -> Self {
        Self {
            entries: HashMap::new(),
            disaster_resistant,
            trail,
        }
    }

    /// Searches every route leaving at `time` and caches the results
    pub fn prime<'r>(
        &mut self,
        routes: impl IntoIterator<Item = &'r Route>,
        search: &WalkSearch<'_>,
        time: SimTime,
    ) {
        for route in routes {
            let walk = self.search(route, time, search);
            if walk.is_none() {
                warn!("{} has no walk at t={:.0}s", route.number, time);
            }
            self.entries.insert(route.number, walk);
        }
    }

    fn search(&self, route: &Route, time: SimTime, search: &WalkSearch<'_>) -> Option<Walk> {
        let outcome = search.search(route, time, self.trail);
        let complete = outcome.is_complete();
        let walk = outcome.into_walk();
        if walk.is_some() && !complete {
            info!(
                "{} cannot visit every required stop at t={:.0}s; running a partial walk",
                route.number, time
            );
        }
        walk
    }

    /// The cached entry for a route: `None` if never searched,
    /// `Some(None)` if the route has been abandoned
    pub fn cached(&self, route: RouteNum) -> Option<&Option<Walk>> {
        self.entries.get(&route)
    }

    /// Returns the walk `route` should use when leaving its origin at `time`
    pub fn get_walk(
        &mut self,
        route: &Route,
        time: SimTime,
        network: &SimNetwork,
        flood: &FloodModel,
        search: &WalkSearch<'_>,
    ) -> Option<Walk> {
        let cached = match self.entries.get(&route.number) {
            Some(None) => return None,
            Some(Some(walk)) => walk.clone(),
            None => {
                let walk = self.search(route, time, search);
                self.entries.insert(route.number, walk.clone());
                return walk;
            }
        };

        if cached.is_valid(route.origin, network, flood, time, route.max_walk_duration) {
            return Some(cached);
        }

        let replacement = if self.disaster_resistant {
            let walk = self.search(route, time, search);
            match &walk {
                Some(walk) => info!(
                    "{} rerouted at t={:.0}s ({} connections)",
                    route.number,
                    time,
                    walk.len()
                ),
                None => warn!("{} has no flood-free walk at t={:.0}s", route.number, time),
            }
            walk
        } else {
            warn!(
                "{} walk flooded at t={:.0}s; route abandoned",
                route.number, time
            );
            None
        };

        self.entries.insert(route.number, replacement.clone());
        replacement
    }
}
