//! End-of-run passenger outcome statistics

use std::fmt;

use super::passenger::{SimPassenger, TripOutcome};
use super::shortest_paths::ShortestPathTable;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassengerOutcomes {
    pub total: usize,
    pub arrived_preferred: usize,
    pub arrived_fallback: usize,
    pub stranded: usize,
    /// Mean drive time in minutes from fallback stops to the preferred ones
    pub mean_fallback_minutes: Option<f64>,
}

impl PassengerOutcomes {
    pub fn from_passengers<'a>(
        passengers: impl IntoIterator<Item = &'a SimPassenger>,
        shortest_paths: &ShortestPathTable,
    ) -> Self {
        let mut outcomes = PassengerOutcomes::default();
        let mut fallback_seconds = 0.0;
        // Fallbacks with no road to the preferred stop are left out of the mean
        let mut fallback_counted = 0usize;

        for passenger in passengers {
            outcomes.total += 1;
            match passenger.outcome() {
                TripOutcome::Preferred => outcomes.arrived_preferred += 1,
                TripOutcome::Stranded => outcomes.stranded += 1,
                TripOutcome::Fallback => {
                    outcomes.arrived_fallback += 1;
                    if let Some(stop) = passenger
                        .arrived_at
                        .filter(|&stop| shortest_paths.is_reachable(stop, passenger.destination))
                    {
                        fallback_seconds += shortest_paths.distance(stop, passenger.destination);
                        fallback_counted += 1;
                    }
                }
            }
        }

        if fallback_counted > 0 {
            outcomes.mean_fallback_minutes =
                Some(fallback_seconds / (fallback_counted as f64 * 60.0));
        }
        outcomes
    }

    /// Share of passengers who reached any stop, in percent
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.arrived_preferred + self.arrived_fallback) as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for PassengerOutcomes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} passengers arrived at their destination",
            self.arrived_preferred
        )?;
        writeln!(f, "{} passengers were stranded", self.stranded)?;
        if let Some(minutes) = self.mean_fallback_minutes {
            writeln!(
                f,
                "{} arrived at a non-preferred stop, on average {:.1} minutes drive from their preferred stop",
                self.arrived_fallback, minutes
            )?;
        }
        write!(f, "Success rate: {:.1}%", self.success_rate())
    }
}
