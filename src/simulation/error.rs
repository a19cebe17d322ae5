//! Scenario validation errors.

use thiserror::Error;

use super::types::{RouteNum, StopId};

/// Reasons a scenario is rejected before the simulation starts
#[derive(Debug, Error, PartialEq)]
pub enum ScenarioError {
    #[error("{0} is defined more than once")]
    DuplicateStop(StopId),

    #[error("{context} references unknown {stop}")]
    UnknownStop { stop: StopId, context: String },

    #[error("a connection between {0} and {1} already exists")]
    DuplicateConnection(StopId, StopId),

    #[error("connection from {0} to itself")]
    SelfLoop(StopId),

    #[error("connection between {a} and {b} has invalid travel time {time}")]
    InvalidTravelTime { a: StopId, b: StopId, time: f64 },

    #[error("{0} is defined more than once")]
    DuplicateRoute(RouteNum),

    #[error("{context} references unknown {route}")]
    UnknownRoute { route: RouteNum, context: String },

    #[error("{route} has invalid maximum walk duration {duration}")]
    InvalidWalkBudget { route: RouteNum, duration: f64 },

    #[error("{route} has a departure at invalid time {time}")]
    InvalidDepartureTime { route: RouteNum, time: f64 },

    #[error("scenario has no {0} stop")]
    MissingTerminal(&'static str),
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
