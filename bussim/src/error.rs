use thiserror::Error;

use crate::{RouteName, StopName};

/// Problems with a network configuration, detected before the simulation starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A route visits a stop that is not defined.
    #[error("route {route} references undefined stop {stop}")]
    UnknownStop {
        /// Route name.
        route: RouteName,
        /// Undefined stop name.
        stop: StopName,
    },
    /// Passengers arrive at a stop that no route serves.
    #[error("stop {0} has a positive arrival rate but no route serves it")]
    UnservedStop(StopName),
    /// Two stops have the same name.
    #[error("stop {0} is defined more than once")]
    DuplicateStop(StopName),
    /// Two routes have the same name.
    #[error("route {0} is defined more than once")]
    DuplicateRoute(RouteName),
    /// A route has no stops.
    #[error("route {0} has no stops")]
    EmptyRoute(RouteName),
    /// A numerical parameter is negative or not finite, or not positive where it has to be.
    #[error("invalid value of {field}: {value}")]
    InvalidValue {
        /// Name of the offending parameter.
        field: String,
        /// Its value.
        value: f64,
    },
    /// Buses must fit at least one passenger.
    #[error("bus capacity must be positive")]
    ZeroCapacity,
}

/// Invalid parameters of a travel time distribution.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TravelTimeError {
    /// The standard deviation is negative or not finite.
    #[error("travel time standard deviation must be finite and non-negative, got {0}")]
    StdDev(f64),
    /// The mean is not finite.
    #[error("travel time mean must be finite, got {0}")]
    Mean(f64),
    /// The floor does not keep the travel time strictly positive.
    #[error("minimum travel time must be positive and finite, got {0}")]
    Floor(f64),
}
