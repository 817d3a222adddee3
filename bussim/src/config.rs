use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use eyre::WrapErr;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, RouteName, StopName};

/// Bus service parameters shared by all routes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Maximum number of passengers onboard.
    pub capacity: usize,
    /// Time to board one passenger.
    pub boarding_time: f64,
    /// Time for one passenger to alight.
    pub alighting_time: f64,
    /// Time a bus stays at a stop where nobody gets on or off.
    pub min_dwell: f64,
    /// Shortest travel time between two stops; must be positive.
    pub min_travel: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            capacity: 40,
            boarding_time: 3.0 / 60.0,
            alighting_time: 2.0 / 60.0,
            min_dwell: 0.1,
            min_travel: 0.5,
        }
    }
}

/// A stop and the rate of passenger arrivals at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopConfig {
    /// Unique stop name.
    pub name: StopName,
    /// Expected number of arrivals per time unit; zero means nobody arrives.
    #[serde(default)]
    pub arrival_rate: f64,
}

/// A route with its buses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Unique route name.
    pub name: RouteName,
    /// Stops in visiting order; the last one is followed by the first one.
    pub stops: Vec<StopName>,
    /// Target interval between buses.
    pub headway: f64,
    /// Number of buses.
    pub num_buses: usize,
    /// Mean travel time between consecutive stops.
    pub travel_mean: f64,
    /// Standard deviation of the travel time.
    pub travel_sd: f64,
}

/// The whole network along with the length of the simulated period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Simulation stops at this time.
    pub horizon: f64,
    /// Bus service parameters.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Stop definitions.
    pub stops: Vec<StopConfig>,
    /// Route definitions.
    pub routes: Vec<RouteConfig>,
}

impl Default for Config {
    /// Two routes with three stops each, simulated for 8 hours (in minutes).
    fn default() -> Self {
        let stop = |name: &str, arrival_rate: f64| StopConfig {
            name: StopName::from(name),
            arrival_rate,
        };
        let route = |name: &str, stops: &[&str], headway: f64, travel_mean: f64| RouteConfig {
            name: RouteName::from(name),
            stops: stops.iter().map(|&s| StopName::from(s)).collect(),
            headway,
            num_buses: 2,
            travel_mean,
            travel_sd: 1.0,
        };
        Self {
            horizon: 8.0 * 60.0,
            service: ServiceConfig::default(),
            stops: vec![
                stop("A1", 0.35),
                stop("A2", 0.25),
                stop("A3", 0.20),
                stop("B1", 0.40),
                stop("B2", 0.30),
                stop("B3", 0.22),
            ],
            routes: vec![
                route("A", &["A1", "A2", "A3"], 15.0, 6.0),
                route("B", &["B1", "B2", "B3"], 12.0, 5.0),
            ],
        }
    }
}

fn check(field: &str, value: f64, valid: bool) -> Result<(), ConfigError> {
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        })
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    check(field, value, value.is_finite() && value >= 0.0)
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    check(field, value, value.is_finite() && value > 0.0)
}

impl Config {
    /// Loads a configuration from a JSON file. The result is not validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .wrap_err_with(|| format!("unable to open config file {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .wrap_err_with(|| format!("unable to parse config file {}", path.display()))
    }

    /// Arrival rate of the given stop, if defined.
    #[must_use]
    pub fn arrival_rate(&self, stop: &StopName) -> Option<f64> {
        self.stops
            .iter()
            .find(|s| &s.name == stop)
            .map(|s| s.arrival_rate)
    }

    /// Checks that the network is consistent and all parameters are in range.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("horizon", self.horizon)?;
        self.validate_service()?;

        let mut stop_names = HashSet::new();
        for stop in &self.stops {
            if !stop_names.insert(&stop.name) {
                return Err(ConfigError::DuplicateStop(stop.name.clone()));
            }
            non_negative(&format!("arrival_rate of stop {}", stop.name), stop.arrival_rate)?;
        }

        let mut route_names = HashSet::new();
        for route in &self.routes {
            if !route_names.insert(&route.name) {
                return Err(ConfigError::DuplicateRoute(route.name.clone()));
            }
            if route.stops.is_empty() {
                return Err(ConfigError::EmptyRoute(route.name.clone()));
            }
            if let Some(stop) = route.stops.iter().find(|s| !stop_names.contains(s)) {
                return Err(ConfigError::UnknownStop {
                    route: route.name.clone(),
                    stop: stop.clone(),
                });
            }
            non_negative(&format!("headway of route {}", route.name), route.headway)?;
            non_negative(&format!("travel_mean of route {}", route.name), route.travel_mean)?;
            non_negative(&format!("travel_sd of route {}", route.name), route.travel_sd)?;
        }

        if let Some(stop) = self.stops.iter().find(|stop| {
            stop.arrival_rate > 0.0 && !self.routes.iter().any(|r| r.stops.contains(&stop.name))
        }) {
            return Err(ConfigError::UnservedStop(stop.name.clone()));
        }
        Ok(())
    }

    fn validate_service(&self) -> Result<(), ConfigError> {
        let service = &self.service;
        if service.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        non_negative("boarding_time", service.boarding_time)?;
        non_negative("alighting_time", service.alighting_time)?;
        non_negative("min_dwell", service.min_dwell)?;
        positive("min_travel", service.min_travel)
    }
}
