//! Bus transit network simulation.
//!
//! Passengers arrive at stops at random, buses cycle through the stops of their routes picking
//! them up and dropping them off, and the run produces queueing and service metrics.
//!
//! All processes are [`simcore`] components:
//! - [`PassengerGenerator`] creates passengers at one stop and puts them in the stop's queue,
//! - [`Bus`] alights, boards, dwells, and travels in a loop over its route,
//! - [`QueueSampler`] periodically records the length of every stop's queue.
//!
//! Buses and the sampler report to a [`MetricsSink`] stored in the simulation state.
//! [`TransitSimulation`] puts the whole network together from a [`Config`].

#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::default_trait_access,
    clippy::cast_precision_loss
)]

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

mod bus;
pub use bus::{Bus, Event as BusEvent, Visit, TRAVEL_STEP};

mod config;
pub use config::{Config, RouteConfig, ServiceConfig, StopConfig};

mod error;
pub use error::{ConfigError, TravelTimeError};

mod metrics;
pub use metrics::{BusUsage, Metrics, MetricsSink, PassengerRecord, QueueSample};

mod passenger;
pub use passenger::Passenger;

mod passenger_generator;
pub use passenger_generator::{Event as GeneratorEvent, PassengerGenerator};

pub mod report;

mod route;
pub use route::{Route, TravelTime};

mod sampler;
pub use sampler::{Event as SamplerEvent, QueueSampler, SAMPLE_INTERVAL};

mod simulation;
pub use simulation::{BusComponent, TransitSimulation};

mod stop;
pub use stop::Stop;

macro_rules! name_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            From,
            Into,
            Debug,
            Default,
            PartialEq,
            PartialOrd,
            Eq,
            Ord,
            Serialize,
            Deserialize,
            Clone,
            Hash,
            Display,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// The name as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self(String::from(name))
            }
        }
    };
}

name_type! {
    /// Passenger ID, unique within a run: the origin stop name and a per-stop counter.
    PassengerId
}

name_type! {
    /// Name of a stop, unique within a network.
    StopName
}

name_type! {
    /// Name of a route.
    RouteName
}

name_type! {
    /// Bus ID: the route name and the number of the bus on that route.
    BusId
}
