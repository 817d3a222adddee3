use std::collections::HashMap;
use std::rc::Rc;

use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Exp;
use simcore::{ComponentId, Key, Simulation};

use crate::metrics::sink_mut;
use crate::{
    bus, passenger_generator, sampler, Bus, BusId, Config, ConfigError, MetricsSink,
    PassengerGenerator, QueueSampler, Route, ServiceConfig, Stop, StopName, TravelTime,
    TravelTimeError, SAMPLE_INTERVAL,
};

/// Type of the bus components in a [`TransitSimulation`].
pub type BusComponent<S> = Bus<ChaCha8Rng, S>;

/// A bus network ready to be simulated, with all its components registered.
///
/// Every component that draws random numbers owns a generator seeded from a single root
/// generator, in the order of construction. Thus, a configuration and a seed fully determine a run.
pub struct TransitSimulation<S> {
    simulation: Simulation,
    sink: Key<S>,
    stops: Vec<Stop>,
    buses: Vec<ComponentId<bus::Event>>,
    horizon: f64,
    service: ServiceConfig,
}

impl<S: MetricsSink + 'static> TransitSimulation<S> {
    /// Builds the network described by `config`.
    ///
    /// Components are created in this order: one passenger generator per stop with positive
    /// arrival rate (attached to the first route serving it), the buses of each route, and the
    /// queue sampler.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &Config, seed: u64, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut root_rng = ChaCha8Rng::seed_from_u64(seed);
        let mut simulation = Simulation::default();
        let sink = simulation.state.insert(sink);

        let stops: Vec<Stop> = config
            .stops
            .iter()
            .map(|s| Stop::new(s.name.clone(), &mut simulation.state))
            .collect();
        let stops_by_name: HashMap<&StopName, &Stop> =
            stops.iter().map(|stop| (stop.name(), stop)).collect();

        let routes = config
            .routes
            .iter()
            .map(|route| -> Result<Rc<Route>, ConfigError> {
                let travel_time =
                    TravelTime::new(route.travel_mean, route.travel_sd, config.service.min_travel)
                        .map_err(|err| {
                            let (field, value) = match err {
                                TravelTimeError::Mean(value) => {
                                    (format!("travel_mean of route {}", route.name), value)
                                }
                                TravelTimeError::StdDev(value) => {
                                    (format!("travel_sd of route {}", route.name), value)
                                }
                                TravelTimeError::Floor(value) => (String::from("min_travel"), value),
                            };
                            ConfigError::InvalidValue { field, value }
                        })?;
                let route_stops = route
                    .stops
                    .iter()
                    .map(|name| {
                        stops_by_name.get(name).map(|&s| s.clone()).ok_or_else(|| {
                            ConfigError::UnknownStop {
                                route: route.name.clone(),
                                stop: name.clone(),
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Rc::new(Route::new(
                    route.name.clone(),
                    route_stops,
                    route.headway,
                    route.num_buses,
                    travel_time,
                )))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for stop_config in config.stops.iter().filter(|s| s.arrival_rate > 0.0) {
            let route = routes
                .iter()
                .find(|r| r.position(&stop_config.name).is_some())
                .ok_or_else(|| ConfigError::UnservedStop(stop_config.name.clone()))?;
            let interval_dist =
                Exp::new(stop_config.arrival_rate).map_err(|_| ConfigError::InvalidValue {
                    field: format!("arrival_rate of stop {}", stop_config.name),
                    value: stop_config.arrival_rate,
                })?;
            let generator = PassengerGenerator::new(
                ChaCha8Rng::seed_from_u64(root_rng.gen()),
                interval_dist,
                stops_by_name[&stop_config.name].clone(),
                route,
            );
            let generator = simulation.add_component(generator);
            simulation.schedule(0.0, generator, passenger_generator::Event::Start);
        }

        let mut buses = Vec::new();
        for route in &routes {
            for idx in 0..route.num_buses() {
                let id = BusId::from(format!("{}-Bus-{}", route.name(), idx + 1));
                sink_mut(&mut simulation.state, sink).register_bus(&id, route.name());
                let bus: BusComponent<S> = Bus::new(
                    id,
                    Rc::clone(route),
                    config.service,
                    ChaCha8Rng::seed_from_u64(root_rng.gen()),
                    sink,
                );
                let bus = simulation.add_component(bus);
                simulation.schedule(route.start_offset(idx), bus, bus::Event::Arrive);
                buses.push(bus);
            }
        }

        let sampler = simulation.add_component(QueueSampler::new(stops.clone(), sink));
        simulation.schedule(SAMPLE_INTERVAL, sampler, sampler::Event::Sample);

        log::info!(
            "Network with {} stops, {} routes, and {} buses; horizon: {}",
            stops.len(),
            routes.len(),
            buses.len(),
            config.horizon
        );

        Ok(Self {
            simulation,
            sink,
            stops,
            buses,
            horizon: config.horizon,
            service: config.service,
        })
    }

    /// Runs the simulation until the configured horizon. Returns the number of processed events.
    pub fn run(&mut self) -> usize {
        self.simulation.run_until(self.horizon)
    }

    /// Same as [`TransitSimulation::run`] but displays a progress bar along the way.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn run_with_progress(&mut self) -> usize {
        let pb = ProgressBar::new(self.horizon.ceil() as u64)
            .with_style(ProgressStyle::default_bar().template("{msg} {wide_bar} {percent}%"));
        let mut processed = 0;
        while self
            .simulation
            .scheduler
            .peek_time()
            .map_or(false, |time| time < self.horizon)
        {
            self.simulation.step();
            processed += 1;
            let time = self.simulation.scheduler.time();
            if (pb.position() as f64) < time.floor() {
                pb.set_position(time.floor() as u64);
                pb.set_message(&format!(
                    "[t={time:.0}] [waiting={waiting}]",
                    time = time,
                    waiting = self.waiting_passengers(),
                ));
            }
        }
        self.simulation.run_until(self.horizon);
        pb.finish();
        processed
    }

    /// Current simulation time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.simulation.scheduler.time()
    }

    /// Time at which the simulation stops.
    #[must_use]
    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    /// Bus service parameters.
    #[must_use]
    pub fn service(&self) -> &ServiceConfig {
        &self.service
    }

    /// All stops, in the order of configuration.
    #[must_use]
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Finds a stop by name.
    #[must_use]
    pub fn stop(&self, name: &StopName) -> Option<&Stop> {
        self.stops.iter().find(|s| s.name() == name)
    }

    /// Current queue length at the given stop, if it exists.
    #[must_use]
    pub fn queue_length(&self, name: &StopName) -> Option<usize> {
        self.stop(name)
            .map(|stop| stop.peek_length(&self.simulation.state))
    }

    /// Total number of passengers waiting at all stops.
    #[must_use]
    pub fn waiting_passengers(&self) -> usize {
        self.stops
            .iter()
            .map(|stop| stop.peek_length(&self.simulation.state))
            .sum()
    }

    /// Iterates over the buses, route by route.
    pub fn buses(&self) -> impl Iterator<Item = &BusComponent<S>> + '_ {
        self.buses.iter().filter_map(move |&id| {
            self.simulation.component::<BusComponent<S>>(id)
        })
    }

    /// Underlying engine.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Metrics sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        self.simulation
            .state
            .get(self.sink)
            .expect("Metrics sink must live in the state for the whole simulation")
    }

    /// Consumes the simulation and returns the metrics sink.
    #[must_use]
    pub fn into_sink(mut self) -> S {
        self.simulation
            .state
            .remove(self.sink)
            .expect("Metrics sink must live in the state for the whole simulation")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Metrics;

    #[test]
    fn test_default_network() {
        let sim = TransitSimulation::new(&Config::default(), 42, Metrics::default()).unwrap();
        let ids: Vec<_> = sim.buses().map(|b| b.id().as_str().to_string()).collect();
        assert_eq!(ids, vec!["A-Bus-1", "A-Bus-2", "B-Bus-1", "B-Bus-2"]);
        assert_eq!(sim.stops().len(), 6);
        assert_eq!(sim.sink().buses().len(), 4);
        assert_eq!(sim.waiting_passengers(), 0);
        assert_eq!(sim.queue_length(&StopName::from("C1")), None);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = Config::default();
        config.service.capacity = 0;
        assert!(matches!(
            TransitSimulation::new(&config, 42, Metrics::default()),
            Err(ConfigError::ZeroCapacity)
        ));
    }

    #[test]
    fn test_zero_min_travel_is_rejected() {
        let mut config = Config::default();
        config.service.min_travel = 0.0;
        config.service.min_dwell = 0.0;
        for route in &mut config.routes {
            route.travel_mean = 0.0;
            route.travel_sd = 0.0;
        }
        assert_eq!(
            TransitSimulation::new(&config, 42, Metrics::default()).err(),
            Some(ConfigError::InvalidValue {
                field: String::from("min_travel"),
                value: 0.0
            })
        );
    }

    #[test]
    fn test_time_advances_with_degenerate_travel() {
        let mut config = Config::default();
        config.horizon = 10.0;
        config.service.min_dwell = 0.0;
        for route in &mut config.routes {
            route.travel_mean = 0.0;
            route.travel_sd = 0.0;
        }
        let mut sim = TransitSimulation::new(&config, 42, Metrics::default()).unwrap();
        sim.run();
        assert_eq!(sim.time(), 10.0);
        for usage in sim.sink().buses().iter().map(|(_, usage)| usage) {
            assert!(usage.trips_completed > 0);
            assert!(usage.trips_completed < 10);
        }
    }

    #[test]
    fn test_progress_run_matches_plain_run() {
        let mut config = Config::default();
        config.horizon = 60.0;
        let mut plain = TransitSimulation::new(&config, 3, Metrics::default()).unwrap();
        let mut with_progress = TransitSimulation::new(&config, 3, Metrics::default()).unwrap();
        assert_eq!(plain.run(), with_progress.run_with_progress());
        assert_eq!(plain.time(), 60.0);
        assert_eq!(with_progress.time(), 60.0);
        assert_eq!(
            plain.sink().waiting_times(),
            with_progress.sink().waiting_times()
        );
    }
}
