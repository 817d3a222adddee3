use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::Distribution;
use simcore::{Component, ComponentId, Scheduler, State};

use crate::{Passenger, PassengerId, Route, Stop, StopName};

/// Passenger generator events.
#[derive(Debug, Copy, Clone)]
pub enum Event {
    /// Starts the generator: the first passenger arrives after a random interval.
    Start,
    /// A new passenger arrives at the stop and joins its queue.
    /// Then, the generator schedules the next arrival after a time randomly selected from the
    /// interval distribution, which is a parameter of the generator.
    Arrival,
}

/// Generates passengers arriving at a single stop. See [`Event`].
///
/// Each passenger travels to a stop selected uniformly at random among the stops following its
/// origin on the route. Passengers arriving at the last stop of the route have nowhere to go,
/// and their destination is their origin.
pub struct PassengerGenerator<R, T> {
    rng: R,
    interval_dist: T,
    stop: Stop,
    destinations: Vec<StopName>,
    counter: usize,
}

impl<R, T> Component for PassengerGenerator<R, T>
where
    R: Rng,
    T: Distribution<f64>,
{
    type Event = Event;

    fn process_event(
        &mut self,
        self_id: ComponentId<Self::Event>,
        event: &Self::Event,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) {
        if let Event::Arrival = event {
            let passenger = self.generate_passenger(scheduler.time());
            log::trace!(
                "[{:.3}] Passenger {} arrives at {} heading to {}",
                scheduler.time(),
                passenger.id(),
                passenger.origin(),
                passenger.destination()
            );
            self.stop.put(passenger, scheduler, state);
        }
        scheduler.schedule(self.next_interval(), self_id, Event::Arrival);
    }
}

impl<R, T> PassengerGenerator<R, T>
where
    R: Rng,
    T: Distribution<f64>,
{
    /// Creates a generator of passengers at `stop`, with destinations downstream on `route`.
    pub fn new(rng: R, interval_dist: T, stop: Stop, route: &Route) -> Self {
        let destinations: Vec<_> = route
            .downstream(stop.name())
            .iter()
            .map(|s| s.name().clone())
            .collect();
        if destinations.is_empty() {
            log::warn!(
                "Stop {} is the last stop of route {}: its passengers will ride a full cycle",
                stop.name(),
                route.name()
            );
        }
        Self {
            rng,
            interval_dist,
            stop,
            destinations,
            counter: 0,
        }
    }

    /// Stop where the passengers arrive.
    #[must_use]
    pub fn stop(&self) -> &Stop {
        &self.stop
    }

    /// Number of passengers generated so far.
    #[must_use]
    pub fn generated(&self) -> usize {
        self.counter
    }

    fn generate_passenger(&mut self, time: f64) -> Passenger {
        self.counter += 1;
        let origin = self.stop.name().clone();
        let destination = self
            .destinations
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| origin.clone());
        Passenger::new(
            PassengerId::from(format!("{}-{}", origin, self.counter)),
            time,
            origin,
            destination,
        )
    }

    fn next_interval(&mut self) -> f64 {
        let interval = self.interval_dist.sample(&mut self.rng);
        match interval.partial_cmp(&0.0) {
            None | Some(std::cmp::Ordering::Less) => 0.0,
            _ => interval,
        }
    }
}
