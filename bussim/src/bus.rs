use std::rc::Rc;

use rand::distributions::Distribution;
use rand::Rng;
use simcore::{Component, ComponentId, Key, Scheduler, State};

use crate::metrics::sink_mut;
use crate::{BusId, MetricsSink, Passenger, PassengerRecord, Route, ServiceConfig, StopName};

/// Longest slice of travel between two consecutive updates of a bus's usage.
pub const TRAVEL_STEP: f64 = 1.0;

/// Events driving a bus through its cycle.
#[derive(Debug, Clone, Copy)]
pub enum Event {
    /// The bus has arrived at its current stop and lets passengers off.
    Arrive,
    /// The bus tries to board the next passenger from the stop queue.
    Board,
    /// A passenger handed over by the stop to a bus that asked for one while the queue was
    /// empty. The passenger is parked in the state under the key until the bus picks it up.
    Delivered(Key<Passenger>),
    /// The bus leaves the stop.
    Depart,
    /// The bus is on its way to the next stop.
    Travel {
        /// Travel time left to the next stop.
        remaining: f64,
    },
}

/// Number of passengers that got off and on during the current stop visit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    /// Passengers that got off.
    pub alighted: usize,
    /// Passengers that got on.
    pub boarded: usize,
}

impl Visit {
    /// A bus stays at a stop for the minimum dwell time only if nobody got on or off.
    #[must_use]
    pub fn requires_dwell(self) -> bool {
        self.alighted == 0 && self.boarded == 0
    }
}

/// A bus cycling over the stops of its route.
///
/// At every stop, the bus first lets off all passengers destined there, paying the alighting
/// time for each of them. Then it boards passengers one by one, for as long as there is room
/// and somebody is waiting, paying the boarding time for each. If nobody got on or off, it
/// dwells for a minimal period. Finally, it travels to the next stop, wrapping around to the
/// first one at the end of the route.
pub struct Bus<R, S> {
    id: BusId,
    route: Rc<Route>,
    service: ServiceConfig,
    rng: R,
    sink: Key<S>,
    onboard: Vec<Passenger>,
    current: usize,
    visit: Visit,
    active_time: f64,
    occupied_time: f64,
    trips_completed: usize,
}

impl<R, S> Bus<R, S>
where
    R: Rng,
    S: MetricsSink + 'static,
{
    /// Constructs an empty bus positioned at the first stop of its route.
    pub fn new(id: BusId, route: Rc<Route>, service: ServiceConfig, rng: R, sink: Key<S>) -> Self {
        Self {
            id,
            route,
            service,
            rng,
            sink,
            onboard: Vec::new(),
            current: 0,
            visit: Visit::default(),
            active_time: 0.0,
            occupied_time: 0.0,
            trips_completed: 0,
        }
    }

    /// Bus ID.
    #[must_use]
    pub fn id(&self) -> &BusId {
        &self.id
    }

    /// Route the bus serves.
    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Passengers onboard in boarding order.
    #[must_use]
    pub fn onboard(&self) -> &[Passenger] {
        &self.onboard
    }

    /// Position of the current (or next, when travelling) stop on the route.
    #[must_use]
    pub fn current_stop(&self) -> usize {
        self.current
    }

    /// Passengers moved during the current stop visit.
    #[must_use]
    pub fn visit(&self) -> Visit {
        self.visit
    }

    /// Total travel time so far.
    #[must_use]
    pub fn active_time(&self) -> f64 {
        self.active_time
    }

    /// Sum of passenger load times travel time so far.
    #[must_use]
    pub fn occupied_time(&self) -> f64 {
        self.occupied_time
    }

    /// Completed cycles over the route.
    #[must_use]
    pub fn trips_completed(&self) -> usize {
        self.trips_completed
    }

    fn stop_name(&self) -> StopName {
        self.route.stop(self.current).name().clone()
    }

    fn alight(&mut self, self_id: ComponentId<Event>, scheduler: &mut Scheduler, state: &mut State) {
        let now = scheduler.time();
        let stop = self.stop_name();
        let (mut departing, staying): (Vec<_>, Vec<_>) = std::mem::take(&mut self.onboard)
            .into_iter()
            .partition(|p| p.destination() == &stop);
        self.onboard = staying;
        self.visit = Visit {
            alighted: departing.len(),
            boarded: 0,
        };
        let sink = sink_mut(state, self.sink);
        for passenger in &mut departing {
            passenger.alight(now);
            sink.record_alight(passenger.id(), now);
            log::debug!(
                "[{:.3}] Passenger {} gets off bus {} at {}",
                now,
                passenger.id(),
                self.id,
                stop
            );
        }
        if departing.is_empty() {
            self.board(self_id, scheduler, state);
        } else {
            let delay = self.service.alighting_time * departing.len() as f64;
            scheduler.schedule(delay, self_id, Event::Board);
        }
    }

    fn board(&mut self, self_id: ComponentId<Event>, scheduler: &mut Scheduler, state: &mut State) {
        let route = Rc::clone(&self.route);
        let stop = route.stop(self.current);
        if self.onboard.len() < self.service.capacity && stop.peek_length(state) > 0 {
            match stop.take(state, self_id, Event::Delivered) {
                Some(passenger) => self.on_board(self_id, passenger, scheduler, state),
                None => log::debug!(
                    "[{:.3}] Bus {} waits for a passenger at {}",
                    scheduler.time(),
                    self.id,
                    stop.name()
                ),
            }
        } else {
            self.leave_stop(self_id, scheduler, state);
        }
    }

    fn on_board(
        &mut self,
        self_id: ComponentId<Event>,
        passenger: Passenger,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) {
        let now = scheduler.time();
        let stop = self.stop_name();
        let route = self.route.name().clone();
        let bus = self.id.clone();
        let boarded = self.take_on_board(passenger, now);
        log::debug!(
            "[{:.3}] Passenger {} boards bus {} at {}",
            now,
            boarded.id(),
            bus,
            stop
        );
        let record = PassengerRecord::boarded(boarded, route, bus);
        let sink = sink_mut(state, self.sink);
        sink.record_wait(record.waiting_time());
        sink.record_passenger(record);
        sink.record_stop_served(&stop);
        scheduler.schedule(self.service.boarding_time, self_id, Event::Board);
    }

    /// Appends the passenger to the onboard list, stamping its board time.
    ///
    /// # Panics
    ///
    /// Panics if the bus is full.
    fn take_on_board(&mut self, mut passenger: Passenger, now: f64) -> &Passenger {
        assert!(
            self.onboard.len() < self.service.capacity,
            "invariant violation: bus {} is full ({} passengers) at stop {} at time {}",
            self.id,
            self.onboard.len(),
            self.stop_name(),
            now
        );
        passenger.board(now);
        self.onboard.push(passenger);
        self.visit.boarded += 1;
        &self.onboard[self.onboard.len() - 1]
    }

    fn leave_stop(
        &mut self,
        self_id: ComponentId<Event>,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) {
        if self.visit.requires_dwell() {
            scheduler.schedule(self.service.min_dwell, self_id, Event::Depart);
        } else {
            self.depart(self_id, scheduler, state);
        }
    }

    fn depart(&mut self, self_id: ComponentId<Event>, scheduler: &mut Scheduler, state: &mut State) {
        let travel_time = self.route.travel_time().sample(&mut self.rng);
        log::trace!(
            "[{:.3}] Bus {} leaves {} with {} passengers; travel time: {:.3}",
            scheduler.time(),
            self.id,
            self.route.stop(self.current).name(),
            self.onboard.len(),
            travel_time
        );
        self.travel(self_id, travel_time, scheduler, state);
    }

    fn travel(
        &mut self,
        self_id: ComponentId<Event>,
        remaining: f64,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) {
        let step = remaining.min(TRAVEL_STEP);
        let occupied = self.onboard.len() as f64 * step;
        self.active_time += step;
        self.occupied_time += occupied;
        sink_mut(state, self.sink).record_bus_increment(&self.id, step, occupied);
        scheduler.schedule(
            step,
            self_id,
            Event::Travel {
                remaining: remaining - step,
            },
        );
    }

    fn arrive_at_next_stop(&mut self, state: &mut State) {
        self.current = (self.current + 1) % self.route.len();
        if self.current == 0 {
            self.trips_completed += 1;
            sink_mut(state, self.sink).record_bus_trip_completed(&self.id);
        }
    }
}

impl<R, S> Component for Bus<R, S>
where
    R: Rng,
    S: MetricsSink + 'static,
{
    type Event = Event;

    fn process_event(
        &mut self,
        self_id: ComponentId<Event>,
        event: &Event,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) {
        match event {
            Event::Arrive => self.alight(self_id, scheduler, state),
            Event::Board => self.board(self_id, scheduler, state),
            Event::Delivered(key) => {
                let passenger = state
                    .remove(*key)
                    .expect("Delivered passenger must be in the state");
                self.on_board(self_id, passenger, scheduler, state);
            }
            Event::Depart => self.depart(self_id, scheduler, state),
            Event::Travel { remaining } => {
                if *remaining > 0.0 {
                    self.travel(self_id, *remaining, scheduler, state);
                } else {
                    self.arrive_at_next_stop(state);
                    self.alight(self_id, scheduler, state);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Metrics, PassengerId, RouteName, Stop, TravelTime};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rstest::rstest;
    use simcore::Simulation;

    fn bus(sim: &mut Simulation, capacity: usize) -> Bus<ChaCha8Rng, Metrics> {
        let stops = ["X", "Y"]
            .iter()
            .map(|&name| Stop::new(StopName::from(name), &mut sim.state))
            .collect();
        let route = Route::new(
            RouteName::from("R"),
            stops,
            10.0,
            1,
            TravelTime::new(2.5, 0.0, 0.5).unwrap(),
        );
        let sink = sim.state.insert(Metrics::default());
        let service = ServiceConfig {
            capacity,
            ..ServiceConfig::default()
        };
        Bus::new(
            BusId::from("R-Bus-1"),
            Rc::new(route),
            service,
            ChaCha8Rng::seed_from_u64(7),
            sink,
        )
    }

    fn passenger(id: &str) -> Passenger {
        Passenger::new(
            PassengerId::from(id),
            0.0,
            StopName::from("X"),
            StopName::from("Y"),
        )
    }

    #[rstest(
        alighted,
        boarded,
        expected,
        case(0, 0, true),
        case(1, 0, false),
        case(0, 1, false),
        case(2, 3, false)
    )]
    fn test_requires_dwell(alighted: usize, boarded: usize, expected: bool) {
        assert_eq!(Visit { alighted, boarded }.requires_dwell(), expected);
    }

    #[test]
    fn test_take_on_board() {
        let mut sim = Simulation::default();
        let mut bus = bus(&mut sim, 2);
        assert_eq!(bus.take_on_board(passenger("X-1"), 3.0).board_time(), Some(3.0));
        bus.take_on_board(passenger("X-2"), 3.5);
        assert_eq!(bus.onboard().len(), 2);
        assert_eq!(
            bus.visit(),
            Visit {
                alighted: 0,
                boarded: 2
            }
        );
    }

    #[test]
    #[should_panic(expected = "bus R-Bus-1 is full (1 passengers) at stop X at time 3")]
    fn test_boarding_beyond_capacity() {
        let mut sim = Simulation::default();
        let mut bus = bus(&mut sim, 1);
        bus.take_on_board(passenger("X-1"), 3.0);
        bus.take_on_board(passenger("X-2"), 3.0);
    }

    #[test]
    fn test_passenger_delivered_to_waiting_bus() {
        let mut sim = Simulation::default();
        let bus = bus(&mut sim, 2);
        let sink = bus.sink;
        let stop = bus.route().stop(0).clone();
        let id = sim.add_component(bus);
        assert!(stop.take(&mut sim.state, id, Event::Delivered).is_none());
        stop.put(passenger("X-1"), &mut sim.scheduler, &mut sim.state);
        assert_eq!(stop.peek_length(&sim.state), 0);
        assert!(sim.step());
        let bus = sim.component::<Bus<ChaCha8Rng, Metrics>>(id).unwrap();
        assert_eq!(bus.onboard().len(), 1);
        assert_eq!(bus.onboard()[0].board_time(), Some(0.0));
        assert_eq!(bus.visit().boarded, 1);
        let metrics = sim.state.get(sink).unwrap();
        assert_eq!(metrics.total_served(), 1);
        assert!(metrics.passenger(&PassengerId::from("X-1")).is_some());
        assert_eq!(sim.scheduler.peek_time(), Some(ServiceConfig::default().boarding_time));
    }

    #[test]
    fn test_travel_in_unit_steps() {
        let mut sim = Simulation::default();
        let mut bus = bus(&mut sim, 2);
        bus.take_on_board(passenger("X-1"), 0.0);
        let sink = bus.sink;
        let id = sim.add_component(bus);
        sim.schedule(0.0, id, Event::Depart);
        // Travel time is exactly 2.5: steps of 1, 1, and 0.5; the bus reaches Y at 2.5.
        assert_eq!(sim.run_until(2.5), 3);
        let bus = sim.component::<Bus<ChaCha8Rng, Metrics>>(id).unwrap();
        assert_eq!(bus.active_time(), 2.5);
        assert_eq!(bus.occupied_time(), 2.5);
        assert_eq!(bus.current_stop(), 0);
        assert_eq!(sim.scheduler.len(), 1);
        let usage = sim
            .state
            .get(sink)
            .unwrap()
            .bus(&BusId::from("R-Bus-1"))
            .unwrap();
        assert_eq!(usage.active_time, 2.5);
        assert_eq!(usage.occupied_time, 2.5);
    }
}
