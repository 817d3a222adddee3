use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use simcore::{Key, State};

use crate::{BusId, Passenger, PassengerId, RouteName, StopName};

/// Receiver of everything the simulation measures.
///
/// A single sink is stored in the simulation state, and every component that reports data
/// holds a key to it. Implement this trait to collect the data differently, e.g., to stream it
/// out or to inspect it in tests.
pub trait MetricsSink {
    /// Announces a bus before it starts operating.
    fn register_bus(&mut self, bus: &BusId, route: &RouteName);

    /// Records how long a passenger waited at the stop before boarding.
    fn record_wait(&mut self, waiting_time: f64);

    /// Records a passenger at the moment of boarding; the alight time is not yet known.
    fn record_passenger(&mut self, record: PassengerRecord);

    /// Records the alight time of a passenger previously passed to `record_passenger`.
    fn record_alight(&mut self, passenger: &PassengerId, time: f64);

    /// Counts one passenger boarding at `stop`.
    fn record_stop_served(&mut self, stop: &StopName);

    /// Adds a slice of travel to the bus's active time, and its passenger load times the
    /// slice to the occupied time.
    fn record_bus_increment(&mut self, bus: &BusId, active: f64, occupied: f64);

    /// Counts a completed cycle over the route.
    fn record_bus_trip_completed(&mut self, bus: &BusId);

    /// Records the queue length at a stop.
    fn record_queue_sample(&mut self, stop: &StopName, time: f64, length: usize);
}

/// Returns the sink stored in the state.
///
/// # Panics
///
/// Panics if the sink was removed from the state.
pub(crate) fn sink_mut<S: 'static>(state: &mut State, key: Key<S>) -> &mut S {
    state
        .get_mut(key)
        .expect("Metrics sink must live in the state for the whole simulation")
}

/// A passenger's trip, as recorded at boarding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassengerRecord {
    /// Passenger ID.
    pub id: PassengerId,
    /// Origin stop.
    pub origin: StopName,
    /// Destination stop.
    pub destination: StopName,
    /// Time of arrival at the origin.
    pub arrival_time: f64,
    /// Time of boarding.
    pub board_time: f64,
    /// Time of alighting, if known.
    pub alight_time: Option<f64>,
    /// Route of the bus.
    pub route: RouteName,
    /// Bus the passenger boarded.
    pub bus: BusId,
}

impl PassengerRecord {
    /// Builds a record of a passenger that just boarded `bus`.
    ///
    /// # Panics
    ///
    /// Panics if the passenger has not boarded yet.
    #[must_use]
    pub fn boarded(passenger: &Passenger, route: RouteName, bus: BusId) -> Self {
        let board_time = passenger.board_time().unwrap_or_else(|| {
            panic!(
                "invariant violation: passenger {} recorded before boarding",
                passenger.id()
            )
        });
        Self {
            id: passenger.id().clone(),
            origin: passenger.origin().clone(),
            destination: passenger.destination().clone(),
            arrival_time: passenger.arrival_time(),
            board_time,
            alight_time: passenger.alight_time(),
            route,
            bus,
        }
    }

    /// Time between the arrival and boarding.
    #[must_use]
    pub fn waiting_time(&self) -> f64 {
        self.board_time - self.arrival_time
    }
}

/// Accumulated usage of one bus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusUsage {
    /// Route of the bus.
    pub route: RouteName,
    /// Total time spent travelling.
    pub active_time: f64,
    /// Sum of passenger load times travel time.
    pub occupied_time: f64,
    /// Number of completed cycles over the route.
    pub trips_completed: usize,
}

impl BusUsage {
    /// Average number of passengers onboard while travelling.
    #[must_use]
    pub fn average_occupancy(&self) -> f64 {
        if self.active_time > 0.0 {
            self.occupied_time / self.active_time
        } else {
            0.0
        }
    }

    /// Average occupancy as a percentage of `capacity`.
    #[must_use]
    pub fn utilization(&self, capacity: usize) -> f64 {
        if capacity == 0 {
            0.0
        } else {
            100.0 * self.average_occupancy() / capacity as f64
        }
    }
}

/// Queue length at a stop at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueSample {
    /// Sampling time.
    pub time: f64,
    /// Stop name.
    pub stop: StopName,
    /// Number of waiting passengers.
    pub length: usize,
}

/// In-memory metrics sink.
#[derive(Debug, Default)]
pub struct Metrics {
    waiting_times: Vec<f64>,
    passengers: Vec<PassengerRecord>,
    passenger_index: HashMap<PassengerId, usize>,
    served_per_stop: BTreeMap<StopName, usize>,
    buses: Vec<(BusId, BusUsage)>,
    bus_index: HashMap<BusId, usize>,
    queue_samples: Vec<QueueSample>,
}

impl Metrics {
    /// Waiting times of all boarded passengers, in boarding order.
    #[must_use]
    pub fn waiting_times(&self) -> &[f64] {
        &self.waiting_times
    }

    /// Passenger records in boarding order.
    #[must_use]
    pub fn passengers(&self) -> &[PassengerRecord] {
        &self.passengers
    }

    /// Record of the given passenger, if boarded.
    #[must_use]
    pub fn passenger(&self, id: &PassengerId) -> Option<&PassengerRecord> {
        self.passenger_index.get(id).map(|&idx| &self.passengers[idx])
    }

    /// Number of boardings per stop; stops nobody boarded at are absent.
    #[must_use]
    pub fn served_per_stop(&self) -> &BTreeMap<StopName, usize> {
        &self.served_per_stop
    }

    /// Total number of boarded passengers.
    #[must_use]
    pub fn total_served(&self) -> usize {
        self.served_per_stop.values().sum()
    }

    /// Usage of every bus, in registration order.
    #[must_use]
    pub fn buses(&self) -> &[(BusId, BusUsage)] {
        &self.buses
    }

    /// Usage of the given bus, if known.
    #[must_use]
    pub fn bus(&self, id: &BusId) -> Option<&BusUsage> {
        self.bus_index.get(id).map(|&idx| &self.buses[idx].1)
    }

    fn bus_mut(&mut self, id: &BusId) -> &mut BusUsage {
        let buses = &mut self.buses;
        let idx = *self.bus_index.entry(id.clone()).or_insert_with(|| {
            buses.push((id.clone(), BusUsage::default()));
            buses.len() - 1
        });
        &mut self.buses[idx].1
    }

    /// Queue length samples in sampling order.
    #[must_use]
    pub fn queue_samples(&self) -> &[QueueSample] {
        &self.queue_samples
    }
}

impl MetricsSink for Metrics {
    fn register_bus(&mut self, bus: &BusId, route: &RouteName) {
        self.bus_mut(bus).route = route.clone();
    }

    fn record_wait(&mut self, waiting_time: f64) {
        self.waiting_times.push(waiting_time);
    }

    fn record_passenger(&mut self, record: PassengerRecord) {
        self.passenger_index
            .insert(record.id.clone(), self.passengers.len());
        self.passengers.push(record);
    }

    fn record_alight(&mut self, passenger: &PassengerId, time: f64) {
        match self.passenger_index.get(passenger) {
            Some(&idx) => self.passengers[idx].alight_time = Some(time),
            None => log::warn!("Alighting of unrecorded passenger {}", passenger),
        }
    }

    fn record_stop_served(&mut self, stop: &StopName) {
        *self.served_per_stop.entry(stop.clone()).or_default() += 1;
    }

    fn record_bus_increment(&mut self, bus: &BusId, active: f64, occupied: f64) {
        let usage = self.bus_mut(bus);
        usage.active_time += active;
        usage.occupied_time += occupied;
    }

    fn record_bus_trip_completed(&mut self, bus: &BusId) {
        self.bus_mut(bus).trips_completed += 1;
    }

    fn record_queue_sample(&mut self, stop: &StopName, time: f64, length: usize) {
        self.queue_samples.push(QueueSample {
            time,
            stop: stop.clone(),
            length,
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use float_cmp::approx_eq;
    use rstest::{fixture, rstest};

    fn boarded(id: &str, origin: &str, arrival: f64, board: f64) -> PassengerRecord {
        let mut passenger = Passenger::new(
            PassengerId::from(id),
            arrival,
            StopName::from(origin),
            StopName::from("X3"),
        );
        passenger.board(board);
        PassengerRecord::boarded(&passenger, RouteName::from("X"), BusId::from("X-Bus-1"))
    }

    #[fixture]
    fn metrics() -> Metrics {
        let mut metrics = Metrics::default();
        metrics.register_bus(&BusId::from("X-Bus-1"), &RouteName::from("X"));
        for record in vec![
            boarded("X1-1", "X1", 0.5, 2.0),
            boarded("X1-2", "X1", 1.0, 2.0),
            boarded("X2-1", "X2", 3.0, 7.0),
        ] {
            metrics.record_wait(record.waiting_time());
            metrics.record_stop_served(&record.origin);
            metrics.record_passenger(record);
        }
        metrics
    }

    #[rstest]
    fn test_served_counts(metrics: Metrics) {
        assert_eq!(metrics.total_served(), 3);
        assert_eq!(metrics.passengers().len(), 3);
        assert_eq!(metrics.waiting_times(), &[1.5, 1.0, 4.0]);
        assert_eq!(
            metrics.served_per_stop().iter().collect::<Vec<_>>(),
            vec![(&StopName::from("X1"), &2), (&StopName::from("X2"), &1)]
        );
    }

    #[rstest]
    fn test_alight_reconciled(metrics: Metrics) {
        let mut metrics = metrics;
        let id = PassengerId::from("X1-2");
        assert_eq!(metrics.passenger(&id).unwrap().alight_time, None);
        metrics.record_alight(&id, 9.0);
        assert_eq!(metrics.passenger(&id).unwrap().alight_time, Some(9.0));
        metrics.record_alight(&PassengerId::from("unknown"), 10.0);
        assert_eq!(
            metrics
                .passengers()
                .iter()
                .filter(|p| p.alight_time.is_some())
                .count(),
            1
        );
    }

    #[rstest]
    fn test_bus_usage(metrics: Metrics) {
        let mut metrics = metrics;
        let bus = BusId::from("X-Bus-1");
        metrics.record_bus_increment(&bus, 1.0, 3.0);
        metrics.record_bus_increment(&bus, 0.5, 0.5);
        metrics.record_bus_trip_completed(&bus);
        let usage = metrics.bus(&bus).unwrap();
        assert_eq!(usage.route, RouteName::from("X"));
        assert!(approx_eq!(f64, usage.active_time, 1.5));
        assert!(approx_eq!(f64, usage.occupied_time, 3.5));
        assert_eq!(usage.trips_completed, 1);
        assert!(approx_eq!(f64, usage.average_occupancy(), 3.5 / 1.5));
        assert!(approx_eq!(f64, usage.utilization(2), 100.0 * 3.5 / 3.0));
    }

    #[test]
    fn test_buses_in_registration_order() {
        let mut metrics = Metrics::default();
        let route = RouteName::from("A");
        for idx in 1..=11 {
            metrics.register_bus(&BusId::from(format!("A-Bus-{}", idx)), &route);
        }
        metrics.record_bus_trip_completed(&BusId::from("A-Bus-10"));
        let ids: Vec<_> = metrics.buses().iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids[1], "A-Bus-2");
        assert_eq!(ids[9], "A-Bus-10");
        assert_eq!(ids.len(), 11);
        assert_eq!(metrics.buses()[9].1.trips_completed, 1);
        assert_eq!(metrics.bus(&BusId::from("A-Bus-12")), None);
    }

    #[test]
    fn test_idle_bus_usage() {
        let usage = BusUsage::default();
        assert_eq!(usage.average_occupancy(), 0.0);
        assert_eq!(usage.utilization(40), 0.0);
    }
}
