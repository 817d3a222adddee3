use serde::Serialize;

use crate::{PassengerId, StopName};

/// A passenger travelling from its origin stop to its destination.
///
/// Board and alight times are unset until the passenger gets on and off a bus.
/// Their order is enforced: `arrival_time <= board_time <= alight_time`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Passenger {
    id: PassengerId,
    arrival_time: f64,
    origin: StopName,
    destination: StopName,
    board_time: Option<f64>,
    alight_time: Option<f64>,
}

impl Passenger {
    /// Constructs a passenger who arrives at `origin` at `arrival_time`.
    #[must_use]
    pub fn new(
        id: PassengerId,
        arrival_time: f64,
        origin: StopName,
        destination: StopName,
    ) -> Self {
        Self {
            id,
            arrival_time,
            origin,
            destination,
            board_time: None,
            alight_time: None,
        }
    }

    /// Passenger ID.
    #[must_use]
    pub fn id(&self) -> &PassengerId {
        &self.id
    }

    /// Time the passenger joined the queue at the origin.
    #[must_use]
    pub fn arrival_time(&self) -> f64 {
        self.arrival_time
    }

    /// Stop where the passenger arrived.
    #[must_use]
    pub fn origin(&self) -> &StopName {
        &self.origin
    }

    /// Stop where the passenger gets off.
    #[must_use]
    pub fn destination(&self) -> &StopName {
        &self.destination
    }

    /// Time the passenger got on a bus, if any.
    #[must_use]
    pub fn board_time(&self) -> Option<f64> {
        self.board_time
    }

    /// Time the passenger got off the bus, if any.
    #[must_use]
    pub fn alight_time(&self) -> Option<f64> {
        self.alight_time
    }

    /// Time between the arrival and boarding, if already boarded.
    #[must_use]
    pub fn waiting_time(&self) -> Option<f64> {
        self.board_time.map(|board| board - self.arrival_time)
    }

    /// Marks the passenger as boarded at `time`.
    ///
    /// # Panics
    ///
    /// Panics if the passenger has already boarded, or if `time` is before the arrival.
    pub fn board(&mut self, time: f64) {
        assert!(
            self.board_time.is_none(),
            "invariant violation: passenger {} boards twice",
            self.id
        );
        assert!(
            time >= self.arrival_time,
            "invariant violation: passenger {} boards at {} before arriving at {}",
            self.id,
            time,
            self.arrival_time
        );
        self.board_time = Some(time);
    }

    /// Marks the passenger as alighted at `time`.
    ///
    /// # Panics
    ///
    /// Panics if the passenger has not boarded, has already alighted, or if `time` is before
    /// the boarding.
    pub fn alight(&mut self, time: f64) {
        let board_time = self.board_time.unwrap_or_else(|| {
            panic!(
                "invariant violation: passenger {} alights without boarding",
                self.id
            )
        });
        assert!(
            self.alight_time.is_none(),
            "invariant violation: passenger {} alights twice",
            self.id
        );
        assert!(
            time >= board_time,
            "invariant violation: passenger {} alights at {} before boarding at {}",
            self.id,
            time,
            board_time
        );
        self.alight_time = Some(time);
    }
}
