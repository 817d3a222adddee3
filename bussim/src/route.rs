use rand::distributions::Distribution;
use rand::Rng;
use rand_distr::Normal;

use crate::{RouteName, Stop, StopName, TravelTimeError};

/// Travel time between two consecutive stops: normally distributed, never shorter than a floor.
#[derive(Debug, Clone, Copy)]
pub struct TravelTime {
    normal: Normal<f64>,
    floor: f64,
}

impl TravelTime {
    /// Constructs a travel time distribution.
    ///
    /// # Errors
    ///
    /// Returns an error if the mean is not finite, the standard deviation is negative or not
    /// finite, or the floor is not positive.
    pub fn new(mean: f64, std_dev: f64, floor: f64) -> Result<Self, TravelTimeError> {
        if !mean.is_finite() {
            return Err(TravelTimeError::Mean(mean));
        }
        if !(std_dev.is_finite() && std_dev >= 0.0) {
            return Err(TravelTimeError::StdDev(std_dev));
        }
        if !(floor.is_finite() && floor > 0.0) {
            return Err(TravelTimeError::Floor(floor));
        }
        let normal = Normal::new(mean, std_dev).map_err(|_| TravelTimeError::StdDev(std_dev))?;
        Ok(Self { normal, floor })
    }

    /// Shortest travel time this distribution ever returns.
    #[must_use]
    pub fn floor(&self) -> f64 {
        self.floor
    }
}

impl Distribution<f64> for TravelTime {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.normal.sample(rng).max(self.floor)
    }
}

/// A route is a cyclic sequence of stops served by a number of buses.
#[derive(Debug)]
pub struct Route {
    name: RouteName,
    stops: Vec<Stop>,
    headway: f64,
    num_buses: usize,
    travel_time: TravelTime,
}

impl Route {
    /// Constructs a route.
    ///
    /// # Panics
    ///
    /// Panics if `stops` is empty.
    #[must_use]
    pub fn new(
        name: RouteName,
        stops: Vec<Stop>,
        headway: f64,
        num_buses: usize,
        travel_time: TravelTime,
    ) -> Self {
        assert!(!stops.is_empty(), "route {} has no stops", name);
        Self {
            name,
            stops,
            headway,
            num_buses,
            travel_time,
        }
    }

    /// Route name.
    #[must_use]
    pub fn name(&self) -> &RouteName {
        &self.name
    }

    /// Stops in visiting order.
    #[must_use]
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// The stop at position `idx` of the route.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    #[must_use]
    pub fn stop(&self, idx: usize) -> &Stop {
        &self.stops[idx]
    }

    /// Number of stops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Always `false`: routes have at least one stop.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Target interval between consecutive buses.
    #[must_use]
    pub fn headway(&self) -> f64 {
        self.headway
    }

    /// Number of buses serving the route.
    #[must_use]
    pub fn num_buses(&self) -> usize {
        self.num_buses
    }

    /// Travel time distribution between consecutive stops.
    #[must_use]
    pub fn travel_time(&self) -> &TravelTime {
        &self.travel_time
    }

    /// Position of the first occurrence of the stop on this route.
    #[must_use]
    pub fn position(&self, stop: &StopName) -> Option<usize> {
        self.stops.iter().position(|s| s.name() == stop)
    }

    /// Stops following the first occurrence of `stop` up to the end of the route.
    /// Empty for the last stop or a stop not on the route.
    #[must_use]
    pub fn downstream(&self, stop: &StopName) -> &[Stop] {
        match self.position(stop) {
            Some(position) => &self.stops[position + 1..],
            None => &[],
        }
    }

    /// Time at which bus number `bus` (counting from 0) first arrives at the first stop,
    /// spreading the buses evenly within one headway.
    #[must_use]
    pub fn start_offset(&self, bus: usize) -> f64 {
        bus as f64 * self.headway / self.num_buses as f64
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rstest::rstest;
    use simcore::State;

    fn route(state: &mut State) -> Route {
        let stops = ["A1", "A2", "A3"]
            .iter()
            .map(|&name| Stop::new(StopName::from(name), state))
            .collect();
        Route::new(
            RouteName::from("A"),
            stops,
            15.0,
            2,
            TravelTime::new(6.0, 1.0, 0.5).unwrap(),
        )
    }

    fn names(stops: &[Stop]) -> Vec<&str> {
        stops.iter().map(|s| s.name().as_str()).collect()
    }

    #[test]
    fn test_downstream() {
        let mut state = State::default();
        let route = route(&mut state);
        assert_eq!(names(route.downstream(&StopName::from("A1"))), vec!["A2", "A3"]);
        assert_eq!(names(route.downstream(&StopName::from("A2"))), vec!["A3"]);
        assert!(route.downstream(&StopName::from("A3")).is_empty());
        assert!(route.downstream(&StopName::from("B1")).is_empty());
    }

    #[test]
    fn test_start_offsets() {
        let mut state = State::default();
        let route = route(&mut state);
        assert_eq!(route.start_offset(0), 0.0);
        assert_eq!(route.start_offset(1), 7.5);
    }

    #[rstest(
        mean,
        std_dev,
        floor,
        expected,
        case::negative_std_dev(5.0, -1.0, 0.5, TravelTimeError::StdDev(-1.0)),
        case::infinite_std_dev(5.0, f64::INFINITY, 0.5, TravelTimeError::StdDev(f64::INFINITY)),
        case::zero_floor(0.0, 0.0, 0.0, TravelTimeError::Floor(0.0)),
        case::negative_floor(5.0, 1.0, -0.5, TravelTimeError::Floor(-0.5)),
        case::infinite_mean(f64::INFINITY, 1.0, 0.5, TravelTimeError::Mean(f64::INFINITY)),
    )]
    fn test_invalid_travel_time(mean: f64, std_dev: f64, floor: f64, expected: TravelTimeError) {
        assert_eq!(TravelTime::new(mean, std_dev, floor).unwrap_err(), expected);
    }

    #[test]
    fn test_nan_std_dev_is_rejected() {
        assert!(matches!(
            TravelTime::new(5.0, f64::NAN, 0.5),
            Err(TravelTimeError::StdDev(_))
        ));
    }

    #[test]
    fn test_degenerate_travel_time_is_floored() {
        let travel_time = TravelTime::new(0.0, 0.0, 0.5).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(travel_time.sample(&mut rng), 0.5);
    }

    proptest! {
        #[test]
        fn test_travel_time_never_below_floor(
            seed: u64,
            mean in -20.0..20.0_f64,
            std_dev in 0.0..10.0_f64,
        ) {
            let travel_time = TravelTime::new(mean, std_dev, 0.5).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for _ in 0..20 {
                prop_assert!(travel_time.sample(&mut rng) >= 0.5);
            }
        }
    }
}
