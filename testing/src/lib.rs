//! Test helpers shared by the simulation crates.

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::cell::Cell;

use rand::distributions::Distribution;

/// This distribution replays a fixed script of values, ignoring the random number generator.
/// Once the script is exhausted, the last value is repeated forever.
///
/// This is meant for testing: it lets a test dictate, e.g., exact inter-arrival or travel times
/// of a process that normally draws them at random.
///
/// # Examples
///
/// ```
/// # use rand::distributions::Distribution;
/// # use testing::Script;
/// let script = Script::new(vec![1.0, 2.5]);
/// let mut rng = rand::thread_rng();
/// assert_eq!(script.sample(&mut rng), 1.0);
/// assert_eq!(script.sample(&mut rng), 2.5);
/// assert_eq!(script.sample(&mut rng), 2.5);
/// ```
pub struct Script<T> {
    values: Vec<T>,
    next: Cell<usize>,
}

impl<T> Script<T> {
    /// Constructs a script from a non-empty list of values.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty.
    #[must_use]
    pub fn new(values: Vec<T>) -> Self {
        assert!(!values.is_empty(), "script must have at least one value");
        Self {
            values,
            next: Cell::new(0),
        }
    }

    /// Number of values drawn so far.
    #[must_use]
    pub fn drawn(&self) -> usize {
        self.next.get()
    }
}

impl<T: Copy> Distribution<T> for Script<T> {
    fn sample<R: rand::Rng + ?Sized>(&self, _rng: &mut R) -> T {
        let idx = self.next.get();
        self.next.set(idx + 1);
        self.values[idx.min(self.values.len() - 1)]
    }
}

/// A distribution that always returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct Constant<T>(pub T);

impl<T: Copy> Distribution<T> for Constant<T> {
    fn sample<R: rand::Rng + ?Sized>(&self, _rng: &mut R) -> T {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_script_repeats_last() {
        let script = Script::new(vec![3_u32, 1, 4]);
        let mut rng = StepRng::new(0, 1);
        let drawn: Vec<u32> = (0..5).map(|_| script.sample(&mut rng)).collect();
        assert_eq!(drawn, vec![3, 1, 4, 4, 4]);
        assert_eq!(script.drawn(), 5);
    }

    #[test]
    #[should_panic]
    fn test_empty_script() {
        let _ = Script::<f64>::new(Vec::new());
    }

    #[test]
    fn test_constant() {
        let mut rng = StepRng::new(0, 1);
        assert_eq!(Constant(-2.5).sample(&mut rng), -2.5);
    }
}
