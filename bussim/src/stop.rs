use simcore::{ComponentId, Key, QueueId, QueueStats, Scheduler, State};

use crate::{Passenger, StopName};

/// A named stop with an unbounded FIFO queue of waiting passengers.
///
/// The queue itself lives in the simulation [`State`]; a `Stop` is a cheap handle to it, and
/// clones of it refer to the same queue.
#[derive(Debug, Clone)]
pub struct Stop {
    name: StopName,
    queue: QueueId<Passenger>,
}

impl Stop {
    /// Creates a stop with an empty queue in `state`.
    pub fn new(name: StopName, state: &mut State) -> Self {
        Self {
            name,
            queue: state.new_queue(),
        }
    }

    /// Stop name.
    #[must_use]
    pub fn name(&self) -> &StopName {
        &self.name
    }

    /// Enqueues a passenger that arrived at this stop. Never blocks.
    ///
    /// # Panics
    ///
    /// Panics if the passenger's origin is a different stop.
    pub fn put(&self, passenger: Passenger, scheduler: &mut Scheduler, state: &mut State) {
        assert_eq!(
            passenger.origin(),
            &self.name,
            "invariant violation: passenger {} queued at a stop other than its origin",
            passenger.id()
        );
        state.put(self.queue, passenger, scheduler);
    }

    /// Takes the passenger at the head of the queue.
    ///
    /// Returns `None` when the queue is empty; `requester` then receives `resume(key)` as soon as
    /// a passenger arrives, with `key` pointing to that passenger in the state.
    pub fn take<E: 'static>(
        &self,
        state: &mut State,
        requester: ComponentId<E>,
        resume: fn(Key<Passenger>) -> E,
    ) -> Option<Passenger> {
        state.take(self.queue, requester, resume)
    }

    /// Current number of waiting passengers.
    #[must_use]
    pub fn peek_length(&self, state: &State) -> usize {
        state.len(self.queue)
    }

    /// Queue traffic counters.
    #[must_use]
    pub fn stats(&self, state: &State) -> QueueStats {
        state.stats(self.queue)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::PassengerId;

    fn passenger(id: &str, origin: &str) -> Passenger {
        Passenger::new(
            PassengerId::from(id),
            0.0,
            StopName::from(origin),
            StopName::from("Z"),
        )
    }

    #[test]
    fn test_clones_share_the_queue() {
        let mut scheduler = Scheduler::default();
        let mut state = State::default();
        let stop = Stop::new(StopName::from("X"), &mut state);
        let handle = stop.clone();
        stop.put(passenger("X-1", "X"), &mut scheduler, &mut state);
        stop.put(passenger("X-2", "X"), &mut scheduler, &mut state);
        assert_eq!(handle.peek_length(&state), 2);
        assert_eq!(stop.stats(&state).puts, 2);
    }

    #[test]
    #[should_panic(expected = "other than its origin")]
    fn test_put_at_wrong_stop() {
        let mut scheduler = Scheduler::default();
        let mut state = State::default();
        let stop = Stop::new(StopName::from("X"), &mut state);
        stop.put(passenger("Y-1", "Y"), &mut scheduler, &mut state);
    }
}
