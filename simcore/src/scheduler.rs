use std::any::{Any, TypeId};
use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::rc::Rc;

use ordered_float::OrderedFloat;
use thiserror::Error;

use crate::{Clock, ComponentId};

/// Reasons for rejecting an event when it is scheduled.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ScheduleError {
    /// The requested delay is negative.
    #[error("negative delay {delay} requested at time {now}")]
    NegativeDelay {
        /// The rejected delay.
        delay: f64,
        /// Simulation time at which it was requested.
        now: f64,
    },
    /// The requested delay is not a number.
    #[error("NaN delay requested at time {now}")]
    NotANumber {
        /// Simulation time at which it was requested.
        now: f64,
    },
}

/// A scheduled event with its receiver and firing time. The event itself is type-erased.
///
/// Entries are ordered by time and then by sequence number, which is assigned when the event is
/// created. The ordering is reversed so that a [`BinaryHeap`] pops the earliest entry first.
#[derive(Debug)]
pub struct EventEntry {
    time: OrderedFloat<f64>,
    sequence: u64,
    component: usize,
    inner: Box<dyn Any>,
    event_type: TypeId,
}

impl EventEntry {
    /// Views the entry with its event as `E`, or returns `None` if the event has another type.
    #[must_use]
    pub fn downcast<E: 'static>(&self) -> Option<EventEntryTyped<'_, E>> {
        if self.event_type != TypeId::of::<E>() {
            return None;
        }
        self.inner
            .downcast_ref::<E>()
            .map(|event| EventEntryTyped {
                time: self.time.0,
                component_id: ComponentId::new(self.component),
                event,
            })
    }

    /// The time at which the event fires.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time.0
    }

    /// Creation order of the event, unique within a scheduler.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Index of the component the event is addressed to.
    #[must_use]
    pub fn component_idx(&self) -> usize {
        self.component
    }
}

impl PartialEq for EventEntry {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.sequence == other.sequence
    }
}

impl Eq for EventEntry {}

impl PartialOrd for EventEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Event entry with the event downcast to its concrete type.
#[derive(Debug)]
pub struct EventEntryTyped<'e, E> {
    /// The time at which the event fires.
    pub time: f64,
    /// Receiving component.
    pub component_id: ComponentId<E>,
    /// The event itself.
    pub event: &'e E,
}

/// Read-only view of the simulation clock, for components that need to stamp times.
#[derive(Clone)]
pub struct ClockRef {
    clock: Clock,
}

impl From<Clock> for ClockRef {
    fn from(clock: Clock) -> Self {
        Self { clock }
    }
}

impl fmt::Debug for ClockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClockRef").field(&self.clock.get()).finish()
    }
}

impl ClockRef {
    /// Time on the clock.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.clock.get()
    }
}

/// Owns the clock and the pending events, ordered by time and then by creation.
pub struct Scheduler {
    events: BinaryHeap<EventEntry>,
    clock: Clock,
    next_sequence: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            events: BinaryHeap::new(),
            clock: Rc::new(Cell::new(0.0)),
            next_sequence: 0,
        }
    }
}

impl Scheduler {
    /// Schedules `event` to be executed for `component` at `self.time() + delay`.
    ///
    /// # Errors
    ///
    /// Returns an error if `delay` is negative or NaN; nothing is scheduled in that case.
    pub fn try_schedule<E: 'static>(
        &mut self,
        delay: f64,
        component: ComponentId<E>,
        event: E,
    ) -> Result<(), ScheduleError> {
        let now = self.time();
        if delay.is_nan() {
            return Err(ScheduleError::NotANumber { now });
        }
        if delay < 0.0 {
            return Err(ScheduleError::NegativeDelay { delay, now });
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.events.push(EventEntry {
            time: OrderedFloat(now + delay),
            sequence,
            component: component.id(),
            inner: Box::new(event),
            event_type: TypeId::of::<E>(),
        });
        Ok(())
    }

    /// Schedules `event` to be executed for `component` at `self.time() + delay`.
    ///
    /// # Panics
    ///
    /// An invalid delay means a component is broken, so it aborts the simulation instead of
    /// being reported back. See [`Scheduler::try_schedule`].
    pub fn schedule<E: 'static>(&mut self, delay: f64, component: ComponentId<E>, event: E) {
        if let Err(err) = self.try_schedule(delay, component, event) {
            panic!(
                "invariant violation: {} (component {})",
                err,
                component.id()
            );
        }
    }

    /// Schedules `event` to be executed for `component` at `self.time()`.
    pub fn schedule_immediately<E: 'static>(&mut self, component: ComponentId<E>, event: E) {
        self.schedule(0.0, component, event);
    }

    /// Returns the current simulation time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.clock.get()
    }

    /// A read-only handle to the clock.
    #[must_use]
    pub fn clock(&self) -> ClockRef {
        ClockRef {
            clock: Rc::clone(&self.clock),
        }
    }

    /// Time of the next event, or `None` if none are left.
    #[must_use]
    pub fn peek_time(&self) -> Option<f64> {
        self.events.peek().map(EventEntry::time)
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Checks if there are no pending events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pops the earliest event and moves the clock to its time, or returns `None` if there are
    /// no events left.
    ///
    /// # Panics
    ///
    /// Panics if the next event is in the past, which can only result from a corrupted queue.
    pub fn pop(&mut self) -> Option<EventEntry> {
        let entry = self.events.pop()?;
        let now = self.time();
        assert!(
            entry.time() >= now,
            "invariant violation: event #{} for component {} at {} precedes current time {}",
            entry.sequence,
            entry.component,
            entry.time(),
            now
        );
        self.clock.set(entry.time());
        Some(entry)
    }

    /// Moves the clock forward to `time` without processing anything.
    /// Does nothing if `time` is not in the future.
    pub(crate) fn advance_to(&mut self, time: f64) {
        if time > self.time() {
            self.clock.set(time);
        }
    }
}
