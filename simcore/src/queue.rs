//! A FIFO queue holding values of a certain type, as well as a list of callbacks of processes
//! waiting to pop from the queue.

use std::collections::VecDeque;

use crate::{Scheduler, State};

/// The callback resuming a process that waited for an element of the queue.
pub(crate) struct ProcessCallback<T>(Box<dyn FnOnce(T, &mut Scheduler, &mut State)>);

impl<T> ProcessCallback<T> {
    pub(crate) fn new<F>(cb: F) -> Self
    where
        F: FnOnce(T, &mut Scheduler, &mut State) + 'static,
    {
        Self(Box::new(cb))
    }

    pub(crate) fn process(self, value: T, scheduler: &mut Scheduler, state: &mut State) {
        (self.0)(value, scheduler, state);
    }
}

/// Counters describing the traffic through a queue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Total number of elements ever pushed.
    pub puts: usize,
    /// Total number of elements ever taken, including the ones handed directly to waiting
    /// processes.
    pub takes: usize,
    /// Number of processes currently waiting for an element.
    pub waiting: usize,
}

/// Unbounded queue of elements of type `T`.
///
/// Pushing never fails. Popping from an empty queue registers the caller's callback, and waiting
/// callbacks receive pushed elements in the order they started waiting.
pub(crate) struct Queue<T> {
    elements: VecDeque<T>,
    waiting_to_pop: VecDeque<ProcessCallback<T>>,
    puts: usize,
    takes: usize,
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self {
            elements: VecDeque::new(),
            waiting_to_pop: VecDeque::new(),
            puts: 0,
            takes: 0,
        }
    }
}

impl<T> Queue<T> {
    /// Pushes `element` to the back of the queue. If a process is waiting to pop, the element
    /// does not enter the queue; instead, it is returned along with the callback of the process
    /// that has been waiting the longest.
    #[must_use]
    pub(crate) fn push(&mut self, element: T) -> Option<(ProcessCallback<T>, T)> {
        self.puts += 1;
        if let Some(callback) = self.waiting_to_pop.pop_front() {
            debug_assert!(self.elements.is_empty());
            self.takes += 1;
            Some((callback, element))
        } else {
            self.elements.push_back(element);
            None
        }
    }

    /// Pops the first element. If the queue is empty, the callback is put in line to be
    /// called by a future `push`, and `None` is returned.
    pub(crate) fn pop(&mut self, callback: ProcessCallback<T>) -> Option<T> {
        if let Some(element) = self.elements.pop_front() {
            self.takes += 1;
            Some(element)
        } else {
            self.waiting_to_pop.push_back(callback);
            None
        }
    }

    /// Returns the number of elements in the queue.
    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    pub(crate) fn stats(&self) -> QueueStats {
        QueueStats {
            puts: self.puts,
            takes: self.takes,
            waiting: self.waiting_to_pop.len(),
        }
    }
}
