use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use rand::RngCore;

use crate::queue::{ProcessCallback, Queue};
use crate::{ComponentId, QueueStats, Scheduler};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<V> {
            id: usize,
            state_hash: u64,
            _marker: PhantomData<V>,
        }

        impl<V> $name<V> {
            fn issue(id: usize, state_hash: u64) -> Self {
                Self {
                    id,
                    state_hash,
                    _marker: PhantomData,
                }
            }
        }

        impl<V> Clone for $name<V> {
            fn clone(&self) -> Self {
                Self::issue(self.id, self.state_hash)
            }
        }

        impl<V> Copy for $name<V> {}

        impl<V> PartialEq for $name<V> {
            fn eq(&self, other: &Self) -> bool {
                (self.id, self.state_hash) == (other.id, other.state_hash)
            }
        }

        impl<V> Eq for $name<V> {}

        impl<V> fmt::Debug for $name<V> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.id)
            }
        }
    };
}

handle! {
    /// Handle to a value of type `V` kept in the [`State`] value store.
    ///
    /// Keys are issued only by [`State::insert`]. Each one remembers which state issued it, and
    /// using it with any other state panics:
    ///
    /// ```should_panic
    /// # use simcore::State;
    /// let mut first = State::default();
    /// let mut second = State::default();
    /// let key = first.insert(1);
    /// let _ = second.remove(key);
    /// ```
    ///
    /// The value type is part of the key type, so a key cannot be used to read a value of
    /// another type:
    ///
    /// ```compile_fail
    /// # use simcore::State;
    /// let mut state = State::default();
    /// let key = state.insert(String::from("1"));
    /// let _: Option<i32> = state.remove(key);
    /// ```
    Key
}

handle! {
    /// Handle to a FIFO queue of values of type `V` kept in the [`State`].
    /// Issued by [`State::new_queue`]; bound to the issuing state just like [`Key`].
    QueueId
}

/// Everything components share: a typed value store and the blocking queues.
pub struct State {
    store: HashMap<TypeId, HashMap<usize, Box<dyn Any>>>,
    queues: HashMap<TypeId, HashMap<usize, Box<dyn Any>>>,
    next_id: usize,
    state_hash: u64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            store: HashMap::new(),
            queues: HashMap::new(),
            next_id: 0,
            state_hash: rand::thread_rng().next_u64(),
        }
    }
}

impl State {
    fn assert_hash(&self, state_hash: u64) {
        assert_eq!(
            state_hash, self.state_hash,
            "State hash of the key does not match the hash of the state"
        );
    }

    /// Moves `value` into the store and returns its key.
    #[must_use = "Discarding key results in leaking inserted value"]
    pub fn insert<V: 'static>(&mut self, value: V) -> Key<V> {
        let id = self.next_id;
        self.next_id += 1;
        self.store
            .entry(TypeId::of::<V>())
            .or_default()
            .insert(id, Box::new(value));
        Key::issue(id, self.state_hash)
    }

    /// Takes the value out of the store, or returns `None` if it was already removed.
    pub fn remove<V: 'static>(&mut self, key: Key<V>) -> Option<V> {
        self.assert_hash(key.state_hash);
        self.store
            .get_mut(&TypeId::of::<V>())
            .and_then(|m| m.remove(&key.id))
            .and_then(|v| v.downcast::<V>().ok())
            .map(|v| *v)
    }

    /// Borrows the stored value.
    #[must_use]
    pub fn get<V: 'static>(&self, key: Key<V>) -> Option<&V> {
        self.assert_hash(key.state_hash);
        self.store
            .get(&TypeId::of::<V>())
            .and_then(|m| m.get(&key.id))
            .and_then(|v| v.downcast_ref::<V>())
    }

    /// Mutably borrows the stored value.
    #[must_use]
    pub fn get_mut<V: 'static>(&mut self, key: Key<V>) -> Option<&mut V> {
        self.assert_hash(key.state_hash);
        self.store
            .get_mut(&TypeId::of::<V>())
            .and_then(|m| m.get_mut(&key.id))
            .and_then(|v| v.downcast_mut::<V>())
    }

    /// Creates an empty unbounded queue.
    pub fn new_queue<V: 'static>(&mut self) -> QueueId<V> {
        let id = self.next_id;
        self.next_id += 1;
        self.queues
            .entry(TypeId::of::<V>())
            .or_default()
            .insert(id, Box::new(Queue::<V>::default()));
        QueueId::issue(id, self.state_hash)
    }

    fn queue<V: 'static>(&self, queue: QueueId<V>) -> &Queue<V> {
        self.assert_hash(queue.state_hash);
        self.queues
            .get(&TypeId::of::<V>())
            .and_then(|m| m.get(&queue.id))
            .and_then(|q| q.downcast_ref::<Queue<V>>())
            .expect("If this queue ID was issued, a corresponding queue must exist")
    }

    fn queue_mut<V: 'static>(&mut self, queue: QueueId<V>) -> &mut Queue<V> {
        self.assert_hash(queue.state_hash);
        self.queues
            .get_mut(&TypeId::of::<V>())
            .and_then(|m| m.get_mut(&queue.id))
            .and_then(|q| q.downcast_mut::<Queue<V>>())
            .expect("If this queue ID was issued, a corresponding queue must exist")
    }

    /// Sends `value` to the `queue`. This never blocks.
    ///
    /// If a process is waiting to take from the queue, the value goes directly to the one that
    /// has been waiting the longest: it is inserted into the value store, and the process is
    /// scheduled at the current time with the event built from the resulting key.
    pub fn put<V: 'static>(&mut self, queue: QueueId<V>, value: V, scheduler: &mut Scheduler) {
        let handed_over = self.queue_mut(queue).push(value);
        if let Some((callback, value)) = handed_over {
            callback.process(value, scheduler, self);
        }
    }

    /// Takes the first value from the `queue`.
    ///
    /// If the queue is empty, it returns `None` and `requester` is put in line. Once a value
    /// becomes available, it is moved to the value store and `requester` receives
    /// `resume(key)` at the time of the corresponding [`State::put`].
    pub fn take<V: 'static, E: 'static>(
        &mut self,
        queue: QueueId<V>,
        requester: ComponentId<E>,
        resume: fn(Key<V>) -> E,
    ) -> Option<V> {
        self.queue_mut(queue).pop(ProcessCallback::new(
            move |value, scheduler: &mut Scheduler, state: &mut State| {
                let key = state.insert(value);
                scheduler.schedule_immediately(requester, resume(key));
            },
        ))
    }

    /// Number of values in the queue. Never blocks.
    #[must_use]
    pub fn len<V: 'static>(&self, queue: QueueId<V>) -> usize {
        self.queue(queue).len()
    }

    /// Returns traffic counters of the queue. The current length is always `puts - takes`.
    #[must_use]
    pub fn stats<V: 'static>(&self, queue: QueueId<V>) -> QueueStats {
        self.queue(queue).stats()
    }
}
