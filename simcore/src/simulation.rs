use crate::{Component, ComponentId, Components, QueueId, Scheduler, State};

/// The main simulation object.
#[derive(Default)]
pub struct Simulation {
    /// Current state of the simulation meant to be mutated by the components.
    pub state: State,
    /// Schedules events and maintains the clock.
    pub scheduler: Scheduler,
    components: Components,
}

impl Simulation {
    /// Adds a new component.
    #[must_use]
    pub fn add_component<C: Component + 'static>(&mut self, component: C) -> ComponentId<C::Event> {
        self.components.add_component(component)
    }

    /// Adds a new unbounded queue.
    #[must_use]
    pub fn add_queue<V: 'static>(&mut self) -> QueueId<V> {
        self.state.new_queue()
    }

    /// Schedules a new event to be executed after `delay` in component `component`.
    pub fn schedule<E: 'static>(&mut self, delay: f64, component: ComponentId<E>, event: E) {
        self.scheduler.schedule(delay, component, event);
    }

    /// Returns a reference to a registered component, or `None` if `C` is not its type.
    #[must_use]
    pub fn component<C: Component + 'static>(&self, id: ComponentId<C::Event>) -> Option<&C> {
        self.components.get(id)
    }

    /// Processes the next event, advancing the clock to its time.
    /// Returns `false` if there were no events left.
    pub fn step(&mut self) -> bool {
        if let Some(entry) = self.scheduler.pop() {
            self.components
                .process_entry(&entry, &mut self.scheduler, &mut self.state);
            true
        } else {
            false
        }
    }

    /// Processes all events scheduled strictly before `horizon`, and moves the clock to
    /// `horizon`. Events left in the queue, as well as processes waiting on queues, are abandoned.
    ///
    /// Returns the number of processed events.
    pub fn run_until(&mut self, horizon: f64) -> usize {
        let mut processed = 0;
        while self.scheduler.peek_time().map_or(false, |time| time < horizon) {
            self.step();
            processed += 1;
        }
        self.scheduler.advance_to(horizon);
        log::debug!(
            "Stopped at {} after {} events; {} left in the queue",
            horizon,
            processed,
            self.scheduler.len()
        );
        processed
    }
}
