use simcore::{Component, ComponentId, Key, Scheduler, State};

use crate::metrics::sink_mut;
use crate::{MetricsSink, Stop};

/// Time between two consecutive queue samples.
pub const SAMPLE_INTERVAL: f64 = 1.0;

/// Queue sampler events.
#[derive(Debug, Copy, Clone)]
pub enum Event {
    /// Records the queue length of every stop and schedules the next sample.
    Sample,
}

/// Periodically records the number of passengers waiting at each stop.
pub struct QueueSampler<S> {
    stops: Vec<Stop>,
    sink: Key<S>,
}

impl<S: MetricsSink + 'static> QueueSampler<S> {
    /// Creates a sampler of the given stops reporting to `sink`.
    pub fn new(stops: Vec<Stop>, sink: Key<S>) -> Self {
        Self { stops, sink }
    }
}

impl<S: MetricsSink + 'static> Component for QueueSampler<S> {
    type Event = Event;

    fn process_event(
        &mut self,
        self_id: ComponentId<Self::Event>,
        _event: &Self::Event,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) {
        let now = scheduler.time();
        for stop in &self.stops {
            let length = stop.peek_length(state);
            sink_mut(state, self.sink).record_queue_sample(stop.name(), now, length);
        }
        scheduler.schedule(SAMPLE_INTERVAL, self_id, Event::Sample);
    }
}
