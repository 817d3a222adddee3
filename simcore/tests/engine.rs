use simcore::{Component, ComponentId, Key, QueueId, Scheduler, Simulation, State};

use rstest::{fixture, rstest};

/// Shared log of `(time, label, value)` entries written by the test components.
type Journal = Vec<(f64, &'static str, Option<u32>)>;

#[derive(Debug)]
enum ConsumerEvent {
    Take,
    Delivered(Key<u32>),
}

/// Takes one value from the queue at every `Take` event, blocking when it is empty.
struct Consumer {
    label: &'static str,
    queue: QueueId<u32>,
    journal: Key<Journal>,
}

impl Component for Consumer {
    type Event = ConsumerEvent;

    fn process_event(
        &mut self,
        self_id: ComponentId<ConsumerEvent>,
        event: &ConsumerEvent,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) {
        let value = match event {
            ConsumerEvent::Take => state.take(self.queue, self_id, ConsumerEvent::Delivered),
            ConsumerEvent::Delivered(key) => state.remove(*key),
        };
        let now = scheduler.time();
        let journal = state.get_mut(self.journal).expect("missing journal");
        journal.push((now, self.label, value));
    }
}

#[derive(Debug)]
struct Produce(u32);

/// Puts the value carried by the event into the queue.
struct Producer {
    queue: QueueId<u32>,
}

impl Component for Producer {
    type Event = Produce;

    fn process_event(
        &mut self,
        _self_id: ComponentId<Produce>,
        event: &Produce,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) {
        state.put(self.queue, event.0, scheduler);
    }
}

#[derive(Debug)]
struct Mark(&'static str);

struct Marker {
    journal: Key<Journal>,
}

impl Component for Marker {
    type Event = Mark;

    fn process_event(
        &mut self,
        _self_id: ComponentId<Mark>,
        event: &Mark,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) {
        let now = scheduler.time();
        state
            .get_mut(self.journal)
            .expect("missing journal")
            .push((now, event.0, None));
    }
}

struct Setup {
    sim: Simulation,
    queue: QueueId<u32>,
    journal: Key<Journal>,
}

#[fixture]
fn setup() -> Setup {
    let mut sim = Simulation::default();
    let queue = sim.add_queue::<u32>();
    let journal = sim.state.insert(Journal::new());
    Setup {
        sim,
        queue,
        journal,
    }
}

#[rstest]
fn test_same_instant_events_in_creation_order(setup: Setup) {
    let Setup {
        mut sim, journal, ..
    } = setup;
    let marker = sim.add_component(Marker { journal });
    sim.schedule(2.0, marker, Mark("A"));
    sim.schedule(1.0, marker, Mark("first"));
    sim.schedule(2.0, marker, Mark("B"));
    sim.schedule(2.0, marker, Mark("C"));
    assert_eq!(sim.run_until(10.0), 4);
    let labels: Vec<_> = sim
        .state
        .get(journal)
        .unwrap()
        .iter()
        .map(|(t, l, _)| (*t, *l))
        .collect();
    assert_eq!(
        labels,
        vec![(1.0, "first"), (2.0, "A"), (2.0, "B"), (2.0, "C")]
    );
}

#[rstest]
fn test_take_blocks_until_put(setup: Setup) {
    let Setup {
        mut sim,
        queue,
        journal,
    } = setup;
    let consumer = sim.add_component(Consumer {
        label: "consumer",
        queue,
        journal,
    });
    let producer = sim.add_component(Producer { queue });
    sim.schedule(1.0, consumer, ConsumerEvent::Take);
    sim.schedule(4.0, producer, Produce(7));
    sim.run_until(10.0);
    assert_eq!(
        sim.state.get(journal).unwrap(),
        &vec![(1.0, "consumer", None), (4.0, "consumer", Some(7))]
    );
    assert_eq!(sim.state.len(queue), 0);
}

#[rstest]
fn test_waiting_takers_served_in_request_order(setup: Setup) {
    let Setup {
        mut sim,
        queue,
        journal,
    } = setup;
    let first = sim.add_component(Consumer {
        label: "first",
        queue,
        journal,
    });
    let second = sim.add_component(Consumer {
        label: "second",
        queue,
        journal,
    });
    let producer = sim.add_component(Producer { queue });
    // The second consumer is added later but asks earlier.
    sim.schedule(2.0, first, ConsumerEvent::Take);
    sim.schedule(1.0, second, ConsumerEvent::Take);
    sim.schedule(3.0, producer, Produce(10));
    sim.schedule(3.0, producer, Produce(20));
    sim.schedule(3.0, producer, Produce(30));
    sim.run_until(10.0);

    let deliveries: Vec<_> = sim
        .state
        .get(journal)
        .unwrap()
        .iter()
        .filter(|(_, _, v)| v.is_some())
        .copied()
        .collect();
    assert_eq!(
        deliveries,
        vec![(3.0, "second", Some(10)), (3.0, "first", Some(20))]
    );
    assert_eq!(sim.state.len(queue), 1);
    let stats = sim.state.stats(queue);
    assert_eq!((stats.puts, stats.takes, stats.waiting), (3, 2, 0));
}

#[rstest]
fn test_run_until_abandons_the_rest(setup: Setup) {
    let Setup {
        mut sim,
        queue,
        journal,
    } = setup;
    let consumer = sim.add_component(Consumer {
        label: "stalled",
        queue,
        journal,
    });
    let marker = sim.add_component(Marker { journal });
    sim.schedule(0.0, consumer, ConsumerEvent::Take);
    sim.schedule(5.0, marker, Mark("at horizon"));
    sim.schedule(6.0, marker, Mark("after horizon"));

    assert_eq!(sim.run_until(5.0), 1);
    assert_eq!(sim.scheduler.time(), 5.0);
    assert_eq!(sim.scheduler.len(), 2);
    assert_eq!(sim.state.stats(queue).waiting, 1);
    assert_eq!(sim.state.get(journal).unwrap().len(), 1);
}

#[rstest]
fn test_component_lookup(setup: Setup) {
    let Setup {
        mut sim, queue, ..
    } = setup;
    let producer = sim.add_component(Producer { queue });
    assert!(sim.component::<Producer>(producer).is_some());
    assert!(!sim.step());
}
