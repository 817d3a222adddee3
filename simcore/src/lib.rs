#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

//! This is a general purpose discrete-event simulation engine that provides the mechanisms such
//! as: scheduler, state, blocking queues, and components reacting to events.
//!
//! The engine is single-threaded. Components are explicit state machines: each event is
//! dispatched to exactly one component, which runs to completion and schedules whatever it
//! needs next. Events scheduled for the same time are processed in the order they were created.
//!
//! # Examples
//!
//! ```
//! # use simcore::{Component, ComponentId, Scheduler, Simulation, State};
//! #[derive(Debug)]
//! struct Tick;
//!
//! struct Ticker {
//!     ticks: usize,
//! }
//!
//! impl Component for Ticker {
//!     type Event = Tick;
//!     fn process_event(
//!         &mut self,
//!         self_id: ComponentId<Tick>,
//!         _event: &Tick,
//!         scheduler: &mut Scheduler,
//!         _state: &mut State,
//!     ) {
//!         self.ticks += 1;
//!         scheduler.schedule(1.0, self_id, Tick);
//!     }
//! }
//!
//! let mut sim = Simulation::default();
//! let ticker = sim.add_component(Ticker { ticks: 0 });
//! sim.schedule(0.0, ticker, Tick);
//! sim.run_until(5.0);
//! assert_eq!(sim.component::<Ticker>(ticker).unwrap().ticks, 5);
//! assert_eq!(sim.scheduler.time(), 5.0);
//! ```

use std::cell::Cell;
use std::rc::Rc;

/// Simulation clock, measured in abstract time units.
pub type Clock = Rc<Cell<f64>>;

pub use component::{Component, ComponentId, Components};
pub use queue::QueueStats;
pub use scheduler::{ClockRef, EventEntry, EventEntryTyped, ScheduleError, Scheduler};
pub use simulation::Simulation;
pub use state::{Key, QueueId, State};

mod component;
mod queue;
mod scheduler;
mod simulation;
mod state;
