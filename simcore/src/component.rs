use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::{EventEntry, Scheduler, State};

/// Identifies a simulation component.
///
/// The ID is typed by the event the component accepts, so an event of a wrong type cannot be
/// scheduled for it.
pub struct ComponentId<E> {
    id: usize,
    _marker: PhantomData<E>,
}

impl<E> ComponentId<E> {
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Numerical ID, equal to the order in which the component was added.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }
}

impl<E> Clone for ComponentId<E> {
    fn clone(&self) -> Self {
        Self::new(self.id)
    }
}
impl<E> Copy for ComponentId<E> {}

impl<E> PartialEq for ComponentId<E> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<E> Eq for ComponentId<E> {}

impl<E> Hash for ComponentId<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<E> fmt::Debug for ComponentId<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.id)
    }
}

/// Interface of simulation components.
///
/// A component is a state machine: it is resumed with one event at a time, mutates itself and
/// the shared [`State`], and schedules its next events through the [`Scheduler`].
pub trait Component {
    /// Type of events this component reacts to.
    type Event: fmt::Debug + 'static;

    /// Reacts to `event`.
    fn process_event(
        &mut self,
        self_id: ComponentId<Self::Event>,
        event: &Self::Event,
        scheduler: &mut Scheduler,
        state: &mut State,
    );
}

/// Type-erased component, so that components with different event types can be stored together.
trait AnyComponent {
    fn process_entry(&mut self, entry: &EventEntry, scheduler: &mut Scheduler, state: &mut State);
    fn as_any(&self) -> &dyn Any;
}

impl<C> AnyComponent for C
where
    C: Component + 'static,
{
    fn process_entry(&mut self, entry: &EventEntry, scheduler: &mut Scheduler, state: &mut State) {
        let typed = entry.downcast::<C::Event>().unwrap_or_else(|| {
            panic!(
                "event #{} has a wrong type for component {}",
                entry.sequence(),
                entry.component_idx()
            )
        });
        log::trace!(
            "[{:.4}] [component {}] {:?}",
            typed.time,
            typed.component_id.id(),
            typed.event
        );
        self.process_event(typed.component_id, typed.event, scheduler, state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Container holding all components of a simulation.
#[derive(Default)]
pub struct Components {
    components: Vec<Box<dyn AnyComponent>>,
}

impl Components {
    /// Adds a new component and returns its ID.
    #[must_use]
    pub fn add_component<C: Component + 'static>(&mut self, component: C) -> ComponentId<C::Event> {
        let id = self.components.len();
        self.components.push(Box::new(component));
        ComponentId::new(id)
    }

    /// Returns the component with the given ID, or `None` if it is not of type `C`.
    #[must_use]
    pub fn get<C: Component + 'static>(&self, id: ComponentId<C::Event>) -> Option<&C> {
        self.components
            .get(id.id())
            .and_then(|c| c.as_any().downcast_ref::<C>())
    }

    /// Number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Checks if no components are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Dispatches `entry` to the component it is addressed to.
    pub(crate) fn process_entry(
        &mut self,
        entry: &EventEntry,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) {
        self.components
            .get_mut(entry.component_idx())
            .unwrap_or_else(|| panic!("no component with ID {}", entry.component_idx()))
            .process_entry(entry, scheduler, state);
    }
}
