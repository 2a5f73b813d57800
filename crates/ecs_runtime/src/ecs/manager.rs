//! # Manager
//!
//! The manager owns a [`World`] (entities, per-type component stores and the
//! event store) plus the ordered list of processors it drives. An external
//! loop calls [`Manager::update`] once per tick; every processor runs to
//! completion, in registration order, on the calling thread.
//!
//! ```
//! use ecs_runtime::prelude::*;
//!
//! struct Label(&'static str);
//! impl Component for Label {}
//!
//! struct Relabel;
//!
//! impl EntityLogic for Relabel {
//!     fn update_entity(&mut self, _: &ProcessorContext, _: f32, entity: &Entity) -> EcsResult<()> {
//!         if let Some(label) = entity.get_component::<Label>()? {
//!             label.borrow_mut().0 = "egg";
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut manager = Manager::new();
//! let entity = manager.create_entity();
//! entity.add_component(Label("spam"))?;
//!
//! EntityProcessor::with_needed(ComponentSet::new().with::<Label>(), Relabel)
//!     .register_to(&mut manager);
//! manager.update(0.1)?;
//!
//! assert_eq!(entity.get_component::<Label>()?.unwrap().borrow().0, "egg");
//! # Ok::<(), EcsError>(())
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::component::{Component, Shared};
use super::entity::Entity;
use super::error::EcsResult;
use super::event::Event;
use super::processor::Processor;
use super::query::ComponentSet;
use super::storage::EventStore;
use super::world::World;
use crate::config::ManagerConfig;

/// Registry and scheduler for entities, components, processors and events
pub struct Manager {
    world: World,
    processors: Vec<Rc<RefCell<dyn Processor>>>,
    config: ManagerConfig,
    ticks: u64,
}

impl Manager {
    /// Create a manager with the default configuration
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Create a manager with a custom configuration
    pub fn with_config(config: ManagerConfig) -> Self {
        log::debug!("Creating manager with {config:?}");
        Self {
            world: World::with_capacity(config.entity_capacity),
            processors: Vec::with_capacity(config.processor_capacity),
            config,
            ticks: 0,
        }
    }

    /// Shared world handle
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Active configuration
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Create a new entity bound to this manager
    pub fn create_entity(&self) -> Entity {
        self.world.create_entity()
    }

    /// Remove `entity` and purge its components from every store
    ///
    /// Fails with [`EcsError::UnknownEntity`](super::EcsError::UnknownEntity)
    /// if the entity is not live under this manager.
    pub fn kill_entity(&self, entity: &Entity) -> EcsResult<()> {
        self.world.kill_entity(entity)
    }

    /// Whether `entity` is live under this manager
    pub fn contains(&self, entity: &Entity) -> bool {
        self.world.contains(entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.world.entity_count()
    }

    /// Get an iterator over all live entities
    pub fn entities(&self) -> impl Iterator<Item = Entity> {
        self.world.entities()
    }

    /// Components stored under exactly type `T`
    pub fn components_by_type<T: Component>(&self) -> impl Iterator<Item = Shared<T>> {
        self.world.components_by_type::<T>()
    }

    /// Entities holding a component of every type in `types`
    pub fn entities_by_types(&self, types: &ComponentSet) -> impl Iterator<Item = Entity> {
        self.world.entities_by_types(types)
    }

    /// Register `processor` at the end of the schedule
    pub fn add_processor<P: Processor>(&mut self, processor: P) -> Shared<P> {
        let shared = Rc::new(RefCell::new(processor));
        self.add_shared_processor(Rc::clone(&shared));
        shared
    }

    /// Register an already shared processor at the end of the schedule
    ///
    /// The same instance may be added more than once; it then runs once per
    /// registration each tick.
    pub fn add_shared_processor<P: Processor>(&mut self, processor: Shared<P>) {
        {
            let mut borrowed = processor.borrow_mut();
            borrowed.context_mut().bind(&self.world);
            log::debug!(
                "Registered processor {} at position {}",
                borrowed.name(),
                self.processors.len()
            );
        }
        self.processors.push(processor);
    }

    /// Registered processors in registration order
    pub fn processors(&self) -> impl Iterator<Item = &Rc<RefCell<dyn Processor>>> {
        self.processors.iter()
    }

    /// Number of registered processors
    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// Store `event` as the singleton for its type, replacing any earlier one
    pub fn add_event<E: Event>(&mut self, event: E) -> Shared<E> {
        self.world.add_event(event)
    }

    /// Snapshot of the event store
    pub fn event_store(&self) -> EventStore {
        self.world.event_store()
    }

    /// Current singleton for event type `E`
    pub fn event<E: Event>(&self) -> Option<Shared<E>> {
        self.world.event::<E>()
    }

    /// Number of completed ticks
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run every processor once, in registration order
    ///
    /// `delta_time` is handed to each processor unchanged. The first
    /// processor error aborts the tick and is returned.
    pub fn update(&mut self, delta_time: f32) -> EcsResult<()> {
        for processor in &self.processors {
            let mut processor = processor.borrow_mut();
            if self.config.trace_ticks {
                log::trace!(
                    "Tick {}: running {} (dt = {delta_time})",
                    self.ticks,
                    processor.name()
                );
            }
            processor.update(delta_time).map_err(|error| {
                log::error!("Processor {} failed: {error}", processor.name());
                error
            })?;
        }
        self.ticks += 1;
        Ok(())
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self
            .processors
            .iter()
            .map(|processor| processor.try_borrow().map_or("<running>", |p| p.name()))
            .collect();
        f.debug_struct("Manager")
            .field("world", &self.world)
            .field("processors", &names)
            .field("ticks", &self.ticks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::error::EcsError;
    use crate::ecs::processor::{FnProcessor, ProcessorContext};

    struct Counter(u32);
    impl Component for Counter {}

    fn recorder(
        name: &'static str,
        log: &Rc<RefCell<Vec<&'static str>>>,
    ) -> FnProcessor<impl FnMut(&ProcessorContext, f32) -> EcsResult<()> + 'static> {
        let log = Rc::clone(log);
        FnProcessor::new(name, move |_: &ProcessorContext, _: f32| -> EcsResult<()> {
            log.borrow_mut().push(name);
            Ok(())
        })
    }

    #[test]
    fn test_update_runs_in_registration_order() {
        let mut manager = Manager::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        manager.add_processor(recorder("first", &log));
        manager.add_processor(recorder("second", &log));
        manager.add_processor(recorder("third", &log));

        manager.update(0.016).unwrap();

        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
        assert_eq!(manager.ticks(), 1);
    }

    #[test]
    fn test_shared_processor_runs_per_registration() {
        let mut manager = Manager::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let shared = manager.add_processor(recorder("twice", &log));
        manager.add_shared_processor(shared);

        manager.update(0.1).unwrap();

        assert_eq!(manager.processor_count(), 2);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_failing_processor_stops_tick() {
        let mut manager = Manager::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        manager.add_processor(recorder("before", &log));
        manager.add_processor(FnProcessor::new(
            "broken",
            |_: &ProcessorContext, _: f32| -> EcsResult<()> { Err(EcsError::UnboundProcessor) },
        ));
        manager.add_processor(recorder("after", &log));

        assert_eq!(manager.update(0.1), Err(EcsError::UnboundProcessor));
        assert_eq!(*log.borrow(), vec!["before"]);
        assert_eq!(manager.ticks(), 0);
    }

    #[test]
    fn test_kill_entity_purges_components() {
        let manager = Manager::new();
        let entity = manager.create_entity();
        let other = manager.create_entity();
        entity.add_component(Counter(1)).unwrap();
        other.add_component(Counter(2)).unwrap();

        manager.kill_entity(&entity).unwrap();

        let remaining: Vec<_> = manager
            .components_by_type::<Counter>()
            .map(|counter| counter.borrow().0)
            .collect();
        assert_eq!(remaining, vec![2]);
        assert!(!manager.contains(&entity));
        assert_eq!(manager.kill_entity(&entity), Err(EcsError::UnknownEntity(entity.id())));
    }

    #[test]
    fn test_with_config_presizes() {
        let config = ManagerConfig {
            entity_capacity: 64,
            processor_capacity: 8,
            trace_ticks: true,
        };
        let mut manager = Manager::with_config(config.clone());

        assert_eq!(manager.config(), &config);
        manager.update(0.0).unwrap();
        assert_eq!(manager.ticks(), 1);
    }

    #[test]
    fn test_debug_names_processors() {
        let mut manager = Manager::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        manager.add_processor(recorder("named", &log));

        assert!(format!("{manager:?}").contains("named"));
    }
}
