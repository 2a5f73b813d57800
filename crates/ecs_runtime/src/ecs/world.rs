//! ECS World implementation

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::component::{Component, Shared};
use super::entity::Entity;
use super::error::{EcsError, EcsResult};
use super::event::Event;
use super::query::ComponentSet;
use super::storage::{EventStore, Registry};

/// Shared view of a manager's entities, components and events
///
/// A `World` is a cheap handle: cloning it shares the same registry. The
/// [`Manager`](super::Manager) owns one and processors reach it through
/// [`ProcessorContext::world`](super::ProcessorContext::world). Sequences
/// returned here are snapshots taken at call time, so callers may create or
/// kill entities while iterating them.
#[derive(Clone)]
pub struct World {
    registry: Rc<RefCell<Registry>>,
}

impl World {
    pub(crate) fn with_capacity(entity_capacity: usize) -> Self {
        Self::from_registry(Rc::new(RefCell::new(Registry::with_capacity(entity_capacity))))
    }

    pub(crate) fn from_registry(registry: Rc<RefCell<Registry>>) -> Self {
        Self { registry }
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<Registry>> {
        Rc::downgrade(&self.registry)
    }

    /// Create a new entity bound to this world
    pub fn create_entity(&self) -> Entity {
        let id = self.registry.borrow_mut().spawn();
        log::debug!("Created entity {id:?}");
        Entity::bound(id, &self.registry)
    }

    /// Remove `entity` and every component attached to it
    pub fn kill_entity(&self, entity: &Entity) -> EcsResult<()> {
        if !entity.is_owned_by(&self.registry) {
            return Err(EcsError::UnknownEntity(entity.id()));
        }
        let purged = self.registry.borrow_mut().despawn(entity.id())?;
        log::debug!("Killed entity {:?} ({} components purged)", entity.id(), purged.len());
        drop(purged);
        Ok(())
    }

    /// Whether `entity` is live in this world
    pub fn contains(&self, entity: &Entity) -> bool {
        entity.is_owned_by(&self.registry) && self.registry.borrow().is_alive(entity.id())
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.registry.borrow().entity_count()
    }

    /// Get an iterator over all live entities
    pub fn entities(&self) -> impl Iterator<Item = Entity> {
        let ids = self.registry.borrow().live_ids();
        let registry = Rc::clone(&self.registry);
        ids.into_iter().map(move |id| Entity::bound(id, &registry))
    }

    /// Components stored under exactly type `T`
    pub fn components_by_type<T: Component>(&self) -> impl Iterator<Item = Shared<T>> {
        let components = self.registry.borrow().components_of::<T>();
        components.into_iter()
    }

    /// Entities holding a component of every type in `types`
    ///
    /// An empty set yields every live entity.
    pub fn entities_by_types(&self, types: &ComponentSet) -> impl Iterator<Item = Entity> {
        let ids = self.registry.borrow().ids_with(types);
        let registry = Rc::clone(&self.registry);
        ids.into_iter().map(move |id| Entity::bound(id, &registry))
    }

    /// Whether `entity` is live here and carries every type in `types`
    pub fn has_components(&self, entity: &Entity, types: &ComponentSet) -> bool {
        entity.is_owned_by(&self.registry) && self.registry.borrow().matches(entity.id(), types)
    }

    /// Snapshot of the event store
    ///
    /// The snapshot shares the registered instances but not the registry
    /// borrow, so holding it does not block entity or component changes.
    pub fn event_store(&self) -> EventStore {
        self.registry.borrow().events.clone()
    }

    /// Current singleton for event type `E`
    pub fn event<E: Event>(&self) -> Option<Shared<E>> {
        self.registry.borrow().events.get::<E>()
    }

    pub(crate) fn add_event<E: Event>(&self, event: E) -> Shared<E> {
        let (shared, replaced) = self.registry.borrow_mut().events.insert(event);
        if !replaced.is_empty() {
            log::warn!("Replaced registered event {}", std::any::type_name::<E>());
        } else {
            log::debug!("Registered event {}", std::any::type_name::<E>());
        }
        drop(replaced);
        shared
    }

    /// Invoke the singleton of `E` with `args` and return its output
    ///
    /// The registry is released before the event runs, so the event may use
    /// entities freely. Publishing `E` again from inside its own `call` fails
    /// with [`EcsError::EventInProgress`].
    pub fn publish<E: Event>(&self, args: E::Args) -> EcsResult<E::Output> {
        let name = std::any::type_name::<E>();
        let event = self
            .event::<E>()
            .ok_or(EcsError::UnregisteredEvent(name))?;
        let mut instance = event
            .try_borrow_mut()
            .map_err(|_| EcsError::EventInProgress(name))?;
        log::trace!("Publishing {name}");
        instance.call(args)
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("World")
            .field("entities", &registry.entity_count())
            .field("component_types", &registry.store_names())
            .field("events", &registry.events.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position(i32);
    impl Component for Position {}

    struct Echo;

    impl Event for Echo {
        type Args = i32;
        type Output = i32;

        fn call(&mut self, value: i32) -> EcsResult<i32> {
            Ok(value)
        }
    }

    struct Recurse {
        world: World,
    }

    impl Event for Recurse {
        type Args = ();
        type Output = ();

        fn call(&mut self, (): ()) -> EcsResult<()> {
            self.world.publish::<Self>(())
        }
    }

    /// Checks its entity when dropped
    struct Farewell {
        entity: Entity,
        seen: Rc<RefCell<Option<EcsResult<bool>>>>,
    }

    impl Event for Farewell {
        type Args = ();
        type Output = ();
    }

    impl Drop for Farewell {
        fn drop(&mut self) {
            *self.seen.borrow_mut() = Some(self.entity.has_component::<Position>());
        }
    }

    #[test]
    fn test_replaced_event_drops_outside_registry() {
        let world = World::with_capacity(0);
        let entity = world.create_entity();
        entity.add_component(Position(1)).unwrap();
        let seen = Rc::new(RefCell::new(None));

        world.add_event(Farewell {
            entity: entity.clone(),
            seen: Rc::clone(&seen),
        });
        world.add_event(Farewell {
            entity: entity.clone(),
            seen: Rc::new(RefCell::new(None)),
        });

        assert_eq!(*seen.borrow(), Some(Ok(true)));
    }

    #[test]
    fn test_entities_snapshot_allows_mutation() {
        let world = World::with_capacity(0);
        let first = world.create_entity();
        world.create_entity();

        let mut seen = 0;
        for entity in world.entities() {
            seen += 1;
            if entity == first {
                world.kill_entity(&entity).unwrap();
                world.create_entity();
            }
        }

        assert_eq!(seen, 2);
        assert_eq!(world.entity_count(), 2);
        assert!(!world.contains(&first));
    }

    #[test]
    fn test_kill_entity_from_other_world_fails() {
        let world = World::with_capacity(0);
        let other = World::with_capacity(0);
        world.create_entity();
        let foreign = other.create_entity();

        assert_eq!(
            world.kill_entity(&foreign),
            Err(EcsError::UnknownEntity(foreign.id()))
        );
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn test_publish_passes_result_back() {
        let world = World::with_capacity(0);
        assert_eq!(
            world.publish::<Echo>(1),
            Err(EcsError::UnregisteredEvent(std::any::type_name::<Echo>()))
        );

        world.add_event(Echo);
        assert_eq!(world.publish::<Echo>(7), Ok(7));
        assert!(world.event_store().contains::<Echo>());
    }

    #[test]
    fn test_reentrant_publish_is_rejected() {
        let world = World::with_capacity(0);
        world.add_event(Recurse {
            world: world.clone(),
        });

        assert_eq!(
            world.publish::<Recurse>(()),
            Err(EcsError::EventInProgress(std::any::type_name::<Recurse>()))
        );
    }

    #[test]
    fn test_debug_lists_stores() {
        let world = World::with_capacity(0);
        let entity = world.create_entity();
        entity.add_component(Position(3)).unwrap();

        let rendered = format!("{world:?}");
        assert!(rendered.contains("entities: 1"));
        assert!(rendered.contains("Position"));
    }
}
