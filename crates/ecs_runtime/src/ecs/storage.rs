//! Type-erased component and event storage
//!
//! Every component type gets its own [`ComponentStore`], keyed by [`TypeId`]
//! in the [`Registry`]. Values are held as `Rc<RefCell<T>>` behind an
//! `Rc<dyn Any>` and recovered with a checked downcast, so a store only ever
//! hands out values of the exact type it was created for.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use slotmap::{SecondaryMap, SlotMap};

use super::component::{Component, ComponentType, Shared};
use super::entity::EntityId;
use super::error::{EcsError, EcsResult};
use super::event::Event;
use super::query::ComponentSet;

/// All components of one concrete type, keyed by entity
pub(crate) struct ComponentStore {
    ty: ComponentType,
    entries: SecondaryMap<EntityId, Rc<dyn Any>>,
}

impl ComponentStore {
    fn new(ty: ComponentType) -> Self {
        Self {
            ty,
            entries: SecondaryMap::new(),
        }
    }

    fn insert<T: Component>(&mut self, entity: EntityId, component: T) -> (Shared<T>, Evicted) {
        let shared = Rc::new(RefCell::new(component));
        let erased: Rc<dyn Any> = shared.clone();
        let previous = self.entries.insert(entity, erased);
        (shared, previous.into_iter().collect())
    }

    fn get<T: Component>(&self, entity: EntityId) -> Option<Shared<T>> {
        self.entries
            .get(entity)
            .and_then(|erased| Rc::clone(erased).downcast::<RefCell<T>>().ok())
    }

    fn remove(&mut self, entity: EntityId) -> Option<Rc<dyn Any>> {
        self.entries.remove(entity)
    }

    fn values<T: Component>(&self) -> Vec<Shared<T>> {
        self.entries
            .values()
            .filter_map(|erased| Rc::clone(erased).downcast::<RefCell<T>>().ok())
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Values taken out of the stores
///
/// Dropping one may run a component or event destructor, and such a
/// destructor is free to use entity handles. Callers hold it until their
/// registry borrow has ended and only then let it go.
pub(crate) struct Evicted(Vec<Rc<dyn Any>>);

impl Evicted {
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Rc<dyn Any>> for Evicted {
    fn from_iter<I: IntoIterator<Item = Rc<dyn Any>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Per-entity bookkeeping: which component types it currently carries
#[derive(Debug, Default)]
pub(crate) struct EntityRecord {
    types: Vec<ComponentType>,
}

/// One registered event singleton
#[derive(Clone)]
struct RegisteredEvent {
    name: &'static str,
    instance: Rc<dyn Any>,
}

/// Mapping from event type to its singleton instance
///
/// A registry, not a queue: publishing neither consumes nor creates
/// instances. Adding a second instance of a type replaces the first.
/// Clones share the registered instances.
#[derive(Clone, Default)]
pub struct EventStore {
    events: HashMap<TypeId, RegisteredEvent>,
}

impl EventStore {
    /// Store `event` as the singleton of its type, returning the shared
    /// handle and the instance it replaced, if any
    pub(crate) fn insert<E: Event>(&mut self, event: E) -> (Shared<E>, Evicted) {
        let shared = Rc::new(RefCell::new(event));
        let instance: Rc<dyn Any> = shared.clone();
        let replaced = self.events.insert(
            TypeId::of::<E>(),
            RegisteredEvent {
                name: std::any::type_name::<E>(),
                instance,
            },
        );
        (shared, replaced.map(|registered| registered.instance).into_iter().collect())
    }

    /// Current singleton for `E`
    pub fn get<E: Event>(&self) -> Option<Shared<E>> {
        self.events
            .get(&TypeId::of::<E>())
            .and_then(|registered| Rc::clone(&registered.instance).downcast::<RefCell<E>>().ok())
    }

    /// Whether an instance of `E` has been added
    pub fn contains<E: Event>(&self) -> bool {
        self.events.contains_key(&TypeId::of::<E>())
    }

    /// Number of registered event types
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no event has been registered
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Type names of the registered events, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.events.values().map(|registered| registered.name).collect();
        names.sort_unstable();
        names
    }
}

/// Entity set, component stores and event store shared by a manager and the
/// handles it gives out
pub(crate) struct Registry {
    entities: SlotMap<EntityId, EntityRecord>,
    components: HashMap<TypeId, ComponentStore>,
    pub(crate) events: EventStore,
}

impl Registry {
    pub(crate) fn with_capacity(entity_capacity: usize) -> Self {
        Self {
            entities: SlotMap::with_capacity_and_key(entity_capacity),
            components: HashMap::new(),
            events: EventStore::default(),
        }
    }

    pub(crate) fn spawn(&mut self) -> EntityId {
        self.entities.insert(EntityRecord::default())
    }

    /// Remove `entity` and every component it owns
    ///
    /// Every store is swept, not only those named in the entity's record.
    pub(crate) fn despawn(&mut self, entity: EntityId) -> EcsResult<Evicted> {
        let record = self
            .entities
            .remove(entity)
            .ok_or(EcsError::UnknownEntity(entity))?;

        let purged: Evicted = self
            .components
            .values_mut()
            .filter_map(|store| store.remove(entity))
            .collect();
        debug_assert_eq!(
            purged.len(),
            record.types.len(),
            "entity record out of step with component stores"
        );
        Ok(purged)
    }

    pub(crate) fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.contains_key(entity)
    }

    pub(crate) fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub(crate) fn live_ids(&self) -> Vec<EntityId> {
        self.entities.keys().collect()
    }

    /// Attach `component` to a live entity
    ///
    /// On success returns the new handle and the component it replaced. A
    /// dead entity hands the component back untouched with the error.
    pub(crate) fn insert_component<T: Component>(
        &mut self,
        entity: EntityId,
        component: T,
    ) -> Result<(Shared<T>, Evicted), (EcsError, T)> {
        let Some(record) = self.entities.get_mut(entity) else {
            return Err((EcsError::UnknownEntity(entity), component));
        };

        let ty = ComponentType::of::<T>();
        if !record.types.contains(&ty) {
            record.types.push(ty);
        }

        Ok(self
            .components
            .entry(ty.id())
            .or_insert_with(|| ComponentStore::new(ty))
            .insert(entity, component))
    }

    pub(crate) fn component<T: Component>(&self, entity: EntityId) -> Option<Shared<T>> {
        self.components.get(&TypeId::of::<T>())?.get(entity)
    }

    pub(crate) fn remove_component<T: Component>(&mut self, entity: EntityId) -> Evicted {
        let ty = ComponentType::of::<T>();
        if let Some(record) = self.entities.get_mut(entity) {
            record.types.retain(|held| *held != ty);
        }
        self.components
            .get_mut(&ty.id())
            .and_then(|store| store.remove(entity))
            .into_iter()
            .collect()
    }

    pub(crate) fn component_types(&self, entity: EntityId) -> Vec<ComponentType> {
        self.entities
            .get(entity)
            .map(|record| record.types.clone())
            .unwrap_or_default()
    }

    pub(crate) fn components_of<T: Component>(&self) -> Vec<Shared<T>> {
        self.components
            .get(&TypeId::of::<T>())
            .map(|store| store.values::<T>())
            .unwrap_or_default()
    }

    pub(crate) fn matches(&self, entity: EntityId, needed: &ComponentSet) -> bool {
        self.entities
            .get(entity)
            .is_some_and(|record| needed.is_subset_of(record.types.iter()))
    }

    /// Entities holding every type in `needed`, in slot order
    ///
    /// Walks the smallest store named by `needed` and checks membership in the
    /// others. An empty set yields every live entity.
    pub(crate) fn ids_with(&self, needed: &ComponentSet) -> Vec<EntityId> {
        if needed.is_empty() {
            return self.live_ids();
        }

        let mut stores = Vec::with_capacity(needed.len());
        for ty in needed {
            match self.components.get(&ty.id()) {
                Some(store) => stores.push(store),
                None => return Vec::new(),
            }
        }
        stores.sort_by_key(|store| store.len());

        let Some((smallest, rest)) = stores.split_first() else {
            return Vec::new();
        };

        smallest
            .entries
            .keys()
            .filter(|&entity| rest.iter().all(|store| store.entries.contains_key(entity)))
            .collect()
    }

    pub(crate) fn store_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.components.values().map(|store| store.ty.name()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position(i32, i32);
    impl Component for Position {}

    #[derive(Debug, PartialEq)]
    struct Velocity(i32, i32);
    impl Component for Velocity {}

    #[test]
    fn test_insert_overwrites_same_type() {
        let mut registry = Registry::with_capacity(4);
        let entity = registry.spawn();

        let (_, first) = registry.insert_component(entity, Position(1, 1)).ok().unwrap();
        let (_, second) = registry.insert_component(entity, Position(2, 3)).ok().unwrap();
        assert!(first.is_empty());
        assert_eq!(second.len(), 1);

        let position = registry.component::<Position>(entity).unwrap();
        assert_eq!(*position.borrow(), Position(2, 3));
        assert_eq!(registry.component_types(entity).len(), 1);
        assert_eq!(registry.components_of::<Position>().len(), 1);
    }

    #[test]
    fn test_insert_on_dead_entity_fails() {
        let mut registry = Registry::with_capacity(0);
        let entity = registry.spawn();
        registry.despawn(entity).unwrap();

        let (error, rejected) = registry.insert_component(entity, Position(0, 0)).err().unwrap();
        assert_eq!(error, EcsError::UnknownEntity(entity));
        assert_eq!(rejected, Position(0, 0));
        assert!(registry.components_of::<Position>().is_empty());
    }

    #[test]
    fn test_despawn_purges_every_store() {
        let mut registry = Registry::with_capacity(0);
        let doomed = registry.spawn();
        let survivor = registry.spawn();

        registry.insert_component(doomed, Position(0, 0)).ok().unwrap();
        registry.insert_component(doomed, Velocity(1, 0)).ok().unwrap();
        registry.insert_component(survivor, Position(5, 5)).ok().unwrap();

        assert_eq!(registry.despawn(doomed).map(|purged| purged.len()), Ok(2));
        assert!(registry.component::<Velocity>(doomed).is_none());
        assert!(registry.components_of::<Velocity>().is_empty());
        assert_eq!(registry.components_of::<Position>().len(), 1);
        assert_eq!(
            registry.despawn(doomed).err(),
            Some(EcsError::UnknownEntity(doomed))
        );
    }

    #[test]
    fn test_ids_with_intersects_stores() {
        let mut registry = Registry::with_capacity(0);
        let both = registry.spawn();
        let only_position = registry.spawn();

        registry.insert_component(both, Position(0, 0)).ok().unwrap();
        registry.insert_component(both, Velocity(0, 0)).ok().unwrap();
        registry.insert_component(only_position, Position(1, 1)).ok().unwrap();

        let needed = ComponentSet::new().with::<Position>().with::<Velocity>();
        assert_eq!(registry.ids_with(&needed), vec![both]);

        let positions = ComponentSet::new().with::<Position>();
        assert_eq!(registry.ids_with(&positions), vec![both, only_position]);

        assert_eq!(registry.ids_with(&ComponentSet::new()).len(), 2);
    }

    #[test]
    fn test_ids_with_unknown_type_is_empty() {
        let mut registry = Registry::with_capacity(0);
        let entity = registry.spawn();
        registry.insert_component(entity, Position(0, 0)).ok().unwrap();

        let needed = ComponentSet::new().with::<Velocity>();
        assert!(registry.ids_with(&needed).is_empty());
    }

    #[test]
    fn test_remove_component_updates_record() {
        let mut registry = Registry::with_capacity(0);
        let entity = registry.spawn();
        registry.insert_component(entity, Position(0, 0)).ok().unwrap();

        assert_eq!(registry.remove_component::<Position>(entity).len(), 1);
        assert!(registry.remove_component::<Position>(entity).is_empty());
        assert!(!registry.matches(entity, &ComponentSet::new().with::<Position>()));
        assert!(registry.component_types(entity).is_empty());
    }
}
