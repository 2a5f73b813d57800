//! Entity implementation

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use super::component::{Component, ComponentType, Shared};
use super::error::{EcsError, EcsResult};
use super::storage::Registry;

slotmap::new_key_type! {
    /// Opaque entity identifier assigned by a [`Manager`](super::Manager)
    ///
    /// Identifiers are generational: a killed entity's id never matches the
    /// entity that later reuses its slot.
    pub struct EntityId;
}

/// Entity handle
///
/// Carries the entity id plus a weak back-reference to the owning manager's
/// registry. Handles are cheap to clone; all component operations go
/// straight to the manager's stores.
#[derive(Clone)]
pub struct Entity {
    id: EntityId,
    registry: Option<Weak<RefCell<Registry>>>,
}

impl Entity {
    /// Create a handle that is not bound to any manager
    ///
    /// Component operations on it fail with [`EcsError::UnboundEntity`].
    pub fn detached(id: EntityId) -> Self {
        Self { id, registry: None }
    }

    pub(crate) fn bound(id: EntityId, registry: &Rc<RefCell<Registry>>) -> Self {
        Self {
            id,
            registry: Some(Rc::downgrade(registry)),
        }
    }

    /// Get the entity ID
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Whether this handle was created by a manager
    pub fn is_bound(&self) -> bool {
        self.registry.is_some()
    }

    pub(crate) fn is_owned_by(&self, registry: &Rc<RefCell<Registry>>) -> bool {
        self.registry
            .as_ref()
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), Rc::as_ptr(registry)))
    }

    fn registry(&self) -> EcsResult<Rc<RefCell<Registry>>> {
        self.registry
            .as_ref()
            .ok_or(EcsError::UnboundEntity(self.id))?
            .upgrade()
            .ok_or(EcsError::ManagerDropped)
    }

    /// Attach `component`, replacing any component of the same type
    ///
    /// Returns the shared handle now held by the manager. Any replaced or
    /// rejected component is dropped after the stores are released, so its
    /// destructor may use entity handles.
    pub fn add_component<T: Component>(&self, component: T) -> EcsResult<Shared<T>> {
        let registry = self.registry()?;
        let inserted = registry.borrow_mut().insert_component(self.id, component);
        let (shared, replaced) = inserted.map_err(|(error, _rejected)| error)?;
        drop(replaced);
        Ok(shared)
    }

    /// Get the component of exactly type `T`, if attached
    pub fn get_component<T: Component>(&self) -> EcsResult<Option<Shared<T>>> {
        let registry = self.registry()?;
        let component = registry.borrow().component::<T>(self.id);
        Ok(component)
    }

    /// Remove the component of type `T`; a missing component is not an error
    pub fn del_component<T: Component>(&self) -> EcsResult<()> {
        let registry = self.registry()?;
        let removed = registry.borrow_mut().remove_component::<T>(self.id);
        drop(removed);
        Ok(())
    }

    /// Whether a component of exactly type `T` is attached
    pub fn has_component<T: Component>(&self) -> EcsResult<bool> {
        Ok(self.get_component::<T>()?.is_some())
    }

    /// Types currently attached, in the order they were first added
    pub fn component_types(&self) -> EcsResult<Vec<ComponentType>> {
        let registry = self.registry()?;
        let types = registry.borrow().component_types(self.id);
        Ok(types)
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        let same_owner = match (&self.registry, &other.registry) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            (None, None) => true,
            _ => false,
        };
        self.id == other.id && same_owner
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("bound", &self.is_bound())
            .finish()
    }
}
