//! Component trait and type tokens

use std::any::TypeId;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Marker trait for components
///
/// Components are keyed by their concrete type. Wrapping a component in a
/// newtype gives it a separate store; there is no subtype matching.
pub trait Component: 'static {}

/// Shared handle to a value owned by a manager store
///
/// Lookups return a clone of the stored handle, so mutations through it are
/// visible to every later lookup.
pub type Shared<T> = Rc<RefCell<T>>;

/// Runtime token identifying a concrete component type
///
/// Equality, ordering and hashing only look at the [`TypeId`]; the name is
/// kept for logs and error messages.
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
}

impl ComponentType {
    /// Token for component type `T`
    pub fn of<T: Component>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Underlying type id
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentType({})", self.name)
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for ComponentType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ComponentType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Health;
    impl Component for Health {}

    struct Armor;
    impl Component for Armor {}

    #[test]
    fn test_component_type_identity() {
        assert_eq!(ComponentType::of::<Health>(), ComponentType::of::<Health>());
        assert_ne!(ComponentType::of::<Health>(), ComponentType::of::<Armor>());
        assert_eq!(ComponentType::of::<Health>().id(), TypeId::of::<Health>());
    }

    #[test]
    fn test_component_type_name() {
        let ty = ComponentType::of::<Armor>();
        assert!(ty.name().ends_with("Armor"));
        assert!(format!("{ty:?}").contains("Armor"));
    }
}
