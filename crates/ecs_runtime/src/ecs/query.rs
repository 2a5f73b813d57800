//! Component type sets used to filter entities

use super::component::{Component, ComponentType};

/// Set of component types an entity must carry to match
///
/// Used both as the `needed` set of an [`EntityProcessor`](super::EntityProcessor)
/// and as the filter for [`Manager::entities_by_types`](super::Manager::entities_by_types).
/// An empty set matches every live entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentSet {
    types: Vec<ComponentType>,
}

impl ComponentSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self { types: Vec::new() }
    }

    /// Add `T` to the set (builder pattern)
    #[must_use]
    pub fn with<T: Component>(mut self) -> Self {
        self.insert(ComponentType::of::<T>());
        self
    }

    /// Add a type token, ignoring duplicates
    pub fn insert(&mut self, ty: ComponentType) -> bool {
        if self.types.contains(&ty) {
            false
        } else {
            self.types.push(ty);
            true
        }
    }

    /// Whether `ty` is part of the set
    pub fn contains(&self, ty: &ComponentType) -> bool {
        self.types.contains(ty)
    }

    /// Number of distinct types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate the types in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ComponentType> {
        self.types.iter()
    }

    /// Whether every type of this set is yielded by `held`
    pub fn is_subset_of<'a>(&self, held: impl IntoIterator<Item = &'a ComponentType> + Clone) -> bool {
        self.types
            .iter()
            .all(|needed| held.clone().into_iter().any(|ty| ty == needed))
    }
}

impl FromIterator<ComponentType> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = ComponentType>>(iter: I) -> Self {
        let mut set = Self::new();
        for ty in iter {
            set.insert(ty);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ComponentSet {
    type Item = &'a ComponentType;
    type IntoIter = std::slice::Iter<'a, ComponentType>;

    fn into_iter(self) -> Self::IntoIter {
        self.types.iter()
    }
}
