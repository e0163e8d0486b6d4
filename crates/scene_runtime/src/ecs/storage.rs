//! Component storage
//!
//! One [`ComponentStorage`] per component type, keyed by [`Entity`]. The world
//! holds them type-erased behind [`ComponentColumn`].

use std::any::Any;

use slotmap::secondary::Entry;
use slotmap::SecondaryMap;

use super::{Component, Entity};

/// Dense-by-slot storage for a single component type
#[derive(Clone)]
pub struct ComponentStorage<T: Component> {
    components: SecondaryMap<Entity, T>,
}

impl<T: Component> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentStorage<T> {
    /// Create an empty storage
    pub fn new() -> Self {
        Self {
            components: SecondaryMap::new(),
        }
    }

    /// Insert a component, returning the previous one if present
    pub fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        self.components.insert(entity, component)
    }

    /// Insert only if `entity` has no component yet
    pub fn try_insert(&mut self, entity: Entity, component: T) -> Option<&mut T> {
        match self.components.entry(entity)? {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => Some(slot.insert(component)),
        }
    }

    /// Remove the component of `entity`
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.components.remove(entity)
    }

    /// Borrow the component of `entity`
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.components.get(entity)
    }

    /// Mutably borrow the component of `entity`
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.get_mut(entity)
    }

    /// Whether `entity` has this component
    pub fn contains(&self, entity: Entity) -> bool {
        self.components.contains_key(entity)
    }

    /// Number of stored components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the storage is empty
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Iterate in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.components.iter()
    }

    /// Iterate mutably in slot order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.components.iter_mut()
    }
}

/// Type-erased view of a [`ComponentStorage`]
pub trait ComponentColumn: Send + Sync {
    /// Drop the component of `entity`, if any
    fn remove_entity(&mut self, entity: Entity) -> bool;

    /// Whether `entity` has a component in this column
    fn contains(&self, entity: Entity) -> bool;

    /// Number of stored components
    fn len(&self) -> usize;

    /// Name of the stored type, for diagnostics
    fn component_name(&self) -> &'static str;

    /// Deep copy of the column
    fn boxed_clone(&self) -> Box<dyn ComponentColumn>;

    /// Upcast for downcasting to the concrete storage
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete storage
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ComponentColumn for ComponentStorage<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.components.remove(entity).is_some()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.components.contains_key(entity)
    }

    fn len(&self) -> usize {
        self.components.len()
    }

    fn component_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn boxed_clone(&self) -> Box<dyn ComponentColumn> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
