//! ECS World implementation
//!
//! The world is the component registry: it hands out generational
//! [`Entity`] handles and keeps one [`ComponentStorage`] per component type.
//! Every operation on a dead handle fails with [`EcsError::InvalidEntity`].
//!
//! Component references never outlive a mutating call: storage may relocate
//! when components are added, and the borrow checker rejects code that holds
//! a `&T` across `&mut self` methods.

use std::any::TypeId;
use std::collections::HashMap;

use slotmap::SlotMap;

use super::query::ComponentSet;
use super::storage::{ComponentColumn, ComponentStorage};
use super::{Component, EcsError, Entity};

/// ECS World containing all entities and components
#[derive(Default)]
pub struct World {
    entities: SlotMap<Entity, ()>,
    storages: HashMap<TypeId, Box<dyn ComponentColumn>>,
}

impl Clone for World {
    fn clone(&self) -> Self {
        Self {
            entities: self.entities.clone(),
            storages: self
                .storages
                .iter()
                .map(|(type_id, column)| (*type_id, column.boxed_clone()))
                .collect(),
        }
    }
}

fn downcast<T: Component>(column: &dyn ComponentColumn) -> &ComponentStorage<T> {
    column
        .as_any()
        .downcast_ref()
        .unwrap_or_else(|| unreachable!("column for {} stored under a foreign TypeId", std::any::type_name::<T>()))
}

fn downcast_mut<T: Component>(column: &mut dyn ComponentColumn) -> &mut ComponentStorage<T> {
    column
        .as_any_mut()
        .downcast_mut()
        .unwrap_or_else(|| unreachable!("column for {} stored under a foreign TypeId", std::any::type_name::<T>()))
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new entity with no components
    pub fn create_entity(&mut self) -> Entity {
        self.entities.insert(())
    }

    /// Destroy an entity and every component it holds
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if the handle is stale.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<(), EcsError> {
        if self.entities.remove(entity).is_none() {
            return Err(EcsError::InvalidEntity(entity));
        }
        for column in self.storages.values_mut() {
            column.remove_entity(entity);
        }
        Ok(())
    }

    /// Whether the handle refers to a live entity
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities in slot order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys()
    }

    /// Remove every entity and component
    pub fn clear(&mut self) {
        self.entities.clear();
        self.storages.clear();
    }

    fn ensure_alive(&self, entity: Entity) -> Result<(), EcsError> {
        if self.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::InvalidEntity(entity))
        }
    }

    /// Typed storage for `T`, if any component of that type was ever added
    pub fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages.get(&TypeId::of::<T>()).map(|column| downcast::<T>(&**column))
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .map(|column| downcast_mut::<T>(&mut **column))
    }

    /// Attach a component
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] for a stale handle and
    /// [`EcsError::DuplicateComponent`] if the kind is already present; the
    /// world is left unchanged in both cases.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<&mut T, EcsError> {
        self.ensure_alive(entity)?;
        let column = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::new()));

        downcast_mut::<T>(&mut **column)
            .try_insert(entity, component)
            .ok_or(EcsError::DuplicateComponent {
                entity,
                component: std::any::type_name::<T>(),
            })
    }

    /// Attach a component, replacing any existing one of the same kind
    ///
    /// Returns the replaced component. Stale handles are ignored.
    pub fn insert_component<T: Component>(&mut self, entity: Entity, component: T) -> Option<T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::new()));
        self.storage_mut::<T>()?.insert(entity, component)
    }

    /// Borrow a component
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] or [`EcsError::MissingComponent`].
    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.ensure_alive(entity)?;
        self.storage::<T>()
            .and_then(|storage| storage.get(entity))
            .ok_or_else(|| missing::<T>(entity))
    }

    /// Mutably borrow a component
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] or [`EcsError::MissingComponent`].
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.ensure_alive(entity)?;
        self.storage_mut::<T>()
            .and_then(|storage| storage.get_mut(entity))
            .ok_or_else(|| missing::<T>(entity))
    }

    /// Whether the entity holds a `T`; false for dead handles
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.is_alive(entity) && self.storage::<T>().is_some_and(|storage| storage.contains(entity))
    }

    /// Detach and return a component
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] or [`EcsError::MissingComponent`].
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<T, EcsError> {
        self.ensure_alive(entity)?;
        self.storage_mut::<T>()
            .and_then(|storage| storage.remove(entity))
            .ok_or_else(|| missing::<T>(entity))
    }

    /// Number of entities holding a `T`
    pub fn component_count<T: Component>(&self) -> usize {
        self.storage::<T>().map_or(0, ComponentStorage::len)
    }

    /// Visit every entity holding a `T`, in slot order
    ///
    /// The closure cannot reach the world, so structural changes during the
    /// traversal are impossible.
    pub fn for_each<T: Component>(&mut self, mut f: impl FnMut(Entity, &mut T)) {
        if let Some(storage) = self.storage_mut::<T>() {
            for (entity, component) in storage.iter_mut() {
                f(entity, component);
            }
        }
    }

    /// Visit every entity holding both an `A` and a `B`, in `A`'s slot order
    pub fn for_each2<A: Component, B: Component>(&mut self, mut f: impl FnMut(Entity, &mut A, &mut B)) {
        debug_assert_ne!(TypeId::of::<A>(), TypeId::of::<B>(), "for_each2 needs two distinct component types");
        if TypeId::of::<A>() == TypeId::of::<B>() {
            return;
        }

        // Lift B's column out so both can be borrowed mutably
        let Some(mut column_b) = self.storages.remove(&TypeId::of::<B>()) else {
            return;
        };
        if let Some(storage_a) = self.storage_mut::<A>() {
            let storage_b = downcast_mut::<B>(&mut *column_b);
            for (entity, a) in storage_a.iter_mut() {
                if let Some(b) = storage_b.get_mut(entity) {
                    f(entity, a, b);
                }
            }
        }
        self.storages.insert(TypeId::of::<B>(), column_b);
    }

    /// Snapshot of the entities holding every component in `Q`
    ///
    /// ```
    /// use scene_runtime::ecs::World;
    /// use scene_runtime::ecs::components::{TagComponent, TransformComponent};
    ///
    /// let mut world = World::new();
    /// let entity = world.create_entity();
    /// world.add_component(entity, TransformComponent::default()).unwrap();
    /// world.add_component(entity, TagComponent::new("crate")).unwrap();
    ///
    /// assert_eq!(world.view::<(TransformComponent, TagComponent)>(), vec![entity]);
    /// ```
    pub fn view<Q: ComponentSet>(&self) -> Vec<Entity> {
        self.entities
            .keys()
            .filter(|&entity| Q::is_contained_in(self, entity))
            .collect()
    }
}

fn missing<T: Component>(entity: Entity) -> EcsError {
    EcsError::MissingComponent {
        entity,
        component: std::any::type_name::<T>(),
    }
}
