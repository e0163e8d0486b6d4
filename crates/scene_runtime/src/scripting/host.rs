//! Behavior instance side table
//!
//! Instances are kept in instantiation order and updated in that order. An
//! entity has at most one instance; it is created from the entity's
//! [`NativeScriptComponent`] and dropped right after its `on_destroy`.
//! Disabled entities are neither instantiated nor updated.

use std::collections::HashSet;

use crate::ecs::components::{is_enabled, NativeScriptComponent};
use crate::ecs::{Entity, World};
use crate::foundation::time::Timestep;
use crate::physics::{ContactEvent, ContactKind, Physics2DBridge};

use super::{CommandQueue, ScriptContext, ScriptableBehavior};

struct ScriptInstance {
    entity: Entity,
    behavior: Box<dyn ScriptableBehavior>,
}

/// Owns every live behavior instance of a running scene
#[derive(Default)]
pub struct ScriptHost {
    instances: Vec<ScriptInstance>,
    bound: HashSet<Entity>,
}

impl ScriptHost {
    /// Create an empty host
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no instance is alive
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Whether `entity` has a live instance
    pub fn contains(&self, entity: Entity) -> bool {
        self.bound.contains(&entity)
    }

    /// Entities with live instances, in update order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.instances.iter().map(|instance| instance.entity)
    }

    /// Instantiate the behavior bound to `entity` and run its `on_create`
    ///
    /// Returns false if the entity has no script component, is disabled or
    /// already has an instance.
    pub fn instantiate(
        &mut self,
        entity: Entity,
        world: &mut World,
        physics: Option<&mut Physics2DBridge>,
        commands: &mut CommandQueue,
    ) -> bool {
        if self.contains(entity) || !is_enabled(world, entity) {
            return false;
        }
        let Ok(script) = world.get_component::<NativeScriptComponent>(entity) else {
            return false;
        };
        let name = script.behavior_name();
        let mut behavior = script.instantiate();

        behavior.on_create(&mut ScriptContext::new(entity, world, physics, commands));
        log::debug!("Instantiated {name} on entity {entity}");

        self.bound.insert(entity);
        self.instances.push(ScriptInstance { entity, behavior });
        true
    }

    /// Instantiate every script component that has no instance yet
    pub fn instantiate_pending(
        &mut self,
        world: &mut World,
        mut physics: Option<&mut Physics2DBridge>,
        commands: &mut CommandQueue,
    ) -> usize {
        let pending: Vec<Entity> = world
            .storage::<NativeScriptComponent>()
            .map(|storage| {
                storage
                    .iter()
                    .map(|(entity, _)| entity)
                    .filter(|entity| !self.contains(*entity))
                    .collect()
            })
            .unwrap_or_default();

        pending
            .into_iter()
            .filter(|&entity| self.instantiate(entity, world, physics.as_deref_mut(), commands))
            .count()
    }

    /// Run `on_update` on every enabled instance in instantiation order
    pub fn update_all(
        &mut self,
        dt: Timestep,
        world: &mut World,
        mut physics: Option<&mut Physics2DBridge>,
        commands: &mut CommandQueue,
    ) {
        for instance in &mut self.instances {
            if !is_enabled(world, instance.entity) {
                continue;
            }
            let mut ctx = ScriptContext::new(instance.entity, world, physics.as_deref_mut(), commands);
            instance.behavior.on_update(&mut ctx, dt);
        }
    }

    /// Deliver contact callbacks to the instances of both participants
    pub fn dispatch_contacts(
        &mut self,
        contacts: &[ContactEvent],
        world: &mut World,
        mut physics: Option<&mut Physics2DBridge>,
        commands: &mut CommandQueue,
    ) {
        for contact in contacts {
            for instance in &mut self.instances {
                let other = if instance.entity == contact.a {
                    contact.b
                } else if instance.entity == contact.b {
                    contact.a
                } else {
                    continue;
                };
                let mut ctx = ScriptContext::new(instance.entity, world, physics.as_deref_mut(), commands);
                match contact.kind {
                    ContactKind::Begin => instance.behavior.on_collision_begin(&mut ctx, other),
                    ContactKind::End => instance.behavior.on_collision_end(&mut ctx, other),
                }
            }
        }
    }

    /// Run `on_destroy` for `entity`'s instance and drop it
    ///
    /// Returns false if the entity had no instance.
    pub fn destroy(
        &mut self,
        entity: Entity,
        world: &mut World,
        physics: Option<&mut Physics2DBridge>,
        commands: &mut CommandQueue,
    ) -> bool {
        if !self.bound.remove(&entity) {
            return false;
        }
        let Some(index) = self.instances.iter().position(|instance| instance.entity == entity) else {
            return false;
        };
        let mut instance = self.instances.remove(index);
        instance
            .behavior
            .on_destroy(&mut ScriptContext::new(entity, world, physics, commands));
        log::debug!("Destroyed script instance of entity {entity}");
        true
    }

    /// Destroy instances whose entity died or lost its script component
    pub fn destroy_orphans(
        &mut self,
        world: &mut World,
        mut physics: Option<&mut Physics2DBridge>,
        commands: &mut CommandQueue,
    ) -> usize {
        let orphans: Vec<Entity> = self
            .instances
            .iter()
            .map(|instance| instance.entity)
            .filter(|&entity| !world.has_component::<NativeScriptComponent>(entity))
            .collect();

        orphans
            .into_iter()
            .filter(|&entity| self.destroy(entity, world, physics.as_deref_mut(), commands))
            .count()
    }

    /// Destroy every instance in instantiation order
    pub fn destroy_all(
        &mut self,
        world: &mut World,
        mut physics: Option<&mut Physics2DBridge>,
        commands: &mut CommandQueue,
    ) {
        for mut instance in std::mem::take(&mut self.instances) {
            instance
                .behavior
                .on_destroy(&mut ScriptContext::new(instance.entity, world, physics.as_deref_mut(), commands));
        }
        self.bound.clear();
    }
}
