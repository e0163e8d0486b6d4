//! Per-call access handed to behaviors

use crate::ecs::{hierarchy, Component, EcsError, Entity, World};
use crate::foundation::math::{Pose2D, Vec2};
use crate::physics::Physics2DBridge;
use crate::scene::spawn;

use super::CommandQueue;

/// What a behavior may touch during a callback
///
/// Component access on the bound entity and on other entities is immediate.
/// Destruction and [`defer`](Self::defer)red edits are applied by the scene
/// after the current pass. Physics helpers act on the bound entity's body and
/// return `false` / `None` when it has none.
pub struct ScriptContext<'a> {
    entity: Entity,
    world: &'a mut World,
    physics: Option<&'a mut Physics2DBridge>,
    commands: &'a mut CommandQueue,
}

impl<'a> ScriptContext<'a> {
    pub(crate) fn new(
        entity: Entity,
        world: &'a mut World,
        physics: Option<&'a mut Physics2DBridge>,
        commands: &'a mut CommandQueue,
    ) -> Self {
        Self {
            entity,
            world,
            physics,
            commands,
        }
    }

    /// Entity the behavior is bound to
    pub const fn entity(&self) -> Entity {
        self.entity
    }

    /// Read-only registry access
    pub fn world(&self) -> &World {
        &*self.world
    }

    /// Component of the bound entity
    ///
    /// # Errors
    ///
    /// See [`World::get_component`].
    pub fn get<T: Component>(&self) -> Result<&T, EcsError> {
        self.world.get_component(self.entity)
    }

    /// Mutable component of the bound entity
    ///
    /// # Errors
    ///
    /// See [`World::get_component_mut`].
    pub fn get_mut<T: Component>(&mut self) -> Result<&mut T, EcsError> {
        self.world.get_component_mut(self.entity)
    }

    /// Whether the bound entity holds a `T`
    pub fn has<T: Component>(&self) -> bool {
        self.world.has_component::<T>(self.entity)
    }

    /// Attach a component to the bound entity
    ///
    /// # Errors
    ///
    /// See [`World::add_component`].
    pub fn add<T: Component>(&mut self, component: T) -> Result<&mut T, EcsError> {
        self.world.add_component(self.entity, component)
    }

    /// Detach a component from the bound entity
    ///
    /// # Errors
    ///
    /// See [`World::remove_component`].
    pub fn remove<T: Component>(&mut self) -> Result<T, EcsError> {
        self.world.remove_component(self.entity)
    }

    /// Component of another entity
    ///
    /// # Errors
    ///
    /// See [`World::get_component`].
    pub fn component_of<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.world.get_component(entity)
    }

    /// Mutable component of another entity
    ///
    /// # Errors
    ///
    /// See [`World::get_component_mut`].
    pub fn component_of_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.world.get_component_mut(entity)
    }

    /// Create an entity with the default components
    ///
    /// A script component added to it starts at the next sync point.
    pub fn create_entity(&mut self, name: &str) -> Entity {
        spawn::spawn_entity(self.world, None, name)
    }

    /// Re-parent an entity
    ///
    /// # Errors
    ///
    /// See [`hierarchy::set_parent`].
    pub fn set_parent(&mut self, child: Entity, parent: Option<Entity>) -> Result<(), EcsError> {
        hierarchy::set_parent(self.world, child, parent)
    }

    /// First entity whose tag name matches
    pub fn find_entity_by_name(&self, name: &str) -> Option<Entity> {
        spawn::find_entity_by_name(self.world(), name)
    }

    /// Queue destruction of `entity` after the current pass
    pub fn destroy_entity(&mut self, entity: Entity) {
        self.commands.destroy(entity);
    }

    /// Queue destruction of the bound entity
    pub fn destroy_self(&mut self) {
        self.commands.destroy(self.entity);
    }

    /// Queue an arbitrary registry edit after the current pass
    pub fn defer(&mut self, edit: impl FnOnce(&mut World) + Send + 'static) {
        self.commands.edit(edit);
    }

    /// Whether the bound entity has a physics body
    pub fn has_body(&self) -> bool {
        self.physics.as_ref().is_some_and(|physics| physics.has_body(self.entity))
    }

    /// Pose of the bound entity's body
    pub fn body_pose(&self) -> Option<Pose2D> {
        self.physics.as_ref().and_then(|physics| physics.body_pose(self.entity))
    }

    /// Teleport the bound entity's body
    pub fn set_body_pose(&mut self, pose: Pose2D) -> bool {
        let entity = self.entity;
        self.physics
            .as_mut()
            .is_some_and(|physics| physics.set_body_pose(entity, pose))
    }

    /// Linear velocity of the bound entity's body
    pub fn linear_velocity(&self) -> Option<Vec2> {
        self.physics.as_ref().and_then(|physics| physics.linear_velocity(self.entity))
    }

    /// Replace the linear velocity of the bound entity's body
    pub fn set_linear_velocity(&mut self, velocity: Vec2) -> bool {
        let entity = self.entity;
        self.physics
            .as_mut()
            .is_some_and(|physics| physics.set_linear_velocity(entity, velocity))
    }

    /// Push the bound entity's body for the next step
    pub fn apply_force(&mut self, force: Vec2) -> bool {
        let entity = self.entity;
        self.physics
            .as_mut()
            .is_some_and(|physics| physics.apply_force(entity, force))
    }

    /// Kick the bound entity's body immediately
    pub fn apply_linear_impulse(&mut self, impulse: Vec2) -> bool {
        let entity = self.entity;
        self.physics
            .as_mut()
            .is_some_and(|physics| physics.apply_linear_impulse(entity, impulse))
    }
}
