//! # Scene
//!
//! The scene owns the registry and, while running, the physics bridge and
//! the live behavior instances. It is the single place where the three are
//! stepped together:
//!
//! ```text
//!            on_runtime_start            pause
//!   Edit ───────────────────▶ Play ◀──────────▶ Paused
//!     ▲                        │      resume      │
//!     └────────────────────────┴──────────────────┘
//!                  on_runtime_stop
//! ```
//!
//! A frame in Play runs behavior updates, applies deferred commands, advances
//! physics, delivers contact callbacks and applies deferred commands again.
//! When [`Scene::update`] returns, every transform reflects the post-step
//! state.

mod error;
pub mod spawn;


use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::config::{PhysicsSettings, SceneSettings};
use crate::ecs::components::{NativeScriptComponent, Rigidbody2DComponent, TransformComponent, Uuid};
use crate::ecs::{hierarchy, Component, ComponentSet, EcsError, Entity, World};
use crate::foundation::math::Mat4;
use crate::foundation::time::{Stopwatch, Timestep};
use crate::physics::{Physics2DBridge, PhysicsBackend, RapierBackend, StepReport};
use crate::scripting::{CommandQueue, SceneCommand, ScriptHost};

pub use error::SceneError;

/// Builds the physics backend each time the scene enters Play
pub type BackendFactory = Arc<dyn Fn(&PhysicsSettings) -> Box<dyn PhysicsBackend> + Send + Sync>;

/// Simulation state of a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SceneState {
    /// Authoring; nothing is simulated
    #[default]
    Edit,
    /// Scripts and physics advance every update
    Play,
    /// Running but frozen
    Paused,
}

impl SceneState {
    /// Play or Paused
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Play | Self::Paused)
    }
}

impl fmt::Display for SceneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Edit => "Edit",
            Self::Play => "Play",
            Self::Paused => "Paused",
        };
        f.write_str(name)
    }
}

/// Performance statistics for the last simulated frame
#[derive(Debug, Clone, Default)]
pub struct SceneStats {
    /// Live entities
    pub entity_count: usize,

    /// Live behavior instances
    pub script_count: usize,

    /// Live physics bodies
    pub body_count: usize,

    /// Frames simulated since the last start
    pub frame_count: u64,

    /// Physics steps taken by the last frame
    pub physics_steps: u32,

    /// Time spent in behavior callbacks and command flushes (microseconds)
    pub script_time_us: u64,

    /// Time spent advancing physics (microseconds)
    pub physics_time_us: u64,
}

impl SceneStats {
    /// Total simulation time of the last frame in microseconds
    pub fn total_frame_time_us(&self) -> u64 {
        self.script_time_us + self.physics_time_us
    }
}

/// Entities, components and their runtime simulation
pub struct Scene {
    world: World,
    state: SceneState,
    settings: SceneSettings,
    physics: Option<Physics2DBridge>,
    scripts: ScriptHost,
    commands: CommandQueue,
    backend_factory: BackendFactory,
    stats: SceneStats,
}

impl Scene {
    /// Create an empty scene with default settings
    pub fn new() -> Self {
        Self::with_settings(SceneSettings::default())
    }

    /// Create an empty scene
    pub fn with_settings(settings: SceneSettings) -> Self {
        Self {
            world: World::new(),
            state: SceneState::Edit,
            settings,
            physics: None,
            scripts: ScriptHost::new(),
            commands: CommandQueue::new(),
            backend_factory: Arc::new(|_: &PhysicsSettings| Box::<RapierBackend>::default() as Box<dyn PhysicsBackend>),
            stats: SceneStats::default(),
        }
    }

    /// Replace the physics backend used by the next Play session
    pub fn set_backend_factory(
        &mut self,
        factory: impl Fn(&PhysicsSettings) -> Box<dyn PhysicsBackend> + Send + Sync + 'static,
    ) {
        self.backend_factory = Arc::new(factory);
    }

    /// Independent edit-time duplicate
    ///
    /// Entity handles, UUIDs and components are identical in the copy.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidStateTransition`] unless the scene is in Edit.
    pub fn copy(&self) -> Result<Self, SceneError> {
        self.expect_state(SceneState::Edit, "copy")?;
        Ok(Self {
            world: self.world.clone(),
            state: SceneState::Edit,
            settings: self.settings.clone(),
            physics: None,
            scripts: ScriptHost::new(),
            commands: CommandQueue::new(),
            backend_factory: Arc::clone(&self.backend_factory),
            stats: SceneStats::default(),
        })
    }

    // ---- entities ----

    /// Create an entity with Id, Tag, Transform and Relationship components
    pub fn create_entity(&mut self, name: &str) -> Entity {
        spawn::spawn_entity(&mut self.world, None, name)
    }

    /// Like [`create_entity`](Self::create_entity) with a known UUID
    pub fn create_entity_with_uuid(&mut self, uuid: Uuid, name: &str) -> Entity {
        spawn::spawn_entity(&mut self.world, Some(uuid), name)
    }

    /// Destroy an entity together with its descendants
    ///
    /// While running, bound behaviors receive `on_destroy` before any
    /// component of their entity is removed, and bodies are destroyed.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] for a stale handle.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<(), SceneError> {
        if !self.world.is_alive(entity) {
            return Err(EcsError::InvalidEntity(entity).into());
        }
        self.destroy_tree(entity);
        Ok(())
    }

    fn destroy_tree(&mut self, root: Entity) {
        let doomed = hierarchy::descendants(&self.world, root);

        for &entity in &doomed {
            self.scripts
                .destroy(entity, &mut self.world, self.physics.as_mut(), &mut self.commands);
        }

        hierarchy::detach(&mut self.world, root);
        for entity in doomed {
            if let Some(physics) = self.physics.as_mut() {
                physics.remove_body(entity);
            }
            if self.world.destroy_entity(entity).is_ok() {
                log::debug!("Destroyed entity {entity}");
            }
        }
    }

    /// Whether the handle refers to a live entity
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.world.is_alive(entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.world.entity_count()
    }

    /// Entity whose Id component carries `uuid`
    pub fn entity_by_uuid(&self, uuid: Uuid) -> Option<Entity> {
        spawn::entity_by_uuid(&self.world, uuid)
    }

    /// First entity whose tag name equals `name`
    pub fn find_entity_by_name(&self, name: &str) -> Option<Entity> {
        spawn::find_entity_by_name(&self.world, name)
    }

    // ---- components ----

    /// Attach a component
    ///
    /// A [`NativeScriptComponent`] attached while running is instantiated
    /// immediately and its `on_create` runs before this returns.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] or [`EcsError::DuplicateComponent`].
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<&mut T, SceneError> {
        self.world.add_component(entity, component)?;

        if self.state.is_running() && is::<T, NativeScriptComponent>() {
            self.scripts
                .instantiate(entity, &mut self.world, self.physics.as_mut(), &mut self.commands);
        }
        Ok(self.world.get_component_mut(entity)?)
    }

    /// Borrow a component
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] or [`EcsError::MissingComponent`].
    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<&T, SceneError> {
        Ok(self.world.get_component(entity)?)
    }

    /// Mutably borrow a component
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] or [`EcsError::MissingComponent`].
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, SceneError> {
        Ok(self.world.get_component_mut(entity)?)
    }

    /// Whether `entity` holds a `T`; false for stale handles
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.world.has_component::<T>(entity)
    }

    /// Detach a component and return it
    ///
    /// While running, removing a [`NativeScriptComponent`] runs the
    /// behavior's `on_destroy` first, and removing a
    /// [`Rigidbody2DComponent`] destroys the body. An entity that keeps a
    /// collider gets an implicit static body at the next advance.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] or [`EcsError::MissingComponent`].
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<T, SceneError> {
        self.world.get_component::<T>(entity)?;

        if is::<T, NativeScriptComponent>() {
            self.scripts
                .destroy(entity, &mut self.world, self.physics.as_mut(), &mut self.commands);
        }
        let component = self.world.remove_component::<T>(entity)?;

        if is::<T, Rigidbody2DComponent>() {
            if let Some(physics) = self.physics.as_mut() {
                physics.remove_body(entity);
            }
        }
        Ok(component)
    }

    /// Visit every entity holding a `T`, in slot order
    pub fn for_each<T: Component>(&mut self, f: impl FnMut(Entity, &mut T)) {
        self.world.for_each(f);
    }

    /// Visit every entity holding both an `A` and a `B`, in slot order
    pub fn for_each2<A: Component, B: Component>(&mut self, f: impl FnMut(Entity, &mut A, &mut B)) {
        self.world.for_each2(f);
    }

    /// Snapshot of entities holding every component kind in `Q`
    pub fn view<Q: ComponentSet>(&self) -> Vec<Entity> {
        self.world.view::<Q>()
    }

    // ---- hierarchy ----

    /// Attach `child` under `parent`, or make it a root with `None`
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] or [`EcsError::HierarchyCycle`].
    pub fn set_parent(&mut self, child: Entity, parent: Option<Entity>) -> Result<(), SceneError> {
        Ok(hierarchy::set_parent(&mut self.world, child, parent)?)
    }

    /// Local-to-world matrix of `entity`
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] for a stale handle.
    pub fn world_matrix(&self, entity: Entity) -> Result<Mat4, SceneError> {
        Ok(hierarchy::world_matrix(&self.world, entity)?)
    }

    /// World-space transform of `entity`
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] for a stale handle and
    /// [`SceneError::DegenerateTransform`] when the composed matrix cannot be
    /// decomposed.
    pub fn world_transform(&self, entity: Entity) -> Result<TransformComponent, SceneError> {
        let matrix = self.world_matrix(entity)?;
        Ok(TransformComponent::from_matrix(&matrix)?)
    }

    // ---- state machine ----

    /// Enter Play: build the physics world and instantiate behaviors
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidStateTransition`] unless the scene is in Edit.
    pub fn on_runtime_start(&mut self) -> Result<(), SceneError> {
        self.expect_state(SceneState::Edit, "start the runtime")?;

        let backend = (self.backend_factory)(&self.settings.physics);
        let mut physics = Physics2DBridge::new(backend, self.settings.physics.clone());
        physics.build(&self.world);
        self.physics = Some(physics);
        self.state = SceneState::Play;
        self.stats = SceneStats::default();

        let created = self
            .scripts
            .instantiate_pending(&mut self.world, self.physics.as_mut(), &mut self.commands);
        self.flush_commands();

        log::info!(
            "Scene '{}' entered Play: {} entities, {} bodies, {} scripts",
            self.settings.name,
            self.world.entity_count(),
            self.physics.as_ref().map_or(0, Physics2DBridge::body_count),
            created
        );
        Ok(())
    }

    /// Return to Edit: destroy every behavior and the physics world
    ///
    /// Transforms keep their last simulated values.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidStateTransition`] unless the scene is running.
    pub fn on_runtime_stop(&mut self) -> Result<(), SceneError> {
        if !self.state.is_running() {
            return Err(self.invalid_transition("stop the runtime"));
        }

        self.scripts
            .destroy_all(&mut self.world, self.physics.as_mut(), &mut self.commands);
        self.physics = None;
        self.state = SceneState::Edit;
        self.flush_commands();

        log::info!(
            "Scene '{}' returned to Edit after {} frames",
            self.settings.name,
            self.stats.frame_count
        );
        Ok(())
    }

    /// Freeze scripts and physics
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidStateTransition`] unless the scene is in Play.
    pub fn pause(&mut self) -> Result<(), SceneError> {
        self.expect_state(SceneState::Play, "pause")?;
        self.state = SceneState::Paused;
        log::info!("Scene '{}' paused", self.settings.name);
        Ok(())
    }

    /// Continue after [`pause`](Self::pause)
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidStateTransition`] unless the scene is Paused.
    pub fn resume(&mut self) -> Result<(), SceneError> {
        self.expect_state(SceneState::Paused, "resume")?;
        self.state = SceneState::Play;
        log::info!("Scene '{}' resumed", self.settings.name);
        Ok(())
    }

    /// Advance the simulation by one frame
    ///
    /// Only Play advances anything; Edit and Paused return immediately.
    pub fn update(&mut self, dt: Timestep) {
        if self.state != SceneState::Play {
            return;
        }

        let script_watch = Stopwatch::start_new();
        self.scripts
            .update_all(dt, &mut self.world, self.physics.as_mut(), &mut self.commands);
        self.sync_point();
        let mut script_time_us = script_watch.elapsed_micros();

        let physics_watch = Stopwatch::start_new();
        let mut steps = 0;
        let contacts = match self.physics.as_mut() {
            Some(physics) => {
                steps = physics.advance(&mut self.world, dt).steps;
                physics.take_contacts()
            }
            None => Vec::new(),
        };
        let physics_time_us = physics_watch.elapsed_micros();

        let contact_watch = Stopwatch::start_new();
        if !contacts.is_empty() {
            self.scripts
                .dispatch_contacts(&contacts, &mut self.world, self.physics.as_mut(), &mut self.commands);
        }
        self.sync_point();
        script_time_us += contact_watch.elapsed_micros();

        self.stats.frame_count += 1;
        if self.settings.enable_stats {
            self.update_stats(steps, script_time_us, physics_time_us);
        }
    }

    /// Apply deferred commands, then reconcile behaviors with script components
    fn sync_point(&mut self) {
        self.flush_commands();
        self.scripts
            .destroy_orphans(&mut self.world, self.physics.as_mut(), &mut self.commands);
        self.scripts
            .instantiate_pending(&mut self.world, self.physics.as_mut(), &mut self.commands);
    }

    fn flush_commands(&mut self) {
        for command in self.commands.take() {
            match command {
                SceneCommand::Destroy(entity) if self.world.is_alive(entity) => self.destroy_tree(entity),
                SceneCommand::Destroy(entity) => log::debug!("Ignoring destroy of dead entity {entity}"),
                SceneCommand::Edit(edit) => edit(&mut self.world),
            }
        }
    }

    fn update_stats(&mut self, steps: u32, script_time_us: u64, physics_time_us: u64) {
        self.stats.entity_count = self.world.entity_count();
        self.stats.script_count = self.scripts.len();
        self.stats.body_count = self.physics.as_ref().map_or(0, Physics2DBridge::body_count);
        self.stats.physics_steps = steps;
        self.stats.script_time_us = script_time_us;
        self.stats.physics_time_us = physics_time_us;
    }

    fn expect_state(&self, expected: SceneState, action: &'static str) -> Result<(), SceneError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid_transition(action))
        }
    }

    fn invalid_transition(&self, action: &'static str) -> SceneError {
        log::warn!("Rejected attempt to {action} in {} state", self.state);
        SceneError::InvalidStateTransition {
            from: self.state,
            action,
        }
    }

    // ---- accessors ----

    /// Current simulation state
    pub const fn state(&self) -> SceneState {
        self.state
    }

    /// Play or Paused
    pub const fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Scene settings
    pub const fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// Read access to the registry, for render collaborators
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Direct registry access
    ///
    /// Structural edits made here bypass behavior callbacks; the next sync
    /// point reconciles bodies and instances.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Physics bridge of the running session
    pub const fn physics(&self) -> Option<&Physics2DBridge> {
        self.physics.as_ref()
    }

    /// Mutable physics bridge of the running session
    pub fn physics_mut(&mut self) -> Option<&mut Physics2DBridge> {
        self.physics.as_mut()
    }

    /// Outcome of the last physics advance
    pub fn last_step_report(&self) -> Option<&StepReport> {
        self.physics.as_ref().map(Physics2DBridge::last_report)
    }

    /// Number of live behavior instances
    pub fn script_count(&self) -> usize {
        self.scripts.len()
    }

    /// Whether `entity` has a live behavior instance
    pub fn has_script_instance(&self, entity: Entity) -> bool {
        self.scripts.contains(entity)
    }

    /// Statistics of the last simulated frame
    pub const fn stats(&self) -> &SceneStats {
        &self.stats
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

fn is<T: 'static, U: 'static>() -> bool {
    TypeId::of::<T>() == TypeId::of::<U>()
}
