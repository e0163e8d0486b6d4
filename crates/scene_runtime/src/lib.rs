//! # Scene Runtime
//!
//! Entities, components and their simulation: an ECS registry, an
//! Edit/Play/Paused state machine, a 2D physics bridge backed by rapier2d and
//! native scriptable behaviors, stepped together once per frame.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_runtime::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let mut scene = Scene::new();
//!
//!     let ground = scene.create_entity("Ground");
//!     scene.add_component(ground, Rigidbody2DComponent::new(BodyType::Static))?;
//!     scene.add_component(ground, BoxCollider2DComponent::new(Vec2::new(20.0, 1.0)))?;
//!
//!     let crate_box = scene.create_entity("Crate");
//!     scene.get_component_mut::<TransformComponent>(crate_box)?.position = Vec3::new(0.0, 5.0, 0.0);
//!     scene.add_component(crate_box, Rigidbody2DComponent::new(BodyType::Dynamic))?;
//!     scene.add_component(crate_box, BoxCollider2DComponent::default())?;
//!
//!     scene.on_runtime_start()?;
//!     let mut timer = Timer::new();
//!     for _ in 0..120 {
//!         scene.update(timer.tick());
//!     }
//!     scene.on_runtime_stop()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod ecs;
pub mod foundation;
pub mod physics;
pub mod scene;
pub mod scripting;

/// Common imports for runtime users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, PhysicsSettings, SceneSettings},
        ecs::{
            components::{
                BoxCollider2DComponent, CircleCollider2DComponent, IdComponent, NativeScriptComponent,
                RelationshipComponent, Rigidbody2DComponent, TagComponent, TransformComponent, Uuid,
            },
            Component, EcsError, Entity, World,
        },
        foundation::{
            math::{Mat4, Pose2D, Quat, Vec2, Vec3},
            time::{Stopwatch, Timer, Timestep},
        },
        physics::{BodyFlags, BodyType, ContactEvent, ContactKind, Physics2DBridge},
        scene::{Scene, SceneError, SceneState, SceneStats},
        scripting::{ScriptContext, ScriptableBehavior},
    };
}
