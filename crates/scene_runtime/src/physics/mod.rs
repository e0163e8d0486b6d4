//! 2D physics integration
//!
//! The scene talks to the simulation only through [`Physics2DBridge`], which
//! owns a [`PhysicsBackend`] (rapier2d by default) for the duration of a Play
//! session and keeps bodies and transforms consistent across frames.

pub mod backend;
pub mod body;
pub mod bridge;
pub mod rapier;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{BodyContact, BodyHandle, PhysicsBackend};
pub use body::{BodyDesc, BodyFlags, BodyProperties, BodyType, ColliderDesc, ColliderShape};
pub use bridge::{ContactEvent, ContactKind, FaultStage, Physics2DBridge, StepReport, TransformFault};
pub use rapier::RapierBackend;
