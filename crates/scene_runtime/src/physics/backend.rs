//! Physics backend abstraction
//!
//! The bridge drives any rigid-body library through [`PhysicsBackend`]. The
//! default implementation is [`RapierBackend`](super::RapierBackend).

use crate::foundation::math::{Pose2D, Vec2};

use super::body::{BodyDesc, BodyProperties};

slotmap::new_key_type! {
    /// Opaque handle of a body inside a backend
    pub struct BodyHandle;
}

/// Begin or end of a contact between two bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyContact {
    /// First body
    pub a: BodyHandle,
    /// Second body
    pub b: BodyHandle,
    /// `true` when the contact started this step, `false` when it ended
    pub started: bool,
}

/// Rigid-body simulation consumed by the physics bridge
///
/// Handles stay valid until [`destroy_body`](Self::destroy_body); calls on
/// unknown handles are ignored.
pub trait PhysicsBackend {
    /// Current gravity
    fn gravity(&self) -> Vec2;

    /// Replace gravity
    fn set_gravity(&mut self, gravity: Vec2);

    /// Create a body together with its colliders
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    /// Destroy a body and its colliders; false if the handle is unknown
    fn destroy_body(&mut self, handle: BodyHandle) -> bool;

    /// Update damping, gravity scale and flags
    fn set_body_properties(&mut self, handle: BodyHandle, properties: &BodyProperties);

    /// World pose of the body
    fn body_pose(&self, handle: BodyHandle) -> Option<Pose2D>;

    /// Move the body. Kinematic bodies reach the pose over the next step.
    fn set_body_pose(&mut self, handle: BodyHandle, pose: Pose2D);

    /// Linear velocity
    fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec2>;

    /// Replace the linear velocity
    fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec2);

    /// Apply a force at the center of mass for the next step
    fn apply_force(&mut self, handle: BodyHandle, force: Vec2);

    /// Apply an instantaneous impulse at the center of mass
    fn apply_linear_impulse(&mut self, handle: BodyHandle, impulse: Vec2);

    /// Advance the simulation by `dt` seconds
    fn step(&mut self, dt: f32);

    /// Move contacts reported since the last call into `out`
    fn drain_contacts(&mut self, out: &mut Vec<BodyContact>);

    /// Number of live bodies
    fn body_count(&self) -> usize;
}
