//! Backend-neutral body and collider descriptions

use bitflags::bitflags;

use crate::foundation::math::{Pose2D, Vec2};

/// Simulation type of a rigid body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum BodyType {
    /// Never moves under simulation; driven by its transform
    Static = 0,
    /// Fully simulated; the physics world owns its pose
    #[default]
    Dynamic = 1,
    /// Moved by its transform, pushes dynamic bodies
    Kinematic = 2,
}

impl BodyType {
    /// Convert a raw serialized tag
    ///
    /// # Panics
    ///
    /// Panics on a tag outside `0..=2`; such a value can only come from a
    /// corrupted scene and there is no sensible body to build for it.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Static,
            1 => Self::Dynamic,
            2 => Self::Kinematic,
            other => panic!("unmapped rigid body type tag {other}"),
        }
    }

    /// Raw tag for serialization
    pub const fn as_raw(self) -> u8 {
        self as u8
    }

    /// Whether the transform drives the body rather than the simulation
    pub const fn is_transform_driven(self) -> bool {
        matches!(self, Self::Static | Self::Kinematic)
    }
}

bitflags! {
    /// Per-body simulation switches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BodyFlags: u8 {
        /// Lock rotation
        const FIXED_ROTATION = 1 << 0;
        /// Continuous collision detection for fast movers
        const BULLET = 1 << 1;
    }
}

/// Tunable properties that can change while a body is alive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyProperties {
    /// Multiplier on world gravity
    pub gravity_scale: f32,
    /// Linear velocity damping
    pub linear_damping: f32,
    /// Angular velocity damping
    pub angular_damping: f32,
    /// Simulation switches
    pub flags: BodyFlags,
}

impl Default for BodyProperties {
    fn default() -> Self {
        Self {
            gravity_scale: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            flags: BodyFlags::empty(),
        }
    }
}

/// Collision shape in body space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    /// Axis-aligned box given by half extents
    Box {
        /// Half width and half height
        half_extents: Vec2,
    },
    /// Circle
    Circle {
        /// Radius
        radius: f32,
    },
}

impl ColliderShape {
    /// Surface area
    pub fn area(&self) -> f32 {
        match *self {
            Self::Box { half_extents } => 4.0 * half_extents.x * half_extents.y,
            Self::Circle { radius } => std::f32::consts::PI * radius * radius,
        }
    }
}

/// Collider attached to a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderDesc {
    /// Shape
    pub shape: ColliderShape,
    /// Offset from the body origin
    pub offset: Vec2,
    /// Mass per unit area
    pub density: f32,
    /// Coulomb friction
    pub friction: f32,
    /// Bounciness
    pub restitution: f32,
    /// Reports contacts without a collision response
    pub is_sensor: bool,
    /// Category bits
    pub collision_category: u16,
    /// Categories it collides with; a pair collides only when each side's
    /// category is in the other's mask
    pub collision_mask: u16,
}

/// Everything needed to create a body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    /// Simulation type
    pub body_type: BodyType,
    /// Initial world pose
    pub pose: Pose2D,
    /// Tunable properties
    pub properties: BodyProperties,
    /// Mass added directly to the body when it carries no collider
    pub additional_mass: f32,
    /// Attached colliders
    pub colliders: Vec<ColliderDesc>,
}
