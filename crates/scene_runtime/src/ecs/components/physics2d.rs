//! 2D physics components
//!
//! Authoring data only. The runtime body lives in the physics bridge's side
//! table for the duration of a Play session.

use crate::ecs::Component;
use crate::foundation::math::Vec2;
use crate::physics::{BodyFlags, BodyProperties, BodyType};

/// Category of a collider that was never assigned one
pub const DEFAULT_COLLISION_CATEGORY: u16 = 0x0001;

/// Mask that collides with every category
pub const DEFAULT_COLLISION_MASK: u16 = 0xFFFF;

/// Rigid body settings
#[derive(Debug, Clone, PartialEq)]
pub struct Rigidbody2DComponent {
    /// Simulation type
    pub body_type: BodyType,

    /// Simulation switches (fixed rotation, bullet)
    pub flags: BodyFlags,

    /// Total mass, spread over the colliders by area
    pub mass: f32,

    /// Multiplier on world gravity
    pub gravity_scale: f32,

    /// Linear velocity damping
    pub linear_damping: f32,

    /// Angular velocity damping
    pub angular_damping: f32,
}

impl Component for Rigidbody2DComponent {}

impl Default for Rigidbody2DComponent {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            flags: BodyFlags::empty(),
            mass: 1.0,
            gravity_scale: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.01,
        }
    }
}

impl Rigidbody2DComponent {
    /// Body of the given type with default settings
    pub fn new(body_type: BodyType) -> Self {
        Self {
            body_type,
            ..Default::default()
        }
    }

    /// Builder pattern: Set mass
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Builder pattern: Set gravity scale
    pub fn with_gravity_scale(mut self, gravity_scale: f32) -> Self {
        self.gravity_scale = gravity_scale;
        self
    }

    /// Builder pattern: Set damping
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Builder pattern: Add flags
    pub fn with_flags(mut self, flags: BodyFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Whether rotation is locked
    pub const fn fixed_rotation(&self) -> bool {
        self.flags.contains(BodyFlags::FIXED_ROTATION)
    }

    /// Live-tunable subset handed to the backend
    pub const fn properties(&self) -> BodyProperties {
        BodyProperties {
            gravity_scale: self.gravity_scale,
            linear_damping: self.linear_damping,
            angular_damping: self.angular_damping,
            flags: self.flags,
        }
    }
}

/// Box collider, sized in local units before the entity's scale
#[derive(Debug, Clone, PartialEq)]
pub struct BoxCollider2DComponent {
    /// Center offset from the entity origin
    pub offset: Vec2,

    /// Full width and height
    pub size: Vec2,

    /// Coulomb friction
    pub friction: f32,

    /// Bounciness
    pub restitution: f32,

    /// Detect contacts without a collision response
    pub is_sensor: bool,

    /// Category bits this collider belongs to
    pub collision_category: u16,

    /// Categories this collider collides with
    pub collision_mask: u16,
}

impl Component for BoxCollider2DComponent {}

impl Default for BoxCollider2DComponent {
    fn default() -> Self {
        Self {
            offset: Vec2::zeros(),
            size: Vec2::new(1.0, 1.0),
            friction: 0.3,
            restitution: 0.0,
            is_sensor: false,
            collision_category: DEFAULT_COLLISION_CATEGORY,
            collision_mask: DEFAULT_COLLISION_MASK,
        }
    }
}

impl BoxCollider2DComponent {
    /// Box of the given full size
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// Builder pattern: Set collision category and mask
    pub fn with_collision_filter(mut self, category: u16, mask: u16) -> Self {
        self.collision_category = category;
        self.collision_mask = mask;
        self
    }
}

/// Circle collider, radius in local units before the entity's scale
#[derive(Debug, Clone, PartialEq)]
pub struct CircleCollider2DComponent {
    /// Center offset from the entity origin
    pub offset: Vec2,

    /// Radius
    pub radius: f32,

    /// Coulomb friction
    pub friction: f32,

    /// Bounciness
    pub restitution: f32,

    /// Detect contacts without a collision response
    pub is_sensor: bool,

    /// Category bits this collider belongs to
    pub collision_category: u16,

    /// Categories this collider collides with
    pub collision_mask: u16,
}

impl Component for CircleCollider2DComponent {}

impl Default for CircleCollider2DComponent {
    fn default() -> Self {
        Self {
            offset: Vec2::zeros(),
            radius: 0.5,
            friction: 0.2,
            restitution: 0.0,
            is_sensor: false,
            collision_category: DEFAULT_COLLISION_CATEGORY,
            collision_mask: DEFAULT_COLLISION_MASK,
        }
    }
}

impl CircleCollider2DComponent {
    /// Circle of the given radius
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            ..Default::default()
        }
    }

    /// Builder pattern: Set collision category and mask
    pub fn with_collision_filter(mut self, category: u16, mask: u16) -> Self {
        self.collision_category = category;
        self.collision_mask = mask;
        self
    }
}
