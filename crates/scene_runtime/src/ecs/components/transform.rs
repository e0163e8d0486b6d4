//! Local transform of an entity
//!
//! Local-space translation, rotation and scale. World matrices are built by
//! walking the parent chain, see [`hierarchy`](crate::ecs::hierarchy).

use crate::ecs::Component;
use crate::foundation::math::{
    constants::{DEG_TO_RAD, RAD_TO_DEG},
    decompose_transform, recompose_transform, rotation_z, z_angle, DegenerateTransform, Mat4, Quat, Vec2, Vec3,
};

/// Translation, rotation and scale relative to the parent
///
/// Pure data relative to the parent entity (or the world for roots). The
/// physics bridge overwrites position x/y and the z rotation of dynamic
/// bodies after each step; z translation and scale are never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    /// Local position
    pub position: Vec3,

    /// Local rotation quaternion
    pub rotation: Quat,

    /// Local scale factors
    pub scale: Vec3,
}

impl Component for TransformComponent {}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl TransformComponent {
    /// No translation, no rotation, unit scale
    pub fn identity() -> Self {
        Self::default()
    }

    /// Identity rotation and scale at `position`
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create from a 2D position at depth zero
    pub fn from_xy(x: f32, y: f32) -> Self {
        Self::from_position(Vec3::new(x, y, 0.0))
    }

    /// Assemble from already-split parts
    pub const fn from_parts(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Create from a transformation matrix
    ///
    /// # Errors
    ///
    /// Fails for matrices that cannot be decomposed.
    pub fn from_matrix(matrix: &Mat4) -> Result<Self, DegenerateTransform> {
        let (position, rotation, scale) = decompose_transform(matrix)?;
        Ok(Self::from_parts(position, rotation, scale))
    }

    /// Local matrix, `T * R * S`
    pub fn to_matrix(&self) -> Mat4 {
        recompose_transform(&self.position, &self.rotation, &self.scale)
    }

    /// Replace the translation
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Replace the rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder pattern: Set rotation around +Z in radians
    pub fn with_rotation_z(mut self, angle: f32) -> Self {
        self.rotation = rotation_z(angle);
        self
    }

    /// Builder pattern: Set rotation from Euler angles in degrees (XYZ order)
    pub fn with_rotation_degrees(mut self, degrees: Vec3) -> Self {
        self.set_rotation_degrees(degrees);
        self
    }

    /// Same scale on every axis
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Per-axis scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Euler angles in degrees (roll, pitch, yaw)
    pub fn rotation_degrees(&self) -> Vec3 {
        let (roll, pitch, yaw) = self.rotation.euler_angles();
        Vec3::new(roll, pitch, yaw) * RAD_TO_DEG
    }

    /// Replace the rotation from Euler angles in degrees
    pub fn set_rotation_degrees(&mut self, degrees: Vec3) {
        let radians = degrees * DEG_TO_RAD;
        self.rotation = Quat::from_euler_angles(radians.x, radians.y, radians.z);
    }

    /// Rotation around +Z in radians
    pub fn angle_z(&self) -> f32 {
        z_angle(&self.rotation)
    }

    /// Position projected on the XY plane
    pub fn xy(&self) -> Vec2 {
        self.position.xy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::PI;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_transform_identity() {
        let transform = TransformComponent::identity();

        assert_eq!(transform.position, Vec3::zeros());
        assert_relative_eq!(transform.rotation, Quat::identity(), epsilon = EPSILON);
        assert_eq!(transform.scale, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_matrix_roundtrip_consistency() {
        let original = TransformComponent::from_parts(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&nalgebra::Unit::new_normalize(Vec3::new(1.0, 1.0, 1.0)), 0.5),
            Vec3::new(2.0, 1.5, 0.8),
        );

        let reconstructed = TransformComponent::from_matrix(&original.to_matrix()).unwrap();

        assert_relative_eq!(reconstructed.position, original.position, epsilon = EPSILON);
        assert_relative_eq!(reconstructed.scale, original.scale, epsilon = EPSILON);

        // q and -q are the same rotation
        let dot = original.rotation.coords.dot(&reconstructed.rotation.coords);
        assert!(dot.abs() > 0.999, "Quaternion rotation mismatch: dot product = {dot}");
    }

    #[test]
    fn test_rotation_degrees_roundtrip() {
        let transform = TransformComponent::identity().with_rotation_degrees(Vec3::new(0.0, 0.0, 90.0));

        assert_relative_eq!(transform.angle_z(), PI / 2.0, epsilon = EPSILON);
        assert_relative_eq!(transform.rotation_degrees(), Vec3::new(0.0, 0.0, 90.0), epsilon = 1e-3);
    }

    #[test]
    fn test_from_matrix_rejects_degenerate() {
        let flat = Mat4::new_nonuniform_scaling(&Vec3::new(0.0, 1.0, 1.0));
        assert!(TransformComponent::from_matrix(&flat).is_err());
    }
}
