//! Math utilities and types
//!
//! Type aliases over nalgebra plus the matrix decomposition used by the
//! physics write-back and the scene hierarchy.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Rotation3, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Tolerance below which a homogeneous weight or axis length counts as zero
pub const DECOMPOSE_EPSILON: f32 = 1e-6;

/// Returned when a matrix cannot be split into translation, rotation and scale
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateTransform {
    /// The matrix contains NaN or infinite elements
    #[error("matrix contains non-finite elements")]
    NonFinite,

    /// The homogeneous weight `m[3][3]` is zero
    #[error("homogeneous weight is zero")]
    ZeroWeight,

    /// The bottom row carries a projective term
    #[error("matrix is projective")]
    Projective,

    /// One of the basis vectors has zero length
    #[error("basis axis {0} has zero length")]
    ZeroScale(usize),

    /// A parent matrix has no inverse
    #[error("matrix is not invertible")]
    Singular,
}

/// Split an affine matrix into `(translation, rotation, scale)`.
///
/// The matrix is normalised by its homogeneous weight first. Scale is the
/// length of each basis column; when the basis is mirrored (negative
/// determinant) all three scale factors and axes are negated so the
/// remaining basis is a proper rotation. Shear is not recovered.
///
/// # Errors
///
/// Returns [`DegenerateTransform`] for non-finite input, a zero weight, a
/// projective bottom row or a zero-length axis.
pub fn decompose_transform(matrix: &Mat4) -> Result<(Vec3, Quat, Vec3), DegenerateTransform> {
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(DegenerateTransform::NonFinite);
    }

    let weight = matrix[(3, 3)];
    if weight.abs() < DECOMPOSE_EPSILON {
        return Err(DegenerateTransform::ZeroWeight);
    }
    let inv_weight = 1.0 / weight;

    for col in 0..3 {
        if (matrix[(3, col)] * inv_weight).abs() > DECOMPOSE_EPSILON {
            return Err(DegenerateTransform::Projective);
        }
    }

    let translation = Vec3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]) * inv_weight;

    let mut axes = [Vec3::zeros(); 3];
    let mut scale = Vec3::zeros();
    for (i, axis) in axes.iter_mut().enumerate() {
        let column = Vec3::new(matrix[(0, i)], matrix[(1, i)], matrix[(2, i)]) * inv_weight;
        let length = column.norm();
        if length < DECOMPOSE_EPSILON {
            return Err(DegenerateTransform::ZeroScale(i));
        }
        scale[i] = length;
        *axis = column / length;
    }

    // Mirrored basis
    if axes[0].dot(&axes[1].cross(&axes[2])) < 0.0 {
        scale = -scale;
        for axis in &mut axes {
            *axis = -*axis;
        }
    }

    let basis = Mat3::from_columns(&axes);
    let rotation = Quat::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis));
    if !rotation.coords.iter().all(|v| v.is_finite()) {
        return Err(DegenerateTransform::NonFinite);
    }

    Ok((translation, rotation, scale))
}

/// Build `T * R * S` from its parts
pub fn recompose_transform(translation: &Vec3, rotation: &Quat, scale: &Vec3) -> Mat4 {
    Mat4::new_translation(translation)
        * rotation.to_homogeneous()
        * Mat4::new_nonuniform_scaling(scale)
}

/// Rotation of `angle` radians around +Z
pub fn rotation_z(angle: f32) -> Quat {
    Quat::from_axis_angle(&Vec3::z_axis(), angle)
}

/// Angle of a rotation around +Z, in radians
pub fn z_angle(rotation: &Quat) -> f32 {
    rotation.euler_angles().2
}

/// Position and orientation in the XY plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    /// Position in world units
    pub position: Vec2,
    /// Counter-clockwise rotation in radians
    pub angle: f32,
}

impl Pose2D {
    /// Create a pose
    pub const fn new(position: Vec2, angle: f32) -> Self {
        Self { position, angle }
    }

    /// Whether every field is finite
    pub fn is_finite(&self) -> bool {
        self.position.x.is_finite() && self.position.y.is_finite() && self.angle.is_finite()
    }

    /// Component-wise comparison within `epsilon`
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        approx::abs_diff_eq!(self.position, other.position, epsilon = epsilon)
            && approx::abs_diff_eq!(self.angle, other.angle, epsilon = epsilon)
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::new(Vec2::zeros(), 0.0)
    }
}

/// Reduce a world matrix to its XY pose, z translation and scale
///
/// A flattened z axis (scale z of zero) is accepted: only the x and y axes
/// have to be non-degenerate, and the returned scale z is zero.
///
/// # Errors
///
/// Propagates [`DegenerateTransform`] from [`decompose_transform`].
pub fn pose_2d(matrix: &Mat4) -> Result<(Pose2D, f32, Vec3), DegenerateTransform> {
    let flat = matrix.column(2).xyz().norm() < DECOMPOSE_EPSILON;
    let mut planar = *matrix;
    if flat {
        let x_axis = matrix.column(0).xyz();
        let y_axis = matrix.column(1).xyz();
        if let Some(normal) = x_axis.cross(&y_axis).try_normalize(DECOMPOSE_EPSILON) {
            let weight = matrix[(3, 3)];
            planar.set_column(2, &Vec4::new(normal.x * weight, normal.y * weight, normal.z * weight, matrix[(3, 2)]));
        }
    }

    let (translation, rotation, mut scale) = decompose_transform(&planar)?;
    if flat {
        scale.z = 0.0;
    }
    let pose = Pose2D::new(translation.xy(), z_angle(&rotation));
    Ok((pose, translation.z, scale))
}

/// Mathematical constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}
