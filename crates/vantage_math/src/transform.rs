//! Basis + translation transform used by the editor model
//!
//! A `LinearTransform` stores the three basis axes of an object and its
//! translation. It converts losslessly to an affine `Mat4` and back: the
//! matrix columns are the axes, so sheared bases survive the round trip.
//!
//! Decomposing into a `Pose` does lose shear. `to_pose` writes the exact
//! translation over the decomposed position, since decomposition is not
//! trusted to reproduce it.

use core::fmt;

use crate::matrix::{Mat3, Mat4};
use crate::pose::Pose;
use crate::vector::{Vec3, Vec4};

/// Ratio of `|det|` to the product of the axis lengths below which a basis
/// counts as degenerate.
const DEGENERATE_BASIS_RATIO: f32 = 1e-6;

/// Reasons a transform cannot be represented or decomposed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformError {
    /// A component is NaN or infinite
    NonFinite,
    /// The basis axes are zero-length or coplanar
    Singular,
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::NonFinite => write!(f, "transform has non-finite components"),
            TransformError::Singular => write!(f, "transform basis is not invertible"),
        }
    }
}

impl std::error::Error for TransformError {}

/// Object orientation and position as three basis axes plus a translation
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearTransform {
    pub left: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
    pub trans: Vec3,
}

impl LinearTransform {
    pub const IDENTITY: Self = Self {
        left: Vec3::X,
        up: Vec3::Y,
        forward: Vec3::Z,
        trans: Vec3::ZERO,
    };

    #[inline]
    pub const fn new(left: Vec3, up: Vec3, forward: Vec3, trans: Vec3) -> Self {
        Self { left, up, forward, trans }
    }

    #[inline]
    pub fn from_translation(trans: Vec3) -> Self {
        Self {
            trans,
            ..Self::IDENTITY
        }
    }

    /// Build the basis from a decomposed pose
    pub fn from_pose(pose: &Pose) -> Self {
        Self {
            left: pose.rotation * Vec3::X * pose.scale.x,
            up: pose.rotation * Vec3::Y * pose.scale.y,
            forward: pose.rotation * Vec3::Z * pose.scale.z,
            trans: pose.position,
        }
    }

    /// Set translation (builder pattern)
    #[inline]
    pub fn with_translation(mut self, trans: Vec3) -> Self {
        self.trans = trans;
        self
    }

    #[inline]
    pub fn basis(&self) -> Mat3 {
        Mat3::from_cols(self.left, self.up, self.forward)
    }

    /// Affine matrix with the basis in columns 0..3 and the translation in column 3
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_cols(
            self.left.extend(0.0),
            self.up.extend(0.0),
            self.forward.extend(0.0),
            self.trans.extend(1.0),
        )
    }

    /// Check the transform can be turned into a renderer pose
    pub fn validate(&self) -> Result<(), TransformError> {
        if !(self.left.is_finite() && self.up.is_finite() && self.forward.is_finite() && self.trans.is_finite()) {
            return Err(TransformError::NonFinite);
        }
        check_basis(&self.basis())
    }

    /// Read the axes and translation out of an affine matrix.
    pub fn from_matrix(matrix: &Mat4) -> Result<Self, TransformError> {
        if !matrix.is_finite() {
            return Err(TransformError::NonFinite);
        }
        check_basis(&matrix.linear())?;

        let [left, up, forward, trans] = matrix.cols.map(Vec4::truncate);
        Ok(Self::new(left, up, forward, trans))
    }

    /// Decompose into a renderer pose, re-asserting the exact translation.
    pub fn to_pose(&self) -> Result<Pose, TransformError> {
        self.validate()?;
        Ok(Pose::from_matrix(&self.to_matrix()).with_position(self.trans))
    }

    /// Component-wise comparison with an absolute tolerance
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.left.abs_diff_eq(other.left, epsilon)
            && self.up.abs_diff_eq(other.up, epsilon)
            && self.forward.abs_diff_eq(other.forward, epsilon)
            && self.trans.abs_diff_eq(other.trans, epsilon)
    }
}

impl Default for LinearTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<LinearTransform> for Mat4 {
    fn from(t: LinearTransform) -> Self {
        t.to_matrix()
    }
}

fn check_basis(basis: &Mat3) -> Result<(), TransformError> {
    let scale = basis.cols[0].length() * basis.cols[1].length() * basis.cols[2].length();
    let det = basis.determinant();
    if scale == 0.0 || det.abs() <= scale * DEGENERATE_BASIS_RATIO {
        return Err(TransformError::Singular);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quaternion::Quat;

    fn sample() -> LinearTransform {
        LinearTransform::from_pose(&Pose::new(
            Vec3::new(12.5, -3.0, 1024.25),
            Quat::from_axis_angle(Vec3::new(0.3, 1.0, -0.2), 2.1),
            Vec3::new(1.0, 2.0, 0.5),
        ))
    }

    #[test]
    fn test_identity_matrix() {
        assert_eq!(LinearTransform::IDENTITY.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_matrix_round_trip() {
        let t = sample();
        let back = LinearTransform::from_matrix(&t.to_matrix()).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_sheared_basis_survives_matrix() {
        // Rotated child under a parent scaled along x only
        let parent = Mat4::from_scale_rotation_translation(Vec3::new(3.0, 1.0, 1.0), Quat::IDENTITY, Vec3::ZERO);
        let child = Pose::new(Vec3::new(1.0, 2.0, 0.0), Quat::from_rotation_z(0.7), Vec3::ONE).to_matrix();
        let world = parent * child;
        assert!(world.cols[0].truncate().dot(world.cols[1].truncate()).abs() > 1e-3);

        let t = LinearTransform::from_matrix(&world).unwrap();
        assert_eq!(t.to_matrix(), world);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_translation_is_reasserted() {
        let m = LinearTransform::from_translation(Vec3::new(0.1, 0.2, 0.3)).to_matrix();
        let back = LinearTransform::from_matrix(&m).unwrap();
        assert_eq!(back.trans, Vec3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_pose_keeps_exact_translation() {
        let t = sample();
        let pose = t.to_pose().unwrap();
        assert_eq!(pose.position, t.trans);
    }

    #[test]
    fn test_singular_basis_rejected() {
        let t = LinearTransform::new(Vec3::X, Vec3::X, Vec3::Z, Vec3::ZERO);
        assert_eq!(t.validate(), Err(TransformError::Singular));
        assert_eq!(LinearTransform::from_matrix(&t.to_matrix()), Err(TransformError::Singular));
    }

    #[test]
    fn test_non_finite_rejected() {
        let t = LinearTransform::from_translation(Vec3::new(f32::NAN, 0.0, 0.0));
        assert_eq!(t.validate(), Err(TransformError::NonFinite));
    }
}
