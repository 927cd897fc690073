//! # vantage_math - Affine Transform Math
//!
//! Math primitives for editing scene objects:
//! - Column-major `Mat3` / `Mat4` with inverse and TRS decomposition
//! - `Quat` rotations
//! - `Pose`, the position/rotation/scale form a renderer stores per node
//! - `LinearTransform`, the basis + translation form the editor model stores

pub mod vector;
pub mod matrix;
pub mod quaternion;
pub mod pose;
pub mod transform;

pub use vector::*;
pub use matrix::*;
pub use quaternion::*;
pub use pose::*;
pub use transform::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const FRAC_PI_2: f32 = PI / 2.0;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
    pub const EPSILON: f32 = 1e-6;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

/// Convert radians to degrees
#[inline]
pub fn degrees(radians: f32) -> f32 {
    radians * consts::RAD_TO_DEG
}

pub mod prelude {
    pub use crate::vector::{Vec3, Vec4};
    pub use crate::matrix::{Mat3, Mat4};
    pub use crate::quaternion::Quat;
    pub use crate::pose::Pose;
    pub use crate::transform::{LinearTransform, TransformError};
    pub use crate::{radians, degrees};
}
