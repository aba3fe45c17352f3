// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Float32 math helpers covering scalar utilities, vectors, quaternions and
//! axis-aligned bounds.
//!
//! All operations round to `f32` to match the precision tracked entities are
//! reported in.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

mod aabb;
mod quat;
mod vec3;

pub use aabb::Aabb;
pub use quat::Quat;
pub use vec3::Vec3;

/// Global epsilon used by math routines when detecting degenerate values.
pub const EPSILON: f32 = 1e-6;

/// Cartesian axis selector.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Axis {
    /// The X axis (right).
    #[default]
    X,
    /// The Y axis (up).
    Y,
    /// The Z axis (forward).
    Z,
}

impl Axis {
    /// Unit vector pointing along the positive direction of this axis.
    pub const fn unit(self) -> Vec3 {
        match self {
            Self::X => Vec3::UNIT_X,
            Self::Y => Vec3::UNIT_Y,
            Self::Z => Vec3::UNIT_Z,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// Clamps `value` to the inclusive `[min, max]` range using float32 rounding.
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    debug_assert!(min <= max, "invalid clamp range: {min} > {max}");
    value.max(min).min(max)
}

/// Clamps `value` to `[0, 1]`. NaN collapses to `0`.
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    clamp(value, 0.0, 1.0)
}

/// Converts radians to degrees with float32 precision.
pub fn rad_to_deg(value: f32) -> f32 {
    value * (360.0 / TAU)
}
