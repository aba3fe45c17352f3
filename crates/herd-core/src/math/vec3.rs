// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::math::{Axis, EPSILON};

/// 3D vector used for positions, velocities and directions.
///
/// * Components encode world-space metres (or metres per second for
///   velocities) and may represent either points or directions depending on
///   the calling context.
/// * Arithmetic uses `f32`.
/// * Serializes as a plain `[x, y, z]` array.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Vec3 {
    data: [f32; 3],
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit vector pointing along the positive X axis.
    pub const UNIT_X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit vector pointing along the positive Y axis.
    pub const UNIT_Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit vector pointing along the positive Z axis.
    pub const UNIT_Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Creates a vector from components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { data: [x, y, z] }
    }

    /// Returns the components as an array.
    pub fn to_array(self) -> [f32; 3] {
        self.data
    }

    /// X component.
    pub fn x(&self) -> f32 {
        self.data[0]
    }

    /// Y component.
    pub fn y(&self) -> f32 {
        self.data[1]
    }

    /// Z component.
    pub fn z(&self) -> f32 {
        self.data[2]
    }

    /// Component along `axis`.
    pub fn component(&self, axis: Axis) -> f32 {
        self.data[axis.index()]
    }

    /// Adds two vectors.
    pub fn add(&self, other: &Self) -> Self {
        Self::new(
            self.data[0] + other.data[0],
            self.data[1] + other.data[1],
            self.data[2] + other.data[2],
        )
    }

    /// Subtracts another vector.
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(
            self.data[0] - other.data[0],
            self.data[1] - other.data[1],
            self.data[2] - other.data[2],
        )
    }

    /// Scales the vector by a scalar.
    pub fn scale(&self, scalar: f32) -> Self {
        Self::new(
            self.data[0] * scalar,
            self.data[1] * scalar,
            self.data[2] * scalar,
        )
    }

    /// Dot product with another vector.
    pub fn dot(&self, other: &Self) -> f32 {
        self.data[0] * other.data[0] + self.data[1] * other.data[1] + self.data[2] * other.data[2]
    }

    /// Cross product with another vector.
    pub fn cross(&self, other: &Self) -> Self {
        let [ax, ay, az] = self.data;
        let [bx, by, bz] = other.data;
        Self::new(ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx)
    }

    /// Vector length (magnitude).
    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Squared magnitude of the vector.
    pub fn length_squared(&self) -> f32 {
        self.dot(self)
    }

    /// Normalises the vector, returning the zero vector if length ≤ `EPSILON`.
    ///
    /// Degenerate vectors normalize to zero so downstream callers can detect
    /// them.
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len <= EPSILON {
            return Self::ZERO;
        }
        self.scale(1.0 / len)
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Self) -> f32 {
        self.sub(other).length()
    }

    /// Linear interpolation towards `other` by `t` (unclamped).
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        self.add(&other.sub(self).scale(t))
    }

    /// Midpoint between two points.
    pub fn midpoint(&self, other: &Self) -> Self {
        self.lerp(other, 0.5)
    }

    /// Arithmetic mean of `points`; zero for an empty slice.
    pub fn centroid(points: &[Self]) -> Self {
        if points.is_empty() {
            return Self::ZERO;
        }
        let sum = points.iter().fold(Self::ZERO, |acc, p| acc + *p);
        sum.scale(1.0 / points.len() as f32)
    }

    /// Projects this vector onto `onto`. Returns zero when `onto` is degenerate.
    pub fn project_onto(&self, onto: &Self) -> Self {
        let len_sq = onto.length_squared();
        if len_sq <= EPSILON * EPSILON {
            return Self::ZERO;
        }
        onto.scale(self.dot(onto) / len_sq)
    }

    /// Removes the component along `normal`, leaving the projection onto the
    /// plane `normal` defines.
    pub fn project_on_plane(&self, normal: &Self) -> Self {
        self.sub(&self.project_onto(normal))
    }

    /// Unsigned angle to `other` in radians, `[0, π]`.
    ///
    /// Returns `0` when either vector is degenerate.
    pub fn angle_to(&self, other: &Self) -> f32 {
        let denom = (self.length_squared() * other.length_squared()).sqrt();
        if denom <= EPSILON {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(-1.0, 1.0).acos()
    }

    /// Signed angle to `other` in radians, `[-π, π]`.
    ///
    /// The sign is positive when `self × other` points along `axis`.
    pub fn signed_angle(&self, other: &Self, axis: &Self) -> f32 {
        let unsigned = self.angle_to(other);
        if self.cross(other).dot(axis) < 0.0 {
            -unsigned
        } else {
            unsigned
        }
    }

    /// `true` when this direction points at `target` within `threshold`
    /// (dot product of the normalized directions).
    pub fn is_facing(&self, target: &Self, threshold: f32) -> bool {
        let a = self.normalize();
        let b = target.normalize();
        if a == Self::ZERO || b == Self::ZERO {
            return false;
        }
        a.dot(&b) >= threshold
    }

    /// `true` when this direction points away from `target` within `threshold`.
    pub fn is_facing_away(&self, target: &Self, threshold: f32) -> bool {
        self.is_facing(&-*target, threshold)
    }

    /// Component-wise minimum.
    pub fn component_min(&self, other: &Self) -> Self {
        Self::new(
            self.data[0].min(other.data[0]),
            self.data[1].min(other.data[1]),
            self.data[2].min(other.data[2]),
        )
    }

    /// Component-wise maximum.
    pub fn component_max(&self, other: &Self) -> Self {
        Self::new(
            self.data[0].max(other.data[0]),
            self.data[1].max(other.data[1]),
            self.data[2].max(other.data[2]),
        )
    }
}

/// Converts a 3-element `[f32; 3]` array into a `Vec3` interpreted as `(x, y, z)`.
///
/// # Examples
/// ```
/// use herd_core::math::Vec3;
/// let v = Vec3::from([1.0, 2.0, 3.0]);
/// assert_eq!(v.to_array(), [1.0, 2.0, 3.0]);
/// ```
impl From<[f32; 3]> for Vec3 {
    fn from(value: [f32; 3]) -> Self {
        Self { data: value }
    }
}

impl From<Vec3> for [f32; 3] {
    fn from(value: Vec3) -> Self {
        value.data
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::add(&self, &rhs)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::sub(&self, &rhs)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        self.scale(rhs)
    }
}

impl Mul<Vec3> for f32 {
    type Output = Vec3;
    fn mul(self, rhs: Vec3) -> Vec3 {
        rhs.scale(self)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        self.scale(-1.0)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = Self::add(self, &rhs);
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = Self::sub(self, &rhs);
    }
}

impl MulAssign<f32> for Vec3 {
    fn mul_assign(&mut self, rhs: f32) {
        *self = self.scale(rhs);
    }
}
