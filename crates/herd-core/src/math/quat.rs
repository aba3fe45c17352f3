// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use serde::{Deserialize, Serialize};

use crate::math::{rad_to_deg, Vec3, EPSILON};

/// Quaternion stored as `(x, y, z, w)`.
///
/// * All angles are expressed in radians unless a method name says degrees.
/// * The basis convention is right-handed with `+X` right, `+Y` up and `+Z`
///   forward.
/// * Serializes as a plain `[x, y, z, w]` array.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Quat {
    data: [f32; 4],
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quat {
    /// Creates a quaternion from components.
    ///
    /// Callers should provide finite components; use
    /// [`Quat::from_axis_angle`] for axis/angle construction.
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { data: [x, y, z, w] }
    }

    /// Returns the quaternion as an array.
    pub fn to_array(self) -> [f32; 4] {
        self.data
    }

    fn component(&self, idx: usize) -> f32 {
        self.data[idx]
    }

    fn vector_part(&self) -> Vec3 {
        Vec3::new(self.data[0], self.data[1], self.data[2])
    }

    /// Returns the identity quaternion.
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Constructs a quaternion from a rotation axis and angle in radians.
    ///
    /// Returns the identity quaternion when the axis length is ≤ `EPSILON`.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let len_sq = axis.length_squared();
        if len_sq <= EPSILON * EPSILON {
            return Self::identity();
        }
        let norm_axis = axis.scale(1.0 / len_sq.sqrt());
        let (sin_half, cos_half) = (angle * 0.5).sin_cos();
        let scaled = norm_axis.scale(sin_half);
        Self::new(scaled.x(), scaled.y(), scaled.z(), cos_half)
    }

    /// Hamilton product of two quaternions (`self * other`).
    ///
    /// Applying the result to a vector rotates by `other` first, then by
    /// `self`. Quaternion multiplication is non‑commutative.
    pub fn multiply(&self, other: &Self) -> Self {
        let [ax, ay, az, aw] = self.data;
        let [bx, by, bz, bw] = other.data;
        Self::new(
            aw * bx + ax * bw + ay * bz - az * by,
            aw * by - ax * bz + ay * bw + az * bx,
            aw * bz + ax * by - ay * bx + az * bw,
            aw * bw - ax * bx - ay * by - az * bz,
        )
    }

    /// Normalises the quaternion; returns identity when norm is ~0.
    pub fn normalize(&self) -> Self {
        let len = (self.component(0) * self.component(0)
            + self.component(1) * self.component(1)
            + self.component(2) * self.component(2)
            + self.component(3) * self.component(3))
        .sqrt();
        if len <= EPSILON {
            return Self::identity();
        }
        let inv = 1.0 / len;
        Self::new(
            self.component(0) * inv,
            self.component(1) * inv,
            self.component(2) * inv,
            self.component(3) * inv,
        )
    }

    /// Conjugate `(-x, -y, -z, w)`.
    pub fn conjugate(&self) -> Self {
        Self::new(
            -self.component(0),
            -self.component(1),
            -self.component(2),
            self.component(3),
        )
    }

    /// Inverse rotation. Equals the conjugate for unit quaternions.
    pub fn inverse(&self) -> Self {
        self.normalize().conjugate()
    }

    /// Rotates a vector by this (normalized) quaternion.
    pub fn rotate(&self, v: &Vec3) -> Vec3 {
        let q = self.normalize();
        let u = q.vector_part();
        let w = q.component(3);
        let t = u.cross(v).scale(2.0);
        *v + t.scale(w) + u.cross(&t)
    }

    /// Canonical forward (`+Z`) rotated by this quaternion.
    pub fn forward(&self) -> Vec3 {
        self.rotate(&Vec3::UNIT_Z)
    }

    /// Canonical right (`+X`) rotated by this quaternion.
    pub fn right(&self) -> Vec3 {
        self.rotate(&Vec3::UNIT_X)
    }

    /// Canonical up (`+Y`) rotated by this quaternion.
    pub fn up(&self) -> Vec3 {
        self.rotate(&Vec3::UNIT_Y)
    }

    /// Axis-angle decomposition with the angle in `[0, π]` radians.
    ///
    /// The identity rotation has no defined axis; `+Y` is reported.
    pub fn to_axis_angle(&self) -> (Vec3, f32) {
        let mut q = self.normalize();
        if q.component(3) < 0.0 {
            q = Self::new(
                -q.component(0),
                -q.component(1),
                -q.component(2),
                -q.component(3),
            );
        }
        let w = q.component(3).clamp(-1.0, 1.0);
        let angle = 2.0 * w.acos();
        let s = (1.0 - w * w).max(0.0).sqrt();
        if s <= EPSILON {
            return (Vec3::UNIT_Y, 0.0);
        }
        (q.vector_part().scale(1.0 / s), angle)
    }

    /// Rotation angle in radians, `[0, π]`.
    pub fn angle(&self) -> f32 {
        self.to_axis_angle().1
    }

    /// Rotation axis (unit length).
    pub fn axis(&self) -> Vec3 {
        self.to_axis_angle().0
    }

    /// Angle in degrees of the rotation's twist about `axis`.
    ///
    /// Uses a swing-twist split; the result is signed and lies in
    /// `(-180, 180]`.
    pub fn twist_degrees(&self, axis: &Vec3) -> f32 {
        let n = axis.normalize();
        if n == Vec3::ZERO {
            return 0.0;
        }
        let q = self.normalize();
        let along = q.vector_part().dot(&n);
        let mut angle = rad_to_deg(2.0 * along.atan2(q.component(3)));
        if angle > 180.0 {
            angle -= 360.0;
        } else if angle <= -180.0 {
            angle += 360.0;
        }
        angle
    }

    /// Rotation whose `+Z` maps to `forward` and whose `+Y` is as close to
    /// `up` as possible.
    ///
    /// Returns identity when `forward` is degenerate. When `up` is parallel
    /// to `forward` an alternate world axis stands in for it.
    pub fn look_rotation(forward: &Vec3, up: &Vec3) -> Self {
        let f = forward.normalize();
        if f == Vec3::ZERO {
            return Self::identity();
        }
        let mut r = up.cross(&f);
        if r.length_squared() <= EPSILON {
            let alt = if f.y().abs() < 0.999 {
                Vec3::UNIT_Y
            } else {
                Vec3::UNIT_Z
            };
            r = alt.cross(&f);
        }
        let r = r.normalize();
        let u = f.cross(&r);
        Self::from_basis(&r, &u, &f)
    }

    /// Builds a rotation from orthonormal basis columns.
    fn from_basis(x: &Vec3, y: &Vec3, z: &Vec3) -> Self {
        let (m00, m01, m02) = (x.x(), y.x(), z.x());
        let (m10, m11, m12) = (x.y(), y.y(), z.y());
        let (m20, m21, m22) = (x.z(), y.z(), z.z());
        let trace = m00 + m11 + m22;
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Self::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
        } else if m00 > m11 && m00 > m22 {
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Self::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Self::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Self::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        };
        q.normalize()
    }
}

/// Converts a 4‑element `[f32; 4]` array `(x, y, z, w)` into a `Quat`.
/// The components are taken verbatim; normalization is not enforced.
impl From<[f32; 4]> for Quat {
    fn from(value: [f32; 4]) -> Self {
        Self { data: value }
    }
}

impl From<Quat> for [f32; 4] {
    fn from(value: Quat) -> Self {
        value.data
    }
}
