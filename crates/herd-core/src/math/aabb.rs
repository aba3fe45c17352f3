// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::math::Vec3;

/// Axis-aligned bounding box in world coordinates.
///
/// Invariants:
/// - `min` components are less than or equal to `max` components.
/// - Values are `f32` and represent meters in world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    min: Vec3,
    max: Vec3,
}

impl Aabb {
    /// Size of the box along each axis (`max - min`).
    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    /// Builds the minimal AABB that contains all `points`.
    ///
    /// Returns `None` if `points` is empty.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for p in rest {
            min = min.component_min(p);
            max = max.component_max(p);
        }
        Some(Self { min, max })
    }
}
