// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Settings bundle controlling metric variants.
//!
//! Every field has a default. A field only means something to the
//! `(arity, metric)` pairs that read it; all other pairs ignore it.

use serde::{Deserialize, Serialize};

pub use crate::math::Axis;
use crate::convert::DEFAULT_FACING_THRESHOLD;
use crate::math::Vec3;

/// Length unit distance-like metrics are reported in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistanceUnit {
    /// Metres (native).
    #[default]
    Meters,
    /// Centimetres.
    Centimeters,
    /// Inches.
    Inches,
    /// Feet.
    Feet,
}

impl DistanceUnit {
    /// Multiplier from metres to this unit.
    pub const fn scale(self) -> f32 {
        match self {
            Self::Meters => 1.0,
            Self::Centimeters => 100.0,
            Self::Inches => 39.3701,
            Self::Feet => 3.28084,
        }
    }
}

/// How Density aggregates member spacing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DensityMethod {
    /// Mean distance from each member to the centroid.
    #[default]
    AverageFromCenter,
    /// Sum of distances from each member to the centroid.
    SumFromCenter,
    /// Mean distance from each member to its nearest neighbour.
    NearestNeighbor,
}

/// How Size measures the formation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SizeMethod {
    /// Extents of the axis-aligned bounding box (vector).
    #[default]
    BoundingBox,
    /// Largest distance from the centroid (float).
    Radius,
}

/// Reference direction used by rotation-style metrics.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AxisSelection {
    /// World `+Y`.
    #[default]
    Up,
    /// World `+X`.
    Right,
    /// World `+Z`.
    Forward,
    /// From the formation's center to the reference entity.
    ObjectToCenter,
    /// [`RelationSettings::custom_axis`].
    Custom,
}

/// Which vertex of a three-member formation defines "forward".
///
/// Forward runs from the midpoint of the other two members through the
/// named vertex; right is the difference of the other two.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ThroupleLayout {
    /// Forward through member 0.
    #[default]
    CenterThroughLeader,
    /// Forward through member 2.
    CenterThroughThird,
    /// Forward through member 1.
    CenterThroughFollower,
}

/// Which pair(s) a three-member Distance reports.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PairSelection {
    /// `(d01, d12, d20)` packed as a vector.
    #[default]
    All,
    /// Members 0 and 1.
    LeaderFollower,
    /// Members 1 and 2.
    FollowerThird,
    /// Members 2 and 0.
    ThirdLeader,
    /// Mean of the three pair distances.
    Average,
}

/// Flat, defaulted settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationSettings {
    /// Reduce a vector (or rotation) result to one axis.
    pub isolate_axis: bool,
    /// Axis used by `isolate_axis`.
    pub axis: Axis,
    /// Reduce a vector (or rotation) result to its magnitude.
    pub magnitude_only: bool,
    /// Normalize movement vectors.
    pub direction_only: bool,
    /// Entity results are measured relative to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Measure the leader against the other members instead of the group.
    pub relative_to_members: bool,
    /// Unit for distance-like results.
    pub distance_unit: DistanceUnit,
    /// Density aggregation.
    pub density_method: DensityMethod,
    /// Size measurement.
    pub size_method: SizeMethod,
    /// Reference direction for rotation metrics.
    pub axis_selection: AxisSelection,
    /// Direction used when `axis_selection` is `Custom`.
    pub custom_axis: Vec3,
    /// Three-member forward/right layout.
    pub layout: ThroupleLayout,
    /// Three-member distance pair selection.
    pub pair: PairSelection,
    /// Gaze target for Trigger; without one Trigger reads the members' own
    /// trigger flags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// Dot-product threshold for facing tests.
    pub threshold: f32,
    /// Flip the computed forward direction.
    pub invert: bool,
}

impl Default for RelationSettings {
    fn default() -> Self {
        Self {
            isolate_axis: false,
            axis: Axis::X,
            magnitude_only: false,
            direction_only: false,
            reference: None,
            relative_to_members: false,
            distance_unit: DistanceUnit::Meters,
            density_method: DensityMethod::AverageFromCenter,
            size_method: SizeMethod::BoundingBox,
            axis_selection: AxisSelection::Up,
            custom_axis: Vec3::UNIT_Y,
            layout: ThroupleLayout::CenterThroughLeader,
            pair: PairSelection::All,
            proxy: None,
            threshold: DEFAULT_FACING_THRESHOLD,
            invert: false,
        }
    }
}

impl RelationSettings {
    /// Reports results in `unit`.
    pub fn with_unit(mut self, unit: DistanceUnit) -> Self {
        self.distance_unit = unit;
        self
    }

    /// Reduces vector results to `axis`.
    pub fn isolating(mut self, axis: Axis) -> Self {
        self.isolate_axis = true;
        self.axis = axis;
        self
    }

    /// Reduces vector results to their magnitude.
    pub fn magnitude(mut self) -> Self {
        self.magnitude_only = true;
        self
    }

    /// Measures relative to `reference`.
    pub fn relative_to(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Entity names the settings refer to besides the members.
    pub fn referenced_entities(&self) -> impl Iterator<Item = &str> {
        self.reference.as_deref().into_iter().chain(self.proxy.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referenced_entities_lists_reference_then_proxy() {
        let none = RelationSettings::default();
        assert_eq!(none.referenced_entities().count(), 0);

        let settings = RelationSettings {
            proxy: Some("screen".into()),
            ..RelationSettings::default().relative_to("hips")
        };
        let names: Vec<&str> = settings.referenced_entities().collect();
        assert_eq!(names, ["hips", "screen"]);
    }
}
