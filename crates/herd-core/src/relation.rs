// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Arity classes and their closed metric vocabularies.
//!
//! A [`Relation`] pairs an arity class with one of that class's metrics, so
//! an illegal `(class, metric)` combination cannot be expressed.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a relationship by member count.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArityClass {
    /// Exactly one member.
    Single,
    /// Exactly two members (leader, follower).
    Couple,
    /// Exactly three members (leader, follower, third).
    Throuple,
    /// One or more members.
    Group,
}

impl ArityClass {
    /// Members needed before a metric produces anything but its zero value.
    pub const fn required_members(self) -> usize {
        match self {
            Self::Single | Self::Group => 1,
            Self::Couple => 2,
            Self::Throuple => 3,
        }
    }

    /// Whether a relationship of this class may list `count` members.
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Group => count >= 1,
            _ => count == self.required_members(),
        }
    }

    /// Class name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::Couple => "Couple",
            Self::Throuple => "Throuple",
            Self::Group => "Group",
        }
    }
}

impl fmt::Display for ArityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error parsing a relation or metric name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseRelationError {
    /// Expected `Class.Metric`.
    #[error("expected `Class.Metric`, got {0:?}")]
    Malformed(String),
    /// Unknown arity class.
    #[error("unknown arity class {0:?}")]
    UnknownClass(String),
    /// The class has no metric with this name.
    #[error("{class} has no metric {metric:?}")]
    UnknownMetric {
        /// Arity class.
        class: ArityClass,
        /// Rejected metric name.
        metric: String,
    },
}

macro_rules! metric_enum {
    ($(#[$doc:meta])* $name:ident { $($(#[$vdoc:meta])* $variant:ident),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vdoc])* $variant,)+
        }

        impl $name {
            /// Every metric of the class.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Metric name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }

            fn parse(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|m| m.name().eq_ignore_ascii_case(name))
            }
        }
    };
}

metric_enum!(
    /// Metrics of a single entity.
    SingleMetric {
        /// Position.
        Position,
        /// Orientation.
        Rotation,
        /// Velocity.
        Movement,
        /// Trigger/gaze state.
        Trigger,
    }
);

metric_enum!(
    /// Metrics of a leader/follower pair.
    CoupleMetric {
        /// Midpoint.
        Position,
        /// Look rotation from follower to leader.
        Rotation,
        /// Mean or relative velocity.
        Movement,
        /// Both members triggered.
        Trigger,
        /// Euclidean distance.
        Distance,
        /// Vector from leader to follower.
        Difference,
    }
);

metric_enum!(
    /// Metrics of a three-member formation.
    ThroupleMetric {
        /// Centroid.
        Position,
        /// Layout rotation.
        Rotation,
        /// Mean or relative velocity.
        Movement,
        /// All members triggered.
        Trigger,
        /// Pairwise distances.
        Distance,
        /// Interior angles.
        Angle,
        /// Spacing around the centroid.
        Density,
        /// Extents or radius.
        Size,
        /// Roll of the layout about its forward axis.
        RotationAroundAxis,
    }
);

metric_enum!(
    /// Metrics of an arbitrary group.
    GroupMetric {
        /// Centroid.
        Position,
        /// Look rotation along the mean velocity.
        Rotation,
        /// Mean or relative velocity.
        Movement,
        /// All members triggered.
        Trigger,
        /// Spacing around the centroid.
        Density,
        /// Extents or radius.
        Size,
        /// Roll of the leading three members about their forward axis.
        RotationAroundAxis,
    }
);

/// An arity class together with one of its metrics.
///
/// Serialized as its `Class.Metric` string.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Relation {
    /// Single-entity metric.
    Single(SingleMetric),
    /// Pair metric.
    Couple(CoupleMetric),
    /// Three-member metric.
    Throuple(ThroupleMetric),
    /// Group metric.
    Group(GroupMetric),
}

impl Relation {
    /// Arity class of the relation.
    pub const fn arity(self) -> ArityClass {
        match self {
            Self::Single(_) => ArityClass::Single,
            Self::Couple(_) => ArityClass::Couple,
            Self::Throuple(_) => ArityClass::Throuple,
            Self::Group(_) => ArityClass::Group,
        }
    }

    /// Metric name without the class prefix.
    pub const fn metric_name(self) -> &'static str {
        match self {
            Self::Single(m) => m.name(),
            Self::Couple(m) => m.name(),
            Self::Throuple(m) => m.name(),
            Self::Group(m) => m.name(),
        }
    }

    /// Every legal relation.
    pub fn all() -> impl Iterator<Item = Self> {
        SingleMetric::ALL
            .iter()
            .map(|m| Self::Single(*m))
            .chain(CoupleMetric::ALL.iter().map(|m| Self::Couple(*m)))
            .chain(ThroupleMetric::ALL.iter().map(|m| Self::Throuple(*m)))
            .chain(GroupMetric::ALL.iter().map(|m| Self::Group(*m)))
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.arity(), self.metric_name())
    }
}

impl TryFrom<String> for Relation {
    type Error = ParseRelationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Relation> for String {
    fn from(relation: Relation) -> Self {
        relation.to_string()
    }
}

impl FromStr for Relation {
    type Err = ParseRelationError;

    /// Parses `Class.Metric` (case-insensitive), e.g. `Couple.Distance`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (class, metric) = s
            .split_once('.')
            .ok_or_else(|| ParseRelationError::Malformed(s.to_owned()))?;
        let class = [
            ArityClass::Single,
            ArityClass::Couple,
            ArityClass::Throuple,
            ArityClass::Group,
        ]
        .into_iter()
        .find(|c| c.name().eq_ignore_ascii_case(class))
        .ok_or_else(|| ParseRelationError::UnknownClass(class.to_owned()))?;
        let parsed = match class {
            ArityClass::Single => SingleMetric::parse(metric).map(Self::Single),
            ArityClass::Couple => CoupleMetric::parse(metric).map(Self::Couple),
            ArityClass::Throuple => ThroupleMetric::parse(metric).map(Self::Throuple),
            ArityClass::Group => GroupMetric::parse(metric).map(Self::Group),
        };
        parsed.ok_or_else(|| ParseRelationError::UnknownMetric {
            class,
            metric: metric.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn display_parse_roundtrip_for_every_relation() {
        for relation in Relation::all() {
            let text = relation.to_string();
            assert_eq!(text.parse::<Relation>(), Ok(relation), "{text}");
        }
    }

    #[test]
    fn parse_rejects_cross_class_metrics() {
        assert_eq!(
            "Single.Distance".parse::<Relation>(),
            Err(ParseRelationError::UnknownMetric {
                class: ArityClass::Single,
                metric: "Distance".into(),
            })
        );
        assert!(matches!(
            "Quad.Position".parse::<Relation>(),
            Err(ParseRelationError::UnknownClass(_))
        ));
        assert!("couple.distance".parse::<Relation>().is_ok());
    }

    #[test]
    fn serializes_as_dotted_name() {
        let relation = Relation::Throuple(ThroupleMetric::RotationAroundAxis);
        let json = serde_json::to_string(&relation).unwrap();
        assert_eq!(json, "\"Throuple.RotationAroundAxis\"");
        let back: Relation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, relation);
        assert!(serde_json::from_str::<Relation>("\"Group.Difference\"").is_err());
    }

    #[test]
    fn arity_member_counts() {
        assert!(ArityClass::Single.accepts(1));
        assert!(!ArityClass::Couple.accepts(3));
        assert!(ArityClass::Group.accepts(7));
        assert!(!ArityClass::Group.accepts(0));
        assert_eq!(ArityClass::Throuple.required_members(), 3);
    }
}
