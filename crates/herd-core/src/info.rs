// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Relationship configuration and its cached evaluation snapshot.
//!
//! A [`RelationshipConfig`] is the persisted, static half of a relationship.
//! A [`RelationshipInfo`] pairs it with the outputs of the last refresh:
//!
//! 1. evaluate the relation over the resolved members into a raw [`Datum`];
//! 2. build a converter over the stored `[min, max]`;
//! 3. map the normalized value through the chosen curve;
//! 4. copy the over/under/in-range flags from the converter;
//! 5. derive the [`Status`] from those flags.

use core::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::convert::{RangeBindingMode, RangeConverter, RangeFlags};
use crate::curve::{Curve, CurveChoice, CurveLibrary};
use crate::datum::Datum;
use crate::entity::SpatialState;
use crate::eval::{self, EvalContext};
use crate::relation::{ArityClass, Relation};
use crate::settings::RelationSettings;

/// Stable identifier of a relationship.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(pub u32);

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

const fn enabled_by_default() -> bool {
    true
}

const fn unit_max() -> f32 {
    1.0
}

/// Persisted static configuration of one relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipConfig {
    /// Identifier, unique within a registry.
    pub id: RelationshipId,
    /// Free-form label.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Arity class and metric.
    pub relation: Relation,
    /// Member entity names, leader first.
    pub members: Vec<String>,
    /// Metric variant switches.
    #[serde(default)]
    pub settings: RelationSettings,
    /// Lower bound of the expected range.
    #[serde(default)]
    pub min: f32,
    /// Upper bound of the expected range.
    #[serde(default = "unit_max")]
    pub max: f32,
    /// Curve applied to the normalized value.
    #[serde(default)]
    pub curve: CurveChoice,
    /// Binding applied to integer readings.
    #[serde(default)]
    pub int_binding: RangeBindingMode,
    /// Whether ticks refresh this relationship.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl RelationshipConfig {
    /// Enabled relationship over `[0, 1]` with default settings and a linear
    /// curve.
    pub fn new<I, N>(id: u32, relation: Relation, members: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            id: RelationshipId(id),
            description: String::new(),
            relation,
            members: members.into_iter().map(Into::into).collect(),
            settings: RelationSettings::default(),
            min: 0.0,
            max: unit_max(),
            curve: CurveChoice::default(),
            int_binding: RangeBindingMode::default(),
            enabled: true,
        }
    }

    /// Sets the expected range.
    #[must_use]
    pub fn with_bounds(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Replaces the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: RelationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the curve choice.
    #[must_use]
    pub fn with_curve(mut self, curve: CurveChoice) -> Self {
        self.curve = curve;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Arity class of the configured relation.
    pub fn arity(&self) -> ArityClass {
        self.relation.arity()
    }
}

/// Range classification of the last refresh.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    /// No valid classification: never refreshed, or conversion failed.
    #[default]
    None,
    /// Below `min`.
    Under,
    /// Within `[min, max]`.
    InRange,
    /// Above `max`.
    Over,
}

impl Status {
    /// Mutually exclusive derivation: exactly one flag set selects the
    /// matching status, any other combination yields [`Status::None`].
    pub fn derive(flags: RangeFlags) -> Self {
        match (flags.over, flags.under, flags.in_range) {
            (true, false, false) => Self::Over,
            (false, true, false) => Self::Under,
            (false, false, true) => Self::InRange,
            _ => Self::None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Under => "under",
            Self::InRange => "in-range",
            Self::Over => "over",
        })
    }
}

/// Side-effect-free evaluation result.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Preview {
    /// Evaluator output.
    pub raw: Datum,
    /// Position within `[min, max]`, in `[0, 1]`.
    pub normalized: f32,
    /// Curve output at `normalized`.
    pub curved: f32,
    /// `normalized * 2 - 1`.
    pub as_axis: f32,
    /// Raw reading above `max`.
    pub over: bool,
    /// Raw reading below `min`.
    pub under: bool,
    /// Neither over nor under.
    pub in_range: bool,
}

impl Preview {
    /// The three range flags.
    pub fn flags(&self) -> RangeFlags {
        RangeFlags {
            over: self.over,
            under: self.under,
            in_range: self.in_range,
        }
    }
}

/// Optional replacements applied by [`compute`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreviewOverrides {
    /// Evaluate a different relation.
    pub relation: Option<Relation>,
    /// Use different `(min, max)` bounds.
    pub bounds: Option<(f32, f32)>,
    /// Use different settings.
    pub settings: Option<RelationSettings>,
}

impl PreviewOverrides {
    /// Settings in effect for `config` under these overrides.
    pub fn effective_settings<'a>(
        &'a self,
        config: &'a RelationshipConfig,
    ) -> &'a RelationSettings {
        self.settings.as_ref().unwrap_or(&config.settings)
    }
}

/// Evaluates `config` (with `overrides`) over already-resolved member states.
///
/// `context` must be resolved for the effective settings. Nothing is cached.
pub fn compute(
    config: &RelationshipConfig,
    overrides: &PreviewOverrides,
    members: &[Option<SpatialState>],
    context: &EvalContext,
    curves: &CurveLibrary,
) -> Preview {
    let relation = overrides.relation.unwrap_or(config.relation);
    let (min, max) = overrides.bounds.unwrap_or((config.min, config.max));
    let raw = eval::evaluate(relation, members, context, overrides.effective_settings(config));
    convert(config, raw, min, max, config.curve.resolve(curves))
}

fn convert(config: &RelationshipConfig, raw: Datum, min: f32, max: f32, curve: &Curve) -> Preview {
    match raw.converter(min, max, config.int_binding) {
        Ok(converter) => {
            let flags = converter.flags();
            Preview {
                normalized: converter.normalized(),
                curved: converter.to_curve(curve),
                as_axis: converter.as_axis(),
                over: flags.over,
                under: flags.under,
                in_range: flags.in_range,
                raw,
            }
        }
        Err(err) => {
            warn!(id = %config.id, %err, "relationship reading not convertible");
            Preview {
                raw,
                ..Preview::default()
            }
        }
    }
}

/// Dynamic half of a [`RelationshipInfo`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DynamicOutputs {
    /// Evaluator output.
    pub raw: Datum,
    /// Normalized value.
    pub normalized: f32,
    /// Curve output.
    pub curved: f32,
    /// Normalized value on `[-1, 1]`.
    pub as_axis: f32,
    /// Range flags.
    pub flags: RangeFlags,
    /// Derived classification.
    pub status: Status,
}

impl From<Preview> for DynamicOutputs {
    fn from(preview: Preview) -> Self {
        let flags = preview.flags();
        Self {
            raw: preview.raw,
            normalized: preview.normalized,
            curved: preview.curved,
            as_axis: preview.as_axis,
            flags,
            status: Status::derive(flags),
        }
    }
}

/// Cached configuration plus last-computed outputs for one relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipInfo {
    config: RelationshipConfig,
    dynamic: DynamicOutputs,
    refreshed: bool,
}

impl RelationshipInfo {
    /// Snapshot that has not been refreshed yet.
    pub fn new(config: RelationshipConfig) -> Self {
        Self {
            config,
            dynamic: DynamicOutputs::default(),
            refreshed: false,
        }
    }

    /// Static configuration.
    pub fn config(&self) -> &RelationshipConfig {
        &self.config
    }

    /// Relationship id.
    pub fn id(&self) -> RelationshipId {
        self.config.id
    }

    /// Arity class.
    pub fn arity(&self) -> ArityClass {
        self.config.relation.arity()
    }

    /// Metric name without the class prefix.
    pub fn metric_name(&self) -> &'static str {
        self.config.relation.metric_name()
    }

    /// Last raw reading.
    pub fn raw(&self) -> &Datum {
        &self.dynamic.raw
    }

    /// Last normalized value.
    pub fn normalized(&self) -> f32 {
        self.dynamic.normalized
    }

    /// Last curved value.
    pub fn curved(&self) -> f32 {
        self.dynamic.curved
    }

    /// Last status.
    pub fn status(&self) -> Status {
        self.dynamic.status
    }

    /// Copy of the dynamic outputs.
    pub fn dynamic(&self) -> DynamicOutputs {
        self.dynamic.clone()
    }

    /// `false` until the first refresh and after [`Self::invalidate`].
    pub fn is_fresh(&self) -> bool {
        self.refreshed
    }

    /// Marks the cached outputs stale.
    pub fn invalidate(&mut self) {
        self.refreshed = false;
    }

    /// Replaces the configuration and invalidates the cache.
    pub fn set_config(&mut self, config: RelationshipConfig) {
        self.config = config;
        self.invalidate();
    }

    /// Re-evaluates over `members` and returns the new status.
    pub fn refresh_dynamic(
        &mut self,
        members: &[Option<SpatialState>],
        context: &EvalContext,
        curves: &CurveLibrary,
    ) -> Status {
        let preview = compute(
            &self.config,
            &PreviewOverrides::default(),
            members,
            context,
            curves,
        );
        self.dynamic = DynamicOutputs::from(preview);
        self.refreshed = true;
        self.dynamic.status
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::math::Vec3;
    use crate::relation::CoupleMetric;

    const DISTANCE: Relation = Relation::Couple(CoupleMetric::Distance);

    fn pair(b: Vec3) -> [Option<SpatialState>; 2] {
        [Some(SpatialState::at(Vec3::ZERO)), Some(SpatialState::at(b))]
    }

    #[test]
    fn status_derivation_is_exclusive() {
        let flags = |over, under, in_range| RangeFlags {
            over,
            under,
            in_range,
        };
        assert_eq!(Status::derive(flags(true, false, false)), Status::Over);
        assert_eq!(Status::derive(flags(false, true, false)), Status::Under);
        assert_eq!(Status::derive(flags(false, false, true)), Status::InRange);
        assert_eq!(Status::derive(flags(false, false, false)), Status::None);
        assert_eq!(Status::derive(flags(true, true, false)), Status::None);
    }

    #[test]
    fn refresh_classifies_distance() {
        let config = RelationshipConfig::new(1, DISTANCE, ["a", "b"]).with_bounds(0.0, 10.0);
        let mut info = RelationshipInfo::new(config);
        assert!(!info.is_fresh());
        let lib = CurveLibrary::new();
        let ctx = EvalContext::default();
        let status = info.refresh_dynamic(&pair(Vec3::new(3.0, 4.0, 0.0)), &ctx, &lib);
        assert_eq!(status, Status::InRange);
        assert_eq!(info.raw(), &Datum::Float(5.0));
        assert!((info.normalized() - 0.5).abs() < 1e-6);
        assert!((info.curved() - 0.5).abs() < 1e-6);
        assert!(info.is_fresh());

        let status = info.refresh_dynamic(&pair(Vec3::new(30.0, 40.0, 0.0)), &ctx, &lib);
        assert_eq!(status, Status::Over);
        assert!((info.dynamic().as_axis - 1.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_bounds_clear_flags() {
        let config = RelationshipConfig::new(2, DISTANCE, ["a", "b"]).with_bounds(3.0, 3.0);
        let mut info = RelationshipInfo::new(config);
        let lib = CurveLibrary::new();
        let status = info.refresh_dynamic(&pair(Vec3::UNIT_X), &EvalContext::default(), &lib);
        assert_eq!(status, Status::None);
        assert_eq!(info.dynamic().flags, RangeFlags::default());
        assert_eq!(info.raw(), &Datum::Float(1.0));
    }

    #[test]
    fn preview_overrides_leave_config_alone() {
        let config = RelationshipConfig::new(3, DISTANCE, ["a", "b"]);
        let overrides = PreviewOverrides {
            bounds: Some((0.0, 100.0)),
            ..PreviewOverrides::default()
        };
        let preview = compute(
            &config,
            &overrides,
            &pair(Vec3::new(50.0, 0.0, 0.0)),
            &EvalContext::default(),
            &CurveLibrary::new(),
        );
        assert!(preview.in_range);
        assert!((preview.normalized - 0.5).abs() < 1e-6);
        assert_eq!(config.max, 1.0);
    }

    #[test]
    fn config_json_defaults() {
        let json = r#"{"id": 7, "relation": "Couple.Distance", "members": ["a", "b"]}"#;
        let config: RelationshipConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.id, RelationshipId(7));
        assert!(config.enabled);
        assert_eq!((config.min, config.max), (0.0, 1.0));
        assert_eq!(config.settings, RelationSettings::default());
    }
}
