// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Keyframed remapping curves and the library of named easing shapes.
//!
//! A [`Curve`] is a cubic Hermite spline through [`Keyframe`]s. Outside the
//! key range it holds the first/last value. Library shapes are built from two
//! or three keys with fixed tangents; some of them overshoot `[0, 1]` between
//! keys, so a curved value is only guaranteed to lie in the curve's own
//! co-domain.

use std::f32::consts::FRAC_PI_2;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// `10 · ln 2`: slope of `2^(10(t-1))` at `t = 1`.
const EXPO_SLOPE: f32 = 6.931_472;
/// Slope of the exponential shapes half way through.
const EXPO_MID_SLOPE: f32 = 0.216_608;

/// One control point of a [`Curve`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Input coordinate.
    pub time: f32,
    /// Output value at `time`.
    pub value: f32,
    /// Incoming slope (d value / d time).
    #[serde(default)]
    pub in_tangent: f32,
    /// Outgoing slope (d value / d time).
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    /// Key with independent in/out tangents.
    pub const fn new(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }

    /// `true` when every field is finite.
    pub fn is_finite(&self) -> bool {
        [self.time, self.value, self.in_tangent, self.out_tangent]
            .iter()
            .all(|f| f.is_finite())
    }

    /// Key whose in and out tangents match.
    pub const fn smooth(time: f32, value: f32, tangent: f32) -> Self {
        Self::new(time, value, tangent, tangent)
    }
}

/// Cubic Hermite curve through a sorted list of keyframes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct Curve {
    keys: Vec<Keyframe>,
}

impl From<Vec<Keyframe>> for Curve {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::new(keys)
    }
}

impl From<Curve> for Vec<Keyframe> {
    fn from(curve: Curve) -> Self {
        curve.keys
    }
}

impl Curve {
    /// Builds a curve; keys are sorted by time. Keys with a non-finite time,
    /// value or tangent are dropped.
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        let before = keys.len();
        keys.retain(Keyframe::is_finite);
        if keys.len() < before {
            warn!(dropped = before - keys.len(), "non-finite curve keys dropped");
        }
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// Identity on `[0, 1]`.
    pub fn linear() -> Self {
        Self::new(vec![Keyframe::smooth(0.0, 0.0, 1.0), Keyframe::smooth(1.0, 1.0, 1.0)])
    }

    /// Keys in time order.
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Evaluates the curve at `t`.
    ///
    /// An empty curve evaluates to `0`; a single key evaluates to its value.
    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if t.is_nan() || t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }
        let upper = self.keys.partition_point(|k| k.time <= t);
        let k0 = &self.keys[upper - 1];
        let k1 = &self.keys[upper];
        let dt = k1.time - k0.time;
        if dt <= 0.0 {
            return k1.value;
        }
        let s = (t - k0.time) / dt;
        let s2 = s * s;
        let s3 = s2 * s;
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;
        h00 * k0.value + h10 * k0.out_tangent * dt + h01 * k1.value + h11 * k1.in_tangent * dt
    }
}

/// Named curve shapes. `Custom` defers to a caller-supplied curve.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CurveKind {
    /// `y = x`.
    #[default]
    Linear,
    /// Gentle acceleration.
    EaseIn,
    /// Gentle deceleration.
    EaseOut,
    /// Smoothstep.
    EaseInOut,
    /// Quarter-sine acceleration.
    SineIn,
    /// Quarter-sine deceleration.
    SineOut,
    /// Half-cosine ease.
    SineInOut,
    /// `x²`.
    QuadraticIn,
    /// `1 - (1 - x)²`.
    QuadraticOut,
    /// Piecewise quadratic ease.
    QuadraticInOut,
    /// `x³`.
    CubicIn,
    /// `1 - (1 - x)³`.
    CubicOut,
    /// Piecewise cubic ease.
    CubicInOut,
    /// Exponential acceleration.
    ExponentialIn,
    /// Exponential deceleration.
    ExponentialOut,
    /// Piecewise exponential ease.
    ExponentialInOut,
    /// Caller-supplied curve.
    Custom,
}

impl CurveKind {
    /// Every library shape (everything but `Custom`).
    pub const LIBRARY: [Self; 16] = [
        Self::Linear,
        Self::EaseIn,
        Self::EaseOut,
        Self::EaseInOut,
        Self::SineIn,
        Self::SineOut,
        Self::SineInOut,
        Self::QuadraticIn,
        Self::QuadraticOut,
        Self::QuadraticInOut,
        Self::CubicIn,
        Self::CubicOut,
        Self::CubicInOut,
        Self::ExponentialIn,
        Self::ExponentialOut,
        Self::ExponentialInOut,
    ];

    fn keys(self) -> Option<Vec<Keyframe>> {
        let k = Keyframe::smooth;
        let keys = match self {
            Self::Linear => vec![k(0.0, 0.0, 1.0), k(1.0, 1.0, 1.0)],
            Self::EaseIn => vec![k(0.0, 0.0, 0.0), k(1.0, 1.0, 1.0)],
            Self::EaseOut => vec![k(0.0, 0.0, 1.0), k(1.0, 1.0, 0.0)],
            Self::EaseInOut => vec![k(0.0, 0.0, 0.0), k(1.0, 1.0, 0.0)],
            Self::SineIn => vec![k(0.0, 0.0, 0.0), k(1.0, 1.0, FRAC_PI_2)],
            Self::SineOut => vec![k(0.0, 0.0, FRAC_PI_2), k(1.0, 1.0, 0.0)],
            Self::SineInOut => vec![k(0.0, 0.0, 0.0), k(0.5, 0.5, FRAC_PI_2), k(1.0, 1.0, 0.0)],
            Self::QuadraticIn => vec![k(0.0, 0.0, 0.0), k(1.0, 1.0, 2.0)],
            Self::QuadraticOut => vec![k(0.0, 0.0, 2.0), k(1.0, 1.0, 0.0)],
            Self::QuadraticInOut => vec![k(0.0, 0.0, 0.0), k(0.5, 0.5, 2.0), k(1.0, 1.0, 0.0)],
            Self::CubicIn => vec![k(0.0, 0.0, 0.0), k(1.0, 1.0, 3.0)],
            Self::CubicOut => vec![k(0.0, 0.0, 3.0), k(1.0, 1.0, 0.0)],
            Self::CubicInOut => vec![k(0.0, 0.0, 0.0), k(0.5, 0.5, 3.0), k(1.0, 1.0, 0.0)],
            Self::ExponentialIn => vec![
                k(0.0, 0.0, 0.0),
                k(0.5, 0.031_25, EXPO_MID_SLOPE),
                k(1.0, 1.0, EXPO_SLOPE),
            ],
            Self::ExponentialOut => vec![
                k(0.0, 0.0, EXPO_SLOPE),
                k(0.5, 0.968_75, EXPO_MID_SLOPE),
                k(1.0, 1.0, 0.0),
            ],
            Self::ExponentialInOut => {
                vec![k(0.0, 0.0, 0.0), k(0.5, 0.5, EXPO_SLOPE), k(1.0, 1.0, 0.0)]
            }
            Self::Custom => return None,
        };
        Some(keys)
    }
}

static SHARED: Lazy<CurveLibrary> = Lazy::new(CurveLibrary::new);

/// Lookup table from [`CurveKind`] to its canonical curve.
#[derive(Debug, Clone)]
pub struct CurveLibrary {
    curves: FxHashMap<CurveKind, Curve>,
    linear: Curve,
}

impl Default for CurveLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl CurveLibrary {
    /// Builds every library curve.
    pub fn new() -> Self {
        let curves = CurveKind::LIBRARY
            .iter()
            .filter_map(|kind| kind.keys().map(|keys| (*kind, Curve::new(keys))))
            .collect();
        Self {
            curves,
            linear: Curve::linear(),
        }
    }

    /// Process-wide library instance.
    pub fn shared() -> &'static Self {
        &SHARED
    }

    /// Curve for `kind`; `None` for [`CurveKind::Custom`].
    pub fn get(&self, kind: CurveKind) -> Option<&Curve> {
        self.curves.get(&kind)
    }
}

/// Curve selection stored with a relationship.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveChoice {
    /// Library shape.
    pub kind: CurveKind,
    /// Custom curve; when set it wins over `kind`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<Curve>,
}

impl CurveChoice {
    /// Library shape without a custom override.
    pub fn library(kind: CurveKind) -> Self {
        Self { kind, custom: None }
    }

    /// Custom curve.
    pub fn custom(curve: Curve) -> Self {
        Self {
            kind: CurveKind::Custom,
            custom: Some(curve),
        }
    }

    /// The curve to evaluate: custom if set, else the library shape, else
    /// linear (a `Custom` kind with no curve attached).
    pub fn resolve<'a>(&'a self, library: &'a CurveLibrary) -> &'a Curve {
        if let Some(custom) = &self.custom {
            return custom;
        }
        library.get(self.kind).unwrap_or(&library.linear)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn library_shapes_hit_their_endpoints() {
        let lib = CurveLibrary::new();
        for kind in CurveKind::LIBRARY {
            let curve = lib.get(kind).unwrap();
            assert!(curve.evaluate(0.0).abs() < 1e-6, "{kind:?} at 0");
            assert!((curve.evaluate(1.0) - 1.0).abs() < 1e-6, "{kind:?} at 1");
        }
        assert!(lib.get(CurveKind::Custom).is_none());
    }

    #[test]
    fn polynomial_shapes_are_exact() {
        let lib = CurveLibrary::new();
        let quad = lib.get(CurveKind::QuadraticIn).unwrap();
        let cubic = lib.get(CurveKind::CubicIn).unwrap();
        let smooth = lib.get(CurveKind::EaseInOut).unwrap();
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((quad.evaluate(t) - t * t).abs() < 1e-5);
            assert!((cubic.evaluate(t) - t * t * t).abs() < 1e-5);
            assert!((smooth.evaluate(t) - t * t * (3.0 - 2.0 * t)).abs() < 1e-5);
        }
    }

    #[test]
    fn non_finite_keys_are_dropped() {
        let curve = Curve::new(vec![
            Keyframe::smooth(0.0, 0.0, 1.0),
            Keyframe::smooth(f32::NAN, 0.5, 1.0),
            Keyframe::smooth(0.5, f32::INFINITY, 1.0),
            Keyframe::smooth(1.0, 1.0, 1.0),
        ]);
        assert_eq!(curve.keys().len(), 2);
        assert!((curve.evaluate(0.25) - 0.25).abs() < 1e-6);

        let parsed: Curve = serde_json::from_str(
            r#"[{"time": 0.0, "value": 0.0}, {"time": 1e39, "value": 1.0}]"#,
        )
        .unwrap_or_default();
        assert!(parsed.keys().iter().all(Keyframe::is_finite));
    }

    #[test]
    fn curve_clamps_outside_keys() {
        let curve = Curve::linear();
        assert_eq!(curve.evaluate(-3.0), 0.0);
        assert_eq!(curve.evaluate(7.0), 1.0);
        assert_eq!(Curve::default().evaluate(0.5), 0.0);
    }

    #[test]
    fn custom_choice_overrides_kind() {
        let lib = CurveLibrary::new();
        let flat = Curve::new(vec![Keyframe::smooth(0.0, 0.25, 0.0)]);
        let choice = CurveChoice {
            kind: CurveKind::CubicIn,
            custom: Some(flat),
        };
        assert_eq!(choice.resolve(&lib).evaluate(0.9), 0.25);
        let dangling = CurveChoice::library(CurveKind::Custom);
        assert!((dangling.resolve(&lib).evaluate(0.3) - 0.3).abs() < 1e-6);
    }
}
