// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Range converters: normalize a raw value against `[min, max]`.
//!
//! Every converter reduces its payload to one scalar (`raw`) and derives:
//!
//! * `normalized = clamp01((raw - min) / (max - min))`
//! * `over = raw > max`, `under = raw < min`, `in_range = !over && !under`
//! * `as_axis = normalized * 2 - 1`
//!
//! Float, Int, Vector and Rotation converters refuse a zero-width range.
//! The Bool converter accepts one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::curve::Curve;
use crate::datum::DatumKind;
use crate::math::{clamp01, rad_to_deg, Quat, Vec3};

/// Default dot-product threshold for the `is_facing*` predicates.
pub const DEFAULT_FACING_THRESHOLD: f32 = 0.95;

/// Errors raised when building a converter.
#[derive(Debug, Error, PartialEq)]
pub enum ConvertError {
    /// `min == max`: normalization is undefined.
    #[error("degenerate range: min == max == {0}")]
    DegenerateRange(f32),
    /// The payload has no scalar reading.
    #[error("{0:?} values cannot be range-converted")]
    NotConvertible(DatumKind),
}

/// How an integer converter folds its stored value back into range.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RangeBindingMode {
    /// Value is read as stored.
    #[default]
    None,
    /// Clamp to `[min, max]`.
    Clamped,
    /// Values past `max` wrap around from `min`; values below `min` clamp.
    CycleUp,
    /// Values below `min` wrap around from `max`; values past `max` clamp.
    CycleDown,
    /// Reflect back and forth across the range.
    Oscillate,
}

impl RangeBindingMode {
    /// Applies the binding to `value` over the inclusive `[min, max]`.
    ///
    /// Inverted or empty ranges leave the value untouched.
    pub fn bind(self, value: i32, min: i32, max: i32) -> i32 {
        if min >= max {
            return value;
        }
        let (v, lo, hi) = (i64::from(value), i64::from(min), i64::from(max));
        let size = hi - lo + 1;
        let bound = match self {
            Self::None => v,
            Self::Clamped => v.clamp(lo, hi),
            Self::CycleUp => {
                if v > hi {
                    lo + (v - hi - 1).rem_euclid(size)
                } else {
                    v.max(lo)
                }
            }
            Self::CycleDown => {
                if v < lo {
                    hi - (lo - v - 1).rem_euclid(size)
                } else {
                    v.min(hi)
                }
            }
            Self::Oscillate => {
                let span = hi - lo;
                let offset = (v - lo).rem_euclid(2 * span);
                if offset <= span {
                    lo + offset
                } else {
                    hi - (offset - span)
                }
            }
        };
        bound as i32
    }
}

/// Over/under/in-range flags of one conversion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RangeFlags {
    /// `raw > max`.
    pub over: bool,
    /// `raw < min`.
    pub under: bool,
    /// Neither over nor under.
    pub in_range: bool,
}

/// Shared range semantics over a scalar reading.
pub trait RangeConverter {
    /// Scalar being range-checked.
    fn raw(&self) -> f32;
    /// Lower bound.
    fn min(&self) -> f32;
    /// Upper bound.
    fn max(&self) -> f32;

    /// `clamp01((raw - min) / (max - min))`.
    fn normalized(&self) -> f32 {
        clamp01((self.raw() - self.min()) / (self.max() - self.min()))
    }

    /// `raw > max`.
    fn over(&self) -> bool {
        self.raw() > self.max()
    }

    /// `raw < min`.
    fn under(&self) -> bool {
        self.raw() < self.min()
    }

    /// Neither over nor under.
    fn in_range(&self) -> bool {
        !self.over() && !self.under()
    }

    /// `normalized * 2 - 1`, in `[-1, 1]`.
    fn as_axis(&self) -> f32 {
        self.normalized() * 2.0 - 1.0
    }

    /// Evaluates `curve` at the normalized value.
    fn to_curve(&self, curve: &Curve) -> f32 {
        curve.evaluate(self.normalized())
    }

    /// All three range flags.
    fn flags(&self) -> RangeFlags {
        RangeFlags {
            over: self.over(),
            under: self.under(),
            in_range: self.in_range(),
        }
    }
}

fn checked_range(min: f32, max: f32) -> Result<(), ConvertError> {
    if min == max {
        return Err(ConvertError::DegenerateRange(min));
    }
    Ok(())
}

/// Converter over a float reading.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FloatConverter {
    value: f32,
    min: f32,
    max: f32,
}

impl FloatConverter {
    /// Fails on `min == max`.
    pub fn new(value: f32, min: f32, max: f32) -> Result<Self, ConvertError> {
        checked_range(min, max)?;
        Ok(Self { value, min, max })
    }
}

impl RangeConverter for FloatConverter {
    fn raw(&self) -> f32 {
        self.value
    }
    fn min(&self) -> f32 {
        self.min
    }
    fn max(&self) -> f32 {
        self.max
    }
}

/// Converter over an integer reading with a [`RangeBindingMode`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IntConverter {
    value: i32,
    min: i32,
    max: i32,
    mode: RangeBindingMode,
}

impl IntConverter {
    /// Fails on `min == max`.
    pub fn new(
        value: i32,
        min: i32,
        max: i32,
        mode: RangeBindingMode,
    ) -> Result<Self, ConvertError> {
        if min == max {
            return Err(ConvertError::DegenerateRange(min as f32));
        }
        Ok(Self {
            value,
            min,
            max,
            mode,
        })
    }

    /// Stored value before binding.
    pub fn stored(&self) -> i32 {
        self.value
    }

    /// Stored value after applying the binding mode.
    pub fn bound(&self) -> i32 {
        self.mode.bind(self.value, self.min, self.max)
    }

    /// Binding mode in effect.
    pub fn mode(&self) -> RangeBindingMode {
        self.mode
    }
}

impl RangeConverter for IntConverter {
    fn raw(&self) -> f32 {
        self.bound() as f32
    }
    fn min(&self) -> f32 {
        self.min as f32
    }
    fn max(&self) -> f32 {
        self.max as f32
    }
}

/// Converter over a vector's magnitude.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VectorConverter {
    value: Vec3,
    min: f32,
    max: f32,
}

impl VectorConverter {
    /// Fails on `min == max`.
    pub fn new(value: Vec3, min: f32, max: f32) -> Result<Self, ConvertError> {
        checked_range(min, max)?;
        Ok(Self { value, min, max })
    }

    /// Wrapped vector.
    pub fn value(&self) -> Vec3 {
        self.value
    }

    /// Unit direction (zero for a zero vector).
    pub fn direction(&self) -> Vec3 {
        self.value.normalize()
    }

    /// Projection of the vector onto `onto`.
    pub fn project_onto(&self, onto: &Vec3) -> Vec3 {
        self.value.project_onto(onto)
    }

    /// Unsigned angle to `other`, in degrees.
    pub fn angle_to(&self, other: &Vec3) -> f32 {
        rad_to_deg(self.value.angle_to(other))
    }

    /// Signed angle to `other` about `axis`, in degrees.
    pub fn signed_angle(&self, other: &Vec3, axis: &Vec3) -> f32 {
        rad_to_deg(self.value.signed_angle(other, axis))
    }

    /// Whether the vector points at `target` (see [`DEFAULT_FACING_THRESHOLD`]).
    pub fn is_facing(&self, target: &Vec3, threshold: f32) -> bool {
        self.value.is_facing(target, threshold)
    }

    /// Whether the vector points away from `target`.
    pub fn is_facing_away(&self, target: &Vec3, threshold: f32) -> bool {
        self.value.is_facing_away(target, threshold)
    }
}

impl RangeConverter for VectorConverter {
    fn raw(&self) -> f32 {
        self.value.length()
    }
    fn min(&self) -> f32 {
        self.min
    }
    fn max(&self) -> f32 {
        self.max
    }
}

/// Converter over a rotation's axis-angle magnitude, in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RotationConverter {
    value: Quat,
    min: f32,
    max: f32,
}

impl RotationConverter {
    /// Fails on `min == max`.
    pub fn new(value: Quat, min: f32, max: f32) -> Result<Self, ConvertError> {
        checked_range(min, max)?;
        Ok(Self { value, min, max })
    }

    /// Wrapped rotation.
    pub fn value(&self) -> Quat {
        self.value
    }

    /// Rotation angle in degrees, `[0, 180]`.
    pub fn angle(&self) -> f32 {
        rad_to_deg(self.value.angle())
    }

    /// Rotation axis.
    pub fn axis(&self) -> Vec3 {
        self.value.axis()
    }

    /// Canonical forward rotated by the wrapped rotation.
    pub fn direction(&self) -> Vec3 {
        self.value.forward()
    }

    /// Whether [`Self::direction`] points along `target`.
    pub fn is_facing(&self, target: &Vec3, threshold: f32) -> bool {
        self.direction().is_facing(target, threshold)
    }

    /// Whether [`Self::direction`] points against `target`.
    pub fn is_facing_away(&self, target: &Vec3, threshold: f32) -> bool {
        self.direction().is_facing_away(target, threshold)
    }
}

impl RangeConverter for RotationConverter {
    fn raw(&self) -> f32 {
        self.angle()
    }
    fn min(&self) -> f32 {
        self.min
    }
    fn max(&self) -> f32 {
        self.max
    }
}

/// Converter over a flag read as `0` or `1`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoolConverter {
    value: bool,
    min: f32,
    max: f32,
}

impl BoolConverter {
    /// Accepts any range, including `min == max`.
    pub fn new(value: bool, min: f32, max: f32) -> Self {
        Self { value, min, max }
    }

    /// Wrapped flag.
    pub fn value(&self) -> bool {
        self.value
    }
}

impl RangeConverter for BoolConverter {
    fn raw(&self) -> f32 {
        if self.value {
            1.0
        } else {
            0.0
        }
    }
    fn min(&self) -> f32 {
        self.min
    }
    fn max(&self) -> f32 {
        self.max
    }

    fn normalized(&self) -> f32 {
        if self.min == self.max {
            return if self.raw() < self.min { 0.0 } else { 1.0 };
        }
        clamp01((self.raw() - self.min) / (self.max - self.min))
    }
}

/// Converter selected by payload type.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Converter {
    /// Float payload.
    Float(FloatConverter),
    /// Int payload.
    Int(IntConverter),
    /// Vector payload.
    Vector(VectorConverter),
    /// Rotation payload.
    Rotation(RotationConverter),
    /// Bool payload.
    Bool(BoolConverter),
}

impl Converter {
    fn inner(&self) -> &dyn RangeConverter {
        match self {
            Self::Float(c) => c,
            Self::Int(c) => c,
            Self::Vector(c) => c,
            Self::Rotation(c) => c,
            Self::Bool(c) => c,
        }
    }
}

impl RangeConverter for Converter {
    fn raw(&self) -> f32 {
        self.inner().raw()
    }
    fn min(&self) -> f32 {
        self.inner().min()
    }
    fn max(&self) -> f32 {
        self.inner().max()
    }
    fn normalized(&self) -> f32 {
        self.inner().normalized()
    }
    fn over(&self) -> bool {
        self.inner().over()
    }
    fn under(&self) -> bool {
        self.inner().under()
    }
    fn in_range(&self) -> bool {
        self.inner().in_range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oscillate_reflects_past_max() {
        assert_eq!(RangeBindingMode::Oscillate.bind(13, 0, 10), 7);
        assert_eq!(RangeBindingMode::Oscillate.bind(20, 0, 10), 0);
        assert_eq!(RangeBindingMode::Oscillate.bind(-3, 0, 10), 3);
    }

    #[test]
    fn cycle_modes_wrap_in_their_direction() {
        assert_eq!(RangeBindingMode::CycleUp.bind(11, 0, 10), 0);
        assert_eq!(RangeBindingMode::CycleUp.bind(13, 0, 10), 2);
        assert_eq!(RangeBindingMode::CycleUp.bind(-4, 0, 10), 0);
        assert_eq!(RangeBindingMode::CycleDown.bind(-1, 0, 10), 10);
        assert_eq!(RangeBindingMode::CycleDown.bind(-3, 0, 10), 8);
        assert_eq!(RangeBindingMode::CycleDown.bind(14, 0, 10), 10);
    }

    #[test]
    fn clamped_and_none() {
        assert_eq!(RangeBindingMode::Clamped.bind(42, 0, 10), 10);
        assert_eq!(RangeBindingMode::None.bind(42, 0, 10), 42);
    }

    #[test]
    fn degenerate_ranges_rejected_except_bool() {
        assert_eq!(
            FloatConverter::new(1.0, 2.0, 2.0),
            Err(ConvertError::DegenerateRange(2.0))
        );
        assert!(IntConverter::new(1, 3, 3, RangeBindingMode::None).is_err());
        assert!(VectorConverter::new(Vec3::UNIT_X, 0.0, 0.0).is_err());
        assert!(RotationConverter::new(Quat::identity(), 1.0, 1.0).is_err());
        let b = BoolConverter::new(true, 0.5, 0.5);
        assert_eq!(b.normalized(), 1.0);
        assert!(b.over());
    }

    #[test]
    fn bool_normalizes_against_arbitrary_range() {
        let b = BoolConverter::new(true, 0.0, 4.0);
        assert_eq!(b.normalized(), 0.25);
        assert!(b.in_range());
    }
}
