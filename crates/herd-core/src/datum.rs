// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tagged value container produced by relation evaluation.
//!
//! Exactly one payload is active at a time; the variant is the tag. Typed
//! accessors return `None` when asked for a payload the datum does not
//! carry.

use core::any::{type_name, Any};
use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::convert::{
    BoolConverter, ConvertError, Converter, FloatConverter, IntConverter, RangeBindingMode,
    RotationConverter, VectorConverter,
};
use crate::math::{rad_to_deg, Quat, Vec3};

/// Payload tag of a [`Datum`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatumKind {
    /// `f32` payload.
    Float,
    /// `i32` payload.
    Int,
    /// `bool` payload.
    Bool,
    /// [`Vec3`] payload.
    Vector,
    /// [`Quat`] payload.
    Rotation,
    /// `String` payload.
    Text,
}

/// Errors raised by [`Datum::set_value`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatumError {
    /// The value's type has no payload slot.
    #[error("unsupported datum value type: {0}")]
    UnsupportedType(&'static str),
    /// An integer did not fit the `i32` slot.
    #[error("integer value {0} does not fit a 32-bit datum")]
    IntOutOfRange(i64),
}

/// Tagged union over the six supported payload types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Datum {
    /// Scalar.
    Float(f32),
    /// Integer.
    Int(i32),
    /// Flag.
    Bool(bool),
    /// 3D vector.
    Vector(Vec3),
    /// Rotation.
    Rotation(Quat),
    /// Free text.
    Text(String),
}

impl Default for Datum {
    fn default() -> Self {
        Self::Float(0.0)
    }
}

/// Rust types that map onto one [`Datum`] payload slot.
pub trait DatumValue: Sized {
    /// Tag the type is stored under.
    const KIND: DatumKind;
    /// Wraps the value.
    fn into_datum(self) -> Datum;
    /// Reads the value back; `None` on tag mismatch.
    fn from_datum(datum: &Datum) -> Option<Self>;
}

macro_rules! datum_value {
    ($ty:ty, $variant:ident) => {
        impl DatumValue for $ty {
            const KIND: DatumKind = DatumKind::$variant;
            fn into_datum(self) -> Datum {
                Datum::$variant(self)
            }
            fn from_datum(datum: &Datum) -> Option<Self> {
                match datum {
                    Datum::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Datum {
            fn from(value: $ty) -> Self {
                Datum::$variant(value)
            }
        }
    };
}

datum_value!(f32, Float);
datum_value!(i32, Int);
datum_value!(bool, Bool);
datum_value!(Vec3, Vector);
datum_value!(Quat, Rotation);
datum_value!(String, Text);

impl Datum {
    /// Active payload tag.
    pub fn kind(&self) -> DatumKind {
        match self {
            Self::Float(_) => DatumKind::Float,
            Self::Int(_) => DatumKind::Int,
            Self::Bool(_) => DatumKind::Bool,
            Self::Vector(_) => DatumKind::Vector,
            Self::Rotation(_) => DatumKind::Rotation,
            Self::Text(_) => DatumKind::Text,
        }
    }

    /// Zero value of a kind: `0`, `false`, the zero vector, identity, `""`.
    pub fn zero(kind: DatumKind) -> Self {
        match kind {
            DatumKind::Float => Self::Float(0.0),
            DatumKind::Int => Self::Int(0),
            DatumKind::Bool => Self::Bool(false),
            DatumKind::Vector => Self::Vector(Vec3::ZERO),
            DatumKind::Rotation => Self::Rotation(Quat::identity()),
            DatumKind::Text => Self::Text(String::new()),
        }
    }

    /// Replaces the payload (and tag) with a statically typed value.
    pub fn set<T: DatumValue>(&mut self, value: T) {
        *self = value.into_datum();
    }

    /// Reads the payload as `T`; `None` when the tag differs.
    pub fn get<T: DatumValue>(&self) -> Option<T> {
        T::from_datum(self)
    }

    /// Replaces the payload by dispatching on the runtime type of `value`.
    ///
    /// Accepts `f32`, `f64`, `i32`, `i64`, `u32`, `bool`, [`Vec3`], [`Quat`],
    /// `String` and `&str`. Anything else is logged and rejected, leaving the
    /// previous tag and value untouched.
    pub fn set_value<T: Any>(&mut self, value: &T) -> Result<(), DatumError> {
        let any = value as &dyn Any;
        let next = if let Some(v) = any.downcast_ref::<f32>() {
            Self::Float(*v)
        } else if let Some(v) = any.downcast_ref::<f64>() {
            Self::Float(*v as f32)
        } else if let Some(v) = any.downcast_ref::<i32>() {
            Self::Int(*v)
        } else if let Some(v) = any.downcast_ref::<i64>() {
            Self::Int(i32::try_from(*v).map_err(|_| DatumError::IntOutOfRange(*v))?)
        } else if let Some(v) = any.downcast_ref::<u32>() {
            Self::Int(i32::try_from(*v).map_err(|_| DatumError::IntOutOfRange(i64::from(*v)))?)
        } else if let Some(v) = any.downcast_ref::<bool>() {
            Self::Bool(*v)
        } else if let Some(v) = any.downcast_ref::<Vec3>() {
            Self::Vector(*v)
        } else if let Some(v) = any.downcast_ref::<Quat>() {
            Self::Rotation(*v)
        } else if let Some(v) = any.downcast_ref::<String>() {
            Self::Text(v.clone())
        } else if let Some(v) = any.downcast_ref::<&str>() {
            Self::Text((*v).to_owned())
        } else {
            let name = type_name::<T>();
            warn!(value_type = name, kept = ?self.kind(), "datum rejected unsupported value type");
            return Err(DatumError::UnsupportedType(name));
        };
        *self = next;
        Ok(())
    }

    /// Float payload.
    pub fn as_float(&self) -> Option<f32> {
        self.get()
    }

    /// Int payload.
    pub fn as_int(&self) -> Option<i32> {
        self.get()
    }

    /// Bool payload.
    pub fn as_bool(&self) -> Option<bool> {
        self.get()
    }

    /// Vector payload.
    pub fn as_vector(&self) -> Option<Vec3> {
        self.get()
    }

    /// Rotation payload.
    pub fn as_rotation(&self) -> Option<Quat> {
        self.get()
    }

    /// Text payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar the converters range-check: the value itself for numbers,
    /// `0`/`1` for flags, magnitude for vectors, axis-angle degrees for
    /// rotations. Text has none.
    pub fn scalar(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f32),
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::Vector(v) => Some(v.length()),
            Self::Rotation(q) => Some(rad_to_deg(q.angle())),
            Self::Text(_) => None,
        }
    }

    /// Builds the typed converter for this payload over `[min, max]`.
    ///
    /// Integer payloads use the rounded bounds and `binding`; other payloads
    /// ignore `binding`.
    pub fn converter(
        &self,
        min: f32,
        max: f32,
        binding: RangeBindingMode,
    ) -> Result<Converter, ConvertError> {
        Ok(match self {
            Self::Float(v) => Converter::Float(FloatConverter::new(*v, min, max)?),
            Self::Int(v) => Converter::Int(IntConverter::new(
                *v,
                min.round() as i32,
                max.round() as i32,
                binding,
            )?),
            Self::Bool(v) => Converter::Bool(BoolConverter::new(*v, min, max)),
            Self::Vector(v) => Converter::Vector(VectorConverter::new(*v, min, max)?),
            Self::Rotation(q) => Converter::Rotation(RotationConverter::new(*q, min, max)?),
            Self::Text(_) => return Err(ConvertError::NotConvertible(DatumKind::Text)),
        })
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v:.4}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Vector(v) => {
                let [x, y, z] = v.to_array();
                write!(f, "({x:.4}, {y:.4}, {z:.4})")
            }
            Self::Rotation(q) => {
                let [x, y, z, w] = q.to_array();
                write!(f, "[{x:.4}, {y:.4}, {z:.4}, {w:.4}]")
            }
            Self::Text(s) => f.write_str(s),
        }
    }
}
