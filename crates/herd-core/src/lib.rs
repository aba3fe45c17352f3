// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! herd-core: spatial relationship metrics over tracked entities.
//!
//! A [`Registry`] tracks named entities through an [`EntitySource`] and a set
//! of relationships between them. Each relationship pairs an arity class and
//! metric ([`Relation`]) with settings, an expected `[min, max]` range and a
//! remapping curve. [`Registry::tick`] re-evaluates every enabled
//! relationship and caches the raw reading, its normalized and curved values
//! and an over/under/in-range [`Status`].
//!
//! Evaluation is synchronous and single-threaded: the host calls `tick()` once
//! per update after moving its entities.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

pub mod config;
pub mod convert;
pub mod curve;
pub mod datum;
pub mod entity;
pub mod eval;
pub mod herd;
pub mod info;
pub mod math;
pub mod registry;
pub mod relation;
pub mod settings;

pub use config::{
    ConfigError, ConfigService, ConfigStore, MemoryConfigStore, RelationshipStore,
};
pub use convert::{
    BoolConverter, ConvertError, Converter, FloatConverter, IntConverter, RangeBindingMode,
    RangeConverter, RangeFlags, RotationConverter, VectorConverter,
};
pub use curve::{Curve, CurveChoice, CurveKind, CurveLibrary, Keyframe};
pub use datum::{Datum, DatumError, DatumKind, DatumValue};
pub use entity::{EntityId, EntityRef, EntitySource, SpatialState};
pub use eval::{evaluate, EvalContext};
pub use herd::{EntityRecord, Herd, HerdError, HerdSnapshot};
pub use info::{
    compute, DynamicOutputs, Preview, PreviewOverrides, RelationshipConfig, RelationshipId,
    RelationshipInfo, Status,
};
pub use math::{Aabb, Axis, Quat, Vec3};
pub use registry::{Registry, RegistryError, StatusChange, TickReport};
pub use relation::{
    ArityClass, CoupleMetric, GroupMetric, ParseRelationError, Relation, SingleMetric,
    ThroupleMetric,
};
pub use settings::{
    AxisSelection, DensityMethod, DistanceUnit, PairSelection, RelationSettings, SizeMethod,
    ThroupleLayout,
};
