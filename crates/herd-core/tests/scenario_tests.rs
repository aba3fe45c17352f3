// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
mod common;

use common::{approx, at, equilateral};
use herd_core::{
    evaluate, Converter, CoupleMetric, CurveKind, CurveLibrary, Datum, DistanceUnit, EvalContext,
    IntConverter, RangeBindingMode, RangeConverter, Relation, RelationSettings, SpatialState,
    ThroupleMetric,
};

const DISTANCE: Relation = Relation::Couple(CoupleMetric::Distance);

#[test]
fn couple_distance_in_meters_and_feet() {
    let members = [at(0.0, 0.0, 0.0), at(3.0, 4.0, 0.0)];
    let ctx = EvalContext::default();

    let meters = evaluate(DISTANCE, &members, &ctx, &RelationSettings::default());
    assert_eq!(meters, Datum::Float(5.0));

    let feet = RelationSettings::default().with_unit(DistanceUnit::Feet);
    let raw = evaluate(DISTANCE, &members, &ctx, &feet).as_float().unwrap();
    approx(raw, 16.4042);
}

#[test]
fn equilateral_density_is_circumradius() {
    let members: Vec<Option<SpatialState>> = equilateral()
        .into_iter()
        .map(|p| Some(SpatialState::at(p)))
        .collect();
    let raw = evaluate(
        Relation::Throuple(ThroupleMetric::Density),
        &members,
        &EvalContext::default(),
        &RelationSettings::default(),
    );
    approx(raw.as_float().unwrap(), 1.1547);
}

#[test]
fn linear_curve_midpoint() {
    let lib = CurveLibrary::new();
    let linear = lib.get(CurveKind::Linear).unwrap();
    let converter = Datum::Float(5.0)
        .converter(0.0, 10.0, RangeBindingMode::None)
        .unwrap();
    approx(converter.normalized(), 0.5);
    approx(converter.to_curve(linear), 0.5);
}

#[test]
fn oscillate_binding_reflects() {
    let converter = IntConverter::new(13, 0, 10, RangeBindingMode::Oscillate).unwrap();
    assert_eq!(converter.stored(), 13);
    assert_eq!(converter.bound(), 7);
    assert!(converter.in_range());

    let via_datum = Datum::Int(13)
        .converter(0.0, 10.0, RangeBindingMode::Oscillate)
        .unwrap();
    assert!(matches!(via_datum, Converter::Int(_)));
    approx(via_datum.raw(), 7.0);
}

#[test]
fn evaluation_is_pure() {
    let members = [at(1.0, 2.0, 3.0), at(-4.0, 0.5, 2.0), at(0.0, 0.0, -1.0)];
    let ctx = EvalContext::default();
    let settings = RelationSettings::default();
    for relation in Relation::all() {
        let first = evaluate(relation, &members, &ctx, &settings);
        let second = evaluate(relation, &members, &ctx, &settings);
        assert_eq!(first, second, "{relation}");
    }
}

#[test]
fn missing_members_never_fail() {
    let ctx = EvalContext::default();
    let settings = RelationSettings::default();
    for relation in Relation::all() {
        let needed = relation.arity().required_members();
        let mut members = vec![None; needed];
        members.truncate(needed.saturating_sub(1));
        let out = evaluate(relation, &members, &ctx, &settings);
        assert_eq!(out, Datum::zero(out.kind()), "{relation}");
    }
}
