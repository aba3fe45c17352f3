// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
mod common;

use common::{approx, approx_vec, at, equilateral};
use herd_core::{
    evaluate, Axis, AxisSelection, CoupleMetric, Datum, DensityMethod, EvalContext, GroupMetric,
    PairSelection, Quat, Relation, RelationSettings, SingleMetric, SizeMethod, SpatialState,
    ThroupleMetric, Vec3,
};

fn trio() -> Vec<Option<SpatialState>> {
    equilateral()
        .into_iter()
        .map(|p| Some(SpatialState::at(p)))
        .collect()
}

fn run(relation: Relation, members: &[Option<SpatialState>], settings: &RelationSettings) -> Datum {
    evaluate(relation, members, &EvalContext::default(), settings)
}

#[test]
fn position_is_relative_to_reference() {
    let ctx = EvalContext {
        reference: at(1.0, 1.0, 1.0),
        proxy: None,
    };
    let settings = RelationSettings::default().relative_to("anchor");
    let out = evaluate(
        Relation::Couple(CoupleMetric::Position),
        &[at(2.0, 0.0, 0.0), at(4.0, 2.0, 0.0)],
        &ctx,
        &settings,
    );
    approx_vec(out.as_vector().unwrap(), Vec3::new(2.0, 0.0, -1.0));
}

#[test]
fn single_rotation_relative_to_reference() {
    let quarter = Quat::from_axis_angle(Vec3::UNIT_Y, core::f32::consts::FRAC_PI_2);
    let member = Some(SpatialState::at(Vec3::ZERO).with_rotation(quarter.multiply(&quarter)));
    let ctx = EvalContext {
        reference: Some(SpatialState::at(Vec3::ZERO).with_rotation(quarter)),
        proxy: None,
    };
    let settings = RelationSettings::default().isolating(Axis::Y);
    let out = evaluate(Relation::Single(SingleMetric::Rotation), &[member], &ctx, &settings);
    approx(out.as_float().unwrap(), 90.0);
}

#[test]
fn movement_relative_to_members() {
    let members = [
        Some(SpatialState::default().with_velocity(Vec3::new(4.0, 0.0, 0.0))),
        Some(SpatialState::default().with_velocity(Vec3::new(1.0, 0.0, 0.0))),
        Some(SpatialState::default().with_velocity(Vec3::new(3.0, 0.0, 0.0))),
    ];
    let group = Relation::Group(GroupMetric::Movement);
    let mean = run(group, &members, &RelationSettings::default());
    approx_vec(mean.as_vector().unwrap(), Vec3::new(8.0 / 3.0, 0.0, 0.0));

    let mut settings = RelationSettings::default();
    settings.relative_to_members = true;
    let relative = run(group, &members, &settings);
    approx_vec(relative.as_vector().unwrap(), Vec3::new(2.0, 0.0, 0.0));

    settings.direction_only = true;
    let direction = run(group, &members, &settings);
    approx_vec(direction.as_vector().unwrap(), Vec3::UNIT_X);
}

#[test]
fn trigger_uses_proxy_or_flags() {
    let member = Some(SpatialState::default());
    let single = Relation::Single(SingleMetric::Trigger);

    let mut settings = RelationSettings::default();
    assert_eq!(run(single, &[member], &settings), Datum::Bool(false));
    let flagged = Some(SpatialState::default().with_triggered(true));
    assert_eq!(run(single, &[flagged], &settings), Datum::Bool(true));

    settings.proxy = Some("screen".into());
    let ahead = EvalContext {
        reference: None,
        proxy: at(0.0, 0.0, 5.0),
    };
    let aside = EvalContext {
        reference: None,
        proxy: at(5.0, 0.0, 0.0),
    };
    assert_eq!(evaluate(single, &[member], &ahead, &settings), Datum::Bool(true));
    assert_eq!(evaluate(single, &[member], &aside, &settings), Datum::Bool(false));
    assert_eq!(
        evaluate(single, &[flagged], &EvalContext::default(), &settings),
        Datum::Bool(false)
    );
}

#[test]
fn couple_difference_and_rotation() {
    let members = [at(0.0, 0.0, 1.0), at(0.0, 0.0, 0.0)];
    let diff = run(
        Relation::Couple(CoupleMetric::Difference),
        &members,
        &RelationSettings::default(),
    );
    approx_vec(diff.as_vector().unwrap(), Vec3::new(0.0, 0.0, -1.0));

    let rotation = run(
        Relation::Couple(CoupleMetric::Rotation),
        &members,
        &RelationSettings::default(),
    );
    let q = rotation.as_rotation().unwrap();
    approx_vec(q.forward(), Vec3::UNIT_Z);
    approx_vec(q.up(), Vec3::UNIT_Y);

    let mut inverted = RelationSettings::default();
    inverted.invert = true;
    let flipped = run(Relation::Couple(CoupleMetric::Rotation), &members, &inverted);
    approx_vec(flipped.as_rotation().unwrap().forward(), -Vec3::UNIT_Z);

    let magnitude = run(
        Relation::Couple(CoupleMetric::Rotation),
        &members,
        &inverted.clone().magnitude(),
    );
    approx(magnitude.as_float().unwrap(), 180.0);
}

#[test]
fn throuple_distance_pair_selection() {
    let members = [at(0.0, 0.0, 0.0), at(3.0, 0.0, 0.0), at(3.0, 4.0, 0.0)];
    let relation = Relation::Throuple(ThroupleMetric::Distance);
    let mut settings = RelationSettings::default();
    let all = run(relation, &members, &settings);
    approx_vec(all.as_vector().unwrap(), Vec3::new(3.0, 4.0, 5.0));

    for (pair, expected) in [
        (PairSelection::LeaderFollower, 3.0),
        (PairSelection::FollowerThird, 4.0),
        (PairSelection::ThirdLeader, 5.0),
        (PairSelection::Average, 4.0),
    ] {
        settings.pair = pair;
        approx(run(relation, &members, &settings).as_float().unwrap(), expected);
    }
}

#[test]
fn throuple_layout_metrics_on_equilateral() {
    let members = trio();
    let settings = RelationSettings::default();

    let angles = run(Relation::Throuple(ThroupleMetric::Angle), &members, &settings);
    approx_vec(angles.as_vector().unwrap(), Vec3::new(60.0, 60.0, 60.0));

    let rotation = run(Relation::Throuple(ThroupleMetric::Rotation), &members, &settings);
    let q = rotation.as_rotation().unwrap();
    approx_vec(q.forward(), Vec3::UNIT_Z);
    approx_vec(q.right(), Vec3::UNIT_X);

    let around = Relation::Throuple(ThroupleMetric::RotationAroundAxis);
    approx(run(around, &members, &settings).as_float().unwrap(), -90.0);
    let mut right = settings.clone();
    right.axis_selection = AxisSelection::Right;
    approx(run(around, &members, &right).as_float().unwrap(), 0.0);
}

#[test]
fn size_and_density_variants() {
    let members = trio();
    let r = 2.0 / 3.0_f32.sqrt();
    let size = Relation::Throuple(ThroupleMetric::Size);

    let bbox = run(size, &members, &RelationSettings::default());
    approx_vec(bbox.as_vector().unwrap(), Vec3::new(2.0, 0.0, 1.5 * r));

    let mut settings = RelationSettings::default();
    settings.size_method = SizeMethod::Radius;
    approx(run(size, &members, &settings).as_float().unwrap(), r);

    settings.density_method = DensityMethod::SumFromCenter;
    let density = Relation::Group(GroupMetric::Density);
    approx(run(density, &members, &settings).as_float().unwrap(), 3.0 * r);
    settings.density_method = DensityMethod::NearestNeighbor;
    approx(run(density, &members, &settings).as_float().unwrap(), 2.0);
}

#[test]
fn group_rotation_follows_mean_velocity() {
    let members = [
        Some(SpatialState::default().with_velocity(Vec3::new(1.0, 0.0, 0.0))),
        Some(SpatialState::default().with_velocity(Vec3::new(1.0, 0.0, 0.0))),
    ];
    let relation = Relation::Group(GroupMetric::Rotation);
    let q = run(relation, &members, &RelationSettings::default())
        .as_rotation()
        .unwrap();
    approx_vec(q.forward(), Vec3::UNIT_X);

    let resting = [Some(SpatialState::default())];
    assert_eq!(
        run(relation, &resting, &RelationSettings::default()),
        Datum::Rotation(Quat::identity())
    );
}

#[test]
fn group_rotation_around_axis_needs_three() {
    let relation = Relation::Group(GroupMetric::RotationAroundAxis);
    let two = [at(0.0, 0.0, 0.0), at(1.0, 0.0, 0.0)];
    assert_eq!(run(relation, &two, &RelationSettings::default()), Datum::Float(0.0));
    approx(
        run(relation, &trio(), &RelationSettings::default())
            .as_float()
            .unwrap(),
        -90.0,
    );
}

#[test]
fn axis_isolation_and_magnitude() {
    let members = [at(0.0, 0.0, 0.0), at(3.0, 4.0, 0.0)];
    let diff = Relation::Couple(CoupleMetric::Difference);
    let y = run(diff, &members, &RelationSettings::default().isolating(Axis::Y));
    assert_eq!(y, Datum::Float(4.0));
    let length = run(diff, &members, &RelationSettings::default().magnitude());
    approx(length.as_float().unwrap(), 5.0);
}

#[test]
fn unresolved_members_are_skipped_in_order() {
    let members = [at(0.0, 0.0, 0.0), None, at(0.0, 6.0, 8.0)];
    let out = run(
        Relation::Couple(CoupleMetric::Distance),
        &members,
        &RelationSettings::default(),
    );
    approx(out.as_float().unwrap(), 10.0);
}
