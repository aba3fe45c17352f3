// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Relation evaluator: `(relation, members, settings) → Datum`.
//!
//! Dispatch is a single exhaustive match over [`Relation`], so every legal
//! `(arity, metric)` pair has exactly one formula and illegal pairs do not
//! type-check.
//!
//! Evaluation never fails. Unresolved members are skipped; if fewer than the
//! class requires remain, the metric's zero value is returned (zero vector,
//! identity rotation, `false`, `0`). Vector and rotation results then pass
//! through the axis/magnitude reduction selected in the settings.

use crate::datum::{Datum, DatumKind};
use crate::entity::SpatialState;
use crate::math::{rad_to_deg, Aabb, Quat, Vec3, EPSILON};
use crate::relation::{CoupleMetric, GroupMetric, Relation, SingleMetric, ThroupleMetric};
use crate::settings::{
    AxisSelection, DensityMethod, PairSelection, RelationSettings, SizeMethod, ThroupleLayout,
};

/// States of the entities named in the settings, resolved by the caller.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct EvalContext {
    /// State of [`RelationSettings::reference`], when it resolves.
    pub reference: Option<SpatialState>,
    /// State of [`RelationSettings::proxy`], when it resolves.
    pub proxy: Option<SpatialState>,
}

/// Evaluates `relation` over `members` (in relationship order).
pub fn evaluate(
    relation: Relation,
    members: &[Option<SpatialState>],
    context: &EvalContext,
    settings: &RelationSettings,
) -> Datum {
    let resolved: Vec<SpatialState> = members.iter().flatten().copied().collect();
    let raw = if resolved.len() < relation.arity().required_members() {
        Datum::zero(result_kind(relation, settings))
    } else {
        dispatch(relation, &resolved, context, settings)
    };
    reduce(raw, settings)
}

/// Payload kind `relation` produces under `settings`, before reduction.
pub fn result_kind(relation: Relation, settings: &RelationSettings) -> DatumKind {
    use CoupleMetric as C;
    use GroupMetric as G;
    use SingleMetric as S;
    use ThroupleMetric as T;
    match relation {
        Relation::Single(S::Rotation)
        | Relation::Couple(C::Rotation)
        | Relation::Throuple(T::Rotation)
        | Relation::Group(G::Rotation) => DatumKind::Rotation,
        Relation::Single(S::Trigger)
        | Relation::Couple(C::Trigger)
        | Relation::Throuple(T::Trigger)
        | Relation::Group(G::Trigger) => DatumKind::Bool,
        Relation::Couple(C::Distance)
        | Relation::Throuple(T::Density | T::RotationAroundAxis)
        | Relation::Group(G::Density | G::RotationAroundAxis) => DatumKind::Float,
        Relation::Throuple(T::Distance) if settings.pair != PairSelection::All => DatumKind::Float,
        Relation::Throuple(T::Size) | Relation::Group(G::Size)
            if settings.size_method == SizeMethod::Radius =>
        {
            DatumKind::Float
        }
        _ => DatumKind::Vector,
    }
}

fn dispatch(
    relation: Relation,
    members: &[SpatialState],
    ctx: &EvalContext,
    s: &RelationSettings,
) -> Datum {
    match relation {
        Relation::Single(metric) => single(metric, &members[0], ctx, s),
        Relation::Couple(metric) => couple(metric, [&members[0], &members[1]], ctx, s),
        Relation::Throuple(metric) => {
            throuple(metric, [&members[0], &members[1], &members[2]], ctx, s)
        }
        Relation::Group(metric) => group(metric, members, ctx, s),
    }
}

fn single(
    metric: SingleMetric,
    member: &SpatialState,
    ctx: &EvalContext,
    s: &RelationSettings,
) -> Datum {
    let members = core::slice::from_ref(member);
    match metric {
        SingleMetric::Position => Datum::Vector(position(members, ctx)),
        SingleMetric::Rotation => Datum::Rotation(match ctx.reference {
            Some(reference) => reference.rotation.inverse().multiply(&member.rotation),
            None => member.rotation,
        }),
        SingleMetric::Movement => Datum::Vector(movement(members, ctx, s)),
        SingleMetric::Trigger => Datum::Bool(trigger(members, ctx, s)),
    }
}

fn couple(
    metric: CoupleMetric,
    [leader, follower]: [&SpatialState; 2],
    ctx: &EvalContext,
    s: &RelationSettings,
) -> Datum {
    let pair = [*leader, *follower];
    match metric {
        CoupleMetric::Position => Datum::Vector(position(&pair, ctx)),
        CoupleMetric::Rotation => {
            let mut forward = (leader.position - follower.position).normalize();
            if s.invert {
                forward = -forward;
            }
            let center = leader.position.midpoint(&follower.position);
            let up = reference_axis(s, center, ctx);
            Datum::Rotation(Quat::look_rotation(&forward, &up))
        }
        CoupleMetric::Movement => Datum::Vector(movement(&pair, ctx, s)),
        CoupleMetric::Trigger => Datum::Bool(trigger(&pair, ctx, s)),
        CoupleMetric::Distance => {
            Datum::Float(leader.position.distance(&follower.position) * s.distance_unit.scale())
        }
        CoupleMetric::Difference => Datum::Vector(follower.position - leader.position),
    }
}

fn throuple(
    metric: ThroupleMetric,
    [a, b, c]: [&SpatialState; 3],
    ctx: &EvalContext,
    s: &RelationSettings,
) -> Datum {
    let trio = [*a, *b, *c];
    let points = [a.position, b.position, c.position];
    let unit = s.distance_unit.scale();
    match metric {
        ThroupleMetric::Position => Datum::Vector(position(&trio, ctx)),
        ThroupleMetric::Rotation => {
            let (mut forward, right) = layout(s.layout, points);
            if s.invert {
                forward = -forward;
            }
            let up = forward.cross(&right);
            Datum::Rotation(Quat::look_rotation(&forward, &up))
        }
        ThroupleMetric::Movement => Datum::Vector(movement(&trio, ctx, s)),
        ThroupleMetric::Trigger => Datum::Bool(trigger(&trio, ctx, s)),
        ThroupleMetric::Distance => {
            let [p0, p1, p2] = points;
            let d = Vec3::new(p0.distance(&p1), p1.distance(&p2), p2.distance(&p0)) * unit;
            match s.pair {
                PairSelection::All => Datum::Vector(d),
                PairSelection::LeaderFollower => Datum::Float(d.x()),
                PairSelection::FollowerThird => Datum::Float(d.y()),
                PairSelection::ThirdLeader => Datum::Float(d.z()),
                PairSelection::Average => Datum::Float((d.x() + d.y() + d.z()) / 3.0),
            }
        }
        ThroupleMetric::Angle => Datum::Vector(interior_angles(points)),
        ThroupleMetric::Density => Datum::Float(density(&points, s.density_method) * unit),
        ThroupleMetric::Size => size(&points, s.size_method, unit),
        ThroupleMetric::RotationAroundAxis => {
            Datum::Float(rotation_around_axis(points, ctx, s))
        }
    }
}

fn group(
    metric: GroupMetric,
    members: &[SpatialState],
    ctx: &EvalContext,
    s: &RelationSettings,
) -> Datum {
    let points: Vec<Vec3> = members.iter().map(|m| m.position).collect();
    let unit = s.distance_unit.scale();
    match metric {
        GroupMetric::Position => Datum::Vector(position(members, ctx)),
        GroupMetric::Rotation => {
            let heading = mean(members.iter().map(|m| m.velocity));
            let rotation = if heading.length() <= EPSILON {
                Quat::identity()
            } else {
                Quat::look_rotation(&heading, &Vec3::UNIT_Y)
            };
            Datum::Rotation(rotation)
        }
        GroupMetric::Movement => Datum::Vector(movement(members, ctx, s)),
        GroupMetric::Trigger => Datum::Bool(trigger(members, ctx, s)),
        GroupMetric::Density => Datum::Float(density(&points, s.density_method) * unit),
        GroupMetric::Size => size(&points, s.size_method, unit),
        GroupMetric::RotationAroundAxis => match points.as_slice() {
            [p0, p1, p2, ..] => Datum::Float(rotation_around_axis([*p0, *p1, *p2], ctx, s)),
            _ => Datum::Float(0.0),
        },
    }
}

fn mean(values: impl Iterator<Item = Vec3>) -> Vec3 {
    let (sum, count) = values.fold((Vec3::ZERO, 0_u32), |(acc, n), v| (acc + v, n + 1));
    if count == 0 {
        return Vec3::ZERO;
    }
    sum * (1.0 / count as f32)
}

/// Centroid of the members, relative to the reference entity if any.
fn position(members: &[SpatialState], ctx: &EvalContext) -> Vec3 {
    let center = mean(members.iter().map(|m| m.position));
    match ctx.reference {
        Some(reference) => center - reference.position,
        None => center,
    }
}

/// Mean velocity, or the leader's velocity against the mean of the others
/// when `relative_to_members` is set; minus the reference's velocity.
fn movement(members: &[SpatialState], ctx: &EvalContext, s: &RelationSettings) -> Vec3 {
    let mut velocity = match members.split_first() {
        Some((leader, rest)) if s.relative_to_members && !rest.is_empty() => {
            leader.velocity - mean(rest.iter().map(|m| m.velocity))
        }
        _ => mean(members.iter().map(|m| m.velocity)),
    };
    if let Some(reference) = ctx.reference {
        velocity -= reference.velocity;
    }
    if s.direction_only {
        velocity = velocity.normalize();
    }
    velocity
}

/// With a proxy configured, every member must face it; otherwise every
/// member's own trigger flag must be set. A configured but unresolved proxy
/// reads as not triggered.
fn trigger(members: &[SpatialState], ctx: &EvalContext, s: &RelationSettings) -> bool {
    match (&s.proxy, ctx.proxy) {
        (Some(_), Some(target)) => members.iter().all(|m| {
            m.rotation
                .forward()
                .is_facing(&(target.position - m.position), s.threshold)
        }),
        (Some(_), None) => false,
        (None, _) => members.iter().all(|m| m.triggered),
    }
}

fn reference_axis(s: &RelationSettings, center: Vec3, ctx: &EvalContext) -> Vec3 {
    match s.axis_selection {
        AxisSelection::Up => Vec3::UNIT_Y,
        AxisSelection::Right => Vec3::UNIT_X,
        AxisSelection::Forward => Vec3::UNIT_Z,
        AxisSelection::ObjectToCenter => ctx
            .reference
            .map(|r| (r.position - center).normalize())
            .filter(|dir| *dir != Vec3::ZERO)
            .unwrap_or(Vec3::UNIT_Y),
        AxisSelection::Custom => s.custom_axis,
    }
}

/// `(forward, right)` of a three-point layout.
fn layout(layout: ThroupleLayout, [p0, p1, p2]: [Vec3; 3]) -> (Vec3, Vec3) {
    let (vertex, left, right) = match layout {
        ThroupleLayout::CenterThroughLeader => (p0, p1, p2),
        ThroupleLayout::CenterThroughFollower => (p1, p2, p0),
        ThroupleLayout::CenterThroughThird => (p2, p0, p1),
    };
    let forward = (vertex - left.midpoint(&right)).normalize();
    (forward, (right - left).normalize())
}

fn interior_angles([p0, p1, p2]: [Vec3; 3]) -> Vec3 {
    let at = |v: Vec3, a: Vec3, b: Vec3| rad_to_deg((a - v).angle_to(&(b - v)));
    Vec3::new(at(p0, p1, p2), at(p1, p2, p0), at(p2, p0, p1))
}

fn density(points: &[Vec3], method: DensityMethod) -> f32 {
    if points.is_empty() {
        return 0.0;
    }
    let center = Vec3::centroid(points);
    let n = points.len() as f32;
    match method {
        DensityMethod::AverageFromCenter => {
            points.iter().map(|p| p.distance(&center)).sum::<f32>() / n
        }
        DensityMethod::SumFromCenter => points.iter().map(|p| p.distance(&center)).sum(),
        DensityMethod::NearestNeighbor => {
            if points.len() < 2 {
                return 0.0;
            }
            let nearest_sum: f32 = points
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    points
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, q)| p.distance(q))
                        .fold(f32::INFINITY, f32::min)
                })
                .sum();
            nearest_sum / n
        }
    }
}

fn size(points: &[Vec3], method: SizeMethod, unit: f32) -> Datum {
    match method {
        SizeMethod::BoundingBox => Datum::Vector(
            Aabb::from_points(points).map_or(Vec3::ZERO, |bounds| bounds.extents()) * unit,
        ),
        SizeMethod::Radius => {
            let center = Vec3::centroid(points);
            let radius = points
                .iter()
                .map(|p| p.distance(&center))
                .fold(0.0_f32, f32::max);
            Datum::Float(radius * unit)
        }
    }
}

/// Signed angle in degrees from the reference direction to the layout's
/// right vector, measured about the layout's forward axis.
fn rotation_around_axis(points: [Vec3; 3], ctx: &EvalContext, s: &RelationSettings) -> f32 {
    let (forward, right) = layout(s.layout, points);
    if forward == Vec3::ZERO {
        return 0.0;
    }
    let reference = reference_axis(s, Vec3::centroid(&points), ctx).project_on_plane(&forward);
    let right = right.project_on_plane(&forward);
    rad_to_deg(reference.signed_angle(&right, &forward))
}

fn reduce(raw: Datum, s: &RelationSettings) -> Datum {
    match raw {
        Datum::Vector(v) if s.isolate_axis => Datum::Float(v.component(s.axis)),
        Datum::Vector(v) if s.magnitude_only => Datum::Float(v.length()),
        Datum::Rotation(q) if s.isolate_axis => Datum::Float(q.twist_degrees(&s.axis.unit())),
        Datum::Rotation(q) if s.magnitude_only => Datum::Float(rad_to_deg(q.angle())),
        other => other,
    }
}
