// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use herd_core::{EntityRef, Herd, Registry, SpatialState, Vec3};

pub const EPS: f32 = 1e-4;

pub fn approx(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() <= EPS,
        "expected {expected}, got {actual}"
    );
}

pub fn approx_vec(actual: Vec3, expected: Vec3) {
    let (a, e) = (actual.to_array(), expected.to_array());
    for i in 0..3 {
        assert!(
            (a[i] - e[i]).abs() <= EPS,
            "index {i}: expected {e:?}, got {a:?}"
        );
    }
}

pub fn at(x: f32, y: f32, z: f32) -> Option<SpatialState> {
    Some(SpatialState::at(Vec3::new(x, y, z)))
}

/// Vertices of an equilateral triangle with side 2 centred on the origin in
/// the XZ plane: leader in front, follower on the left, third on the right.
pub fn equilateral() -> [Vec3; 3] {
    let r = 2.0 / 3.0_f32.sqrt();
    [
        Vec3::new(0.0, 0.0, r),
        Vec3::new(-1.0, 0.0, -r / 2.0),
        Vec3::new(1.0, 0.0, -r / 2.0),
    ]
}

/// Registry over a fresh herd with every entity spawned and registered.
pub fn registry_with(entities: &[(&str, Vec3)]) -> Registry<Herd> {
    let mut herd = Herd::new();
    for (name, position) in entities {
        herd.spawn(*name, None, SpatialState::at(*position)).unwrap();
    }
    let mut registry = Registry::new(herd);
    for (name, _) in entities {
        registry.register(EntityRef::new(*name));
    }
    registry
}

/// Moves the entity called `name` to `position`.
pub fn move_to(registry: &mut Registry<Herd>, name: &str, position: Vec3) {
    use herd_core::EntitySource;
    let id = registry.source().find_by_name(name).unwrap();
    registry.source_mut().state_mut(id).unwrap().position = position;
}
