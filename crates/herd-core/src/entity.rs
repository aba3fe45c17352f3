// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Entity handles, the entity-source port and lazily resolved references.
//!
//! An [`EntityRef`] never owns the entity it points at. It caches a
//! generation-checked [`EntityId`] plus the entity's last known path, and
//! re-resolves whenever that handle stops being valid:
//!
//! 1. cached handle (live and still carrying the expected name),
//! 2. lookup by cached path,
//! 3. fallback search by name.
//!
//! A successful resolution rewrites the cached path so later lookups survive
//! structural changes (re-parenting) in the source.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::math::{Quat, Vec3};

/// Generation-checked handle into an entity arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Creates a handle from raw parts.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the arena.
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time the handle was issued.
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// Spatial and kinematic state reported for one tracked entity.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialState {
    /// World-space position in metres.
    pub position: Vec3,
    /// World-space orientation.
    pub rotation: Quat,
    /// World-space velocity in metres per second.
    pub velocity: Vec3,
    /// Tracking confidence in `[0, 1]`.
    pub confidence: f32,
    /// Trigger state of the entity's proxy (button, gaze dwell, ...).
    pub triggered: bool,
}

impl Default for SpatialState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::identity(),
            velocity: Vec3::ZERO,
            confidence: 1.0,
            triggered: false,
        }
    }
}

impl SpatialState {
    /// State at `position` with identity rotation and zero velocity.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Replaces the velocity.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Replaces the rotation.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Replaces the trigger flag.
    pub fn with_triggered(mut self, triggered: bool) -> Self {
        self.triggered = triggered;
        self
    }
}

/// Port implemented by whatever tracks entities (motion capture, manual
/// placement, a simulation). The evaluator is agnostic to the source.
pub trait EntitySource {
    /// `true` if `id` still refers to a live entity.
    fn is_live(&self, id: EntityId) -> bool;
    /// Current name of the entity.
    fn name_of(&self, id: EntityId) -> Option<&str>;
    /// Current `/`-separated path of the entity.
    fn path_of(&self, id: EntityId) -> Option<String>;
    /// Looks an entity up by its full path.
    fn find_by_path(&self, path: &str) -> Option<EntityId>;
    /// Searches for an entity by name.
    fn find_by_name(&self, name: &str) -> Option<EntityId>;
    /// Spatial state of a live entity.
    fn state(&self, id: EntityId) -> Option<SpatialState>;
}

/// Lazily resolved, non-owning reference to a named entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRef {
    name: String,
    path: Option<String>,
    handle: Option<EntityId>,
    confidence: f32,
}

impl EntityRef {
    /// Reference by name only; the path is learnt on first resolution.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            handle: None,
            confidence: 0.0,
        }
    }

    /// Reference with a known path hint.
    pub fn with_path(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new(name)
        }
    }

    /// Stable name of the referenced entity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last path the entity was resolved at.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Cached handle, if any. May be stale; see [`EntityRef::resolve`].
    pub fn handle(&self) -> Option<EntityId> {
        self.handle
    }

    /// Confidence reported by the source at the last resolution.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Resolves the reference against `source`.
    ///
    /// Tries the cached handle, then the cached path, then a name search. On
    /// success the cached path and confidence are refreshed; on failure the
    /// cached handle is dropped.
    pub fn resolve<S: EntitySource + ?Sized>(&mut self, source: &S) -> Option<EntityId> {
        let cached = self
            .handle
            .filter(|id| source.is_live(*id) && source.name_of(*id) == Some(self.name.as_str()));
        let found = cached
            .or_else(|| {
                self.path
                    .as_deref()
                    .and_then(|path| source.find_by_path(path))
                    .filter(|id| source.name_of(*id) == Some(self.name.as_str()))
            })
            .or_else(|| source.find_by_name(&self.name));

        match found {
            Some(id) => {
                if cached.is_none() {
                    debug!(name = %self.name, ?id, "entity reference re-resolved");
                }
                self.handle = Some(id);
                if let Some(path) = source.path_of(id) {
                    self.path = Some(path);
                }
                if let Some(state) = source.state(id) {
                    self.confidence = state.confidence;
                }
                Some(id)
            }
            None => {
                self.handle = None;
                self.confidence = 0.0;
                None
            }
        }
    }

    /// Resolves and returns the entity's spatial state.
    pub fn state<S: EntitySource + ?Sized>(&mut self, source: &S) -> Option<SpatialState> {
        self.resolve(source).and_then(|id| source.state(id))
    }

    /// Position, or the origin when unresolved.
    pub fn position<S: EntitySource + ?Sized>(&mut self, source: &S) -> Vec3 {
        self.state(source).map_or(Vec3::ZERO, |s| s.position)
    }

    /// Rotation, or identity when unresolved.
    pub fn rotation<S: EntitySource + ?Sized>(&mut self, source: &S) -> Quat {
        self.state(source).map_or_else(Quat::identity, |s| s.rotation)
    }

    /// Velocity, or zero when unresolved.
    pub fn velocity<S: EntitySource + ?Sized>(&mut self, source: &S) -> Vec3 {
        self.state(source).map_or(Vec3::ZERO, |s| s.velocity)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::herd::Herd;

    #[test]
    fn path_disambiguates_same_named_entities() {
        let mut herd = Herd::new();
        let rig_a = herd.spawn("rig_a", None, SpatialState::default()).unwrap();
        let rig_b = herd.spawn("rig_b", None, SpatialState::default()).unwrap();
        herd.spawn("hand", Some(rig_a), SpatialState::default()).unwrap();
        let hand_b = herd.spawn("hand", Some(rig_b), SpatialState::default()).unwrap();

        let mut by_path = EntityRef::with_path("hand", "rig_b/hand");
        assert_eq!(by_path.resolve(&herd), Some(hand_b));
        assert_eq!(by_path.path(), Some("rig_b/hand"));
    }

    #[test]
    fn reparenting_rewrites_cached_path() {
        let mut herd = Herd::new();
        let rig_a = herd.spawn("rig_a", None, SpatialState::default()).unwrap();
        let rig_b = herd.spawn("rig_b", None, SpatialState::default()).unwrap();
        let hand = herd.spawn("hand", Some(rig_b), SpatialState::default()).unwrap();

        let mut entity = EntityRef::new("hand");
        assert_eq!(entity.resolve(&herd), Some(hand));
        assert_eq!(entity.path(), Some("rig_b/hand"));

        herd.reparent(hand, Some(rig_a)).unwrap();
        assert_eq!(entity.resolve(&herd), Some(hand));
        assert_eq!(entity.path(), Some("rig_a/hand"));
    }

    #[test]
    fn reused_slot_falls_back_to_name_search() {
        let mut herd = Herd::new();
        let rig = herd.spawn("rig", None, SpatialState::default()).unwrap();
        let old = herd.spawn("hand", None, SpatialState::default()).unwrap();
        let mut entity = EntityRef::new("hand");
        assert_eq!(entity.resolve(&herd), Some(old));

        herd.despawn(old).unwrap();
        let squatter = herd.spawn("head", None, SpatialState::default()).unwrap();
        assert_eq!(squatter.index(), old.index());
        let moved = herd
            .spawn("hand", Some(rig), SpatialState::at(Vec3::UNIT_X))
            .unwrap();

        assert_eq!(entity.resolve(&herd), Some(moved));
        assert_eq!(entity.path(), Some("rig/hand"));
        assert_eq!(entity.position(&herd), Vec3::UNIT_X);
    }

    #[test]
    fn renamed_entity_is_not_matched_by_live_handle() {
        let mut herd = Herd::new();
        let id = herd.spawn("hand", None, SpatialState::default()).unwrap();
        let mut entity = EntityRef::new("hand");
        assert_eq!(entity.resolve(&herd), Some(id));

        herd.rename(id, "paw").unwrap();
        assert_eq!(entity.resolve(&herd), None);
        assert_eq!(entity.handle(), None);
        assert_eq!(entity.rotation(&herd), Quat::identity());
    }
}
