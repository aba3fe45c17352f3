// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory entity arena implementing [`EntitySource`].
//!
//! Slots are reused after despawn; every reuse bumps the slot generation so
//! handles issued before the despawn stop resolving. Paths are derived from
//! the parent chain on demand (`rig/hips/hand_l`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::{EntityId, EntitySource, SpatialState};
use crate::math::clamp01;

/// Errors emitted by [`Herd`] mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HerdError {
    /// The handle does not refer to a live entity.
    #[error("stale or unknown entity handle: {0:?}")]
    StaleHandle(EntityId),
    /// Names must be non-empty and must not contain `/`.
    #[error("invalid entity name: {0:?}")]
    InvalidName(String),
    /// The arena ran out of addressable slots.
    #[error("entity arena is full")]
    Full,
    /// Re-parenting would make an entity its own ancestor.
    #[error("re-parenting {0:?} would create a cycle")]
    Cycle(EntityId),
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    parent: Option<EntityId>,
    state: SpatialState,
}

/// Owned arena of tracked entities.
#[derive(Debug, Clone, Default)]
pub struct Herd {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Herd {
    /// Creates an empty herd.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    /// `true` when no entity is alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, id: EntityId) -> Option<&Entry> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, id: EntityId) -> Option<&mut Entry> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entry.as_mut())
    }

    /// Adds an entity under `parent` (or at the root) and returns its handle.
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        parent: Option<EntityId>,
        mut state: SpatialState,
    ) -> Result<EntityId, HerdError> {
        let name = name.into();
        if name.is_empty() || name.contains('/') {
            return Err(HerdError::InvalidName(name));
        }
        if let Some(p) = parent {
            if self.entry(p).is_none() {
                return Err(HerdError::StaleHandle(p));
            }
        }
        state.confidence = clamp01(state.confidence);
        let entry = Entry {
            name,
            parent,
            state,
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return Ok(EntityId::new(index, slot.generation));
        }
        let index = u32::try_from(self.slots.len()).map_err(|_| HerdError::Full)?;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        Ok(EntityId::new(index, 0))
    }

    /// Removes an entity. Its children move to the despawned entity's parent.
    pub fn despawn(&mut self, id: EntityId) -> Result<SpatialState, HerdError> {
        let removed = self
            .slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| {
                let entry = slot.entry.take()?;
                slot.generation = slot.generation.wrapping_add(1);
                Some(entry)
            })
            .ok_or(HerdError::StaleHandle(id))?;
        for slot in &mut self.slots {
            if let Some(entry) = slot.entry.as_mut() {
                if entry.parent == Some(id) {
                    entry.parent = removed.parent;
                }
            }
        }
        self.free.push(id.index());
        Ok(removed.state)
    }

    /// Moves `id` under `parent` (or to the root).
    pub fn reparent(&mut self, id: EntityId, parent: Option<EntityId>) -> Result<(), HerdError> {
        if self.entry(id).is_none() {
            return Err(HerdError::StaleHandle(id));
        }
        let mut cursor = parent;
        while let Some(p) = cursor {
            if p == id {
                return Err(HerdError::Cycle(id));
            }
            cursor = self.entry(p).ok_or(HerdError::StaleHandle(p))?.parent;
        }
        if let Some(entry) = self.entry_mut(id) {
            entry.parent = parent;
        }
        Ok(())
    }

    /// Renames an entity. References holding the old name stop resolving.
    pub fn rename(&mut self, id: EntityId, name: impl Into<String>) -> Result<(), HerdError> {
        let name = name.into();
        if name.is_empty() || name.contains('/') {
            return Err(HerdError::InvalidName(name));
        }
        let entry = self.entry_mut(id).ok_or(HerdError::StaleHandle(id))?;
        entry.name = name;
        Ok(())
    }

    /// Replaces an entity's spatial state. Confidence is clamped to `[0, 1]`.
    pub fn set_state(&mut self, id: EntityId, mut state: SpatialState) -> Result<(), HerdError> {
        state.confidence = clamp01(state.confidence);
        let entry = self.entry_mut(id).ok_or(HerdError::StaleHandle(id))?;
        entry.state = state;
        Ok(())
    }

    /// Mutable access to an entity's spatial state.
    pub fn state_mut(&mut self, id: EntityId) -> Option<&mut SpatialState> {
        self.entry_mut(id).map(|e| &mut e.state)
    }

    /// Advances every position by `velocity * dt`.
    pub fn integrate(&mut self, dt: f32) {
        for slot in &mut self.slots {
            if let Some(entry) = slot.entry.as_mut() {
                entry.state.position += entry.state.velocity * dt;
            }
        }
    }

    /// Iterates live entities as `(handle, name, state)` in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &str, &SpatialState)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let entry = slot.entry.as_ref()?;
            let index = u32::try_from(index).ok()?;
            Some((
                EntityId::new(index, slot.generation),
                entry.name.as_str(),
                &entry.state,
            ))
        })
    }

    /// Exports a [`HerdSnapshot`] naming every live entity and its path.
    pub fn snapshot(&self) -> HerdSnapshot {
        HerdSnapshot {
            entities: self
                .iter()
                .map(|(id, name, _)| EntityRecord {
                    name: name.to_owned(),
                    path: self.path_of(id),
                })
                .collect(),
        }
    }
}

impl EntitySource for Herd {
    fn is_live(&self, id: EntityId) -> bool {
        self.entry(id).is_some()
    }

    fn name_of(&self, id: EntityId) -> Option<&str> {
        self.entry(id).map(|e| e.name.as_str())
    }

    fn path_of(&self, id: EntityId) -> Option<String> {
        let mut segments = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let entry = self.entry(current)?;
            segments.push(entry.name.as_str());
            cursor = entry.parent;
            if segments.len() > self.slots.len() {
                return None;
            }
        }
        segments.reverse();
        Some(segments.join("/"))
    }

    fn find_by_path(&self, path: &str) -> Option<EntityId> {
        let leaf = path.rsplit('/').next()?;
        self.iter()
            .filter(|(_, name, _)| *name == leaf)
            .map(|(id, _, _)| id)
            .find(|id| self.path_of(*id).as_deref() == Some(path))
    }

    fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.iter()
            .find(|(_, candidate, _)| *candidate == name)
            .map(|(id, _, _)| id)
    }

    fn state(&self, id: EntityId) -> Option<SpatialState> {
        self.entry(id).map(|e| e.state)
    }
}

/// One entity named in a [`HerdSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Unique name within the herd.
    pub name: String,
    /// Path at the time the snapshot was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Persistable list of the entities a set of relationships refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HerdSnapshot {
    /// Entity records in import order.
    pub entities: Vec<EntityRecord>,
}
