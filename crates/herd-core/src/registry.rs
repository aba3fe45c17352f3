// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Registry: tracked entities, relationships and the per-tick refresh.
//!
//! The registry owns its entity source, so mutation is single-owner: the
//! host mutates the source through [`Registry::source_mut`] between ticks and
//! calls [`Registry::tick`] once per update. Relationships refresh in id
//! order, so a tick's status changes are reported deterministically.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::{ConfigError, ConfigStore, RelationshipStore};
use crate::curve::CurveLibrary;
use crate::entity::{EntityRef, EntitySource, SpatialState};
use crate::eval::EvalContext;
use crate::herd::{EntityRecord, HerdSnapshot};
use crate::info::{
    compute, Preview, PreviewOverrides, RelationshipConfig, RelationshipId, RelationshipInfo,
    Status,
};
use crate::relation::ArityClass;
use crate::settings::RelationSettings;

/// Errors emitted by registry mutations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A relationship with this id is already registered.
    #[error("relationship {0} already registered")]
    DuplicateRelationship(RelationshipId),
    /// No relationship with this id.
    #[error("unknown relationship {0}")]
    UnknownRelationship(RelationshipId),
    /// Member count does not fit the arity class.
    #[error("relationship {id}: {class} does not accept {members} member(s)")]
    ArityMismatch {
        /// Offending relationship.
        id: RelationshipId,
        /// Its arity class.
        class: ArityClass,
        /// Number of members configured.
        members: usize,
    },
    /// An imported entity name is already registered.
    #[error("entity {0:?} already registered")]
    DuplicateEntity(String),
    /// Loading from the configuration store failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One relationship whose status changed during a tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    /// Relationship id.
    pub id: RelationshipId,
    /// Status before the refresh.
    pub from: Status,
    /// Status after the refresh.
    pub to: Status,
}

/// Summary of one [`Registry::tick`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TickReport {
    /// Tick counter after this tick (first tick is 1).
    pub tick: u64,
    /// Number of relationships refreshed.
    pub refreshed: usize,
    /// Status changes, in id order.
    pub changes: Vec<StatusChange>,
}

/// Tracks entities and relationships over an [`EntitySource`].
pub struct Registry<S> {
    source: S,
    curves: &'static CurveLibrary,
    entities: FxHashMap<String, EntityRef>,
    relationships: BTreeMap<RelationshipId, RelationshipInfo>,
    index: FxHashMap<String, Vec<RelationshipId>>,
    tick: u64,
}

impl<S: EntitySource> Registry<S> {
    /// Empty registry over `source`, using the shared curve library.
    pub fn new(source: S) -> Self {
        Self {
            source,
            curves: CurveLibrary::shared(),
            entities: FxHashMap::default(),
            relationships: BTreeMap::new(),
            index: FxHashMap::default(),
            tick: 0,
        }
    }

    /// Entity source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable entity source, for the host to move entities between ticks.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Number of completed ticks.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Registers an entity reference. Returns `false` (and keeps the
    /// existing reference) when the name is already registered.
    pub fn register(&mut self, entity: EntityRef) -> bool {
        if self.entities.contains_key(entity.name()) {
            return false;
        }
        let name = entity.name().to_owned();
        debug!(%name, "entity registered");
        self.entities.insert(name.clone(), entity);
        let resolved = resolve_one(&mut self.entities, &self.source, &name).is_some();
        if !resolved {
            return true;
        }
        let ids: Vec<RelationshipId> = self
            .relationships
            .values()
            .filter(|info| info.config().members.contains(&name))
            .map(RelationshipInfo::id)
            .collect();
        for id in ids {
            index_member(&mut self.index, &name, id);
        }
        true
    }

    /// Removes an entity reference and its reverse-index entry. Unknown
    /// names are ignored.
    pub fn unregister(&mut self, name: &str) -> Option<EntityRef> {
        let removed = self.entities.remove(name)?;
        self.index.remove(name);
        debug!(%name, "entity unregistered");
        Some(removed)
    }

    /// `true` when `name` is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Registered entity reference by name.
    pub fn entity(&self, name: &str) -> Option<&EntityRef> {
        self.entities.get(name)
    }

    /// Registers every record of `snapshot`. Fails without registering
    /// anything when a name is already registered or repeated.
    pub fn import_herd(&mut self, snapshot: &HerdSnapshot) -> Result<usize, RegistryError> {
        let mut seen = FxHashSet::default();
        for record in &snapshot.entities {
            if self.entities.contains_key(&record.name) || !seen.insert(record.name.as_str()) {
                return Err(RegistryError::DuplicateEntity(record.name.clone()));
            }
        }
        for record in &snapshot.entities {
            let entity = match &record.path {
                Some(path) => EntityRef::with_path(record.name.clone(), path.clone()),
                None => EntityRef::new(record.name.clone()),
            };
            self.register(entity);
        }
        Ok(snapshot.entities.len())
    }

    /// Records of every registered entity, sorted by name.
    pub fn export_herd(&self) -> HerdSnapshot {
        let mut entities: Vec<_> = self
            .entities
            .values()
            .map(|e| EntityRecord {
                name: e.name().to_owned(),
                path: e.path().map(str::to_owned),
            })
            .collect();
        entities.sort_by(|a, b| a.name.cmp(&b.name));
        HerdSnapshot { entities }
    }

    /// Adds a relationship and refreshes its initial snapshot, which indexes
    /// its resolved members.
    pub fn register_relationship(
        &mut self,
        config: RelationshipConfig,
    ) -> Result<&RelationshipInfo, RegistryError> {
        let id = config.id;
        if self.relationships.contains_key(&id) {
            return Err(RegistryError::DuplicateRelationship(id));
        }
        check_arity(&config)?;
        debug!(%id, relation = %config.relation, "relationship registered");
        for name in config.settings.referenced_entities() {
            if !self.entities.contains_key(name) {
                debug!(%id, entity = %name, "referenced entity not registered");
            }
        }
        self.relationships.insert(id, RelationshipInfo::new(config));
        self.refresh(id)?;
        self.relationships
            .get(&id)
            .ok_or(RegistryError::UnknownRelationship(id))
    }

    /// Removes a relationship from every index and returns its config.
    pub fn unregister_relationship(
        &mut self,
        id: RelationshipId,
    ) -> Result<RelationshipConfig, RegistryError> {
        let info = self
            .relationships
            .remove(&id)
            .ok_or(RegistryError::UnknownRelationship(id))?;
        self.unindex(id);
        debug!(%id, "relationship unregistered");
        Ok(info.config().clone())
    }

    /// Relationships that have `name` as a member resolved at their last
    /// refresh.
    pub fn relationships_for(&self, name: &str) -> &[RelationshipId] {
        self.index.get(name).map_or(&[], Vec::as_slice)
    }

    /// Refreshes every enabled relationship in id order.
    #[instrument(skip(self), fields(tick = self.tick + 1))]
    pub fn tick(&mut self) -> TickReport {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };
        for info in self.relationships.values_mut() {
            if !info.config().enabled {
                continue;
            }
            let config = info.config();
            let members = resolve_members(&mut self.entities, &self.source, &config.members);
            let context = resolve_context(&mut self.entities, &self.source, &config.settings);
            sync_index(&mut self.index, info.id(), &config.members, &members);
            let from = info.status();
            let to = info.refresh_dynamic(&members, &context, self.curves);
            report.refreshed += 1;
            if from != to {
                info!(id = %info.id(), %from, %to, "relationship status changed");
                report.changes.push(StatusChange {
                    id: info.id(),
                    from,
                    to,
                });
            }
        }
        report
    }

    /// Refreshes one relationship regardless of its `enabled` flag.
    pub fn refresh(&mut self, id: RelationshipId) -> Result<Status, RegistryError> {
        let info = self
            .relationships
            .get_mut(&id)
            .ok_or(RegistryError::UnknownRelationship(id))?;
        let config = info.config();
        let members = resolve_members(&mut self.entities, &self.source, &config.members);
        let context = resolve_context(&mut self.entities, &self.source, &config.settings);
        sync_index(&mut self.index, id, &config.members, &members);
        Ok(info.refresh_dynamic(&members, &context, self.curves))
    }

    /// Snapshot of one relationship.
    pub fn info(&self, id: RelationshipId) -> Option<&RelationshipInfo> {
        self.relationships.get(&id)
    }

    /// Every snapshot in id order.
    pub fn infos(&self) -> impl Iterator<Item = &RelationshipInfo> + '_ {
        self.relationships.values()
    }

    /// Evaluates a relationship with `overrides` against live state without
    /// touching its snapshot.
    pub fn preview(
        &mut self,
        id: RelationshipId,
        overrides: &PreviewOverrides,
    ) -> Result<Preview, RegistryError> {
        let info = self
            .relationships
            .get(&id)
            .ok_or(RegistryError::UnknownRelationship(id))?;
        let config = info.config();
        let members = resolve_members(&mut self.entities, &self.source, &config.members);
        let settings = overrides.effective_settings(config);
        let context = resolve_context(&mut self.entities, &self.source, settings);
        Ok(compute(config, overrides, &members, &context, self.curves))
    }

    /// Copy of a relationship's config for editing.
    pub fn edit(&self, id: RelationshipId) -> Result<RelationshipConfig, RegistryError> {
        self.relationships
            .get(&id)
            .map(|info| info.config().clone())
            .ok_or(RegistryError::UnknownRelationship(id))
    }

    /// Commits an edited config: drops its index entries, invalidates the
    /// snapshot and refreshes it, re-indexing the new members.
    pub fn apply(
        &mut self,
        config: RelationshipConfig,
    ) -> Result<&RelationshipInfo, RegistryError> {
        let id = config.id;
        if !self.relationships.contains_key(&id) {
            return Err(RegistryError::UnknownRelationship(id));
        }
        check_arity(&config)?;
        self.unindex(id);
        if let Some(info) = self.relationships.get_mut(&id) {
            info.set_config(config);
        }
        debug!(%id, "relationship edit applied");
        self.refresh(id)?;
        self.relationships
            .get(&id)
            .ok_or(RegistryError::UnknownRelationship(id))
    }

    /// Registers the persisted entity records and every enabled relationship
    /// of `store`. Returns the number of relationships registered.
    pub fn load_from_store<C: ConfigStore>(
        &mut self,
        store: &RelationshipStore<C>,
    ) -> Result<usize, RegistryError> {
        for record in store.load_herd()?.entities {
            let entity = match record.path {
                Some(path) => EntityRef::with_path(record.name, path),
                None => EntityRef::new(record.name),
            };
            self.register(entity);
        }
        let configs = store.load_enabled()?;
        let count = configs.len();
        for config in configs {
            self.register_relationship(config)?;
        }
        Ok(count)
    }

    fn unindex(&mut self, id: RelationshipId) {
        self.index.retain(|_, ids| {
            ids.retain(|other| *other != id);
            !ids.is_empty()
        });
    }
}

fn index_member(
    index: &mut FxHashMap<String, Vec<RelationshipId>>,
    name: &str,
    id: RelationshipId,
) {
    let ids = index.entry(name.to_owned()).or_default();
    if !ids.contains(&id) {
        ids.push(id);
        ids.sort_unstable();
    }
}

/// Indexes the members that resolved and drops the ones that did not.
fn sync_index(
    index: &mut FxHashMap<String, Vec<RelationshipId>>,
    id: RelationshipId,
    names: &[String],
    resolved: &[Option<SpatialState>],
) {
    for (name, state) in names.iter().zip(resolved) {
        if state.is_some() {
            index_member(index, name, id);
        } else if let Some(ids) = index.get_mut(name.as_str()) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                index.remove(name.as_str());
            }
        }
    }
}

fn check_arity(config: &RelationshipConfig) -> Result<(), RegistryError> {
    let class = config.arity();
    if class.accepts(config.members.len()) {
        return Ok(());
    }
    Err(RegistryError::ArityMismatch {
        id: config.id,
        class,
        members: config.members.len(),
    })
}

fn resolve_one<S: EntitySource>(
    entities: &mut FxHashMap<String, EntityRef>,
    source: &S,
    name: &str,
) -> Option<SpatialState> {
    entities.get_mut(name).and_then(|entity| entity.state(source))
}

fn resolve_members<S: EntitySource>(
    entities: &mut FxHashMap<String, EntityRef>,
    source: &S,
    names: &[String],
) -> Vec<Option<SpatialState>> {
    names
        .iter()
        .map(|name| resolve_one(entities, source, name))
        .collect()
}

fn resolve_context<S: EntitySource>(
    entities: &mut FxHashMap<String, EntityRef>,
    source: &S,
    settings: &RelationSettings,
) -> EvalContext {
    EvalContext {
        reference: settings
            .reference
            .as_deref()
            .and_then(|name| resolve_one(entities, source, name)),
        proxy: settings
            .proxy
            .as_deref()
            .and_then(|name| resolve_one(entities, source, name)),
    }
}
