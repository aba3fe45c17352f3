// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config service and storage port for relationship configuration.

use std::cell::RefCell;

use rustc_hash::FxHashMap;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::herd::HerdSnapshot;
use crate::info::{RelationshipConfig, RelationshipId};

/// Storage port for raw config blobs (keyed by logical name).
pub trait ConfigStore {
    /// Load a raw config blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw config blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Thin service that serializes config values and delegates storage to a `ConfigStore`.
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the inner store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Load and deserialize a config value for `key`. Returns `Ok(None)` if missing.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) => {
                if bytes.is_empty() {
                    return Ok(None);
                }
                let value = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serialize and persist a config value for `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }
}

/// In-process store; blobs live in a map for the lifetime of the value.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    blobs: RefCell<FxHashMap<String, Vec<u8>>>,
}

impl MemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        self.blobs
            .borrow()
            .get(key)
            .cloned()
            .ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        self.blobs.borrow_mut().insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}

/// Key holding the persisted [`HerdSnapshot`].
pub const HERD_KEY: &str = "herd";
/// Key holding the persisted relationship list.
pub const RELATIONSHIPS_KEY: &str = "relationships";

/// Typed access to persisted relationships and entity records.
pub struct RelationshipStore<S> {
    service: ConfigService<S>,
}

impl<S: ConfigStore> RelationshipStore<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self {
            service: ConfigService::new(store),
        }
    }

    /// Borrow the inner store.
    pub fn store(&self) -> &S {
        self.service.store()
    }

    /// Every persisted relationship, ordered by id. Empty when nothing was
    /// saved yet.
    pub fn load_all(&self) -> Result<Vec<RelationshipConfig>, ConfigError> {
        let mut configs: Vec<RelationshipConfig> =
            self.service.load(RELATIONSHIPS_KEY)?.unwrap_or_default();
        configs.sort_by_key(|c| c.id);
        Ok(configs)
    }

    /// Relationships flagged for evaluation.
    pub fn load_enabled(&self) -> Result<Vec<RelationshipConfig>, ConfigError> {
        let mut configs = self.load_all()?;
        configs.retain(|c| c.enabled);
        Ok(configs)
    }

    /// Replaces the persisted relationship list.
    pub fn save_all(&self, configs: &[RelationshipConfig]) -> Result<(), ConfigError> {
        let mut sorted = configs.to_vec();
        sorted.sort_by_key(|c| c.id);
        self.service.save(RELATIONSHIPS_KEY, &sorted)
    }

    /// Inserts or replaces the relationship with `config.id`.
    pub fn upsert(&self, config: RelationshipConfig) -> Result<(), ConfigError> {
        let mut configs = self.load_all()?;
        match configs.iter_mut().find(|c| c.id == config.id) {
            Some(slot) => *slot = config,
            None => configs.push(config),
        }
        self.save_all(&configs)
    }

    /// Removes the relationship with `id`, returning it if it was stored.
    pub fn remove(&self, id: RelationshipId) -> Result<Option<RelationshipConfig>, ConfigError> {
        let mut configs = self.load_all()?;
        let Some(pos) = configs.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        let removed = configs.remove(pos);
        self.save_all(&configs)?;
        Ok(Some(removed))
    }

    /// Persisted entity records; empty when nothing was saved yet.
    pub fn load_herd(&self) -> Result<HerdSnapshot, ConfigError> {
        Ok(self.service.load(HERD_KEY)?.unwrap_or_default())
    }

    /// Replaces the persisted entity records.
    pub fn save_herd(&self, snapshot: &HerdSnapshot) -> Result<(), ConfigError> {
        self.service.save(HERD_KEY, snapshot)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::relation::{CoupleMetric, Relation, SingleMetric};

    #[test]
    fn missing_keys_load_empty() {
        let store = RelationshipStore::new(MemoryConfigStore::new());
        assert!(store.load_all().unwrap().is_empty());
        assert!(store.load_herd().unwrap().entities.is_empty());
    }

    #[test]
    fn upsert_replaces_by_id_and_filters_enabled() {
        let store = RelationshipStore::new(MemoryConfigStore::new());
        let distance = Relation::Couple(CoupleMetric::Distance);
        store
            .upsert(RelationshipConfig::new(2, distance, ["a", "b"]))
            .unwrap();
        let position = Relation::Single(SingleMetric::Position);
        let mut disabled = RelationshipConfig::new(1, position, ["a"]);
        disabled.enabled = false;
        store.upsert(disabled).unwrap();
        store
            .upsert(RelationshipConfig::new(2, distance, ["a", "c"]))
            .unwrap();

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, RelationshipId(1));
        assert_eq!(all[1].members, vec!["a", "c"]);
        let enabled = store.load_enabled().unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].id, RelationshipId(2));

        assert!(store.remove(RelationshipId(1)).unwrap().is_some());
        assert!(store.remove(RelationshipId(1)).unwrap().is_none());
        assert_eq!(store.store().keys(), vec![RELATIONSHIPS_KEY]);
    }

    #[test]
    fn corrupt_blob_is_a_serde_error() {
        let store = MemoryConfigStore::new();
        store.save_raw(RELATIONSHIPS_KEY, b"{not json").unwrap();
        let err = RelationshipStore::new(store).load_all().unwrap_err();
        assert!(matches!(err, ConfigError::Serde(_)));
    }
}
