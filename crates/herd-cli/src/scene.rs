// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene files: entities plus the relationships between them.

use std::path::Path;

use anyhow::{bail, Context, Result};
use herd_core::{EntitySource, Herd, Quat, Registry, RelationshipConfig, SpatialState, Vec3};
use serde::{Deserialize, Serialize};

const fn full_confidence() -> f32 {
    1.0
}

/// One entity as written in a scene file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneEntity {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    #[serde(default)]
    pub velocity: Vec3,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub triggered: bool,
}

impl SceneEntity {
    fn state(&self) -> SpatialState {
        SpatialState {
            position: self.position,
            rotation: self.rotation,
            velocity: self.velocity,
            confidence: self.confidence,
            triggered: self.triggered,
        }
    }
}

/// Parsed scene file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub entities: Vec<SceneEntity>,
    #[serde(default)]
    pub relationships: Vec<RelationshipConfig>,
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse scene {}", path.display()))
    }

    /// Spawns every entity; parents must be listed before their children.
    pub fn herd(&self) -> Result<Herd> {
        let mut herd = Herd::new();
        for entity in &self.entities {
            let parent = match &entity.parent {
                Some(name) => match herd.find_by_name(name) {
                    Some(id) => Some(id),
                    None => bail!(
                        "entity {:?}: parent {name:?} not defined before it",
                        entity.name
                    ),
                },
                None => None,
            };
            herd.spawn(entity.name.clone(), parent, entity.state())
                .with_context(|| format!("failed to spawn entity {:?}", entity.name))?;
        }
        Ok(herd)
    }

    /// Registry over the scene's herd with every relationship registered.
    pub fn registry(&self) -> Result<Registry<Herd>> {
        let herd = self.herd()?;
        let snapshot = herd.snapshot();
        let mut registry = Registry::new(herd);
        registry.import_herd(&snapshot)?;
        for config in &self.relationships {
            registry
                .register_relationship(config.clone())
                .with_context(|| format!("failed to register relationship {}", config.id))?;
        }
        Ok(registry)
    }
}
