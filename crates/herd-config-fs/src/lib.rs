// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `ConfigStore` for herd tools.
//!
//! Each key is one `<key>.json` file under the store root. Writes go to a
//! sibling temp file first and are renamed into place, so readers never see
//! a half-written relationship list.

use directories::ProjectDirs;
use herd_core::config::{ConfigError, ConfigStore};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// JSON files under the platform config directory or an explicit root.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    root: PathBuf,
}

impl FsConfigStore {
    /// Store under the user config directory (e.g. `~/.config/herd`).
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("dev", "flyingrobots", "herd")
            .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?;
        Self::at(dirs.config_dir())
    }

    /// Store rooted at `root`; the directory is created if missing.
    pub fn at(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the JSON files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys are plain file stems: non-empty, no separators, no leading dot.
    fn path_for(&self, key: &str) -> Result<PathBuf, ConfigError> {
        let valid = !key.is_empty() && !key.starts_with('.') && !key.contains(['/', '\\']);
        if !valid {
            return Err(ConfigError::Other(format!("invalid config key {key:?}")));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, data)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }
}
