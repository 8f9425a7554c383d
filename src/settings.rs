//! Settings persistence using TOML
//!
//! Stored in `settings.toml` under the platform config directory
//! (e.g. `~/.config/blockfall/settings.toml`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::core::EngineConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Options passed straight to the engine.
    pub engine: EngineConfig,
    pub gameplay: GameplaySettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    /// Fixed piece sequence seed; a fresh one is drawn per game when unset.
    pub seed: Option<u32>,
    /// How long a held direction survives without a key event, on terminals
    /// that do not report key releases.
    pub key_release_timeout_ms: u32,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            seed: None,
            key_release_timeout_ms: 150,
        }
    }
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "blockfall", "blockfall")
}

impl Settings {
    pub fn settings_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("settings.toml"))
    }

    /// Load settings from the config directory, or defaults.
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// A missing or malformed file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), %err, "ignoring malformed settings");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("parse settings")
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serialize settings")
    }

    /// Write settings to `path`, creating its directory.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create config dir {}", dir.display()))?;
        }
        fs::write(path, self.to_toml_string()?)
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}
