use std::{collections::BTreeMap, fs, io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use mini_dungeons_core::SpawnSettings;
use serde::{Deserialize, Serialize};

/// User-facing toggles of the mod.
///
/// Dungeons missing from `dungeon_spawning` are allowed to spawn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModConfig {
    /// Shows a HUD message when a dungeon is cleared.
    pub enable_hud_notification: bool,
    /// Per-dungeon spawning toggles keyed by dungeon name.
    pub dungeon_spawning: BTreeMap<String, bool>,
}

impl Default for ModConfig {
    fn default() -> Self {
        Self {
            enable_hud_notification: true,
            dungeon_spawning: BTreeMap::new(),
        }
    }
}

impl ModConfig {
    /// Parses the configuration from TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse mod configuration toml contents")
    }

    /// Serializes the configuration to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize mod configuration")
    }

    /// Loads the configuration located at the provided path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read mod configuration at {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("invalid mod configuration at {}", path.display()))
    }

    /// Loads the configuration, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents)
                .with_context(|| format!("invalid mod configuration at {}", path.display())),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(error)
                .with_context(|| format!("failed to read mod configuration at {}", path.display())),
        }
    }

    /// Overrides the spawning toggle of the named dungeon.
    pub fn set_spawning_enabled(&mut self, dungeon: impl Into<String>, enabled: bool) {
        let _ = self.dungeon_spawning.insert(dungeon.into(), enabled);
    }
}

impl SpawnSettings for ModConfig {
    fn spawning_enabled(&self, dungeon: &str) -> bool {
        self.dungeon_spawning.get(dungeon).copied().unwrap_or(true)
    }

    fn hud_notification_enabled(&self) -> bool {
        self.enable_hud_notification
    }
}
