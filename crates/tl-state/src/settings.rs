//! Project Settings
//!
//! Persistent editing preferences:
//! - Mute/solo policy
//! - Sync-lock and close-prompt behaviour
//! - History depth
//! - Autosave location and rotation

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{AutosaveConfig, HistoryConfig};

/// How solo buttons behave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SoloMode {
    /// Radio-button solo that also mutes/unmutes the other tracks
    #[default]
    Simple,
    /// Independent solo buttons
    Multiple,
    /// Solo is not offered; mute still maintains the single-track solo indicator
    None,
}

/// Project settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub solo_mode: SoloMode,
    /// Prompt to save on close even when the project has no tracks
    pub empty_can_be_dirty: bool,
    pub history: HistoryConfig,
    pub autosave: AutosaveConfig,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            solo_mode: SoloMode::Simple,
            empty_can_be_dirty: true,
            history: HistoryConfig::default(),
            autosave: AutosaveConfig::default(),
        }
    }
}

impl ProjectSettings {
    pub fn is_solo_simple(&self) -> bool {
        self.solo_mode == SoloMode::Simple
    }

    pub fn is_solo_none(&self) -> bool {
        self.solo_mode == SoloMode::None
    }

    /// Load settings from standard location
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load settings from specified path, falling back to defaults
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path.as_ref()) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed settings {:?}: {}", path.as_ref(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to standard location
    pub fn save(&self) -> std::io::Result<()> {
        self.save_to(Self::default_path())
    }

    /// Save settings to specified path
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, json)
    }

    /// Get default settings file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("tapeline"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("settings.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ProjectSettings::default();
        assert!(settings.is_solo_simple());
        assert_eq!(settings.history.max_depth, 0);
        assert!(settings.autosave.enabled);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = ProjectSettings {
            solo_mode: SoloMode::Multiple,
            history: HistoryConfig { max_depth: 50 },
            ..Default::default()
        };
        settings.save_to(&path).unwrap();

        assert_eq!(ProjectSettings::load_from(&path), settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "solo_mode": "None" }"#).unwrap();

        let settings = ProjectSettings::load_from(&path);
        assert!(settings.is_solo_none());
        assert!(settings.empty_can_be_dirty);
    }

    #[test]
    fn test_retired_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "solo_mode": "Multiple", "sync_locked": true }"#).unwrap();

        let settings = ProjectSettings::load_from(&path);
        assert_eq!(settings.solo_mode, SoloMode::Multiple);

        settings.save_to(&path).unwrap();
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(!saved.contains("sync_locked"));
    }

    #[test]
    fn test_missing_or_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            ProjectSettings::load_from(dir.path().join("absent.json")),
            ProjectSettings::default()
        );

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();
        assert_eq!(ProjectSettings::load_from(&bad), ProjectSettings::default());
    }
}
