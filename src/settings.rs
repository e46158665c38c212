//! Settings for the engine itself: which files form layers, how they rank,
//! and where backups go.
//!
//! [`Settings`] is a confique struct, so every field has a compiled default
//! and a settings file only needs the keys it changes:
//!
//! ```toml
//! priority = ["Default", "Project", "Platform", "GameUserSettings", "Editor"]
//! patterns = ["Default*.ini", "Project*.ini", "Platform*.ini", "GameUserSettings.ini", "Editor*.ini"]
//!
//! [backup]
//! dir_name = "Backup"
//! timestamp_format = "%Y-%m-%d-%H%M%S"
//! ```

use std::path::Path;

use confique::Config;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::IniStackError;
use crate::persist::SaveOptions;
use crate::priority::PriorityRanking;
use crate::validate;

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    /// Filename prefixes ranking the layers, lowest priority first. Files
    /// matching none of them rank below all of them.
    #[config(default = ["Default", "Project", "Platform", "GameUserSettings"])]
    pub priority: Vec<String>,

    /// Glob patterns scanned in order when loading a config directory. Each
    /// pattern's matches are loaded sorted by file name.
    #[config(default = ["Default*.ini", "Project*.ini", "Platform*.ini", "GameUserSettings.ini"])]
    pub patterns: Vec<String>,

    /// Stage every layer before replacing any of them on save.
    #[config(default = true)]
    pub atomic_save: bool,

    /// Backup layout.
    #[config(nested)]
    pub backup: BackupSettings,
}

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BackupSettings {
    /// Backup root inside the config directory.
    #[config(default = "Backup")]
    pub dir_name: String,

    /// chrono format naming the per-save subdirectory.
    #[config(default = "%Y-%m-%d-%H%M%S")]
    pub timestamp_format: String,
}

impl Settings {
    /// Compiled defaults only.
    pub fn defaults() -> Result<Self, IniStackError> {
        Ok(Self::builder().load()?)
    }

    /// Load settings from a TOML file layered over the defaults. A missing
    /// file yields the defaults. With `strict`, unknown keys are rejected.
    pub fn from_file(path: &Path, strict: bool) -> Result<Self, IniStackError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                return Self::defaults();
            }
            Err(e) => {
                return Err(IniStackError::IoError {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };
        Self::from_toml(&content, path, strict)
    }

    /// Pure function: parse settings content, `path` only labels errors.
    pub fn from_toml(content: &str, path: &Path, strict: bool) -> Result<Self, IniStackError> {
        if strict {
            validate::reject_unknown_keys::<Self>(content, path)?;
        }
        let layer: <Self as Config>::Layer =
            toml::from_str(content).map_err(|e| IniStackError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(Self::builder().preloaded(layer).load()?)
    }

    pub fn ranking(&self) -> PriorityRanking {
        PriorityRanking::new(self.priority.iter().cloned())
    }

    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            backup_dir_name: self.backup.dir_name.clone(),
            timestamp_format: self.backup.timestamp_format.clone(),
            atomic: self.atomic_save,
        }
    }
}
