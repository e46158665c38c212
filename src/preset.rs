//! Presets: standalone INI files imported into, or exported from, a database.
//!
//! Importing ([`LayeredDb::merge_preset`]) always lands in the single
//! highest-priority enabled layer, overwriting matching keys. Exporting
//! ([`LayeredDb::export_preset`]) flattens **all** layers, enabled or not,
//! keeping the **first** value seen in load order. That is a different rule
//! from duplicate resolution, where the highest priority wins.
//!
//! [`PresetLibrary`] manages a directory of preset files on top of that.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::database::LayeredDb;
use crate::document::IniDocument;
use crate::error::IniStackError;
use crate::persist;

impl LayeredDb {
    /// Copy every option of the preset at `path` into the highest-priority
    /// enabled layer, creating sections as needed. Returns the target layer's
    /// file name, or `None` when no layer is enabled.
    pub fn merge_preset(&mut self, path: &Path) -> Result<Option<String>, IniStackError> {
        let preset = IniDocument::read(path)?;
        let Some(target) = self.top_layer_mut() else {
            debug!(preset = %path.display(), "no enabled layer to merge preset into");
            return Ok(None);
        };
        let mut count = 0;
        for (section, option) in preset.active_options() {
            target.set_option(section, option.name(), option.value());
            count += 1;
        }
        let name = target.file_name();
        info!(preset = %path.display(), target = %name, options = count, "merged preset");
        Ok(Some(name))
    }

    /// Build the first-seen flattening of every layer, in load order.
    pub fn preset_document(&self, path: &Path) -> IniDocument {
        let mut merged = IniDocument::new(path);
        for doc in self.documents() {
            for (section, option) in doc.active_options() {
                if !merged.has_option(section, option.key()) {
                    merged.set_option(section, option.name(), option.value());
                }
            }
        }
        merged
    }

    /// Write the first-seen flattening of every layer to `path`.
    pub fn export_preset(&self, path: &Path) -> Result<(), IniStackError> {
        let merged = self.preset_document(path);
        persist::write_atomic(path, &merged.render())?;
        info!(preset = %path.display(), "exported preset");
        Ok(())
    }
}

/// A directory of `*.ini` presets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetLibrary {
    dir: PathBuf,
}

impl PresetLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<platform config dir>/inistack/presets`, if the platform has one.
    pub fn platform_default() -> Option<Self> {
        let proj = directories::ProjectDirs::from("", "", "inistack")?;
        Some(Self::new(proj.config_dir().join("presets")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Preset files in the library, sorted by name. Creates the directory.
    pub fn list(&self) -> Result<Vec<PathBuf>, IniStackError> {
        let io_err = |e| IniStackError::IoError {
            path: self.dir.clone(),
            source: e,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;

        let mut presets = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "ini") {
                presets.push(path);
            }
        }
        presets.sort();
        Ok(presets)
    }

    /// Move `source` into the library, then merge it into `db`.
    /// Returns the preset's new path.
    pub fn import(&self, db: &mut LayeredDb, source: &Path) -> Result<PathBuf, IniStackError> {
        let file_name = source.file_name().ok_or_else(|| IniStackError::IoError {
            path: source.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file path"),
        })?;
        let dest = self.dir.join(file_name);
        let write_err = |e| IniStackError::WriteError {
            path: dest.clone(),
            source: e,
        };
        std::fs::create_dir_all(&self.dir).map_err(write_err)?;

        if source != dest {
            // rename fails across filesystems; fall back to copy + remove.
            if std::fs::rename(source, &dest).is_err() {
                std::fs::copy(source, &dest).map_err(write_err)?;
                std::fs::remove_file(source).map_err(|e| IniStackError::IoError {
                    path: source.to_path_buf(),
                    source: e,
                })?;
            }
        }
        db.merge_preset(&dest)?;
        Ok(dest)
    }

    /// Export `db` as `<name>.ini` in the library.
    pub fn export(&self, db: &LayeredDb, name: &str) -> Result<PathBuf, IniStackError> {
        let file_name = if name.ends_with(".ini") {
            name.to_string()
        } else {
            format!("{name}.ini")
        };
        let dest = self.dir.join(file_name);
        db.export_preset(&dest)?;
        Ok(dest)
    }
}
