//! Catalog of known settings, produced by an external header indexer.
//!
//! The catalog only suggests what to insert. It never reads the layers, and
//! [`LayeredDb::insert_setting`] does not depend on its record shape: an
//! [`Insertion`] is the plain `(section, key, value, target)` hand-off.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::database::LayeredDb;
use crate::error::IniStackError;

/// One indexed setting. Only `name` is required in the cache file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    /// Suggested value when inserting.
    pub default: String,
    pub category: String,
    /// Free-form valid range, e.g. `"0..4"`.
    pub range: String,
    /// File the setting was indexed from, or the layer it belongs in.
    pub file: String,
}

/// An insertion request ready for [`LayeredDb::apply_insertion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub section: String,
    pub key: String,
    pub value: String,
    pub target: Option<String>,
}

impl CatalogEntry {
    /// Build an insertion into `section` using the suggested default. The
    /// entry's `file` becomes the target only when it names an INI layer.
    pub fn insertion(&self, section: &str) -> Insertion {
        let target = Path::new(&self.file)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| n.to_ascii_lowercase().ends_with(".ini"));
        Insertion {
            section: section.to_string(),
            key: self.name.clone(),
            value: self.default.clone(),
            target,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Load the indexer's JSON cache. A missing file is an empty catalog.
    ///
    /// A cache that exists but isn't valid JSON is a
    /// [`CatalogError`](IniStackError::CatalogError) rather than an empty
    /// catalog, so a corrupt cache is reported instead of hidden. Callers
    /// that prefer to carry on can fall back to `Catalog::default()`.
    pub fn load(path: &Path) -> Result<Self, IniStackError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no catalog cache");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(IniStackError::IoError {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(&content).map_err(|e| IniStackError::CatalogError {
                path: path.to_path_buf(),
                source: e,
            })?;
        let unnamed = entries.iter().filter(|e| e.name.is_empty()).count();
        if unnamed > 0 {
            warn!(path = %path.display(), unnamed, "skipping catalog records without a name");
        }
        Ok(Self::new(entries.into_iter().filter(|e| !e.name.is_empty()).collect()))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact, case-insensitive lookup by name.
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Case-insensitive substring match over name and description.
    /// An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<&CatalogEntry> {
        let needle = query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.name.to_lowercase().contains(&needle)
                    || e.description.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

impl LayeredDb {
    /// Forward an [`Insertion`] to [`insert_setting`](Self::insert_setting).
    pub fn apply_insertion(&mut self, insertion: &Insertion) -> Option<String> {
        self.insert_setting(
            &insertion.section,
            &insertion.key,
            &insertion.value,
            insertion.target.as_deref(),
        )
    }
}
