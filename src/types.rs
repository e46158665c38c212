//! Value types shared by the database, the operations layer and the CLI adapter.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::error::IniStackError;

/// What to do with the lower-priority definitions of a duplicated key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ResolveAction {
    /// Prefix each losing definition with `;` so it stays in the file, inert.
    Comment,
    /// Remove each losing definition from its layer.
    Delete,
    /// Leave the duplicate as it is.
    Ignore,
}

impl FromStr for ResolveAction {
    type Err = IniStackError;

    /// Case-insensitive, so UI labels like `"Comment"` parse directly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "comment" => Ok(ResolveAction::Comment),
            "delete" => Ok(ResolveAction::Delete),
            "ignore" => Ok(ResolveAction::Ignore),
            _ => Err(IniStackError::UnknownAction(s.to_string())),
        }
    }
}

impl fmt::Display for ResolveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolveAction::Comment => "comment",
            ResolveAction::Delete => "delete",
            ResolveAction::Ignore => "ignore",
        };
        f.write_str(name)
    }
}

/// One `(section, key)` pair and the layers that define it, in load order.
///
/// A layer that repeats the key within its own file is listed once per
/// definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub section: String,
    /// Normalized (lower-cased) key.
    pub key: String,
    pub files: Vec<String>,
}

impl Entry {
    /// True when more than one definition is visible across enabled layers.
    pub fn is_duplicate(&self) -> bool {
        self.files.len() > 1
    }
}

/// A row of the merged view: the value that wins for a `(section, key)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedValue {
    pub section: String,
    pub key: String,
    pub value: String,
    /// Filename of the highest-priority layer defining the key.
    pub source: String,
}

/// Outcome of [`LayeredDb::validate`](crate::LayeredDb::validate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Every layer re-read cleanly and no duplicates are visible.
    Clean,
    /// A layer could not be re-read from disk.
    ReadFailure { file: String, reason: String },
    /// Duplicate entries must be resolved before a safe save.
    Duplicates(Vec<Entry>),
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        matches!(self, Validation::Clean)
    }

    /// Human-readable summary suitable for a status bar or dialog.
    pub fn message(&self) -> String {
        match self {
            Validation::Clean => "Validation passed".to_string(),
            Validation::ReadFailure { file, reason } => {
                format!("Failed to re-read {file}: {reason}")
            }
            Validation::Duplicates(entries) => {
                let mut msg = format!("Duplicate entries detected: {}", entries.len());
                for entry in entries {
                    msg.push_str(&format!(
                        "\n  [{}] {} in {}",
                        entry.section,
                        entry.key,
                        entry.files.join(", ")
                    ));
                }
                msg
            }
        }
    }

    /// The `(ok, message)` pair host UIs map onto "allow save" / "block save".
    pub fn into_parts(self) -> (bool, String) {
        (self.is_ok(), self.message())
    }
}

/// An engine operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into these.
#[derive(Debug, Clone, PartialEq)]
pub enum IniAction {
    List,
    Files,
    Duplicates,
    Resolve {
        section: String,
        key: String,
        action: ResolveAction,
    },
    ResolveAll {
        action: ResolveAction,
    },
    Insert {
        section: String,
        key: String,
        value: String,
        target: Option<String>,
    },
    Enable {
        file: String,
    },
    Disable {
        file: String,
    },
    Validate,
    Save,
    ImportPreset {
        path: PathBuf,
    },
    ExportPreset {
        path: PathBuf,
    },
}
