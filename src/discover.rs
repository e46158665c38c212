//! Layer discovery inside a config directory.
//!
//! The directory is scanned once and its file names are matched against an
//! ordered list of glob patterns (by default `Default*.ini`, `Project*.ini`,
//! `Platform*.ini`, `GameUserSettings.ini`). Each pattern's matches are sorted
//! by file name and appended in pattern order, so the result is
//! **priority-ascending**: first = lowest, last = highest, matching the list
//! convention used everywhere else.
//!
//! Only regular files directly inside the directory are considered; the
//! `Backup/` tree and other subdirectories are never descended into. A file
//! matched by an earlier pattern is not listed again by a later one.
//!
//! A missing directory yields no layers. Only actual I/O errors (permissions,
//! etc.) are propagated.

use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::IniStackError;

/// Glob patterns of the stock layer set, in load order.
pub const DEFAULT_PATTERNS: [&str; 4] = [
    "Default*.ini",
    "Project*.ini",
    "Platform*.ini",
    "GameUserSettings.ini",
];

/// Compile `patterns`, failing on the first invalid one.
pub fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Pattern>, IniStackError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p.as_ref()).map_err(|e| IniStackError::InvalidPattern {
                pattern: p.as_ref().to_string(),
                source: e,
            })
        })
        .collect()
}

/// File names of the regular files directly inside `dir`.
fn list_file_names(dir: &Path) -> Result<Vec<String>, IniStackError> {
    let io_err = |e| IniStackError::IoError {
        path: dir.to_path_buf(),
        source: e,
    };
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(io_err(e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(io_err)?;
        if !entry.file_type().map_err(io_err)?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Match `names` against `patterns`, pattern by pattern, each group sorted.
pub fn order_matches(names: &[String], patterns: &[Pattern]) -> Vec<String> {
    let mut ordered: Vec<String> = Vec::new();
    for pattern in patterns {
        let mut group: Vec<&String> = names
            .iter()
            .filter(|n| pattern.matches(n.as_str()) && !ordered.contains(*n))
            .collect();
        group.sort();
        ordered.extend(group.into_iter().cloned());
    }
    ordered
}

/// Discover layer files in `dir`, priority-ascending.
pub fn discover_layers<S: AsRef<str>>(
    dir: &Path,
    patterns: &[S],
) -> Result<Vec<PathBuf>, IniStackError> {
    let compiled = compile_patterns(patterns)?;
    let names = list_file_names(dir)?;
    Ok(order_matches(&names, &compiled)
        .into_iter()
        .map(|name| dir.join(name))
        .collect())
}
