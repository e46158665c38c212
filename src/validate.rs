//! Strict-mode checking of settings files: reject keys the settings struct
//! doesn't know.
//!
//! The file is deserialized into the all-optional `C::Layer` through
//! `serde_ignored`, which reports every key the layer didn't consume. Each one
//! becomes an [`IniStackError::UnknownKey`] with its best-effort line number.

use std::path::Path;

use confique::Config;
use serde::Deserialize;

use crate::error::IniStackError;

/// Fail with [`IniStackError::UnknownKeys`] if `content` has keys unknown to `C`.
pub fn reject_unknown_keys<C: Config>(content: &str, path: &Path) -> Result<(), IniStackError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    let mut ignored: Vec<String> = Vec::new();
    let deserializer = toml::Deserializer::new(content);
    let _layer: C::Layer = serde_ignored::deserialize(deserializer, |p| {
        ignored.push(p.to_string());
    })
    .map_err(|e| IniStackError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    if ignored.is_empty() {
        return Ok(());
    }

    Err(IniStackError::UnknownKeys(
        ignored
            .into_iter()
            .map(|key| IniStackError::UnknownKey {
                line: locate_key(content, &key),
                key,
                path: path.to_path_buf(),
            })
            .collect(),
    ))
}

/// 1-indexed line of a dotted key such as `"backup.dir_nam"`, or 0 if not found.
///
/// Tracks `[table]` headers and matches the leaf only inside the expected
/// table. Quoted keys and inline tables are not handled.
fn locate_key(content: &str, dotted_key: &str) -> usize {
    let (table, leaf) = dotted_key.rsplit_once('.').unwrap_or(("", dotted_key));
    let mut current = String::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if let Some(header) = trimmed
            .strip_prefix('[')
            .filter(|h| !h.starts_with('['))
            .and_then(|h| h.strip_suffix(']'))
        {
            current = header
                .split('.')
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(".");
            continue;
        }
        if current == table
            && let Some(rest) = trimmed.strip_prefix(leaf)
            && rest.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}
