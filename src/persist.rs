//! Writing layers back to disk: backups, atomic rewrites and multi-layer saves.
//!
//! Every rewrite goes through a temp file created next to its target and
//! renamed into place, so a single file is either fully rewritten or left
//! alone. A multi-layer save can additionally stage every layer before
//! touching any of them (see [`SaveOptions::atomic`]).

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::document::IniDocument;
use crate::error::IniStackError;

/// How [`save_layers`] lays out backups and commits files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    /// Backup root, relative to the config directory.
    pub backup_dir_name: String,
    /// chrono format string naming each save's backup subdirectory.
    pub timestamp_format: String,
    /// Stage every layer before renaming any of them into place.
    pub atomic: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            backup_dir_name: "Backup".into(),
            timestamp_format: "%Y-%m-%d-%H%M%S".into(),
            atomic: true,
        }
    }
}

impl SaveOptions {
    /// `{config_dir}/{backup_dir_name}/{now}`, computed once per save.
    pub fn backup_dir(&self, config_dir: &Path) -> PathBuf {
        let stamp = chrono::Local::now()
            .format(&self.timestamp_format)
            .to_string();
        config_dir.join(&self.backup_dir_name).join(stamp)
    }
}

/// Copy `target` into `backup_dir` if it exists, creating the directory.
/// Returns the backup path, or `None` when there was nothing to back up.
///
/// An existing backup of the same file in `backup_dir` is left alone, so
/// repeated saves within one timestamp keep the earliest snapshot.
pub fn backup_file(target: &Path, backup_dir: &Path) -> Result<Option<PathBuf>, IniStackError> {
    if !target.exists() {
        return Ok(None);
    }
    let backup_err = |e| IniStackError::BackupError {
        path: target.to_path_buf(),
        backup_dir: backup_dir.to_path_buf(),
        source: e,
    };
    let file_name = target
        .file_name()
        .ok_or_else(|| backup_err(std::io::Error::other("path has no file name")))?;

    std::fs::create_dir_all(backup_dir).map_err(backup_err)?;
    let dest = backup_dir.join(file_name);
    if dest.exists() {
        debug!(to = %dest.display(), "backup already taken in this directory");
        return Ok(Some(dest));
    }
    std::fs::copy(target, &dest).map_err(backup_err)?;
    debug!(from = %target.display(), to = %dest.display(), "backed up layer");
    Ok(Some(dest))
}

fn parent_dir(target: &Path) -> &Path {
    match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Write `content` to a temp file beside `target`, ready to be renamed over it.
/// Creates parent directories if needed and carries over the target's
/// permissions when it already exists.
pub fn stage(target: &Path, content: &str) -> Result<NamedTempFile, IniStackError> {
    let dir = parent_dir(target);
    let write_err = |e| IniStackError::WriteError {
        path: target.to_path_buf(),
        source: e,
    };

    std::fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    if let Ok(meta) = std::fs::metadata(target) {
        std::fs::set_permissions(tmp.path(), meta.permissions()).map_err(write_err)?;
    }
    Ok(tmp)
}

fn commit(staged: NamedTempFile, target: &Path) -> Result<(), IniStackError> {
    staged
        .persist(target)
        .map(drop)
        .map_err(|e| IniStackError::CommitError {
            path: target.to_path_buf(),
            source: e,
        })
}

/// Replace `target` with `content` in one rename.
pub fn write_atomic(target: &Path, content: &str) -> Result<(), IniStackError> {
    let staged = stage(target, content)?;
    commit(staged, target)
}

/// Write every document to its own path, backing each up into `backup_dir`.
///
/// With `atomic`, all layers are rendered and staged first; a failure at
/// that point leaves every file untouched. Without it, layers are backed up
/// and rewritten one after another and the first failure stops the save.
pub fn save_layers<'a, I>(docs: I, backup_dir: &Path, atomic: bool) -> Result<usize, IniStackError>
where
    I: IntoIterator<Item = &'a IniDocument>,
{
    let docs: Vec<&IniDocument> = docs.into_iter().collect();

    if !atomic {
        for doc in &docs {
            doc.write(doc.path(), backup_dir)?;
        }
        info!(layers = docs.len(), backup = %backup_dir.display(), "saved layers");
        return Ok(docs.len());
    }

    let staged = docs
        .iter()
        .map(|doc| stage(doc.path(), &doc.render()).map(|tmp| (*doc, tmp)))
        .collect::<Result<Vec<_>, _>>()?;

    for doc in &docs {
        backup_file(doc.path(), backup_dir)?;
    }
    for (doc, tmp) in staged {
        commit(tmp, doc.path())?;
    }

    info!(layers = docs.len(), backup = %backup_dir.display(), "saved layers atomically");
    Ok(docs.len())
}
