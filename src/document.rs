//! Line-oriented model of a single INI file.
//!
//! A document is an ordered list of [`Section`]s, each an ordered list of
//! [`IniOption`]s. Every option keeps the raw text of the line it came from
//! (including its trailing newline), so writing it back is a line-level edit:
//! an untouched option is emitted exactly as read, a commented option is the
//! same line with a leading `;`.
//!
//! # What the parser keeps
//!
//! - `[Name]` headers open (or reopen) a section. Section names are
//!   case-sensitive.
//! - `key=value` lines under an open section become options. Keys are
//!   identified by their trimmed, lower-cased form; the original spelling
//!   survives in the raw line.
//! - Everything else (blank lines, `;`/`#` comments, `key=value` before any
//!   header, lines without `=`) is dropped from the model. Rewriting a file
//!   keeps every option but not those lines.
//!
//! # Repeated keys
//!
//! When a file defines the same key twice in one section, the **last**
//! occurrence supplies the value. Earlier occurrences are kept as shadowed
//! lines: they are written back unchanged and count as extra definitions, so
//! the layered database reports the repeat as a duplicate.

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::IniStackError;
use crate::persist;

/// Prefix that turns an option line into a comment.
pub const COMMENT_MARKER: char = ';';

/// Identity form of a key: trimmed and lower-cased.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

const BOM: char = '\u{feff}';

/// Decode file bytes line by line. Lines that are not valid UTF-8 are
/// decoded lossily so one stray byte never costs the rest of the file.
fn decode(path: &Path, bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }
    let mut out = String::with_capacity(bytes.len());
    for (i, line) in bytes.split_inclusive(|&b| b == b'\n').enumerate() {
        match std::str::from_utf8(line) {
            Ok(text) => out.push_str(text),
            Err(_) => {
                trace!(path = %path.display(), line = i + 1, "line is not valid UTF-8");
                out.push_str(&String::from_utf8_lossy(line));
            }
        }
    }
    out
}

fn is_commented_line(line: &str) -> bool {
    line.starts_with(COMMENT_MARKER)
}

/// A single `key=value` definition inside a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniOption {
    key: String,
    name: String,
    value: String,
    raw: String,
    shadowed: Vec<String>,
}

impl IniOption {
    fn new(name: &str, value: &str) -> Self {
        let name = name.trim();
        Self {
            key: normalize_key(name),
            name: name.to_string(),
            value: value.to_string(),
            raw: format!("{name}={value}\n"),
            shadowed: Vec::new(),
        }
    }

    /// Normalized key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Key as spelled in the file (or by the caller that inserted it).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The line written back on save, trailing newline included.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_commented(&self) -> bool {
        is_commented_line(&self.raw)
    }

    /// Live definitions of this key in the file: the option itself plus any
    /// earlier, uncommented repeats.
    pub fn definitions(&self) -> usize {
        if self.is_commented() {
            return 0;
        }
        1 + self
            .shadowed
            .iter()
            .filter(|line| !is_commented_line(line))
            .count()
    }

    fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.raw = format!("{}={}\n", self.name, value);
    }

    /// Replace the stored definition with a later occurrence from the same file.
    fn shadow_with(&mut self, name: &str, value: &str, raw: String) {
        let previous = std::mem::replace(&mut self.raw, raw);
        self.shadowed.push(previous);
        self.name = name.to_string();
        self.value = value.to_string();
    }

    fn comment(&mut self) -> bool {
        let mut changed = self.comment_shadowed();
        if !self.is_commented() {
            self.raw.insert(0, COMMENT_MARKER);
            changed = true;
        }
        changed
    }

    fn comment_shadowed(&mut self) -> bool {
        let mut changed = false;
        for line in self.shadowed.iter_mut().filter(|l| !is_commented_line(l)) {
            line.insert(0, COMMENT_MARKER);
            changed = true;
        }
        changed
    }

    fn delete_shadowed(&mut self) -> bool {
        let before = self.shadowed.len();
        self.shadowed.retain(|line| is_commented_line(line));
        self.shadowed.len() != before
    }

    fn lines(&self) -> impl Iterator<Item = &str> {
        self.shadowed
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.raw.as_str()))
    }
}

/// A named, ordered collection of options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    options: Vec<IniOption>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            options: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every option in file order, commented ones included.
    pub fn options(&self) -> impl Iterator<Item = &IniOption> {
        self.options.iter()
    }

    /// Look up an option by key, in any state.
    pub fn get(&self, key: &str) -> Option<&IniOption> {
        let key = normalize_key(key);
        self.options.iter().find(|o| o.key == key)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut IniOption> {
        let key = normalize_key(key);
        self.options.iter_mut().find(|o| o.key == key)
    }
}

/// One INI file bound to a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniDocument {
    path: PathBuf,
    sections: Vec<Section>,
}

impl IniDocument {
    /// An empty document bound to `path`. Nothing is read or written.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sections: Vec::new(),
        }
    }

    /// Load `path`, or return an empty document if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, IniStackError> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Self::parse(path, &decode(path, &bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new(path)),
            Err(e) => Err(IniStackError::IoError {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Load `path`, treating a missing file as an error.
    pub fn read(path: &Path) -> Result<Self, IniStackError> {
        let bytes = std::fs::read(path).map_err(|e| IniStackError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::parse(path, &decode(path, &bytes)))
    }

    /// Pure function: build a document from file content. Never fails;
    /// lines that don't fit the model are skipped.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Self {
        let mut doc = Self::new(path);
        let mut current: Option<usize> = None;
        let content = content.strip_prefix(BOM).unwrap_or(content);

        for (i, raw) in content.split_inclusive('\n').enumerate() {
            let stripped = raw.trim();
            if stripped.is_empty()
                || stripped.starts_with(COMMENT_MARKER)
                || stripped.starts_with('#')
            {
                continue;
            }

            if let Some(name) = stripped
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            {
                current = Some(doc.section_index_or_insert(name));
                continue;
            }

            let (Some(idx), Some((key, value))) = (current, raw.split_once('=')) else {
                trace!(path = %doc.path.display(), line = i + 1, "skipping unparsed line");
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                trace!(path = %doc.path.display(), line = i + 1, "skipping line with empty key");
                continue;
            }

            let mut raw = raw.to_string();
            if !raw.ends_with('\n') {
                raw.push('\n');
            }
            let value = value.trim();
            let section = &mut doc.sections[idx];
            match section.get_mut(key) {
                Some(existing) => existing.shadow_with(key, value, raw),
                None => {
                    let mut option = IniOption::new(key, value);
                    option.raw = raw;
                    section.options.push(option);
                }
            }
        }
        doc
    }

    fn section_index_or_insert(&mut self, name: &str) -> usize {
        match self.sections.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        }
    }

    fn option_mut(&mut self, section: &str, key: &str) -> Option<&mut IniOption> {
        self.sections
            .iter_mut()
            .find(|s| s.name == section)?
            .get_mut(key)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file name component of the path, used as the layer's identity.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// True if the key is defined, i.e. present and not commented out.
    pub fn has_option(&self, section: &str, key: &str) -> bool {
        self.definitions(section, key) > 0
    }

    pub fn get_option(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?
            .get(key)
            .filter(|o| !o.is_commented())
            .map(IniOption::value)
    }

    /// How many live definitions of the key this file holds.
    pub fn definitions(&self, section: &str, key: &str) -> usize {
        self.section(section)
            .and_then(|s| s.get(key))
            .map_or(0, IniOption::definitions)
    }

    /// Set a value, creating the section and option as needed. An existing
    /// option (even a commented one) is overwritten and its line regenerated
    /// as `key=value`.
    pub fn set_option(&mut self, section: &str, key: &str, value: &str) {
        let idx = self.section_index_or_insert(section);
        let section = &mut self.sections[idx];
        match section.get_mut(key) {
            Some(option) => option.set_value(value),
            None => section.options.push(IniOption::new(key, value)),
        }
    }

    /// Remove an option with all its repeats. Returns `false` if absent.
    pub fn delete_option(&mut self, section: &str, key: &str) -> bool {
        let key = normalize_key(key);
        let Some(section) = self.sections.iter_mut().find(|s| s.name == section) else {
            return false;
        };
        let before = section.options.len();
        section.options.retain(|o| o.key != key);
        section.options.len() != before
    }

    /// Comment out an option and its repeats. Idempotent: a line is never
    /// prefixed twice. Returns `false` if nothing changed.
    pub fn comment_option(&mut self, section: &str, key: &str) -> bool {
        self.option_mut(section, key)
            .is_some_and(IniOption::comment)
    }

    /// Comment out the earlier repeats of a key, keeping the last definition.
    pub fn comment_shadowed(&mut self, section: &str, key: &str) -> bool {
        self.option_mut(section, key)
            .is_some_and(IniOption::comment_shadowed)
    }

    /// Drop the earlier repeats of a key, keeping the last definition.
    pub fn delete_shadowed(&mut self, section: &str, key: &str) -> bool {
        self.option_mut(section, key)
            .is_some_and(IniOption::delete_shadowed)
    }

    /// Defined options as `(section name, option)` in file order.
    pub fn active_options(&self) -> impl Iterator<Item = (&str, &IniOption)> {
        self.sections.iter().flat_map(|s| {
            s.options
                .iter()
                .filter(|o| !o.is_commented())
                .map(move |o| (s.name.as_str(), o))
        })
    }

    /// Serialize: each section's header followed by its option lines, with a
    /// blank line between sections.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push('[');
            out.push_str(&section.name);
            out.push_str("]\n");
            for option in &section.options {
                for line in option.lines() {
                    out.push_str(line);
                }
            }
        }
        out
    }

    /// Back up the current `target` into `backup_dir` (if it exists), then
    /// rewrite it with this document's content.
    pub fn write(&self, target: &Path, backup_dir: &Path) -> Result<(), IniStackError> {
        persist::backup_file(target, backup_dir)?;
        persist::write_atomic(target, &self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn doc(content: &str) -> IniDocument {
        IniDocument::parse("DefaultGame.ini", content)
    }

    #[test]
    fn parses_sections_and_options() {
        let d = doc("[Core]\nKey=1\nOther = two words \n\n[Audio]\nVolume=0.5\n");
        assert!(d.has_section("Core"));
        assert!(d.has_section("Audio"));
        assert_eq!(d.get_option("Core", "key"), Some("1"));
        assert_eq!(d.get_option("Core", "other"), Some("two words"));
        assert_eq!(d.get_option("Audio", "Volume"), Some("0.5"));
    }

    #[test]
    fn keys_are_case_insensitive_sections_are_not() {
        let d = doc("[Core]\nMaxFPS=60\n");
        assert!(d.has_option("Core", "maxfps"));
        assert!(d.has_option("Core", "MAXFPS"));
        assert!(!d.has_option("core", "maxfps"));
    }

    #[test]
    fn noise_is_skipped() {
        let d = doc("orphan=1\n; comment\n# also comment\n[S]\nno equals here\n=novalue\nk=v\n");
        assert_eq!(d.sections().len(), 1);
        let opts: Vec<_> = d.active_options().map(|(_, o)| o.key().to_string()).collect();
        assert_eq!(opts, vec!["k"]);
    }

    #[test]
    fn raw_line_is_preserved() {
        let d = doc("[S]\n  Key = value ; trailing\n");
        let opt = d.section("S").unwrap().get("key").unwrap();
        assert_eq!(opt.raw(), "  Key = value ; trailing\n");
        assert_eq!(opt.name(), "Key");
        assert_eq!(opt.value(), "value ; trailing");
    }

    #[test]
    fn last_line_without_newline_gets_one() {
        let d = doc("[S]\nKey=1");
        assert_eq!(d.render(), "[S]\nKey=1\n");
    }

    #[test]
    fn repeated_key_does_not_fail_and_last_wins() {
        let d = doc("[S]\nKey=1\nkey=2\n");
        assert_eq!(d.get_option("S", "key"), Some("2"));
        assert_eq!(d.definitions("S", "key"), 2);
        assert_eq!(d.render(), "[S]\nKey=1\nkey=2\n");
    }

    #[test]
    fn repeated_section_reopens() {
        let d = doc("[S]\na=1\n[T]\nb=2\n[S]\nc=3\n");
        assert_eq!(d.sections().len(), 2);
        assert_eq!(d.get_option("S", "a"), Some("1"));
        assert_eq!(d.get_option("S", "c"), Some("3"));
    }

    #[test]
    fn set_option_creates_section_and_option() {
        let mut d = IniDocument::new("x.ini");
        d.set_option("Core", "Key", "v");
        assert_eq!(d.render(), "[Core]\nKey=v\n");
    }

    #[test]
    fn set_option_overwrites_and_regenerates_line() {
        let mut d = doc("[S]\n  MaxFPS = 60 ; old\n");
        d.set_option("S", "maxfps", "120");
        assert_eq!(d.get_option("S", "MaxFPS"), Some("120"));
        assert_eq!(d.render(), "[S]\nMaxFPS=120\n");
    }

    #[test]
    fn delete_missing_is_noop() {
        let mut d = doc("[S]\nk=1\n");
        assert!(!d.delete_option("S", "missing"));
        assert!(!d.delete_option("Nope", "k"));
        assert!(d.delete_option("S", "K"));
        assert!(!d.has_option("S", "k"));
        assert_eq!(d.render(), "[S]\n");
    }

    #[test]
    fn comment_is_idempotent() {
        let mut d = doc("[S]\nKey=1\n");
        assert!(d.comment_option("S", "key"));
        assert!(!d.comment_option("S", "key"));
        let opt = d.section("S").unwrap().get("key").unwrap();
        assert_eq!(opt.raw(), ";Key=1\n");
        assert!(!d.has_option("S", "key"));
        assert_eq!(d.get_option("S", "key"), None);
    }

    #[test]
    fn comment_missing_is_noop() {
        let mut d = doc("[S]\nKey=1\n");
        assert!(!d.comment_option("S", "other"));
        assert!(!d.comment_option("T", "key"));
        assert_eq!(d.render(), "[S]\nKey=1\n");
    }

    #[test]
    fn comment_covers_repeats() {
        let mut d = doc("[S]\nKey=1\nKey=2\n");
        d.comment_option("S", "key");
        assert_eq!(d.render(), "[S]\n;Key=1\n;Key=2\n");
        assert_eq!(d.definitions("S", "key"), 0);
    }

    #[test]
    fn set_revives_commented_option() {
        let mut d = doc("[S]\nKey=1\n");
        d.comment_option("S", "key");
        d.set_option("S", "key", "3");
        assert_eq!(d.get_option("S", "key"), Some("3"));
        assert_eq!(d.render(), "[S]\nKey=3\n");
    }

    #[test]
    fn shadowed_repeats_can_be_commented_or_dropped() {
        let mut commented = doc("[S]\nKey=1\nKey=2\n");
        assert!(commented.comment_shadowed("S", "key"));
        assert_eq!(commented.definitions("S", "key"), 1);
        assert_eq!(commented.render(), "[S]\n;Key=1\nKey=2\n");

        let mut dropped = doc("[S]\nKey=1\nKey=2\n");
        assert!(dropped.delete_shadowed("S", "key"));
        assert!(!dropped.delete_shadowed("S", "key"));
        assert_eq!(dropped.render(), "[S]\nKey=2\n");
    }

    #[test]
    fn render_separates_sections_with_blank_line() {
        let d = doc("; header\n[A]\na=1\n\n\n[B]\nb=2\n");
        assert_eq!(d.render(), "[A]\na=1\n\n[B]\nb=2\n");
    }

    #[test]
    fn crlf_lines_round_trip() {
        let d = doc("[S]\r\nKey=1\r\n");
        assert_eq!(d.get_option("S", "key"), Some("1"));
        assert_eq!(d.render(), "[S]\nKey=1\r\n");
    }

    #[test]
    fn leading_bom_does_not_hide_first_section() {
        let d = doc("\u{feff}[Core]\nKey=1\n");
        assert_eq!(d.get_option("Core", "key"), Some("1"));
        assert_eq!(d.render(), "[Core]\nKey=1\n");
    }

    #[test]
    fn bom_layer_survives_write() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("DefaultEngine.ini");
        fs::write(&target, "\u{feff}[Core]\nKey=1\n").unwrap();
        let loaded = IniDocument::load(&target).unwrap();
        loaded.write(&target, &dir.path().join("Backup")).unwrap();
        let reread = IniDocument::load(&target).unwrap();
        assert_eq!(reread.get_option("Core", "key"), Some("1"));
    }

    #[test]
    fn invalid_utf8_line_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("DefaultEngine.ini");
        fs::write(&target, b"; caf\xe9\n[Core]\nKey=1\n").unwrap();
        let loaded = IniDocument::load(&target).unwrap();
        assert_eq!(loaded.get_option("Core", "key"), Some("1"));
        assert_eq!(loaded.render(), "[Core]\nKey=1\n");
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let d = IniDocument::load(&dir.path().join("DefaultGame.ini")).unwrap();
        assert!(d.sections().is_empty());
        assert_eq!(d.file_name(), "DefaultGame.ini");
    }

    #[test]
    fn read_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let result = IniDocument::read(&dir.path().join("preset.ini"));
        assert!(matches!(result, Err(IniStackError::IoError { .. })));
    }

    #[test]
    fn write_backs_up_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("DefaultGame.ini");
        fs::write(&path, "; keep me\n[S]\nKey=1\n").unwrap();
        let mut d = IniDocument::load(&path).unwrap();
        d.set_option("S", "Key", "2");

        let backup = dir.path().join("Backup").join("stamp");
        d.write(&path, &backup).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[S]\nKey=2\n");
        assert_eq!(
            fs::read_to_string(backup.join("DefaultGame.ini")).unwrap(),
            "; keep me\n[S]\nKey=1\n"
        );
    }

    #[test]
    fn write_new_file_skips_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ProjectGame.ini");
        let mut d = IniDocument::new(&path);
        d.set_option("S", "k", "v");

        let backup = dir.path().join("Backup").join("stamp");
        d.write(&path, &backup).unwrap();

        assert!(path.exists());
        assert!(!backup.exists());
    }
}
