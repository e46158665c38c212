use std::path::{Path, PathBuf};

use tracing::debug;

use crate::database::LayeredDb;
use crate::error::IniStackError;
use crate::ops::{self, ActionResult};
use crate::settings::Settings;
use crate::types::IniAction;

/// Entry point for building a layered INI database.
pub struct Inistack;

impl Inistack {
    pub fn builder() -> InistackBuilder {
        InistackBuilder::new()
    }
}

/// Builder for configuring and loading a [`LayeredDb`].
///
/// Settings come from three places, later ones winning:
///
/// - compiled defaults of [`Settings`],
/// - a settings file ([`settings_file()`](Self::settings_file)) or a ready
///   [`Settings`] value ([`settings()`](Self::settings)),
/// - the programmatic overrides ([`priority()`](Self::priority),
///   [`patterns()`](Self::patterns), [`atomic_save()`](Self::atomic_save)).
#[derive(Debug, Clone)]
pub struct InistackBuilder {
    settings: Option<Settings>,
    settings_file: Option<PathBuf>,
    strict: bool,
    priority: Option<Vec<String>>,
    patterns: Option<Vec<String>>,
    atomic_save: Option<bool>,
}

impl InistackBuilder {
    fn new() -> Self {
        Self {
            settings: None,
            settings_file: None,
            strict: true,
            priority: None,
            patterns: None,
            atomic_save: None,
        }
    }

    /// Start from an already-built [`Settings`] instead of the defaults.
    /// Takes precedence over [`settings_file`](Self::settings_file).
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Read settings from a TOML file. A missing file means defaults.
    pub fn settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_file = Some(path.into());
        self
    }

    /// Enable or disable strict mode (default: `true`).
    /// In strict mode, unknown keys in the settings file produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Replace the priority table (filename prefixes, lowest priority first).
    pub fn priority<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.priority = Some(prefixes.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the glob patterns used to discover layer files.
    pub fn patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// Stage all layers before replacing any on save (default: `true`).
    pub fn atomic_save(mut self, atomic: bool) -> Self {
        self.atomic_save = Some(atomic);
        self
    }

    /// Resolve the effective settings: base layer plus overrides.
    fn effective_settings(&self) -> Result<Settings, IniStackError> {
        let mut settings = match (&self.settings, &self.settings_file) {
            (Some(s), _) => s.clone(),
            (None, Some(path)) => Settings::from_file(path, self.strict)?,
            (None, None) => Settings::defaults()?,
        };
        if let Some(priority) = &self.priority {
            settings.priority = priority.clone();
        }
        if let Some(patterns) = &self.patterns {
            settings.patterns = patterns.clone();
        }
        if let Some(atomic) = self.atomic_save {
            settings.atomic_save = atomic;
        }
        Ok(settings)
    }

    /// An empty database configured by this builder.
    pub fn build(&self) -> Result<LayeredDb, IniStackError> {
        let settings = self.effective_settings()?;
        debug!(
            priority = ?settings.priority,
            patterns = ?settings.patterns,
            atomic = settings.atomic_save,
            "configured database"
        );
        // Fail on a bad pattern here rather than on the first load.
        crate::discover::compile_patterns(&settings.patterns)?;
        Ok(LayeredDb::with_settings(&settings))
    }

    /// Build a database and load `config_dir` into it.
    pub fn load(&self, config_dir: &Path) -> Result<LayeredDb, IniStackError> {
        let mut db = self.build()?;
        db.load(config_dir)?;
        Ok(db)
    }

    /// Load `config_dir`, run `actions` in order, and return each result.
    pub fn handle(
        &self,
        config_dir: &Path,
        actions: &[IniAction],
    ) -> Result<Vec<ActionResult>, IniStackError> {
        let mut db = self.load(config_dir)?;
        actions
            .iter()
            .map(|action| ops::handle(&mut db, action))
            .collect()
    }

    /// Like [`handle`](Self::handle), printing each result to stdout.
    pub fn handle_and_print(
        &self,
        config_dir: &Path,
        actions: &[IniAction],
    ) -> Result<(), IniStackError> {
        for result in self.handle(config_dir, actions)? {
            print!("{result}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{config_dir, read};
    use crate::types::ResolveAction;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_settings() {
        let s = Inistack::builder().effective_settings().unwrap();
        assert_eq!(s, Settings::defaults().unwrap());
    }

    #[test]
    fn overrides_win_over_settings() {
        let base = Settings {
            atomic_save: true,
            ..Settings::defaults().unwrap()
        };
        let s = Inistack::builder()
            .settings(base)
            .priority(["Base", "Local"])
            .atomic_save(false)
            .effective_settings()
            .unwrap();
        assert_eq!(s.priority, vec!["Base", "Local"]);
        assert!(!s.atomic_save);
    }

    #[test]
    fn settings_file_is_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inistack.toml");
        fs::write(&path, "patterns = [\"Base*.ini\"]\n").unwrap();
        let s = Inistack::builder()
            .settings_file(&path)
            .effective_settings()
            .unwrap();
        assert_eq!(s.patterns, vec!["Base*.ini"]);
    }

    #[test]
    fn strict_rejects_unknown_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inistack.toml");
        fs::write(&path, "patern = []\n").unwrap();
        let result = Inistack::builder().settings_file(&path).build();
        assert!(matches!(result, Err(IniStackError::UnknownKeys(_))));
    }

    #[test]
    fn lenient_allows_unknown_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inistack.toml");
        fs::write(&path, "patern = []\n").unwrap();
        assert!(
            Inistack::builder()
                .settings_file(&path)
                .strict(false)
                .build()
                .is_ok()
        );
    }

    #[test]
    fn bad_pattern_fails_at_build() {
        let result = Inistack::builder().patterns(["[oops"]).build();
        assert!(matches!(result, Err(IniStackError::InvalidPattern { .. })));
    }

    #[test]
    fn load_with_custom_layers() {
        let dir = config_dir(&[
            ("Local.ini", "[S]\nk=2\n"),
            ("Base.ini", "[S]\nk=1\n"),
            ("DefaultGame.ini", "[S]\nk=0\n"),
        ]);
        let db = Inistack::builder()
            .priority(["Base", "Local"])
            .patterns(["Base.ini", "Local.ini"])
            .load(dir.path())
            .unwrap();
        assert_eq!(db.available_targets(), vec!["Base.ini", "Local.ini"]);
        assert_eq!(db.merged()[0].source, "Local.ini");
    }

    #[test]
    fn handle_runs_actions_in_order() {
        let dir = config_dir(&[
            ("DefaultGame.ini", "[S]\nk=1\n"),
            ("ProjectGame.ini", "[S]\nk=2\n"),
        ]);
        let results = Inistack::builder()
            .handle(
                dir.path(),
                &[
                    IniAction::Resolve {
                        section: "S".into(),
                        key: "k".into(),
                        action: ResolveAction::Comment,
                    },
                    IniAction::Save,
                ],
            )
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(matches!(results[1], ActionResult::Saved { .. }));
        assert_eq!(read(&dir, "DefaultGame.ini"), "[S]\n;k=1\n");
    }
}
