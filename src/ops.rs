//! Engine operations and their result types.
//!
//! [`handle`] executes one [`IniAction`] against a [`LayeredDb`] and returns
//! an [`ActionResult`] that callers display however they like. Nothing here
//! depends on a CLI framework.

use std::fmt;
use std::path::PathBuf;

use crate::database::LayeredDb;
use crate::error::IniStackError;
use crate::types::{Entry, IniAction, MergedValue, ResolveAction, Validation};

/// Result of an engine operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// The merged view: winning value and source layer per key.
    Listing { entries: Vec<MergedValue> },
    /// Loaded layers and whether each is enabled.
    Files { files: Vec<(String, bool)> },
    /// Keys defined more than once across enabled layers.
    Duplicates { entries: Vec<Entry> },
    Resolved {
        section: String,
        key: String,
        action: ResolveAction,
        changed: usize,
    },
    ResolvedAll { action: ResolveAction, count: usize },
    /// `target` is `None` when no layer was enabled.
    Inserted {
        section: String,
        key: String,
        value: String,
        target: Option<String>,
    },
    Toggled { file: String, enabled: bool },
    Validation(Validation),
    Saved { backup_dir: PathBuf },
    PresetImported {
        path: PathBuf,
        target: Option<String>,
    },
    PresetExported { path: PathBuf },
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionResult::Listing { entries } => {
                for e in entries {
                    writeln!(f, "[{}] {} = {}  ({})", e.section, e.key, e.value, e.source)?;
                }
                Ok(())
            }
            ActionResult::Files { files } => {
                for (name, enabled) in files {
                    let mark = if *enabled { 'x' } else { ' ' };
                    writeln!(f, "[{mark}] {name}")?;
                }
                Ok(())
            }
            ActionResult::Duplicates { entries } => {
                if entries.is_empty() {
                    return writeln!(f, "No duplicates");
                }
                for e in entries {
                    writeln!(f, "[{}] {}: {}", e.section, e.key, e.files.join(", "))?;
                }
                Ok(())
            }
            ActionResult::Resolved {
                section,
                key,
                action,
                changed,
            } => writeln!(f, "Resolved [{section}] {key} with {action} ({changed} layer(s) changed)"),
            ActionResult::ResolvedAll { action, count } => {
                writeln!(f, "Resolved {count} duplicate(s) with {action}")
            }
            ActionResult::Inserted {
                section,
                key,
                value,
                target,
            } => match target {
                Some(t) => writeln!(f, "Inserted [{section}] {key} = {value} into {t}"),
                None => writeln!(f, "No enabled layer to insert [{section}] {key} into"),
            },
            ActionResult::Toggled { file, enabled } => {
                let state = if *enabled { "Enabled" } else { "Disabled" };
                writeln!(f, "{state} {file}")
            }
            ActionResult::Validation(v) => writeln!(f, "{}", v.message()),
            ActionResult::Saved { backup_dir } => {
                writeln!(f, "Saved, backups in {}", backup_dir.display())
            }
            ActionResult::PresetImported { path, target } => match target {
                Some(t) => writeln!(f, "Merged preset {} into {t}", path.display()),
                None => writeln!(f, "No enabled layer to merge preset {} into", path.display()),
            },
            ActionResult::PresetExported { path } => {
                writeln!(f, "Exported preset to {}", path.display())
            }
        }
    }
}

/// Execute `action` against `db`.
pub fn handle(db: &mut LayeredDb, action: &IniAction) -> Result<ActionResult, IniStackError> {
    match action {
        IniAction::List => Ok(ActionResult::Listing {
            entries: db.merged(),
        }),
        IniAction::Files => Ok(ActionResult::Files {
            files: db.list_files(),
        }),
        IniAction::Duplicates => Ok(ActionResult::Duplicates {
            entries: db.find_duplicates(),
        }),
        IniAction::Resolve {
            section,
            key,
            action,
        } => Ok(ActionResult::Resolved {
            changed: db.resolve_duplicate(section, key, *action),
            section: section.clone(),
            key: key.clone(),
            action: *action,
        }),
        IniAction::ResolveAll { action } => Ok(ActionResult::ResolvedAll {
            count: db.resolve_all(*action),
            action: *action,
        }),
        IniAction::Insert {
            section,
            key,
            value,
            target,
        } => Ok(ActionResult::Inserted {
            target: db.insert_setting(section, key, value, target.as_deref()),
            section: section.clone(),
            key: key.clone(),
            value: value.clone(),
        }),
        IniAction::Enable { file } => toggle(db, file, true),
        IniAction::Disable { file } => toggle(db, file, false),
        IniAction::Validate => Ok(ActionResult::Validation(db.validate())),
        IniAction::Save => {
            let dir = db
                .config_dir()
                .ok_or(IniStackError::NoConfigDir)?
                .to_path_buf();
            Ok(ActionResult::Saved {
                backup_dir: db.save(&dir)?,
            })
        }
        IniAction::ImportPreset { path } => Ok(ActionResult::PresetImported {
            target: db.merge_preset(path)?,
            path: path.clone(),
        }),
        IniAction::ExportPreset { path } => {
            db.export_preset(path)?;
            Ok(ActionResult::PresetExported { path: path.clone() })
        }
    }
}

fn toggle(db: &mut LayeredDb, file: &str, enabled: bool) -> Result<ActionResult, IniStackError> {
    if !db.set_file_enabled(file, enabled) {
        return Err(IniStackError::LayerNotFound(file.to_string()));
    }
    Ok(ActionResult::Toggled {
        file: file.to_string(),
        enabled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{config_dir, read};
    use std::fs;

    fn loaded() -> (tempfile::TempDir, LayeredDb) {
        let dir = config_dir(&[
            ("DefaultGame.ini", "[S]\nk=1\nonly=a\n"),
            ("ProjectGame.ini", "[S]\nk=2\n"),
        ]);
        let mut db = LayeredDb::new();
        db.load(dir.path()).unwrap();
        (dir, db)
    }

    #[test]
    fn list_shows_merged_values() {
        let (_dir, mut db) = loaded();
        let result = handle(&mut db, &IniAction::List).unwrap();
        assert_eq!(
            result.to_string(),
            "[S] k = 2  (ProjectGame.ini)\n[S] only = a  (DefaultGame.ini)\n"
        );
    }

    #[test]
    fn files_marks_disabled() {
        let (_dir, mut db) = loaded();
        handle(
            &mut db,
            &IniAction::Disable {
                file: "ProjectGame.ini".into(),
            },
        )
        .unwrap();
        let result = handle(&mut db, &IniAction::Files).unwrap();
        assert_eq!(result.to_string(), "[x] DefaultGame.ini\n[ ] ProjectGame.ini\n");
    }

    #[test]
    fn duplicates_display() {
        let (_dir, mut db) = loaded();
        let result = handle(&mut db, &IniAction::Duplicates).unwrap();
        assert_eq!(result.to_string(), "[S] k: DefaultGame.ini, ProjectGame.ini\n");

        handle(
            &mut db,
            &IniAction::ResolveAll {
                action: ResolveAction::Delete,
            },
        )
        .unwrap();
        let result = handle(&mut db, &IniAction::Duplicates).unwrap();
        assert_eq!(result.to_string(), "No duplicates\n");
    }

    #[test]
    fn resolve_reports_changes() {
        let (_dir, mut db) = loaded();
        let result = handle(
            &mut db,
            &IniAction::Resolve {
                section: "S".into(),
                key: "k".into(),
                action: ResolveAction::Comment,
            },
        )
        .unwrap();
        assert_eq!(
            result,
            ActionResult::Resolved {
                section: "S".into(),
                key: "k".into(),
                action: ResolveAction::Comment,
                changed: 1,
            }
        );
    }

    #[test]
    fn insert_reports_target() {
        let (_dir, mut db) = loaded();
        let result = handle(
            &mut db,
            &IniAction::Insert {
                section: "T".into(),
                key: "new".into(),
                value: "1".into(),
                target: None,
            },
        )
        .unwrap();
        assert_eq!(result.to_string(), "Inserted [T] new = 1 into ProjectGame.ini\n");
    }

    #[test]
    fn toggle_unknown_layer_errors() {
        let (_dir, mut db) = loaded();
        let result = handle(
            &mut db,
            &IniAction::Enable {
                file: "Nope.ini".into(),
            },
        );
        assert!(matches!(result, Err(IniStackError::LayerNotFound(ref f)) if f == "Nope.ini"));
    }

    #[test]
    fn validate_returns_validation() {
        let (_dir, mut db) = loaded();
        let result = handle(&mut db, &IniAction::Validate).unwrap();
        assert!(matches!(result, ActionResult::Validation(Validation::Duplicates(_))));
    }

    #[test]
    fn save_needs_loaded_dir() {
        let mut db = LayeredDb::new();
        assert!(matches!(
            handle(&mut db, &IniAction::Save),
            Err(IniStackError::NoConfigDir)
        ));
    }

    #[test]
    fn save_writes_to_loaded_dir() {
        let (dir, mut db) = loaded();
        handle(
            &mut db,
            &IniAction::Resolve {
                section: "S".into(),
                key: "k".into(),
                action: ResolveAction::Delete,
            },
        )
        .unwrap();
        let result = handle(&mut db, &IniAction::Save).unwrap();
        let ActionResult::Saved { backup_dir } = result else {
            panic!("expected Saved, got {result:?}");
        };
        assert!(backup_dir.join("DefaultGame.ini").exists());
        assert_eq!(read(&dir, "DefaultGame.ini"), "[S]\nonly=a\n");
    }

    #[test]
    fn presets_round_through_ops() {
        let (dir, mut db) = loaded();
        let out = dir.path().join("presets").join("p.ini");
        handle(&mut db, &IniAction::ExportPreset { path: out.clone() }).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "[S]\nk=1\nonly=a\n");

        fs::write(&out, "[S]\nk=9\n").unwrap();
        let result = handle(&mut db, &IniAction::ImportPreset { path: out }).unwrap();
        assert!(matches!(
            result,
            ActionResult::PresetImported { target: Some(ref t), .. } if t == "ProjectGame.ini"
        ));
        assert_eq!(db.layer("ProjectGame.ini").unwrap().get_option("S", "k"), Some("9"));
    }
}
