use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IniStackError {
    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to back up {path} into {backup_dir}: {source}")]
    BackupError {
        path: PathBuf,
        backup_dir: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to replace {path} with its staged copy: {source}")]
    CommitError {
        path: PathBuf,
        source: tempfile::PersistError,
    },

    #[error("Invalid layer pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("Unknown resolution action '{0}' (expected one of: comment, delete, ignore)")]
    UnknownAction(String),

    #[error("No layer named '{0}' is loaded")]
    LayerNotFound(String),

    #[error("No config directory loaded; call .load() on the database first")]
    NoConfigDir,

    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in settings file")]
    UnknownKeys(Vec<IniStackError>),

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Settings error: {0}")]
    SettingsError(#[from] confique::Error),

    #[error("Failed to parse catalog {path}: {source}")]
    CatalogError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_formats_correctly() {
        let err = IniStackError::UnknownKey {
            key: "typo_key".into(),
            path: "/home/user/.config/inistack/settings.toml".into(),
            line: 42,
        };
        let msg = err.to_string();
        assert!(msg.contains("typo_key"));
        assert!(msg.contains("settings.toml"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn unknown_action_lists_valid_actions() {
        let err = IniStackError::UnknownAction("comentt".into());
        let msg = err.to_string();
        assert!(msg.contains("comentt"));
        assert!(msg.contains("comment"));
        assert!(msg.contains("delete"));
    }

    #[test]
    fn layer_not_found_formats() {
        let err = IniStackError::LayerNotFound("DefaultGame.ini".into());
        assert!(err.to_string().contains("DefaultGame.ini"));
    }

    #[test]
    fn backup_error_names_both_paths() {
        let err = IniStackError::BackupError {
            path: "Config/DefaultEngine.ini".into(),
            backup_dir: "Config/Backup/2024-01-01-000000".into(),
            source: std::io::Error::other("disk full"),
        };
        let msg = err.to_string();
        assert!(msg.contains("DefaultEngine.ini"));
        assert!(msg.contains("2024-01-01-000000"));
        assert!(msg.contains("disk full"));
    }
}
