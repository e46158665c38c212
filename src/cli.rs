//! Clap adapter for inistack.
//!
//! Compiled only with the `clap` Cargo feature (on by default). Embed
//! [`IniArgs`] in a `#[derive(Parser)]` struct to get
//! `list|files|duplicates|resolve|resolve-all|insert|validate|save|import-preset|export-preset`
//! subcommands plus global `--disable FILE` and `--save` flags.
//!
//! The only bridge to the core is [`IniArgs::into_actions()`], which turns
//! parsed arguments into [`IniAction`](crate::IniAction)s for
//! [`InistackBuilder::handle()`](crate::InistackBuilder::handle).

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::types::{IniAction, ResolveAction};

/// Clap-derived args for the INI subcommand group.
///
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[arg(long)]
///     config_dir: PathBuf,
///     #[command(flatten)]
///     ini: IniArgs,
/// }
/// ```
#[derive(Debug, Args)]
pub struct IniArgs {
    /// Exclude a layer file from reads, duplicate checks and insertion.
    /// May be repeated. The file is still rewritten on save.
    #[arg(long = "disable", value_name = "FILE", global = true)]
    pub disabled: Vec<String>,

    /// Write every layer back to disk after the subcommand runs.
    #[arg(long, global = true)]
    pub save: bool,

    #[command(subcommand)]
    pub action: Option<IniSubcommand>,
}

#[derive(Debug, Subcommand)]
pub enum IniSubcommand {
    /// Show the merged value of every key and the layer it comes from.
    List,
    /// Show loaded layer files and whether each is enabled.
    Files,
    /// Show keys defined more than once across enabled layers.
    Duplicates,
    /// Resolve one duplicated key, keeping the highest-priority definition.
    Resolve {
        section: String,
        key: String,
        #[arg(short, long, value_enum, default_value_t = ResolveAction::Comment)]
        action: ResolveAction,
    },
    /// Resolve every duplicated key the same way.
    ResolveAll {
        #[arg(short, long, value_enum, default_value_t = ResolveAction::Comment)]
        action: ResolveAction,
    },
    /// Write a setting into a layer.
    Insert {
        section: String,
        key: String,
        value: String,
        /// Layer file to write into. Falls back to a best guess if it is
        /// not an enabled layer.
        #[arg(short, long)]
        target: Option<String>,
    },
    /// Re-read every layer and check for duplicates.
    Validate,
    /// Write every layer back to disk, with timestamped backups.
    Save,
    /// Merge a preset file into the highest-priority enabled layer.
    ImportPreset { path: PathBuf },
    /// Export all layers as one preset file, first value seen wins.
    ExportPreset { path: PathBuf },
}

impl IniArgs {
    /// Convert clap-parsed args into framework-agnostic actions.
    ///
    /// Each `--disable` becomes a `Disable` action ahead of the subcommand,
    /// and `--save` a trailing `Save`. A bare invocation (no subcommand)
    /// maps to `List`.
    pub fn into_actions(self) -> Vec<IniAction> {
        let mut actions: Vec<IniAction> = self
            .disabled
            .into_iter()
            .map(|file| IniAction::Disable { file })
            .collect();
        actions.push(match self.action {
            None | Some(IniSubcommand::List) => IniAction::List,
            Some(IniSubcommand::Files) => IniAction::Files,
            Some(IniSubcommand::Duplicates) => IniAction::Duplicates,
            Some(IniSubcommand::Resolve {
                section,
                key,
                action,
            }) => IniAction::Resolve {
                section,
                key,
                action,
            },
            Some(IniSubcommand::ResolveAll { action }) => IniAction::ResolveAll { action },
            Some(IniSubcommand::Insert {
                section,
                key,
                value,
                target,
            }) => IniAction::Insert {
                section,
                key,
                value,
                target,
            },
            Some(IniSubcommand::Validate) => IniAction::Validate,
            Some(IniSubcommand::Save) => IniAction::Save,
            Some(IniSubcommand::ImportPreset { path }) => IniAction::ImportPreset { path },
            Some(IniSubcommand::ExportPreset { path }) => IniAction::ExportPreset { path },
        });
        if self.save && actions.last() != Some(&IniAction::Save) {
            actions.push(IniAction::Save);
        }
        actions
    }
}
