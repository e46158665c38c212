//! Layered INI configuration for game-engine style config directories.
//!
//! A project's config directory holds several INI files that all describe
//! the same settings: `DefaultEngine.ini`, `ProjectEngine.ini`,
//! `GameUserSettings.ini` and so on. Each file is a **layer**; when two layers
//! define the same key, the one with the higher priority wins. inistack loads
//! those layers into one [`LayeredDb`], shows where keys are duplicated, and
//! lets you clean them up and write everything back safely.
//!
//! ```ignore
//! let mut db = Inistack::builder().load(Path::new("Config"))?;
//! for dup in db.find_duplicates() {
//!     println!("[{}] {} in {}", dup.section, dup.key, dup.files.join(", "));
//! }
//! db.resolve_all(ResolveAction::Comment);
//! db.save(Path::new("Config"))?;
//! ```
//!
//! # Layer priority
//!
//! Priority comes from the file name prefix, lowest first:
//!
//! ```text
//! Default*.ini
//!        ↑ overridden by
//! Project*.ini
//!        ↑ overridden by
//! Platform*.ini
//!        ↑ overridden by
//! GameUserSettings*.ini
//! ```
//!
//! A file matching none of the prefixes ranks below all of them. Ties (two
//! `Default*` files, say) are broken by load order: the later one wins. The
//! table is a plain ordered list, replaceable through [`Settings`] or
//! [`InistackBuilder::priority`].
//!
//! # Duplicates are reported, never silently fixed
//!
//! A key is a duplicate when more than one definition of it is visible
//! across enabled layers, regardless of value. Sections are compared
//! exactly; keys case-insensitively. A key repeated inside one file counts
//! once per repeat, and its last occurrence is the one that takes effect.
//!
//! Nothing changes until you pick a [`ResolveAction`]:
//!
//! - **`Comment`** prefixes every losing definition with `;`. The line stays
//!   in the file but no longer counts. Commenting twice is a no-op.
//! - **`Delete`** removes the losing definitions.
//! - **`Ignore`** leaves them alone.
//!
//! The highest-priority definition always survives.
//!
//! # Enabled layers
//!
//! Disabling a layer ([`LayeredDb::set_file_enabled`]) hides it from the
//! merged view, from duplicate detection and from insertion. It is still
//! written back on save, so toggling a layer never loses data.
//!
//! # Inserting settings
//!
//! [`LayeredDb::insert_setting`] writes into an explicit target layer when it
//! names an enabled one. Otherwise it picks the highest-priority enabled
//! layer that doesn't define the key yet, so inserting doesn't create a new
//! duplicate. A [`Catalog`] of known settings can suggest the value and
//! target through an [`Insertion`].
//!
//! # Saving
//!
//! [`LayeredDb::save`] rewrites every layer and copies each original into one
//! timestamped backup directory (`Backup/2025-01-31-142501/` by default). With
//! `atomic_save` on, every layer is staged to a temp file first and only then
//! renamed into place, so a failure while rendering or writing leaves all
//! layers untouched.
//!
//! Saved files are canonical: comments and blank lines are dropped, options
//! are written as `key=value` in their original order, sections are
//! separated by one blank line. Unchanged options keep their exact line.
//!
//! # Presets
//!
//! A preset is a standalone INI file. [`LayeredDb::merge_preset`] copies one
//! into the highest-priority enabled layer, overwriting matching keys.
//! [`LayeredDb::export_preset`] flattens every layer into one file, keeping
//! the first value seen in load order. [`PresetLibrary`] manages a directory
//! of them.
//!
//! # Settings and strict mode
//!
//! [`Settings`] is a confique struct with compiled defaults for the priority
//! table, discovery patterns and backup layout. A settings file only needs
//! the keys it changes. Strict mode is **on by default**: an unknown key
//! fails with its file and line:
//!
//! ```text
//! Unknown key 'prioritty' in /home/user/.config/inistack/inistack.toml (line 2)
//! ```
//!
//! # Clap adapter
//!
//! The `cli` module (behind the `clap` feature, on by default) provides
//! [`IniArgs`], a clap derive struct that turns a command line into
//! [`IniAction`]s. Without clap, build [`IniAction`] values directly and run
//! them with [`InistackBuilder::handle`].
//!
//! # Logging
//!
//! The engine emits `tracing` events (loads, resolutions, insert targets,
//! saves, presets). It never installs a subscriber.
//!
//! # Error handling
//!
//! All fallible operations return [`IniStackError`]. Operations that can only
//! find nothing to do (resolving a key that isn't duplicated, toggling an
//! unknown file) report that through their return value instead.

pub mod document;
pub mod error;
pub mod types;

mod builder;
mod catalog;
#[cfg(feature = "clap")]
mod cli;
mod database;
mod discover;
mod ops;
mod persist;
mod preset;
mod priority;
mod settings;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{Inistack, InistackBuilder};
pub use catalog::{Catalog, CatalogEntry, Insertion};
#[cfg(feature = "clap")]
pub use cli::{IniArgs, IniSubcommand};
pub use database::LayeredDb;
pub use discover::{DEFAULT_PATTERNS, discover_layers};
pub use document::{IniDocument, IniOption, Section};
pub use error::IniStackError;
pub use ops::{ActionResult, handle};
pub use persist::SaveOptions;
pub use preset::PresetLibrary;
pub use priority::{DEFAULT_PRIORITY, PriorityRanking};
pub use settings::{BackupSettings, Settings};
pub use types::{Entry, IniAction, MergedValue, ResolveAction, Validation};
