//! The layered config database: a priority-ordered set of INI documents for
//! one config directory.
//!
//! # Ordering
//!
//! Layers are kept in **load order**, which [`discover`](crate::discover)
//! makes priority-ascending for the stock layer set. Every query that lists
//! layers (`entries`, `available_targets`, `list_files`) uses load order.
//! Anything that decides a winner (`resolve_duplicate`, `insert_setting`,
//! `merged`, `merge_preset`) sorts by [`PriorityRanking`] rank with load
//! order breaking ties.
//!
//! # Enabled layers
//!
//! A disabled layer stays loaded but is invisible to reads, duplicate
//! detection and insertion. It is still rewritten on save, so disabling
//! never discards data.
//!
//! # Resolution is explicit
//!
//! Duplicates are only reported. Nothing changes until the caller picks a
//! [`ResolveAction`] for a key ([`resolve_duplicate`](LayeredDb::resolve_duplicate))
//! or for all of them ([`resolve_all`](LayeredDb::resolve_all)); `save`
//! writes whatever state the layers are in.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::discover::{self, DEFAULT_PATTERNS};
use crate::document::{IniDocument, normalize_key};
use crate::error::IniStackError;
use crate::persist::{self, SaveOptions};
use crate::priority::PriorityRanking;
use crate::settings::Settings;
use crate::types::{Entry, MergedValue, ResolveAction, Validation};

#[derive(Debug, Clone)]
struct Layer {
    doc: IniDocument,
    name: String,
    enabled: bool,
}

/// Layer indices defining each `(section, key)`, in first-seen order.
/// An index repeats once per definition in that layer.
type DefinitionMap = Vec<((String, String), Vec<usize>)>;

/// In-memory, layered view of a config directory.
///
/// The database exclusively owns its documents; callers read through
/// accessors and mutate through the database's operations.
#[derive(Debug, Clone)]
pub struct LayeredDb {
    layers: Vec<Layer>,
    config_dir: Option<PathBuf>,
    ranking: PriorityRanking,
    patterns: Vec<String>,
    save_options: SaveOptions,
}

impl Default for LayeredDb {
    fn default() -> Self {
        Self::new()
    }
}

impl LayeredDb {
    /// An empty database using the stock layer set.
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            config_dir: None,
            ranking: PriorityRanking::default(),
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            save_options: SaveOptions::default(),
        }
    }

    /// An empty database configured from [`Settings`].
    pub fn with_settings(settings: &Settings) -> Self {
        Self {
            ranking: settings.ranking(),
            patterns: settings.patterns.clone(),
            save_options: settings.save_options(),
            ..Self::new()
        }
    }

    // -- Loading ------------------------------------------------------------

    /// Load every layer file in `config_dir`, replacing any loaded layers.
    /// All layers start enabled.
    pub fn load(&mut self, config_dir: &Path) -> Result<(), IniStackError> {
        let paths = discover::discover_layers(config_dir, &self.patterns)?;
        let mut layers = Vec::with_capacity(paths.len());
        for path in paths {
            let doc = IniDocument::load(&path)?;
            layers.push(Layer {
                name: doc.file_name(),
                doc,
                enabled: true,
            });
        }
        info!(dir = %config_dir.display(), layers = layers.len(), "loaded config directory");
        self.layers = layers;
        self.config_dir = Some(config_dir.to_path_buf());
        Ok(())
    }

    /// Add an already-built document as the newest (last-loaded) layer.
    pub fn push_layer(&mut self, doc: IniDocument) {
        self.layers.push(Layer {
            name: doc.file_name(),
            doc,
            enabled: true,
        });
    }

    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    pub fn ranking(&self) -> &PriorityRanking {
        &self.ranking
    }

    pub fn save_options(&self) -> &SaveOptions {
        &self.save_options
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Read access to a layer's document, enabled or not.
    pub fn layer(&self, filename: &str) -> Option<&IniDocument> {
        self.layers
            .iter()
            .find(|l| l.name == filename)
            .map(|l| &l.doc)
    }

    /// Every loaded layer with its enabled flag, in load order.
    pub fn list_files(&self) -> Vec<(String, bool)> {
        self.layers
            .iter()
            .map(|l| (l.name.clone(), l.enabled))
            .collect()
    }

    /// Include or exclude a layer from reads, merges and insertion.
    /// Returns `false` if no layer has that name.
    pub fn set_file_enabled(&mut self, filename: &str, enabled: bool) -> bool {
        match self.layers.iter_mut().find(|l| l.name == filename) {
            Some(layer) => {
                layer.enabled = enabled;
                debug!(layer = filename, enabled, "toggled layer");
                true
            }
            None => false,
        }
    }

    /// File names of enabled layers, in load order: the valid insertion targets.
    pub fn available_targets(&self) -> Vec<String> {
        self.enabled().map(|(_, l)| l.name.clone()).collect()
    }

    fn enabled(&self) -> impl Iterator<Item = (usize, &Layer)> {
        self.layers.iter().enumerate().filter(|(_, l)| l.enabled)
    }

    // -- Queries ------------------------------------------------------------

    fn definitions(&self) -> DefinitionMap {
        let mut map: DefinitionMap = Vec::new();
        let mut positions: HashMap<(String, String), usize> = HashMap::new();

        for (idx, layer) in self.enabled() {
            for (section, option) in layer.doc.active_options() {
                let id = (section.to_string(), option.key().to_string());
                let pos = *positions.entry(id.clone()).or_insert_with(|| {
                    map.push((id, Vec::new()));
                    map.len() - 1
                });
                map[pos]
                    .1
                    .extend(std::iter::repeat_n(idx, option.definitions()));
            }
        }
        map
    }

    fn defining_layers(&self, section: &str, key: &str) -> Vec<usize> {
        let key = normalize_key(key);
        let mut found = Vec::new();
        for (idx, layer) in self.enabled() {
            found.extend(std::iter::repeat_n(idx, layer.doc.definitions(section, &key)));
        }
        found
    }

    /// Layer indices sorted by ascending priority, without repeats.
    fn by_priority(&self, indices: &[usize]) -> Vec<usize> {
        let mut sorted = indices.to_vec();
        sorted.sort_by_key(|&i| self.ranking.sort_key(&self.layers[i].name, i));
        sorted.dedup();
        sorted
    }

    /// Every `(section, key)` defined in an enabled layer, with the layers
    /// defining it in load order.
    pub fn entries(&self) -> Vec<Entry> {
        self.definitions()
            .into_iter()
            .map(|((section, key), idxs)| Entry {
                section,
                key,
                files: idxs.iter().map(|&i| self.layers[i].name.clone()).collect(),
            })
            .collect()
    }

    /// Entries defined more than once across enabled layers.
    pub fn find_duplicates(&self) -> Vec<Entry> {
        self.entries()
            .into_iter()
            .filter(Entry::is_duplicate)
            .collect()
    }

    /// Merged view: for each entry, the value from its highest-priority layer.
    pub fn merged(&self) -> Vec<MergedValue> {
        self.definitions()
            .into_iter()
            .filter_map(|((section, key), idxs)| {
                let winner = *self.by_priority(&idxs).last()?;
                let layer = &self.layers[winner];
                let value = layer.doc.get_option(&section, &key)?.to_string();
                Some(MergedValue {
                    section,
                    key,
                    value,
                    source: layer.name.clone(),
                })
            })
            .collect()
    }

    /// Rank of `filename` under this database's priority table.
    pub fn priority_rank(&self, filename: &str) -> Option<usize> {
        self.ranking.rank(filename)
    }

    // -- Mutation -----------------------------------------------------------

    /// Apply `action` to every definition of `(section, key)` except the
    /// highest-priority one. Within a single file, earlier repeats lose to
    /// the last occurrence. Returns the number of layers changed.
    pub fn resolve_duplicate(&mut self, section: &str, key: &str, action: ResolveAction) -> usize {
        if action == ResolveAction::Ignore {
            return 0;
        }
        let ordered = self.by_priority(&self.defining_layers(section, key));
        let Some((&winner, losers)) = ordered.split_last() else {
            return 0;
        };

        let mut changed = 0;
        for &idx in losers {
            let doc = &mut self.layers[idx].doc;
            let did = match action {
                ResolveAction::Comment => doc.comment_option(section, key),
                ResolveAction::Delete => doc.delete_option(section, key),
                ResolveAction::Ignore => false,
            };
            changed += usize::from(did);
        }

        let doc = &mut self.layers[winner].doc;
        let did = match action {
            ResolveAction::Comment => doc.comment_shadowed(section, key),
            ResolveAction::Delete => doc.delete_shadowed(section, key),
            ResolveAction::Ignore => false,
        };
        changed += usize::from(did);

        debug!(
            section,
            key,
            %action,
            winner = %self.layers[winner].name,
            changed,
            "resolved duplicate"
        );
        changed
    }

    /// Resolve every current duplicate with the same action. Returns the
    /// number of duplicates that were touched.
    pub fn resolve_all(&mut self, action: ResolveAction) -> usize {
        let mut touched = 0;
        for entry in self.find_duplicates() {
            if self.resolve_duplicate(&entry.section, &entry.key, action) > 0 {
                touched += 1;
            }
        }
        touched
    }

    /// Write `section.key = value` into a layer and return its file name.
    ///
    /// `target` wins when it names an enabled layer. Otherwise the
    /// highest-priority enabled layer that doesn't define the key yet is
    /// chosen, so the insert doesn't create a duplicate; if all define it,
    /// the highest-priority layer is overwritten. With no enabled layers
    /// nothing happens.
    pub fn insert_setting(
        &mut self,
        section: &str,
        key: &str,
        value: &str,
        target: Option<&str>,
    ) -> Option<String> {
        let explicit = target.and_then(|name| {
            self.layers
                .iter()
                .position(|l| l.enabled && l.name == name)
        });

        let idx = match explicit {
            Some(idx) => idx,
            None => {
                let enabled: Vec<usize> = self.enabled().map(|(i, _)| i).collect();
                let ordered = self.by_priority(&enabled);
                let free = ordered
                    .iter()
                    .rev()
                    .find(|&&i| !self.layers[i].doc.has_option(section, key));
                *free.or(ordered.last())?
            }
        };

        let layer = &mut self.layers[idx];
        layer.doc.set_option(section, key, value);
        debug!(section, key, layer = %layer.name, "inserted setting");
        Some(layer.name.clone())
    }

    /// Mutable access to the highest-priority enabled layer.
    pub(crate) fn top_layer_mut(&mut self) -> Option<&mut IniDocument> {
        let enabled: Vec<usize> = self.enabled().map(|(i, _)| i).collect();
        let top = *self.by_priority(&enabled).last()?;
        Some(&mut self.layers[top].doc)
    }

    /// Every layer's document, enabled or not, in load order.
    pub fn documents(&self) -> impl Iterator<Item = &IniDocument> {
        self.layers.iter().map(|l| &l.doc)
    }

    // -- Persistence --------------------------------------------------------

    /// Write every layer back to disk, enabled or not, backing each up into
    /// one timestamped directory under `config_dir`. Returns that directory.
    ///
    /// Duplicates are written as they are; call
    /// [`resolve_duplicate`](Self::resolve_duplicate) first to change them.
    pub fn save(&self, config_dir: &Path) -> Result<PathBuf, IniStackError> {
        let backup_dir = self.save_options.backup_dir(config_dir);
        persist::save_layers(self.documents(), &backup_dir, self.save_options.atomic)?;
        Ok(backup_dir)
    }

    /// Re-read every layer from disk and check for duplicates.
    pub fn validate(&self) -> Validation {
        for layer in &self.layers {
            if let Err(e) = IniDocument::load(layer.doc.path()) {
                return Validation::ReadFailure {
                    file: layer.name.clone(),
                    reason: e.to_string(),
                };
            }
        }
        let duplicates = self.find_duplicates();
        if duplicates.is_empty() {
            Validation::Clean
        } else {
            Validation::Duplicates(duplicates)
        }
    }
}
