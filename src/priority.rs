//! Layer priority from filename prefixes.
//!
//! A [`PriorityRanking`] is an ordered list of filename prefixes, lowest
//! priority first. A layer's rank is the index of the first prefix its file
//! name starts with. Names matching no prefix are unranked, and unranked
//! sorts below every ranked name: ranks are `Option<usize>`, and `None`
//! orders before `Some(_)`.

/// Prefixes of the stock layer set, lowest priority first.
pub const DEFAULT_PRIORITY: [&str; 4] = ["Default", "Project", "Platform", "GameUserSettings"];

/// Ordered `(prefix -> rank)` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityRanking {
    prefixes: Vec<String>,
}

impl Default for PriorityRanking {
    fn default() -> Self {
        Self::new(DEFAULT_PRIORITY)
    }
}

impl PriorityRanking {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Rank of `filename`; higher wins. `None` for unranked names.
    pub fn rank(&self, filename: &str) -> Option<usize> {
        self.prefixes
            .iter()
            .position(|prefix| filename.starts_with(prefix.as_str()))
    }

    /// Total order key for a layer: rank first, then load position, so ties
    /// between layers of the same rank go to the one loaded later.
    pub fn sort_key(&self, filename: &str, load_index: usize) -> (Option<usize>, usize) {
        (self.rank(filename), load_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ranks_ascend() {
        let r = PriorityRanking::default();
        assert_eq!(r.rank("DefaultEngine.ini"), Some(0));
        assert_eq!(r.rank("ProjectGame.ini"), Some(1));
        assert_eq!(r.rank("PlatformEngine.ini"), Some(2));
        assert_eq!(r.rank("GameUserSettings.ini"), Some(3));
    }

    #[test]
    fn unranked_sorts_below_everything() {
        let r = PriorityRanking::default();
        assert_eq!(r.rank("Custom.ini"), None);
        assert!(r.rank("Custom.ini") < r.rank("DefaultEngine.ini"));
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        let r = PriorityRanking::default();
        assert_eq!(r.rank("defaultengine.ini"), None);
    }

    #[test]
    fn first_matching_prefix_wins() {
        let r = PriorityRanking::new(["Game", "GameUserSettings"]);
        assert_eq!(r.rank("GameUserSettings.ini"), Some(0));
    }

    #[test]
    fn custom_table() {
        let r = PriorityRanking::new(vec!["Base".to_string(), "Local".to_string()]);
        assert_eq!(r.rank("LocalEditor.ini"), Some(1));
        assert_eq!(r.prefixes(), ["Base", "Local"]);
    }

    #[test]
    fn sort_key_breaks_ties_by_load_order() {
        let r = PriorityRanking::default();
        let mut layers = vec![("DefaultGame.ini", 1), ("DefaultEngine.ini", 0), ("Odd.ini", 2)];
        layers.sort_by_key(|(name, idx)| r.sort_key(name, *idx));
        let names: Vec<_> = layers.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["Odd.ini", "DefaultEngine.ini", "DefaultGame.ini"]);
    }
}
