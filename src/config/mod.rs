pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// User-tunable behavior of the tree browser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Quiet period, in milliseconds, between the last keystroke and the search.
    pub search_debounce_ms: u64,
    /// Queries shorter than this (after trimming) never start a search.
    pub min_search_length: usize,
    /// Whether expanding a node that was never loaded fetches its children.
    pub load_on_expand: bool,
    pub show_hidden: bool,
    pub follow_symlinks: bool,
    pub case_sensitive_search: bool,
    /// Gitignore-style patterns; matching entries are never listed.
    pub ignore_patterns: BTreeSet<String>,
    pub last_directory: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        settings::load_config()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let ignore_patterns = [
            ".git",
            ".hg",
            ".svn",
            "node_modules",
            "target",
            "__pycache__",
            ".idea",
            ".DS_Store",
            "Thumbs.db",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        Self {
            search_debounce_ms: 1000,
            min_search_length: 3,
            load_on_expand: true,
            show_hidden: false,
            follow_symlinks: false,
            case_sensitive_search: false,
            ignore_patterns,
            last_directory: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_policy() {
        let config = AppConfig::default();
        assert_eq!(config.search_debounce_ms, 1000);
        assert_eq!(config.min_search_length, 3);
        assert!(config.load_on_expand);
        assert!(!config.show_hidden);
        assert!(config.ignore_patterns.contains(".git"));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"show_hidden": true}"#).unwrap();
        assert!(config.show_hidden);
        assert_eq!(config.search_debounce_ms, 1000);
        assert_eq!(config.ignore_patterns, AppConfig::default().ignore_patterns);
    }
}
