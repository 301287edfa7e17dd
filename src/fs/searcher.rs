//! Breadth-first file-name search producing reveal paths for the navigator.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{GlobBuilder, GlobMatcher};

use super::{list_directory, FsEntry, FsOptions};
use crate::search::{predicate, PathSearcher, SearchPath, SearchToken};

/// How a query is compared against entry names.
#[derive(Debug, Clone)]
pub enum NameMatcher {
    Substring { needle: String, case_sensitive: bool },
    Glob(GlobMatcher),
}

impl NameMatcher {
    /// Queries containing glob metacharacters become globs, anything else a substring match.
    pub fn new(query: &str, case_sensitive: bool) -> Self {
        let query = query.trim();
        if query.contains(['*', '?', '[', '{']) {
            match GlobBuilder::new(query)
                .case_insensitive(!case_sensitive)
                .literal_separator(true)
                .build()
            {
                Ok(glob) => return NameMatcher::Glob(glob.compile_matcher()),
                Err(e) => {
                    tracing::debug!("Query {:?} is not a valid glob, using substring: {}", query, e)
                }
            }
        }
        let needle = if case_sensitive {
            query.to_string()
        } else {
            query.to_lowercase()
        };
        NameMatcher::Substring {
            needle,
            case_sensitive,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameMatcher::Substring {
                needle,
                case_sensitive: true,
            } => name.contains(needle.as_str()),
            NameMatcher::Substring { needle, .. } => name.to_lowercase().contains(needle.as_str()),
            NameMatcher::Glob(glob) => glob.is_match(name),
        }
    }
}

/// Walks the tree root breadth-first and reports every entry whose name matches the query.
///
/// Uses the same listing rules as the tree, so every reported path can be revealed.
#[derive(Debug, Clone)]
pub struct FileSystemSearcher {
    options: Arc<FsOptions>,
    case_sensitive: bool,
}

impl FileSystemSearcher {
    pub fn new(options: Arc<FsOptions>, case_sensitive: bool) -> Self {
        Self {
            options,
            case_sensitive,
        }
    }

    /// Builds the root-exclusive path of name predicates leading to `path`.
    fn path_to(&self, path: &Path) -> Option<SearchPath<FsEntry>> {
        let relative = path.strip_prefix(&self.options.root).ok()?;
        Some(
            relative
                .components()
                .map(|component| {
                    let name = component.as_os_str().to_string_lossy().into_owned();
                    predicate(move |entry: &FsEntry| entry.name == name)
                })
                .collect(),
        )
    }
}

impl PathSearcher<FsEntry> for FileSystemSearcher {
    fn search(&self, text: &str, token: &SearchToken, emit: &mut dyn FnMut(SearchPath<FsEntry>)) {
        let matcher = NameMatcher::new(text, self.case_sensitive);
        let mut queue: VecDeque<PathBuf> = VecDeque::from([self.options.root.clone()]);
        // Canonical directories already queued; followed symlinks may point back into the walk.
        let mut visited: HashSet<PathBuf> = HashSet::from([self.options.root.clone()]);
        let mut hits = 0usize;

        while let Some(dir) = queue.pop_front() {
            if token.is_cancelled() {
                tracing::debug!("Search for {:?} cancelled after {} hits", text, hits);
                return;
            }
            let entries = match list_directory(&dir, &self.options) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::debug!("Search skipped a directory: {:#}", e);
                    continue;
                }
            };
            for entry in entries {
                if token.is_cancelled() {
                    return;
                }
                if self.options.descends_into(&entry) {
                    match entry.path.canonicalize() {
                        Ok(real) if visited.insert(real.clone()) => queue.push_back(entry.path.clone()),
                        Ok(_) => tracing::trace!("Already walked {:?}", entry.path),
                        Err(e) => tracing::debug!("Search skipped {:?}: {}", entry.path, e),
                    }
                }
                if matcher.matches(&entry.name) {
                    if let Some(path) = self.path_to(&entry.path) {
                        hits += 1;
                        emit(path);
                    }
                }
            }
        }
        tracing::debug!("Search for {:?} found {} hits", text, hits);
    }
}
