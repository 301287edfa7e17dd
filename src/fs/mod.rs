//! The file-system tree: directory entries as payloads, listed lazily as directories open.

pub mod ignore;
pub mod searcher;

use std::cmp::Ordering;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::GlobSet;
use serde::Serialize;

use crate::config::AppConfig;
use crate::tree::{
    child_loader, ChildLoader, LoaderResult, Node, NodeFactory, NodeId, NodeSeed, Tree, TriState,
};

pub use ignore::build_globset_from_patterns;
pub use searcher::FileSystemSearcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
    Symlink,
}

/// Payload of a file-system node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FsEntry {
    pub path: PathBuf,
    pub name: String,
    pub kind: EntryKind,
}

impl FsEntry {
    /// The entry for the directory a tree is opened on.
    pub fn root(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            kind: EntryKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

impl fmt::Display for FsEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EntryKind::Directory => write!(f, "{}/", self.name),
            EntryKind::File => f.write_str(&self.name),
            EntryKind::Symlink => write!(f, "{}@", self.name),
        }
    }
}

/// Listing rules shared by the loader and the searcher.
#[derive(Debug, Clone)]
pub struct FsOptions {
    pub root: PathBuf,
    pub show_hidden: bool,
    pub follow_symlinks: bool,
    pub ignore: GlobSet,
}

impl FsOptions {
    pub fn new(root: PathBuf, config: &AppConfig) -> Self {
        Self {
            root,
            show_hidden: config.show_hidden,
            follow_symlinks: config.follow_symlinks,
            ignore: build_globset_from_patterns(&config.ignore_patterns),
        }
    }

    fn is_listed(&self, entry: &FsEntry) -> bool {
        if entry.is_hidden() && !self.show_hidden {
            return false;
        }
        let relative = entry.path.strip_prefix(&self.root).unwrap_or(&entry.path);
        !self.ignore.is_match(relative)
    }

    /// Whether the searcher and the loader descend into `entry`.
    fn descends_into(&self, entry: &FsEntry) -> bool {
        match entry.kind {
            EntryKind::Directory => true,
            EntryKind::Symlink => self.follow_symlinks && entry.path.is_dir(),
            EntryKind::File => false,
        }
    }
}

/// Lists `dir`: directories first, then everything else, each group by case-insensitive name.
///
/// Entries that cannot be inspected are skipped; a directory that cannot be read is an error.
pub fn list_directory(dir: &Path, options: &FsOptions) -> Result<Vec<FsEntry>> {
    let read_dir = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut entries: Vec<FsEntry> = read_dir
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry in {:?}: {}", dir, e);
                None
            }
        })
        .filter_map(|entry| {
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    tracing::debug!("Skipping {:?}: {}", entry.path(), e);
                    return None;
                }
            };
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            Some(FsEntry {
                path: entry.path(),
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            })
        })
        .filter(|entry| options.is_listed(entry))
        .collect();

    entries.sort_by(compare_entries);
    Ok(entries)
}

fn compare_entries(a: &FsEntry, b: &FsEntry) -> Ordering {
    match (a.is_dir(), b.is_dir()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
    }
}

/// A loader that lists a directory and gives every listed directory a loader of its own.
pub fn directory_loader(options: Arc<FsOptions>) -> ChildLoader<FsEntry> {
    child_loader(move |entry: &FsEntry| {
        let children = list_directory(&entry.path, &options)?;
        tracing::debug!("Listed {} entries in {:?}", children.len(), entry.path);
        Ok(children
            .into_iter()
            .map(|child| {
                let nested = options
                    .descends_into(&child)
                    .then(|| directory_loader(options.clone()));
                LoaderResult::new(child, nested)
            })
            .collect())
    })
}

/// Builds file-system nodes: symlinks are inert unless the tree follows them.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsNodeFactory {
    pub follow_symlinks: bool,
}

impl NodeFactory<FsEntry> for FsNodeFactory {
    fn create(
        &self,
        _parent: &Node<FsEntry>,
        value: FsEntry,
        loader: Option<ChildLoader<FsEntry>>,
    ) -> NodeSeed<FsEntry> {
        if value.kind == EntryKind::Symlink && !self.follow_symlinks {
            return NodeSeed::new(value, None).enabled(TriState::False);
        }
        NodeSeed::new(value, loader)
    }
}

/// Opens a lazily-loaded tree on the directory `root`.
pub fn open_tree(root: &Path, config: &AppConfig) -> Result<Tree<FsEntry>> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", root.display()))?;
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }
    tracing::info!("Opening tree on {:?}", root);

    let options = Arc::new(FsOptions::new(root.clone(), config));
    let loader = directory_loader(options);
    Ok(Tree::new(FsEntry::root(root), Some(loader))
        .with_factory(FsNodeFactory {
            follow_symlinks: config.follow_symlinks,
        })
        .with_load_on_expand(config.load_on_expand))
}

/// Finds the node for `relative`, loading directories synchronously on the way.
///
/// Returns `Ok(None)` when some component is not listed.
pub fn resolve(
    tree: &mut Tree<FsEntry>,
    relative: &Path,
) -> crate::error::Result<Option<NodeId>> {
    let mut current = tree.root();
    for component in relative.components() {
        let name = match component {
            Component::Normal(name) => name.to_string_lossy(),
            Component::CurDir => continue,
            _ => return Ok(None),
        };
        tree.get_children(current)?;
        match tree.find_child(current, |entry| entry.name == name) {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}
