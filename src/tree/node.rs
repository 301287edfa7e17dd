//! Node identity, tri-state flags and the per-node state record.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::loader::{ChildLoader, Fetch};

/// A value in `{true, false, indeterminate}`.
///
/// `Indeterminate` only ever results from derivation over children; the tree rejects it as
/// input for the derived properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    True,
    False,
    Indeterminate,
}

impl TriState {
    /// Returns `true` unless the state is indeterminate.
    pub fn is_definite(self) -> bool {
        self != TriState::Indeterminate
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            TriState::True => Some(true),
            TriState::False => Some(false),
            TriState::Indeterminate => None,
        }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value {
            TriState::True
        } else {
            TriState::False
        }
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        value.map_or(TriState::Indeterminate, TriState::from)
    }
}

/// Stable handle to a node in a [`Tree`](super::Tree).
///
/// The generation makes handles of released nodes fail to resolve even after their slot is
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// The children slot of a node.
///
/// `Unloaded` is the "not yet fetched" marker. It can only be present when the node has a
/// loader and is never mixed with real children.
pub(crate) enum ChildState<T> {
    Unloaded,
    Loading(Fetch<T>),
    Loaded(Vec<NodeId>),
}

/// A single node of the tree: payload, links and state flags.
pub struct Node<T> {
    pub(crate) value: T,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: ChildState<T>,
    pub(crate) loader: Option<ChildLoader<T>>,
    pub(crate) is_checked: TriState,
    pub(crate) is_visible: TriState,
    pub(crate) is_enabled: TriState,
    pub(crate) is_expanded: bool,
    pub(crate) is_selected: bool,
    pub(crate) is_loading: bool,
}

impl<T> Node<T> {
    pub(crate) fn new(parent: Option<NodeId>, value: T, loader: Option<ChildLoader<T>>) -> Self {
        let children = if loader.is_some() {
            ChildState::Unloaded
        } else {
            ChildState::Loaded(Vec::new())
        };
        Self {
            value,
            parent,
            children,
            loader,
            is_checked: TriState::False,
            is_visible: TriState::True,
            is_enabled: TriState::True,
            is_expanded: false,
            is_selected: false,
            is_loading: false,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_checked(&self) -> TriState {
        self.is_checked
    }

    pub fn is_visible(&self) -> TriState {
        self.is_visible
    }

    pub fn is_enabled(&self) -> TriState {
        self.is_enabled
    }

    pub fn is_expanded(&self) -> bool {
        self.is_expanded
    }

    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    /// `true` strictly while a background fetch for this node is in flight.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Whether the node can produce children through a loader.
    pub fn has_loader(&self) -> bool {
        self.loader.is_some()
    }

    /// Whether the node still holds the unloaded marker.
    pub fn has_unloaded_marker(&self) -> bool {
        matches!(self.children, ChildState::Unloaded)
    }

    /// Whether the children are known, including the empty list of a leaf.
    pub fn is_loaded(&self) -> bool {
        matches!(self.children, ChildState::Loaded(_))
    }

    /// The loaded children in display order. Empty while unloaded or loading.
    pub fn children(&self) -> &[NodeId] {
        match &self.children {
            ChildState::Loaded(ids) => ids,
            _ => &[],
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children = match &self.children {
            ChildState::Unloaded => "unloaded".to_string(),
            ChildState::Loading(_) => "loading".to_string(),
            ChildState::Loaded(ids) => format!("{} loaded", ids.len()),
        };
        f.debug_struct("Node")
            .field("value", &self.value)
            .field("parent", &self.parent)
            .field("children", &children)
            .field("is_checked", &self.is_checked)
            .field("is_visible", &self.is_visible)
            .field("is_expanded", &self.is_expanded)
            .field("is_loading", &self.is_loading)
            .finish()
    }
}
