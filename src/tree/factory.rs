//! The node construction strategy used when a loader resolves.
//!
//! Each concrete tree (for example the file-system tree) is a configuration value that supplies
//! its own factory instead of a node subtype.

use super::loader::ChildLoader;
use super::node::{Node, TriState};

/// Everything a factory decides about a new child before it is attached.
///
/// Checked and visible state are not part of the seed: they are inherited from the parent
/// when the child is attached.
pub struct NodeSeed<T> {
    pub value: T,
    pub loader: Option<ChildLoader<T>>,
    pub is_enabled: TriState,
    pub is_selected: bool,
}

impl<T> NodeSeed<T> {
    /// A seed with default flags (enabled, not selected).
    pub fn new(value: T, loader: Option<ChildLoader<T>>) -> Self {
        Self {
            value,
            loader,
            is_enabled: TriState::True,
            is_selected: false,
        }
    }

    pub fn enabled(mut self, state: TriState) -> Self {
        self.is_enabled = state;
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.is_selected = selected;
        self
    }
}

/// Builds children for a parent node, invoked as `create(parent, payload, nested_loader)`.
pub trait NodeFactory<T>: Send + Sync {
    fn create(&self, parent: &Node<T>, value: T, loader: Option<ChildLoader<T>>) -> NodeSeed<T>;
}

/// Closures can be used directly as factories.
impl<T, F> NodeFactory<T> for F
where
    F: Fn(&Node<T>, T, Option<ChildLoader<T>>) -> NodeSeed<T> + Send + Sync,
{
    fn create(&self, parent: &Node<T>, value: T, loader: Option<ChildLoader<T>>) -> NodeSeed<T> {
        self(parent, value, loader)
    }
}

/// The factory used when a tree does not supply its own: payload and loader pass through.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFactory;

impl<T> NodeFactory<T> for DefaultFactory {
    fn create(&self, _parent: &Node<T>, value: T, loader: Option<ChildLoader<T>>) -> NodeSeed<T> {
        NodeSeed::new(value, loader)
    }
}
