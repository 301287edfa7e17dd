//! State protocols: checked/visible propagation and the plain expanded/enabled/selected flags.

use super::node::{Node, NodeId, TriState};
use super::Tree;
use crate::error::{Result, TreeError};
use crate::events::{Property, TreeEvent};

/// The two properties whose parent value is derived from the children.
#[derive(Debug, Clone, Copy)]
enum Derived {
    Checked,
    Visible,
}

impl Derived {
    fn property(self) -> Property {
        match self {
            Derived::Checked => Property::Checked,
            Derived::Visible => Property::Visible,
        }
    }

    fn get<T>(self, node: &Node<T>) -> TriState {
        match self {
            Derived::Checked => node.is_checked,
            Derived::Visible => node.is_visible,
        }
    }

    fn slot<T>(self, node: &mut Node<T>) -> &mut TriState {
        match self {
            Derived::Checked => &mut node.is_checked,
            Derived::Visible => &mut node.is_visible,
        }
    }
}

impl<T> Tree<T> {
    /// Checks or unchecks a node and propagates the change through the loaded tree.
    ///
    /// The value is pushed down into loaded descendants, ancestors are recomputed from their
    /// children, and a single [`TreeEvent::CheckedChanged`] is raised once the ascent stops.
    /// Indeterminate is rejected without touching any state.
    pub fn set_checked(&mut self, id: NodeId, state: TriState) -> Result<()> {
        if !self.set_derived(Derived::Checked, id, state)? {
            return Ok(());
        }
        let root = self.root;
        let root_state = self.require(root)?.is_checked;
        self.emit(TreeEvent::CheckedChanged {
            node: root,
            state: root_state,
            source: id,
        });
        Ok(())
    }

    /// Shows or hides a node, with the same propagation as [`Tree::set_checked`] but no
    /// terminal event.
    pub fn set_visible(&mut self, id: NodeId, state: TriState) -> Result<()> {
        self.set_derived(Derived::Visible, id, state)?;
        Ok(())
    }

    /// Sets the enabled flag. Any value is accepted and nothing propagates.
    pub fn set_enabled(&mut self, id: NodeId, state: TriState) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.is_enabled != state {
            node.is_enabled = state;
            self.notify(id, Property::Enabled);
        }
        Ok(())
    }

    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.is_selected != selected {
            node.is_selected = selected;
            self.notify(id, Property::Selected);
        }
        Ok(())
    }

    /// Copies the expanded flag of `id` down through its loaded descendants.
    pub fn update_expanded_children(&mut self, id: NodeId) -> Result<()> {
        let expanded = self.require(id)?.is_expanded;
        let mut stack = self.children(id).to_vec();
        while let Some(child) = stack.pop() {
            let node = self.node_mut(child)?;
            if node.is_expanded != expanded {
                node.is_expanded = expanded;
                self.notify(child, Property::Expanded);
                stack.extend_from_slice(self.children(child));
            }
        }
        Ok(())
    }

    /// Returns `Ok(true)` when the value actually changed.
    fn set_derived(&mut self, flag: Derived, id: NodeId, state: TriState) -> Result<bool> {
        if !state.is_definite() {
            return Err(TreeError::IndeterminateNotSettable(flag.property()));
        }
        let node = self.node_mut(id)?;
        if flag.get(node) == state {
            return Ok(false);
        }
        *flag.slot(node) = state;
        self.notify(id, flag.property());

        self.push_down(flag, id, state)?;
        self.recompute_upward(flag, id)?;
        Ok(true)
    }

    /// Applies `state` to every loaded descendant that differs, without loading anything.
    fn push_down(&mut self, flag: Derived, id: NodeId, state: TriState) -> Result<()> {
        let mut stack = self.children(id).to_vec();
        while let Some(child) = stack.pop() {
            let node = self.node_mut(child)?;
            if flag.get(node) != state {
                *flag.slot(node) = state;
                self.notify(child, flag.property());
                stack.extend_from_slice(self.children(child));
            }
        }
        Ok(())
    }

    /// Settles an indeterminate node against freshly loaded children and carries the result
    /// up through its ancestors. Only property notifications are raised.
    pub(super) fn rederive_from_children(&mut self, id: NodeId) -> Result<()> {
        for flag in [Derived::Checked, Derived::Visible] {
            if flag.get(self.require(id)?).is_definite() {
                continue;
            }
            let derived = {
                let mut values = self
                    .children(id)
                    .iter()
                    .filter_map(|child| self.node(*child))
                    .map(|child| flag.get(child));
                match values.next() {
                    Some(first) if first.is_definite() && values.all(|v| v == first) => first,
                    _ => continue,
                }
            };
            *flag.slot(self.node_mut(id)?) = derived;
            self.notify(id, flag.property());
            self.recompute_upward(flag, id)?;
        }
        Ok(())
    }

    /// Re-derives each ancestor from its loaded children, stopping at the first one that
    /// does not change.
    fn recompute_upward(&mut self, flag: Derived, id: NodeId) -> Result<()> {
        let mut child = id;
        while let Some(parent) = self.parent(child) {
            let value = flag.get(self.require(child)?);
            let shared = value.is_definite()
                && self
                    .children(parent)
                    .iter()
                    .filter_map(|sibling| self.node(*sibling))
                    .all(|sibling| flag.get(sibling) == value);
            let derived = if shared {
                value
            } else {
                TriState::Indeterminate
            };

            let node = self.node_mut(parent)?;
            if flag.get(node) == derived {
                break;
            }
            *flag.slot(node) = derived;
            self.notify(parent, flag.property());
            child = parent;
        }
        Ok(())
    }
}

impl<T: Clone + Send + 'static> Tree<T> {
    /// Expands or collapses a node.
    ///
    /// Expanding a node that still holds the unloaded marker starts a background fetch when
    /// the tree loads on expand.
    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) -> Result<()> {
        let load_on_expand = self.load_on_expand;
        let node = self.node_mut(id)?;
        if node.is_expanded == expanded {
            return Ok(());
        }
        node.is_expanded = expanded;
        let fetch = expanded && load_on_expand && node.has_unloaded_marker();
        self.notify(id, Property::Expanded);
        if fetch {
            self.start_fetch(id, None)?;
        }
        Ok(())
    }

    /// Expands every ancestor of `id` so that it becomes reachable in a view.
    pub fn expand_parent_nodes(&mut self, id: NodeId) -> Result<()> {
        self.require(id)?;
        for ancestor in self.ancestors(id) {
            self.set_expanded(ancestor, true)?;
        }
        Ok(())
    }
}
