//! Read-only presentations of a tree: a serializable snapshot and an ASCII rendering.

use serde::Serialize;

use crate::tree::{NodeId, Tree, TriState};

/// A serializable snapshot of one node and its loaded descendants.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct NodeView {
    pub id: String,
    pub label: String,
    pub checked: TriState,
    pub visible: TriState,
    pub enabled: TriState,
    pub expanded: bool,
    pub selected: bool,
    pub loading: bool,
    pub loaded: bool,
    pub children: Vec<NodeView>,
}

impl NodeView {
    /// Snapshots the subtree at `id`. Returns `None` for unknown ids.
    pub fn build<T, L>(tree: &Tree<T>, id: NodeId, label: &L) -> Option<Self>
    where
        L: Fn(&T) -> String,
    {
        let node = tree.node(id)?;
        Some(Self {
            id: id.to_string(),
            label: label(node.value()),
            checked: node.is_checked(),
            visible: node.is_visible(),
            enabled: node.is_enabled(),
            expanded: node.is_expanded(),
            selected: node.is_selected(),
            loading: node.is_loading(),
            loaded: node.is_loaded(),
            children: node
                .children()
                .iter()
                .filter_map(|child| Self::build(tree, *child, label))
                .collect(),
        })
    }
}

/// Which nodes [`render_ascii`] draws.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Skip nodes whose visible state is `False`.
    pub visible_only: bool,
    /// Only draw the children of expanded nodes.
    pub expanded_only: bool,
}

/// Renders the subtree at `id` with box-drawing connectors and check markers.
pub fn render_ascii<T, L>(tree: &Tree<T>, id: NodeId, label: L, options: RenderOptions) -> String
where
    L: Fn(&T) -> String,
{
    let mut result = String::new();
    let Some(node) = tree.node(id) else {
        return result;
    };
    result.push_str(&format!("{} {}\n", marker(node.is_checked()), label(node.value())));
    render_children(tree, id, &label, options, "", &mut result);
    result
}

fn render_children<T, L>(
    tree: &Tree<T>,
    id: NodeId,
    label: &L,
    options: RenderOptions,
    prefix: &str,
    result: &mut String,
) where
    L: Fn(&T) -> String,
{
    let Some(node) = tree.node(id) else {
        return;
    };
    if options.expanded_only && !node.is_expanded() {
        return;
    }

    let shown: Vec<NodeId> = node
        .children()
        .iter()
        .copied()
        .filter(|child| {
            !options.visible_only
                || tree
                    .node(*child)
                    .is_some_and(|n| n.is_visible() != TriState::False)
        })
        .collect();

    for (i, child) in shown.iter().enumerate() {
        let Some(child_node) = tree.node(*child) else {
            continue;
        };
        let is_last = i == shown.len() - 1;
        let connector = if is_last { "└── " } else { "├── " };
        let loading = if child_node.is_loading() { " …" } else { "" };

        result.push_str(&format!(
            "{prefix}{connector}{} {}{loading}\n",
            marker(child_node.is_checked()),
            label(child_node.value())
        ));

        let new_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };
        render_children(tree, *child, label, options, &new_prefix, result);
    }
}

fn marker(state: TriState) -> &'static str {
    match state {
        TriState::True => "[x]",
        TriState::False => "[ ]",
        TriState::Indeterminate => "[-]",
    }
}
