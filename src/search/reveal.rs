//! Progressive reveal of one search path.

use std::collections::VecDeque;

use super::{Predicate, SearchToken};
use crate::tree::{NodeId, Tree, TriState};

/// Walks `path` down from `node`, loading children on the way, and shows the node it ends at.
///
/// Each step expands the current node and moves to its first child matching the next
/// predicate. The token is checked before every step, including steps resumed after a fetch.
pub(crate) fn reveal<T>(
    tree: &mut Tree<T>,
    node: NodeId,
    mut path: VecDeque<Predicate<T>>,
    token: SearchToken,
) where
    T: Clone + Send + 'static,
{
    if token.is_cancelled() {
        return;
    }

    let Some(next) = path.pop_front() else {
        if let Err(e) = tree.set_visible(node, TriState::True) {
            tracing::debug!("Could not show search hit {}: {}", node, e);
        }
        return;
    };

    let result = tree.ensure_children(node, move |tree, children| {
        if token.is_cancelled() {
            return;
        }
        let hit = children
            .iter()
            .copied()
            .find(|child| tree.value(*child).is_some_and(|value| next(value)));
        let Some(hit) = hit else {
            tracing::trace!("No child of {} matches, path ends", node);
            return;
        };
        if let Err(e) = tree.set_expanded(node, true) {
            tracing::debug!("Reveal stopped at {}: {}", node, e);
            return;
        }
        reveal(tree, hit, path, token);
    });

    if let Err(e) = result {
        tracing::debug!("Reveal stopped at {}: {}", node, e);
    }
}
