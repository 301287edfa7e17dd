//! Defines the notifications a tree raises and the sink abstraction that receives them.

use std::fmt;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::tree::{NodeId, TriState};

/// The observable properties of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    Checked,
    Visible,
    Enabled,
    Expanded,
    Selected,
    Loading,
    Children,
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Property::Checked => "checked",
            Property::Visible => "visible",
            Property::Enabled => "enabled",
            Property::Expanded => "expanded",
            Property::Selected => "selected",
            Property::Loading => "loading",
            Property::Children => "children",
        };
        f.write_str(name)
    }
}

/// Events sent from the tree engine to the host.
///
/// Every event is raised on the owner task, after the state it describes has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    /// A single property of `node` changed.
    PropertyChanged { node: NodeId, property: Property },
    /// Terminal notification of a check action.
    ///
    /// Raised exactly once per effective `set_checked` call, after all downward and upward
    /// propagation has settled. `node` is the root and `state` its resulting checked state;
    /// `source` is the node the caller actually changed.
    CheckedChanged {
        node: NodeId,
        state: TriState,
        source: NodeId,
    },
}

/// A trait that abstracts the delivery of tree events.
/// This is "fire-and-forget" and doesn't return a result, simplifying its use.
pub trait EventSink: Send + Sync + 'static {
    fn send_event(&self, event: TreeEvent);
}

/// Implement the trait for a tokio channel, the usual bridge to a host event loop.
impl EventSink for mpsc::UnboundedSender<TreeEvent> {
    fn send_event(&self, event: TreeEvent) {
        // A closed receiver only means nobody is listening any more.
        if let Err(e) = self.send(event) {
            tracing::warn!("Failed to deliver tree event: {}", e);
        }
    }
}

/// A sink that drops every event. Used when the host does not observe the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn send_event(&self, _event: TreeEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_display_uses_lowercase_names() {
        assert_eq!(Property::Checked.to_string(), "checked");
        assert_eq!(Property::Children.to_string(), "children");
    }

    #[test]
    fn closed_channel_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel::<TreeEvent>();
        drop(rx);
        let node = NodeId::new(0, 0);
        tx.send_event(TreeEvent::PropertyChanged {
            node,
            property: Property::Visible,
        });
    }
}
