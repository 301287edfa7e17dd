//! Defines the custom error type for the tree engine.

use thiserror::Error;

use crate::events::Property;
use crate::tree::NodeId;

/// Result type alias used throughout the tree engine.
pub type Result<T> = std::result::Result<T, TreeError>;

/// The primary error type for tree operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// An attempt to force a derived tri-state property to indeterminate.
    ///
    /// Indeterminate is computed from the children and can never be set directly.
    #[error("Cannot set {0} to indeterminate directly")]
    IndeterminateNotSettable(Property),

    /// The id refers to a node that never existed or was released by a reset.
    #[error("Node {0} does not exist")]
    NodeNotFound(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indeterminate_error_display() {
        let err = TreeError::IndeterminateNotSettable(Property::Checked);
        assert_eq!(err.to_string(), "Cannot set checked to indeterminate directly");
    }

    #[test]
    fn node_not_found_display() {
        let err = TreeError::NodeNotFound(NodeId::new(4, 2));
        assert_eq!(err.to_string(), "Node 4v2 does not exist");
    }
}
