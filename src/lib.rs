//! A lazily-loaded, tri-state selection tree engine.
//!
//! [`tree::Tree`] holds the nodes and implements checked/visible propagation and on-demand
//! child loading. [`search::SearchNavigator`] reveals search hits in a tree it owns.
//! [`fs`] provides the file-system instantiation used by the `lazy-tree` binary.

pub mod config;
pub mod error;
pub mod events;
pub mod fs;
pub mod search;
pub mod tree;
pub mod utils;
pub mod view_model;

pub use error::{Result, TreeError};
pub use events::{EventSink, NullSink, Property, TreeEvent};
pub use search::{predicate, PathSearcher, SearchNavigator, SearchPath, SearchSettings, SearchToken};
pub use tree::{child_loader, ChildLoader, LoaderResult, Node, NodeId, Tree, TriState};
