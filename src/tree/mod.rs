//! The tree engine: an arena of nodes with lazily-loaded children and propagated state.
//!
//! A `Tree<T>` is owned by a single task. All mutation and every notification happen on that
//! owner; only loader invocations run on background workers, and their results are queued back
//! to the owner (see [`Tree::process_next`]).

pub mod factory;
pub mod loader;
pub mod node;
mod propagation;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{Result, TreeError};
use crate::events::{EventSink, NullSink, Property, TreeEvent};

pub use factory::{DefaultFactory, NodeFactory, NodeSeed};
pub use loader::{child_loader, ChildLoader, ChildrenCallback, LoaderResult};
pub use node::{Node, NodeId, TriState};

use loader::Completion;
use node::ChildState;

/// One arena slot. The generation is bumped every time the slot's node is released.
struct Slot<T> {
    generation: u32,
    node: Option<Node<T>>,
}

/// A lazily-loaded tree with tri-state checked/visible propagation.
pub struct Tree<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    root: NodeId,
    factory: Arc<dyn NodeFactory<T>>,
    sink: Arc<dyn EventSink>,
    load_on_expand: bool,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    next_ticket: u64,
    /// Tickets whose completion message has not been received yet.
    outstanding: Vec<u64>,
}

impl<T> Tree<T> {
    /// Creates a tree whose root holds `value`.
    ///
    /// With a loader the root starts with the unloaded marker; without one it is a leaf.
    pub fn new(value: T, loader: Option<ChildLoader<T>>) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let root = NodeId::new(0, 0);
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::new(None, value, loader)),
            }],
            free: Vec::new(),
            root,
            factory: Arc::new(DefaultFactory),
            sink: Arc::new(NullSink),
            load_on_expand: true,
            completion_tx,
            completion_rx,
            next_ticket: 0,
            outstanding: Vec::new(),
        }
    }

    /// Sets the factory used to build every child created from now on.
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: NodeFactory<T> + 'static,
    {
        self.factory = Arc::new(factory);
        self
    }

    /// Sets the receiver of property-changed and checked-changed events.
    pub fn with_sink<S: EventSink>(mut self, sink: S) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Whether expanding a node that still holds the unloaded marker starts a fetch.
    pub fn with_load_on_expand(mut self, enabled: bool) -> Self {
        self.load_on_expand = enabled;
        self
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, the root included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.node(id).map(Node::value)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// The loaded children of `id`. Empty for unknown ids and for nodes not loaded yet.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    pub fn is_loaded(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(Node::is_loaded)
    }

    /// Ancestors of `id`, nearest first, ending with the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            result.push(parent);
            current = self.parent(parent);
        }
        result
    }

    /// Finds the first loaded child of `id` whose payload satisfies `predicate`.
    pub fn find_child<P>(&self, id: NodeId, predicate: P) -> Option<NodeId>
    where
        P: Fn(&T) -> bool,
    {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.value(*child).is_some_and(&predicate))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node<T>> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
            .ok_or(TreeError::NodeNotFound(id))
    }

    pub(crate) fn require(&self, id: NodeId) -> Result<&Node<T>> {
        self.node(id).ok_or(TreeError::NodeNotFound(id))
    }

    pub(crate) fn insert(&mut self, node: Node<T>) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId::new(index, 0)
        }
    }

    /// Releases every descendant of `id` (not `id` itself).
    pub(crate) fn release_descendants(&mut self, children: Vec<NodeId>) {
        let mut stack = children;
        while let Some(id) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(id.index())
                .filter(|slot| slot.generation == id.generation())
            else {
                continue;
            };
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index() as u32);
                if let ChildState::Loaded(ids) = node.children {
                    stack.extend(ids);
                }
            }
        }
    }

    pub(crate) fn notify(&self, node: NodeId, property: Property) {
        self.sink
            .send_event(TreeEvent::PropertyChanged { node, property });
    }

    pub(crate) fn emit(&self, event: TreeEvent) {
        self.sink.send_event(event);
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("len", &self.len())
            .field("pending_fetches", &self.outstanding.len())
            .finish()
    }
}
