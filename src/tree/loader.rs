//! Lazy child loading: the fetch contract, the per-node fetch guard and reset.
//!
//! A fetch runs the node's loader on a blocking worker. The worker fills a result slot shared
//! with the tree and then posts a [`Completion`] to the owner's channel; the owner applies it
//! the next time it pumps the tree. Nothing but the loader call ever runs off the owner.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use tokio::sync::mpsc;

use super::node::{ChildState, Node, NodeId};
use super::Tree;
use crate::error::Result;
use crate::events::Property;
use crate::utils::spawn_background;

/// Produces the direct children of a payload.
///
/// Invoked on a background worker. An `Err` is logged and treated as "no children".
pub type ChildLoader<T> = Arc<dyn Fn(&T) -> anyhow::Result<Vec<LoaderResult<T>>> + Send + Sync>;

/// One child produced by a loader, with the loader for its own children (if it can have any).
pub struct LoaderResult<T> {
    pub child: T,
    pub loader: Option<ChildLoader<T>>,
}

impl<T> LoaderResult<T> {
    pub fn new(child: T, loader: Option<ChildLoader<T>>) -> Self {
        Self { child, loader }
    }

    /// A child that can never have children of its own.
    pub fn leaf(child: T) -> Self {
        Self::new(child, None)
    }
}

/// Wraps a closure as a [`ChildLoader`].
pub fn child_loader<T, F>(f: F) -> ChildLoader<T>
where
    F: Fn(&T) -> anyhow::Result<Vec<LoaderResult<T>>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Continuation run on the owner once the children of a node are known.
pub type ChildrenCallback<T> = Box<dyn FnOnce(&mut Tree<T>, &[NodeId]) + Send>;

/// Result slot shared between the owner and the worker of one fetch.
pub(crate) struct FetchSlot<T> {
    result: Mutex<Option<Vec<LoaderResult<T>>>>,
    ready: Condvar,
}

impl<T> FetchSlot<T> {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn fill(&self, children: Vec<LoaderResult<T>>) {
        let mut guard = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(children);
        self.ready.notify_all();
    }

    fn take(&self) -> Option<Vec<LoaderResult<T>>> {
        self.result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Blocks until the worker has filled the slot.
    fn wait(&self) -> Vec<LoaderResult<T>> {
        let mut guard = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(children) = guard.take() {
                return children;
            }
            guard = self
                .ready
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// An in-flight fetch: its ticket, its result slot and the callbacks waiting on it.
pub(crate) struct Fetch<T> {
    ticket: u64,
    slot: Arc<FetchSlot<T>>,
    waiters: Vec<ChildrenCallback<T>>,
}

/// Posted by a worker once its result slot is filled.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Completion {
    node: NodeId,
    ticket: u64,
}

enum Lookup<T> {
    Ready(Vec<NodeId>),
    Inline(ChildLoader<T>, T),
    Wait(Arc<FetchSlot<T>>),
}

impl<T: Clone + Send + 'static> Tree<T> {
    /// Runs `callback` with the children of `id`, fetching them first if needed.
    ///
    /// Loaded nodes take the fast path and the callback runs before this returns. An unloaded
    /// node starts a background fetch; a node with a fetch in flight queues the callback behind
    /// it. Queued callbacks run on the owner, in request order, when the completion is applied.
    pub fn ensure_children<F>(&mut self, id: NodeId, callback: F) -> Result<()>
    where
        F: FnOnce(&mut Tree<T>, &[NodeId]) + Send + 'static,
    {
        let node = self.node_mut(id)?;
        let loaded = match &mut node.children {
            ChildState::Loaded(ids) => Some(ids.clone()),
            ChildState::Loading(fetch) => {
                tracing::debug!(node = %id, "Fetch in flight, queueing callback");
                fetch.waiters.push(Box::new(callback));
                return Ok(());
            }
            ChildState::Unloaded => None,
        };
        match loaded {
            Some(ids) => callback(self, &ids),
            None => self.start_fetch(id, Some(Box::new(callback)))?,
        }
        Ok(())
    }

    /// Returns the children of `id`, loading them synchronously if needed.
    ///
    /// If a background fetch is already in flight this blocks on its result instead of
    /// invoking the loader a second time.
    pub fn get_children(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        let node = self.require(id)?;
        let lookup = match &node.children {
            ChildState::Loaded(ids) => Lookup::Ready(ids.clone()),
            ChildState::Loading(fetch) => Lookup::Wait(fetch.slot.clone()),
            ChildState::Unloaded => match node.loader.clone() {
                Some(loader) => Lookup::Inline(loader, node.value.clone()),
                None => Lookup::Ready(Vec::new()),
            },
        };

        match lookup {
            Lookup::Ready(ids) => Ok(ids),
            Lookup::Inline(loader, value) => {
                tracing::debug!(node = %id, "Loading children inline");
                self.node_mut(id)?.is_loading = true;
                self.notify(id, Property::Loading);
                let children = run_loader(&loader, &value);
                self.finish_fetch(id, Vec::new(), children)
            }
            Lookup::Wait(slot) => {
                tracing::debug!(node = %id, "Waiting on in-flight fetch");
                let children = slot.wait();
                let waiters = match std::mem::replace(
                    &mut self.node_mut(id)?.children,
                    ChildState::Loaded(Vec::new()),
                ) {
                    ChildState::Loading(fetch) => fetch.waiters,
                    _ => Vec::new(),
                };
                self.finish_fetch(id, waiters, children)
            }
        }
    }

    /// Drops the loaded children of `id` so that the next access fetches them again.
    ///
    /// Nodes without a loader keep their children. A fetch in flight is abandoned: its queued
    /// callbacks are dropped and its completion is discarded when it arrives.
    pub fn reset(&mut self, id: NodeId) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.loader.is_some() {
            let previous = std::mem::replace(&mut node.children, ChildState::Unloaded);
            let was_loading = std::mem::replace(&mut node.is_loading, false);
            match previous {
                ChildState::Loaded(ids) => self.release_descendants(ids),
                ChildState::Loading(fetch) => {
                    tracing::debug!(
                        node = %id,
                        ticket = fetch.ticket,
                        dropped_callbacks = fetch.waiters.len(),
                        "Abandoning in-flight fetch"
                    );
                }
                ChildState::Unloaded => {}
            }
            if was_loading {
                self.notify(id, Property::Loading);
            }
        }
        self.notify(id, Property::Children);
        Ok(())
    }

    /// Waits for the next fetch completion and applies it.
    ///
    /// Returns `false` immediately when no fetch is outstanding.
    pub async fn process_next(&mut self) -> bool {
        if self.outstanding.is_empty() {
            return false;
        }
        match self.completion_rx.recv().await {
            Some(completion) => {
                self.apply_completion(completion);
                true
            }
            None => false,
        }
    }

    /// Applies every completion that has already arrived, without waiting.
    ///
    /// Returns the number of completions processed.
    pub fn process_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.apply_completion(completion);
            processed += 1;
        }
        processed
    }

    /// Pumps completions until no fetch is outstanding, including fetches started by callbacks.
    pub async fn settle(&mut self) {
        while self.process_next().await {}
    }

    /// Whether any fetch has a completion that has not been applied yet.
    pub fn has_pending_fetches(&self) -> bool {
        !self.outstanding.is_empty()
    }

    pub(crate) fn completions(&mut self) -> &mut mpsc::UnboundedReceiver<Completion> {
        &mut self.completion_rx
    }

    /// Starts a background fetch for a node holding the unloaded marker.
    pub(crate) fn start_fetch(
        &mut self,
        id: NodeId,
        waiter: Option<ChildrenCallback<T>>,
    ) -> Result<()> {
        let ticket = self.next_ticket;
        let node = self.node_mut(id)?;
        let Some(loader) = node.loader.clone() else {
            node.children = ChildState::Loaded(Vec::new());
            if let Some(waiter) = waiter {
                waiter(self, &[]);
            }
            return Ok(());
        };
        let value = node.value.clone();
        let slot = Arc::new(FetchSlot::new());
        node.children = ChildState::Loading(Fetch {
            ticket,
            slot: slot.clone(),
            waiters: waiter.into_iter().collect(),
        });
        node.is_loading = true;

        self.next_ticket += 1;
        self.outstanding.push(ticket);
        self.notify(id, Property::Loading);
        tracing::debug!(node = %id, ticket, "Starting background fetch");

        spawn_worker(
            loader,
            value,
            slot,
            self.completion_tx.clone(),
            Completion { node: id, ticket },
        );
        Ok(())
    }

    pub(crate) fn apply_completion(&mut self, completion: Completion) {
        let Completion { node: id, ticket } = completion;
        self.outstanding.retain(|t| *t != ticket);

        let is_current = self.node(id).is_some_and(|node| {
            matches!(&node.children, ChildState::Loading(fetch) if fetch.ticket == ticket)
        });
        if !is_current {
            tracing::debug!(node = %id, ticket, "Discarding stale fetch completion");
            return;
        }

        let Ok(node) = self.node_mut(id) else {
            return;
        };
        let ChildState::Loading(fetch) =
            std::mem::replace(&mut node.children, ChildState::Loaded(Vec::new()))
        else {
            return;
        };
        let children = fetch.slot.take().unwrap_or_default();
        tracing::debug!(node = %id, ticket, count = children.len(), "Fetch completed");
        if let Err(e) = self.finish_fetch(id, fetch.waiters, children) {
            tracing::warn!("Failed to attach fetched children: {}", e);
        }
    }

    /// Attaches loader output to `id`, clears the loading flag and serves the waiters.
    ///
    /// A parent left indeterminate (for example by a reset) is re-derived from the new children.
    fn finish_fetch(
        &mut self,
        id: NodeId,
        waiters: Vec<ChildrenCallback<T>>,
        children: Vec<LoaderResult<T>>,
    ) -> Result<Vec<NodeId>> {
        let ids = self.attach_children(id, children)?;
        self.rederive_from_children(id)?;

        let was_loading = std::mem::replace(&mut self.node_mut(id)?.is_loading, false);
        self.notify(id, Property::Children);
        if was_loading {
            self.notify(id, Property::Loading);
        }

        for waiter in waiters {
            // An earlier waiter may have reset the node.
            let current = self.children(id).to_vec();
            waiter(self, &current);
        }
        Ok(ids)
    }

    /// Builds the children through the factory, in loader order.
    ///
    /// Each child inherits the parent's checked and visible state when it is definite.
    fn attach_children(
        &mut self,
        id: NodeId,
        children: Vec<LoaderResult<T>>,
    ) -> Result<Vec<NodeId>> {
        let factory = self.factory.clone();
        let (checked, visible) = {
            let parent = self.require(id)?;
            (parent.is_checked, parent.is_visible)
        };

        let mut ids = Vec::with_capacity(children.len());
        for LoaderResult { child, loader } in children {
            let seed = factory.create(self.require(id)?, child, loader);
            let mut node = Node::new(Some(id), seed.value, seed.loader);
            node.is_enabled = seed.is_enabled;
            node.is_selected = seed.is_selected;
            if checked.is_definite() {
                node.is_checked = checked;
            }
            if visible.is_definite() {
                node.is_visible = visible;
            }
            ids.push(self.insert(node));
        }

        self.node_mut(id)?.children = ChildState::Loaded(ids.clone());
        Ok(ids)
    }
}

/// Calls the loader, turning failures and panics into an empty child list.
fn run_loader<T>(loader: &ChildLoader<T>, value: &T) -> Vec<LoaderResult<T>> {
    match panic::catch_unwind(AssertUnwindSafe(|| loader(value))) {
        Ok(Ok(children)) => children,
        Ok(Err(e)) => {
            tracing::warn!("Child loader failed, treating as empty: {:#}", e);
            Vec::new()
        }
        Err(_) => {
            tracing::error!("Child loader panicked, treating as empty");
            Vec::new()
        }
    }
}

fn spawn_worker<T: Send + 'static>(
    loader: ChildLoader<T>,
    value: T,
    slot: Arc<FetchSlot<T>>,
    tx: mpsc::UnboundedSender<Completion>,
    completion: Completion,
) {
    let fallback_slot = slot.clone();
    let fallback_tx = tx.clone();
    let job = move || {
        slot.fill(run_loader(&loader, &value));
        if tx.send(completion).is_err() {
            tracing::debug!("Tree dropped before fetch completed");
        }
    };

    if let Err(e) = spawn_background("lazy-tree-loader", job) {
        tracing::error!("Failed to spawn loader worker: {}", e);
        fallback_slot.fill(Vec::new());
        let _ = fallback_tx.send(completion);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc as std_mpsc;

    use tracing_test::traced_test;

    use super::*;
    use crate::events::TreeEvent;
    use crate::tree::test_support::*;
    use crate::tree::TriState;

    fn counting_flat_loader(names: &[&str], calls: Arc<AtomicUsize>) -> ChildLoader<String> {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        child_loader(move |_: &String| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(names.iter().cloned().map(LoaderResult::leaf).collect())
        })
    }

    /// A loader that blocks until the test releases it through the returned sender.
    fn gated_loader(names: &[&str]) -> (ChildLoader<String>, std_mpsc::Sender<()>) {
        let (tx, rx) = std_mpsc::channel::<()>();
        let rx = Mutex::new(rx);
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let loader = child_loader(move |_: &String| {
            let _ = rx.lock().unwrap().recv();
            Ok(names.iter().cloned().map(LoaderResult::leaf).collect())
        });
        (loader, tx)
    }

    fn recorder() -> (Arc<Mutex<Vec<Vec<NodeId>>>>, impl Fn() -> ChildrenCallback<String>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handle = seen.clone();
        let make = move || -> ChildrenCallback<String> {
            let seen = handle.clone();
            Box::new(move |_tree: &mut Tree<String>, ids: &[NodeId]| {
                seen.lock().unwrap().push(ids.to_vec());
            })
        };
        (seen, make)
    }

    #[test]
    fn ensure_children_on_leaf_runs_callback_immediately() {
        let mut tree = Tree::new("leaf".to_string(), None);
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        tree.ensure_children(tree.root(), move |_, ids| {
            assert!(ids.is_empty());
            flag.store(true, Ordering::SeqCst);
        })
        .unwrap();
        assert!(ran.load(Ordering::SeqCst));
        assert!(!tree.has_pending_fetches());
    }

    #[tokio::test]
    async fn concurrent_ensure_children_fetch_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_flat_loader(&["a", "b", "c"], calls.clone());
        let mut tree = Tree::new("root".to_string(), Some(loader));
        let root = tree.root();
        let (seen, make) = recorder();

        tree.ensure_children(root, make()).unwrap();
        assert!(tree.node(root).unwrap().is_loading());
        tree.ensure_children(root, make()).unwrap();
        tree.settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
        assert_eq!(seen[0].len(), 3);
        assert!(!tree.node(root).unwrap().is_loading());
        let names: Vec<&str> = tree
            .children(root)
            .iter()
            .map(|id| tree.value(*id).unwrap().as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn get_children_during_fetch_waits_for_the_same_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_flat_loader(&["x", "y"], calls.clone());
        let mut tree = Tree::new("root".to_string(), Some(loader));
        let root = tree.root();
        let (seen, make) = recorder();

        tree.ensure_children(root, make()).unwrap();
        let ids = tree.get_children(root).unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(seen.lock().unwrap().as_slice(), &[ids.clone()]);

        // The worker's completion still arrives and must not load a second time.
        tree.settle().await;
        assert_eq!(tree.children(root), ids.as_slice());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!tree.has_pending_fetches());
    }

    #[test]
    fn get_children_runs_loader_inline_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_flat_loader(&["one"], calls.clone());
        let mut tree = Tree::new("root".to_string(), Some(loader));
        let root = tree.root();

        let first = tree.get_children(root).unwrap();
        let second = tree.get_children(root).unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!tree.has_pending_fetches());
    }

    #[test]
    fn ensure_children_without_runtime_uses_a_thread() {
        let mut tree = flat_tree(&["a", "b"]);
        let root = tree.root();
        let (seen, make) = recorder();

        tree.ensure_children(root, make()).unwrap();
        assert!(tree.has_pending_fetches());
        let ids = tree.get_children(root).unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), &[ids]);
    }

    #[tokio::test]
    async fn reset_during_fetch_discards_late_completion() {
        let (loader, release) = gated_loader(&["late"]);
        let mut tree = Tree::new("root".to_string(), Some(loader));
        let root = tree.root();
        let (seen, make) = recorder();

        tree.ensure_children(root, make()).unwrap();
        tree.reset(root).unwrap();
        assert!(tree.node(root).unwrap().has_unloaded_marker());
        assert!(!tree.node(root).unwrap().is_loading());

        release.send(()).unwrap();
        tree.settle().await;

        assert!(seen.lock().unwrap().is_empty());
        assert!(tree.node(root).unwrap().has_unloaded_marker());
        assert_eq!(tree.len(), 1);

        // A fresh request fetches again.
        release.send(()).unwrap();
        tree.ensure_children(root, make()).unwrap();
        tree.settle().await;
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn reset_releases_the_whole_subtree() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = table_loader(
            &[
                ("root", "src", true),
                ("root", "README", false),
                ("src", "lib.rs", false),
                ("src", "main.rs", false),
            ],
            calls,
        );
        let mut tree = Tree::new("root".to_string(), Some(loader));
        let root = tree.root();
        tree.get_children(root).unwrap();
        let src = child(&tree, root, "src");
        tree.get_children(src).unwrap();
        assert_eq!(tree.len(), 5);

        tree.reset(root).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(src));
    }

    #[test]
    fn reset_without_loader_keeps_children_but_notifies() {
        let sink = RecordingSink::default();
        let mut tree = Tree::new("plain".to_string(), None).with_sink(sink.clone());
        let root = tree.root();
        tree.reset(root).unwrap();
        assert!(tree.is_loaded(root));
        assert_eq!(
            sink.take(),
            vec![TreeEvent::PropertyChanged {
                node: root,
                property: Property::Children
            }]
        );
    }

    #[test]
    #[traced_test]
    fn loader_failure_yields_empty_children() {
        let loader = child_loader(|_: &String| Err(anyhow::anyhow!("permission denied: boom")));
        let mut tree = Tree::new("root".to_string(), Some(loader));
        let root = tree.root();

        let ids = tree.get_children(root).unwrap();
        assert!(ids.is_empty());
        assert!(tree.is_loaded(root));
        assert!(logs_contain("boom"));
    }

    #[test]
    fn loader_panic_yields_empty_children() {
        let loader = child_loader(|_: &String| -> anyhow::Result<Vec<LoaderResult<String>>> {
            panic!("loader exploded")
        });
        let mut tree = Tree::new("root".to_string(), Some(loader));
        let root = tree.root();
        assert!(tree.get_children(root).unwrap().is_empty());
        assert!(tree.is_loaded(root));
    }

    #[test]
    fn loaded_children_inherit_definite_parent_state() {
        let mut tree = flat_tree(&["a", "b"]);
        let root = tree.root();
        tree.set_checked(root, TriState::True).unwrap();
        tree.set_visible(root, TriState::False).unwrap();

        for id in tree.get_children(root).unwrap() {
            let node = tree.node(id).unwrap();
            assert_eq!(node.is_checked(), TriState::True);
            assert_eq!(node.is_visible(), TriState::False);
        }
    }

    #[tokio::test]
    async fn fetch_raises_loading_and_children_events() {
        let sink = RecordingSink::default();
        let mut tree = flat_tree(&["a"]).with_sink(sink.clone());
        let root = tree.root();

        tree.ensure_children(root, |_, _| {}).unwrap();
        tree.settle().await;

        let changed = |property| TreeEvent::PropertyChanged {
            node: root,
            property,
        };
        assert_eq!(
            sink.take(),
            vec![
                changed(Property::Loading),
                changed(Property::Children),
                changed(Property::Loading),
            ]
        );
    }

    #[test]
    fn inline_load_raises_the_same_events() {
        let sink = RecordingSink::default();
        let mut tree = flat_tree(&["a"]).with_sink(sink.clone());
        let root = tree.root();

        tree.get_children(root).unwrap();
        assert!(!tree.node(root).unwrap().is_loading());

        let changed = |property| TreeEvent::PropertyChanged {
            node: root,
            property,
        };
        assert_eq!(
            sink.take(),
            vec![
                changed(Property::Loading),
                changed(Property::Children),
                changed(Property::Loading),
            ]
        );
    }

    #[test]
    fn reload_after_reset_rederives_indeterminate_parent() {
        let mut tree = flat_tree(&["a", "b"]);
        let root = tree.root();
        tree.get_children(root).unwrap();
        let a = child(&tree, root, "a");
        tree.set_checked(a, TriState::True).unwrap();
        assert_eq!(tree.node(root).unwrap().is_checked(), TriState::Indeterminate);

        tree.reset(root).unwrap();
        let ids = tree.get_children(root).unwrap();

        for id in &ids {
            assert_eq!(tree.node(*id).unwrap().is_checked(), TriState::False);
        }
        assert_eq!(tree.node(root).unwrap().is_checked(), TriState::False);
    }

    #[tokio::test]
    async fn background_reload_after_reset_updates_ancestors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = table_loader(
            &[
                ("root", "src", true),
                ("root", "README", false),
                ("src", "lib.rs", false),
                ("src", "main.rs", false),
            ],
            calls,
        );
        let mut tree = Tree::new("root".to_string(), Some(loader));
        let root = tree.root();
        tree.get_children(root).unwrap();
        let src = child(&tree, root, "src");
        tree.get_children(src).unwrap();
        let lib = child(&tree, src, "lib.rs");
        tree.set_checked(lib, TriState::True).unwrap();
        assert_eq!(tree.node(root).unwrap().is_checked(), TriState::Indeterminate);

        tree.reset(src).unwrap();
        tree.ensure_children(src, |_, _| {}).unwrap();
        tree.settle().await;

        assert_eq!(tree.node(src).unwrap().is_checked(), TriState::False);
        assert_eq!(tree.node(root).unwrap().is_checked(), TriState::False);
    }

    #[test]
    fn unknown_node_is_an_error() {
        let mut tree = flat_tree(&[]);
        let missing = NodeId::new(9, 0);
        assert!(tree.get_children(missing).is_err());
        assert!(tree.reset(missing).is_err());
        assert!(tree.ensure_children(missing, |_, _| {}).is_err());
    }
}
