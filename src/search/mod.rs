//! Search-driven navigation: debounced queries, path reveal and cancellation.
//!
//! The navigator owns the tree. A search hides the whole tree, runs the configured
//! [`PathSearcher`] on a blocking worker and reveals every path it reports, loading the nodes
//! along the way. A newer search or a clear cancels every pending reveal of the previous one.

mod reveal;
pub mod token;

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::AppConfig;
use crate::error::Result;
use crate::tree::{Tree, TriState};
use crate::utils::spawn_background;

pub use token::SearchToken;

/// A test over a node payload, matching one root-exclusive path segment.
pub type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// The segments leading from the root (excluded) to one search hit.
pub type SearchPath<T> = Vec<Predicate<T>>;

/// Wraps a closure as a [`Predicate`].
pub fn predicate<T, F>(f: F) -> Predicate<T>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    Box::new(f)
}

/// Produces the paths matching a query.
///
/// Runs on a background worker. Implementations should poll `token` and stop early once it is
/// cancelled; every path handed to `emit` is revealed as soon as the owner gets to it.
pub trait PathSearcher<T>: Send + Sync + 'static {
    fn search(&self, text: &str, token: &SearchToken, emit: &mut dyn FnMut(SearchPath<T>));
}

impl<T, F> PathSearcher<T> for F
where
    F: Fn(&str, &SearchToken, &mut dyn FnMut(SearchPath<T>)) + Send + Sync + 'static,
{
    fn search(&self, text: &str, token: &SearchToken, emit: &mut dyn FnMut(SearchPath<T>)) {
        self(text, token, emit)
    }
}

/// Policy for when a typed query turns into a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Quiet period after the last text change before a search fires.
    pub debounce: Duration,
    /// Minimum query length, in characters, after trimming.
    pub min_query_len: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(1),
            min_query_len: 3,
        }
    }
}

impl From<&AppConfig> for SearchSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.search_debounce_ms),
            min_query_len: config.min_search_length,
        }
    }
}

enum SearchMessage<T> {
    Path {
        token: SearchToken,
        path: SearchPath<T>,
    },
    Finished {
        token: SearchToken,
    },
}

enum Step<T> {
    Fetched(crate::tree::loader::Completion),
    Search(SearchMessage<T>),
    Debounce,
}

/// Drives search over a tree it owns.
pub struct SearchNavigator<T> {
    tree: Tree<T>,
    searcher: Option<Arc<dyn PathSearcher<T>>>,
    settings: SearchSettings,
    text: String,
    deadline: Option<Instant>,
    active: Option<SearchToken>,
    /// Searcher workers that have not reported `Finished` yet.
    running: usize,
    tx: mpsc::UnboundedSender<SearchMessage<T>>,
    rx: mpsc::UnboundedReceiver<SearchMessage<T>>,
}

impl<T: Clone + Send + 'static> SearchNavigator<T> {
    pub fn new(tree: Tree<T>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tree,
            searcher: None,
            settings: SearchSettings::default(),
            text: String::new(),
            deadline: None,
            active: None,
            running: 0,
            tx,
            rx,
        }
    }

    pub fn with_searcher<S: PathSearcher<T>>(mut self, searcher: S) -> Self {
        self.searcher = Some(Arc::new(searcher));
        self
    }

    pub fn with_settings(mut self, settings: SearchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn tree(&self) -> &Tree<T> {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree<T> {
        &mut self.tree
    }

    pub fn into_tree(self) -> Tree<T> {
        self.tree
    }

    pub fn settings(&self) -> SearchSettings {
        self.settings
    }

    pub fn search_text(&self) -> &str {
        &self.text
    }

    /// Whether a search is active and has not been cancelled.
    pub fn is_searching(&self) -> bool {
        self.active.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    /// Whether anything is left for [`SearchNavigator::step`] to do.
    pub fn has_pending_work(&self) -> bool {
        self.deadline.is_some() || self.running > 0 || self.tree.has_pending_fetches()
    }

    /// Records new query text and restarts the debounce timer.
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.deadline = Some(Instant::now() + self.settings.debounce);
    }

    /// Whether the current text would start a search.
    pub fn can_search(&self) -> bool {
        self.searcher.is_some() && self.text.trim().chars().count() >= self.settings.min_query_len
    }

    /// Starts a search for `text` right away, superseding any active search.
    pub fn search(&mut self, text: &str) -> Result<()> {
        self.cancel_search();
        let Some(searcher) = self.searcher.clone() else {
            tracing::debug!("No searcher configured, ignoring query {:?}", text);
            return Ok(());
        };

        let root = self.tree.root();
        self.tree.set_visible(root, TriState::False)?;

        let token = SearchToken::new();
        self.active = Some(token.clone());
        tracing::info!("Starting search for {:?}", text);

        let tx = self.tx.clone();
        let query = text.to_string();
        let job = move || {
            let mut emit = |path: SearchPath<T>| {
                let message = SearchMessage::Path {
                    token: token.clone(),
                    path,
                };
                if tx.send(message).is_err() {
                    tracing::debug!("Navigator dropped, discarding search hit");
                }
            };
            let walk = panic::catch_unwind(AssertUnwindSafe(|| {
                searcher.search(&query, &token, &mut emit)
            }));
            if walk.is_err() {
                tracing::error!("Searcher panicked while searching for {:?}", query);
            }
            let _ = tx.send(SearchMessage::Finished { token });
        };
        if let Err(e) = spawn_background("lazy-tree-search", job) {
            tracing::error!("Failed to spawn search worker: {}", e);
            return Ok(());
        }
        self.running += 1;
        Ok(())
    }

    /// Invalidates the active search. Its pending reveals become no-ops.
    pub fn cancel_search(&mut self) {
        if let Some(token) = self.active.take() {
            token.cancel();
            tracing::info!("Search cancelled");
        }
    }

    /// Cancels any search, collapses the top level, shows the whole tree and clears the text.
    pub fn clear_search(&mut self) -> Result<()> {
        self.cancel_search();
        self.deadline = None;

        let root = self.tree.root();
        for child in self.tree.children(root).to_vec() {
            self.tree.set_expanded(child, false)?;
            self.tree.update_expanded_children(child)?;
        }
        self.tree.set_visible(root, TriState::True)?;
        self.text.clear();
        Ok(())
    }

    /// Handles one unit of work: a fetch completion, a search message or the debounce expiry.
    ///
    /// Returns `false` when there is nothing left to wait for.
    pub async fn step(&mut self) -> bool {
        let fetching = self.tree.has_pending_fetches();
        let searching = self.running > 0;
        let deadline = self.deadline;

        let step = tokio::select! {
            Some(completion) = self.tree.completions().recv(), if fetching => Step::Fetched(completion),
            Some(message) = self.rx.recv(), if searching => Step::Search(message),
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => Step::Debounce,
            else => return false,
        };

        match step {
            Step::Fetched(completion) => self.tree.apply_completion(completion),
            Step::Search(message) => self.handle_message(message),
            Step::Debounce => self.fire_debounced(),
        }
        true
    }

    /// Runs [`SearchNavigator::step`] until no work is left.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    fn handle_message(&mut self, message: SearchMessage<T>) {
        match message {
            SearchMessage::Path { token, path } => {
                if token.is_cancelled() {
                    return;
                }
                let root = self.tree.root();
                reveal::reveal(&mut self.tree, root, VecDeque::from(path), token);
            }
            SearchMessage::Finished { token } => {
                self.running = self.running.saturating_sub(1);
                if !token.is_cancelled() {
                    tracing::info!("Search finished");
                }
            }
        }
    }

    fn fire_debounced(&mut self) {
        self.deadline = None;
        if !self.can_search() {
            return;
        }
        let text = self.text.clone();
        if let Err(e) = self.search(&text) {
            tracing::warn!("Search for {:?} failed: {}", text, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc as std_mpsc;
    use std::sync::Mutex;

    use super::*;
    use crate::tree::test_support::*;
    use crate::tree::{child_loader, ChildLoader, LoaderResult, NodeId};

    fn name_is(name: &'static str) -> Predicate<String> {
        predicate(move |value: &String| value == name)
    }

    /// root -> [src/, docs/, README]; src -> [main.rs, lib.rs]; docs -> [guide.md]
    fn project_tree() -> Tree<String> {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = table_loader(
            &[
                ("root", "src", true),
                ("root", "docs", true),
                ("root", "README", false),
                ("src", "main.rs", false),
                ("src", "lib.rs", false),
                ("docs", "guide.md", false),
            ],
            calls,
        );
        Tree::new("root".to_string(), Some(loader))
    }

    /// Maps a query to fixed paths, recording every query it receives.
    fn scripted_searcher(queries: Arc<Mutex<Vec<String>>>) -> impl PathSearcher<String> {
        move |text: &str, _token: &SearchToken, emit: &mut dyn FnMut(SearchPath<String>)| {
            queries.lock().unwrap().push(text.to_string());
            match text {
                "main" => emit(vec![name_is("src"), name_is("main.rs")]),
                "guide" => emit(vec![name_is("docs"), name_is("guide.md")]),
                "nothing" => emit(vec![name_is("nope")]),
                _ => {}
            }
        }
    }

    fn navigator() -> (SearchNavigator<String>, Arc<Mutex<Vec<String>>>) {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let nav = SearchNavigator::new(project_tree())
            .with_searcher(scripted_searcher(queries.clone()));
        (nav, queries)
    }

    fn named(tree: &Tree<String>, path: &[&str]) -> NodeId {
        path.iter()
            .fold(tree.root(), |parent, name| child(tree, parent, name))
    }

    fn visible(tree: &Tree<String>, path: &[&str]) -> TriState {
        tree.node(named(tree, path)).unwrap().is_visible()
    }

    fn expanded(tree: &Tree<String>, path: &[&str]) -> bool {
        tree.node(named(tree, path)).unwrap().is_expanded()
    }

    #[tokio::test]
    async fn search_reveals_the_matching_leaf() {
        let (mut nav, _) = navigator();
        nav.search("main").unwrap();
        nav.settle().await;

        let tree = nav.tree();
        assert!(expanded(tree, &[]));
        assert!(expanded(tree, &["src"]));
        assert_eq!(visible(tree, &["src", "main.rs"]), TriState::True);
        assert_eq!(visible(tree, &["src", "lib.rs"]), TriState::False);
        assert_eq!(visible(tree, &["README"]), TriState::False);
        assert_eq!(visible(tree, &["docs"]), TriState::False);
        assert_eq!(visible(tree, &["src"]), TriState::Indeterminate);
        assert_eq!(visible(tree, &[]), TriState::Indeterminate);
        assert!(!nav.has_pending_work());
    }

    #[tokio::test]
    async fn path_without_match_ends_silently() {
        let (mut nav, _) = navigator();
        nav.search("nothing").unwrap();
        nav.settle().await;

        let tree = nav.tree();
        assert_eq!(visible(tree, &[]), TriState::False);
        assert!(!expanded(tree, &[]));
        assert!(tree
            .children(tree.root())
            .iter()
            .all(|id| tree.node(*id).unwrap().is_visible() == TriState::False));
    }

    /// Like `project_tree`, but loading `src` blocks until the returned sender fires.
    fn tree_with_gated_src() -> (Tree<String>, std_mpsc::Sender<()>) {
        let (release, gate) = std_mpsc::channel::<()>();
        let gate = Arc::new(Mutex::new(gate));
        let leaves = |names: &[&str]| -> Vec<LoaderResult<String>> {
            names.iter().map(|n| LoaderResult::leaf(n.to_string())).collect()
        };
        let src: ChildLoader<String> = child_loader(move |_: &String| {
            let _ = gate.lock().unwrap().recv();
            Ok(leaves(&["main.rs", "lib.rs"]))
        });
        let docs: ChildLoader<String> =
            child_loader(move |_: &String| Ok(leaves(&["guide.md"])));
        let root = child_loader(move |_: &String| {
            Ok(vec![
                LoaderResult::new("src".to_string(), Some(src.clone())),
                LoaderResult::new("docs".to_string(), Some(docs.clone())),
                LoaderResult::leaf("README".to_string()),
            ])
        });
        (Tree::new("root".to_string(), Some(root)), release)
    }

    #[tokio::test]
    async fn newer_search_cancels_pending_reveals() {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let (tree, release) = tree_with_gated_src();
        let mut nav = SearchNavigator::new(tree).with_searcher(scripted_searcher(queries));

        nav.search("main").unwrap();
        // Step until the first search is parked on the src fetch.
        loop {
            assert!(nav.step().await, "ran out of work before src started loading");
            let tree = nav.tree();
            let parked = tree
                .find_child(tree.root(), |v| v == "src")
                .and_then(|src| tree.node(src))
                .is_some_and(|src| src.is_loading());
            if parked {
                break;
            }
        }

        nav.search("guide").unwrap();
        release.send(()).unwrap();
        nav.settle().await;

        let tree = nav.tree();
        assert!(!expanded(tree, &["src"]));
        assert_eq!(visible(tree, &["src", "main.rs"]), TriState::False);
        assert_eq!(visible(tree, &["src"]), TriState::False);
        assert!(expanded(tree, &["docs"]));
        assert_eq!(visible(tree, &["docs", "guide.md"]), TriState::True);
    }

    #[tokio::test(start_paused = true)]
    async fn typing_is_debounced_into_one_search() {
        let (mut nav, queries) = navigator();
        let started = Instant::now();

        nav.set_search_text("ma");
        tokio::time::advance(Duration::from_millis(400)).await;
        nav.set_search_text("mai");
        tokio::time::advance(Duration::from_millis(400)).await;
        nav.set_search_text("main");
        nav.settle().await;

        assert_eq!(queries.lock().unwrap().as_slice(), &["main".to_string()]);
        assert!(started.elapsed() >= Duration::from_millis(1800));
        assert_eq!(visible(nav.tree(), &["src", "main.rs"]), TriState::True);
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_never_searches() {
        let (mut nav, queries) = navigator();
        nav.set_search_text("  ab  ");
        assert!(!nav.can_search());
        nav.settle().await;

        assert!(queries.lock().unwrap().is_empty());
        assert_eq!(
            nav.tree().node(nav.tree().root()).unwrap().is_visible(),
            TriState::True
        );
    }

    #[test]
    fn can_search_requires_a_searcher() {
        let mut nav = SearchNavigator::new(project_tree());
        nav.set_search_text("main.rs");
        assert!(!nav.can_search());

        let custom = SearchSettings {
            debounce: Duration::from_millis(10),
            min_query_len: 8,
        };
        let (nav, _) = navigator();
        let mut nav = nav.with_settings(custom);
        nav.set_search_text("main.rs");
        assert!(!nav.can_search());
        nav.set_search_text("main.rs!");
        assert!(nav.can_search());
    }

    #[tokio::test]
    async fn clear_search_restores_the_tree() {
        let (mut nav, _) = navigator();
        nav.search("main").unwrap();
        nav.settle().await;
        assert!(expanded(nav.tree(), &["src"]));

        nav.set_search_text("main.r");
        nav.clear_search().unwrap();
        let tree = nav.tree();
        assert!(!expanded(tree, &["src"]));
        assert_eq!(visible(tree, &[]), TriState::True);
        assert_eq!(visible(tree, &["src", "lib.rs"]), TriState::True);
        assert_eq!(visible(tree, &["docs"]), TriState::True);
        assert_eq!(nav.search_text(), "");
        assert!(!nav.is_searching());
        assert!(!nav.has_pending_work());
    }

    #[tokio::test]
    async fn panicking_searcher_still_finishes() {
        let searcher =
            |text: &str, _token: &SearchToken, emit: &mut dyn FnMut(SearchPath<String>)| {
                emit(vec![name_is("src"), name_is("main.rs")]);
                if !text.is_empty() {
                    panic!("searcher failed mid-walk");
                }
            };
        let mut nav = SearchNavigator::new(project_tree()).with_searcher(searcher);
        nav.search("main").unwrap();

        tokio::time::timeout(Duration::from_secs(5), nav.settle())
            .await
            .expect("settle must return after a searcher panic");
        assert!(!nav.has_pending_work());
        assert!(nav.is_searching());
        assert_eq!(visible(nav.tree(), &["src", "main.rs"]), TriState::True);
    }

    #[test]
    fn settings_follow_the_config() {
        let config = AppConfig {
            search_debounce_ms: 250,
            min_search_length: 2,
            ..AppConfig::default()
        };
        let settings = SearchSettings::from(&config);
        assert_eq!(settings.debounce, Duration::from_millis(250));
        assert_eq!(settings.min_query_len, 2);
        assert_eq!(SearchSettings::default().debounce, Duration::from_secs(1));
    }
}
