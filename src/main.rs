use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lazy_tree::config::{settings, AppConfig};
use lazy_tree::fs::{self, FileSystemSearcher, FsEntry, FsOptions};
use lazy_tree::view_model::{render_ascii, NodeView, RenderOptions};
use lazy_tree::{NodeId, SearchNavigator, SearchSettings, Tree, TriState};

/// Browse a directory as a lazily-loaded checkbox tree.
#[derive(Parser, Debug)]
#[command(name = "lazy-tree", version, about)]
struct Cli {
    /// Root directory to display (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Reveal every entry whose name matches this query (substring, or glob with * ? [ {)
    #[arg(long)]
    search: Option<String>,

    /// Check an entry given relative to the root; may be repeated
    #[arg(long = "check", value_name = "REL")]
    check: Vec<PathBuf>,

    /// Number of directory levels to load before printing
    #[arg(long, default_value_t = 1)]
    depth: usize,

    /// Print a JSON snapshot instead of the ASCII tree
    #[arg(long)]
    json: bool,

    /// Read settings from this file instead of the default config location
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => settings::load_config_from(path)?,
        None => AppConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Using default config: {:#}", e);
            AppConfig::default()
        }),
    };

    let mut tree = fs::open_tree(&cli.path, &config)?;
    let root = tree.root();
    let root_path = tree
        .value(root)
        .map(|entry| entry.path.clone())
        .context("Tree has no root entry")?;

    preload(&mut tree, cli.depth)?;

    for relative in &cli.check {
        match fs::resolve(&mut tree, relative)? {
            Some(id) => tree.set_checked(id, TriState::True)?,
            None => tracing::warn!("{} is not listed, not checking it", relative.display()),
        }
    }

    let mut options = RenderOptions::default();
    if let Some(query) = &cli.search {
        let searcher = FileSystemSearcher::new(
            Arc::new(FsOptions::new(root_path.clone(), &config)),
            config.case_sensitive_search,
        );
        let mut navigator = SearchNavigator::new(tree)
            .with_searcher(searcher)
            .with_settings(SearchSettings::from(&config));

        if query.trim().chars().count() < config.min_search_length {
            anyhow::bail!(
                "Search query must be at least {} characters",
                config.min_search_length
            );
        }
        navigator.search(query)?;
        navigator.settle().await;
        tree = navigator.into_tree();
        options = RenderOptions {
            visible_only: true,
            expanded_only: true,
        };
    }

    let label = |entry: &FsEntry| entry.to_string();
    if cli.json {
        let view = NodeView::build(&tree, root, &label).context("Tree has no root node")?;
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render_ascii(&tree, root, label, options));
    }

    if cli.config.is_none() {
        config.last_directory = Some(root_path);
        if let Err(e) = settings::save_config(&config) {
            tracing::warn!("Could not remember last directory: {:#}", e);
        }
    }
    Ok(())
}

/// Loads `depth` levels of directories below the root, breadth-first.
fn preload(tree: &mut Tree<FsEntry>, depth: usize) -> lazy_tree::Result<()> {
    let mut level: Vec<NodeId> = vec![tree.root()];
    for _ in 0..depth {
        let mut next = Vec::new();
        for id in level {
            if tree.node(id).is_some_and(|node| node.has_loader()) {
                next.extend(tree.get_children(id)?);
            }
        }
        level = next;
    }
    Ok(())
}
