//! WikiTree command-line tool
//!
//! Drives [`TreeService`] against a local database file. Every command
//! prints its result as JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! # Create the root article
//! wikitree init-root "Home" --content "Welcome"
//!
//! # Add a child under node 1
//! wikitree add 1 intro "Introduction"
//!
//! # Resolve a nested path
//! wikitree path guides/install/linux
//!
//! # Check nested-set invariants
//! wikitree check
//! ```
//!
//! # Environment Variables
//!
//! - `WIKITREE_DATABASE_PATH`: database file (default: ./data/wikitree.db)
//! - `WIKITREE_TREE_ID`: tree to operate on (default: 1)
//! - `WIKITREE_BUSY_TIMEOUT_MS`: write-lock wait (default: 5000)
//! - `RUST_LOG`: logging level (e.g., "info", "debug")

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use wikitree_core::config::{ENV_BUSY_TIMEOUT_MS, ENV_DATABASE_PATH, ENV_TREE_ID};
use wikitree_core::{TreeConfig, TreeService};

/// Nested-set wiki article tree
#[derive(Parser, Debug)]
#[command(name = "wikitree", version, about = "Create and resolve wiki articles in a nested-set tree")]
struct Args {
    /// Database file
    #[arg(short = 'd', long, env = ENV_DATABASE_PATH)]
    database: Option<PathBuf>,

    /// Tree to operate on
    #[arg(short = 't', long, env = ENV_TREE_ID)]
    tree_id: Option<i64>,

    /// How long a writer waits for the tree lock
    #[arg(long, env = ENV_BUSY_TIMEOUT_MS)]
    busy_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the root article
    InitRoot {
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Insert a child article as the last child of PARENT
    Add {
        parent: i64,
        segment: String,
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Article by node id
    Get { id: i64 },
    /// The root article
    Root,
    /// Article carrying a path segment
    Segment { segment: String },
    /// Article at a `/`-separated path from the root
    Path { path: String },
    /// Direct children of a node
    Children { id: i64 },
    /// Verify nested-set invariants
    Check,
}

impl Args {
    fn config(&self) -> TreeConfig {
        let mut config = TreeConfig::from_env();
        if let Some(database) = &self.database {
            config.database_path = database.clone();
        }
        if let Some(tree_id) = self.tree_id {
            config.tree_id = tree_id;
        }
        if let Some(busy_timeout_ms) = self.busy_timeout_ms {
            config.busy_timeout_ms = busy_timeout_ms;
        }
        config
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    tracing::info!(
        "Opening {} (tree {})",
        config.database_path.display(),
        config.tree_id
    );
    let service = TreeService::open(&config)
        .await
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;

    match args.command {
        Command::InitRoot { title, content } => {
            print_json(&service.create_root(&title, &content).await?)?;
        }
        Command::Add {
            parent,
            segment,
            title,
            content,
        } => {
            print_json(&service.create_child(parent, &segment, &title, &content).await?)?;
        }
        Command::Get { id } => print_json(&service.get_by_id(id).await?)?,
        Command::Root => print_json(&service.get_root().await?)?,
        Command::Segment { segment } => print_json(&service.get_by_path_segment(&segment).await?)?,
        Command::Path { path } => print_json(&service.get_by_path(&path).await?)?,
        Command::Children { id } => print_json(&service.get_children(id).await?)?,
        Command::Check => {
            service.verify_integrity().await?;
            tracing::info!("Tree {} is consistent", config.tree_id);
        }
    }

    Ok(())
}
