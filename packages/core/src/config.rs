//! Tree configuration
//!
//! `TreeConfig` carries everything the tree engine needs to reach its store:
//! the database location, which tree (forest) to operate on and how long a
//! writer waits for the database lock. It is built once by the caller and
//! passed explicitly into [`crate::db::DatabaseService::from_config`] and
//! [`crate::services::TreeService::new`].

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Environment variable holding the database file path
pub const ENV_DATABASE_PATH: &str = "WIKITREE_DATABASE_PATH";

/// Environment variable holding the tree id
pub const ENV_TREE_ID: &str = "WIKITREE_TREE_ID";

/// Environment variable holding the busy timeout in milliseconds
pub const ENV_BUSY_TIMEOUT_MS: &str = "WIKITREE_BUSY_TIMEOUT_MS";

/// Default busy timeout: writers wait up to 5s for the write lock
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// The single designated tree
pub const DEFAULT_TREE_ID: i64 = 1;

/// Configuration for the article tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Path to the libsql database file
    pub database_path: PathBuf,

    /// Tree discriminator; every node written through this config carries it
    pub tree_id: i64,

    /// How long a connection waits on a locked database before failing
    pub busy_timeout_ms: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./data/wikitree.db"),
            tree_id: DEFAULT_TREE_ID,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl TreeConfig {
    /// Config for a database at `database_path`, defaults elsewhere
    pub fn with_database_path(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }

    /// Build a config from `WIKITREE_*` environment variables.
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database_path = env::var(ENV_DATABASE_PATH)
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let tree_id = env::var(ENV_TREE_ID)
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(defaults.tree_id);

        let busy_timeout_ms = env::var(ENV_BUSY_TIMEOUT_MS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.busy_timeout_ms);

        Self {
            database_path,
            tree_id,
            busy_timeout_ms,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.database_path.as_os_str().is_empty() {
            return Err("database_path cannot be empty".to_string());
        }

        if self.tree_id < 1 {
            return Err(format!("tree_id must be positive, got {}", self.tree_id));
        }

        if self.busy_timeout_ms == 0 {
            return Err("busy_timeout_ms must be greater than 0".to_string());
        }

        Ok(())
    }
}
