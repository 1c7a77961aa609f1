//! Database Connection Management
//!
//! Connection and schema management for the article tree on libsql.
//!
//! # Schema
//!
//! - `wiki_article`: article header, points at its current revision
//! - `wiki_articlerevision`: versioned title/content payload
//! - `tree_node`: the nested-set index (`lft`, `rght`, `level`, `tree_id`,
//!   `parent_id`, `path_segment`), one row per article
//!
//! # Database Connection Patterns
//!
//! Use `connect_with_timeout()` in async code. It applies the configured busy
//! timeout and enables foreign keys (a per-connection setting in SQLite).
//!
//! Writers in this process queue on `write_gate()` before `BEGIN IMMEDIATE`.
//! Waiting on the gate is an ordinary `.await`, so a writer can be cancelled
//! while it waits. The busy timeout only applies when another process holds
//! the SQLite write lock; SQLite's busy handler sleeps on the calling thread.
//!
//! ```no_run
//! # use wikitree_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/wikitree.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{TreeConfig, DEFAULT_BUSY_TIMEOUT_MS};
use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Database service for managing the libsql connection and schema
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,

    busy_timeout_ms: u64,

    /// Serializes writers sharing this service
    write_gate: Arc<Mutex<()>>,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path` with the default busy timeout
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    /// 4. Enable WAL mode and foreign keys
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        Self::open(db_path, DEFAULT_BUSY_TIMEOUT_MS).await
    }

    /// Open the database described by `config`
    pub async fn from_config(config: &TreeConfig) -> Result<Self, DatabaseError> {
        Self::open(config.database_path.clone(), config.busy_timeout_ms).await
    }

    async fn open(db_path: PathBuf, busy_timeout_ms: u64) -> Result<Self, DatabaseError> {
        let is_new_database = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
            busy_timeout_ms,
            write_gate: Arc::new(Mutex::new(())),
        };

        service.initialize_schema(is_new_database).await?;

        tracing::debug!(
            "Opened tree database at {} (new: {})",
            service.db_path.display(),
            is_new_database
        );

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so they go through query() rather than execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let mut rows = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        rows.next().await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Idempotent: safe to call against an existing database.
    async fn initialize_schema(&self, is_new_database: bool) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        // current_revision_id stays NULL until the first revision exists
        conn.execute(
            "CREATE TABLE IF NOT EXISTS wiki_article (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                current_revision_id INTEGER UNIQUE,
                created DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                modified DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                group_read BOOLEAN NOT NULL DEFAULT TRUE,
                group_write BOOLEAN NOT NULL DEFAULT TRUE,
                other_read BOOLEAN NOT NULL DEFAULT TRUE,
                other_write BOOLEAN NOT NULL DEFAULT TRUE,
                FOREIGN KEY (current_revision_id) REFERENCES wiki_articlerevision(id)
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to create wiki_article table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS wiki_articlerevision (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL,
                revision_number INTEGER NOT NULL,
                previous_revision_id INTEGER,
                title TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                created DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                modified DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                deleted BOOLEAN NOT NULL DEFAULT FALSE,
                locked BOOLEAN NOT NULL DEFAULT FALSE,
                user_message TEXT NOT NULL DEFAULT '',
                automatic_log TEXT NOT NULL DEFAULT '',
                UNIQUE (article_id, revision_number),
                FOREIGN KEY (article_id) REFERENCES wiki_article(id) ON DELETE CASCADE,
                FOREIGN KEY (previous_revision_id) REFERENCES wiki_articlerevision(id)
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to create wiki_articlerevision table: {}",
                e
            ))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tree_node (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path_segment TEXT,
                lft INTEGER NOT NULL,
                rght INTEGER NOT NULL,
                level INTEGER NOT NULL,
                tree_id INTEGER NOT NULL,
                parent_id INTEGER,
                article_id INTEGER NOT NULL UNIQUE,
                CHECK (rght > lft),
                CHECK (level >= 0),
                FOREIGN KEY (parent_id) REFERENCES tree_node(id),
                FOREIGN KEY (article_id) REFERENCES wiki_article(id)
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to create tree_node table: {}", e))
        })?;

        self.create_core_indexes(&conn).await?;

        if is_new_database {
            self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
                .await?;
        }

        Ok(())
    }

    /// Create the indexes backing lookups and the uniqueness rules of the tree
    async fn create_core_indexes(&self, conn: &libsql::Connection) -> Result<(), DatabaseError> {
        let indexes = [
            // Path segments are unique among the children of one parent
            (
                "idx_tree_node_sibling_segment",
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_tree_node_sibling_segment
                 ON tree_node(parent_id, path_segment)",
            ),
            // One root per tree
            (
                "idx_tree_node_root",
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_tree_node_root
                 ON tree_node(tree_id) WHERE parent_id IS NULL",
            ),
            (
                "idx_tree_node_lft",
                "CREATE INDEX IF NOT EXISTS idx_tree_node_lft ON tree_node(tree_id, lft)",
            ),
            (
                "idx_tree_node_rght",
                "CREATE INDEX IF NOT EXISTS idx_tree_node_rght ON tree_node(tree_id, rght)",
            ),
            (
                "idx_tree_node_segment",
                "CREATE INDEX IF NOT EXISTS idx_tree_node_segment ON tree_node(path_segment)",
            ),
            (
                "idx_revision_article",
                "CREATE INDEX IF NOT EXISTS idx_revision_article
                 ON wiki_articlerevision(article_id)",
            ),
        ];

        for (name, sql) in indexes {
            conn.execute(sql, ()).await.map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to create index '{}': {}", name, e))
            })?;
        }

        Ok(())
    }

    /// Get a raw connection to the database
    ///
    /// No busy timeout and no foreign keys. Prefer `connect_with_timeout()`.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection with busy timeout and foreign keys configured
    ///
    /// Every tree operation runs on its own connection from here; nothing is
    /// cached across operations.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(
            &conn,
            &format!("PRAGMA busy_timeout = {}", self.busy_timeout_ms),
        )
        .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }

    /// Busy timeout applied to every connection, in milliseconds
    pub fn busy_timeout_ms(&self) -> u64 {
        self.busy_timeout_ms
    }

    /// Wait for this service's writer slot
    ///
    /// Held for the whole write transaction; dropping the guard lets the next
    /// writer in. Cancel-safe: a dropped waiter never acquires the slot.
    pub async fn write_gate(&self) -> OwnedMutexGuard<()> {
        self.write_gate.clone().lock_owned().await
    }
}
