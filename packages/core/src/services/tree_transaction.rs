//! Tree Transaction
//!
//! One unit of work on the tree, owning its own connection:
//!
//! ```text
//! Open ──commit()──▶ Committed
//!   └───abort()────▶ Aborted
//! ```
//!
//! Writers first take the service's write gate, then begin with
//! `BEGIN IMMEDIATE`, holding the database write lock before reading any
//! bounds, so two insertions can never plan against the same parent state.
//! Writers of one process queue on the gate, where the caller can cancel them.
//! A writer blocked by another process waits up to the configured busy timeout
//! and then fails with a retryable storage error.
//!
//! Dropping an open transaction (for example when the caller's future is
//! cancelled) drops its connection, and SQLite rolls the transaction back.
//! The gate is released after the connection is gone.

use crate::db::{DatabaseError, DatabaseService};
use crate::operations::TreeError;
use libsql::Connection;
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Open,
    Committed,
    Aborted,
}

/// How the transaction acquires its locks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    /// Read snapshot for multi-statement lookups
    Read,
    /// Holds the write lock from the first statement
    Write,
}

impl TransactionMode {
    fn begin_sql(self) -> &'static str {
        match self {
            TransactionMode::Read => "BEGIN DEFERRED",
            TransactionMode::Write => "BEGIN IMMEDIATE",
        }
    }
}

pub struct TreeTransaction {
    // dropped before `write_slot`
    conn: Connection,
    write_slot: Option<OwnedMutexGuard<()>>,
    operation: &'static str,
    state: TransactionState,
}

impl TreeTransaction {
    /// Open a write transaction for `operation`
    pub async fn begin(db: &DatabaseService, operation: &'static str) -> Result<Self, TreeError> {
        Self::begin_with_mode(db, operation, TransactionMode::Write).await
    }

    /// Open a read-only snapshot for `operation`
    pub async fn begin_read(
        db: &DatabaseService,
        operation: &'static str,
    ) -> Result<Self, TreeError> {
        Self::begin_with_mode(db, operation, TransactionMode::Read).await
    }

    async fn begin_with_mode(
        db: &DatabaseService,
        operation: &'static str,
        mode: TransactionMode,
    ) -> Result<Self, TreeError> {
        let write_slot = match mode {
            TransactionMode::Write => {
                let slot = db.write_gate().await;
                tracing::debug!("{}: acquired write gate", operation);
                Some(slot)
            }
            TransactionMode::Read => None,
        };

        let conn = db
            .connect_with_timeout()
            .await
            .map_err(TreeError::storage(operation))?;

        conn.execute(mode.begin_sql(), ())
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
            })
            .map_err(TreeError::storage(operation))?;

        tracing::debug!("{}: transaction open ({:?})", operation, mode);

        Ok(Self {
            conn,
            write_slot,
            operation,
            state: TransactionState::Open,
        })
    }

    /// Connection all statements of this transaction run on
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Whether this transaction holds the service's write gate
    pub fn holds_write_gate(&self) -> bool {
        self.write_slot.is_some()
    }

    /// Make every write of this transaction visible
    pub async fn commit(mut self) -> Result<(), TreeError> {
        match self.conn.execute("COMMIT", ()).await {
            Ok(_) => {
                self.state = TransactionState::Committed;
                tracing::debug!("{}: transaction committed", self.operation);
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_err) = self.conn.execute("ROLLBACK", ()).await {
                    tracing::warn!(
                        "{}: rollback after failed commit failed: {}",
                        self.operation,
                        rollback_err
                    );
                }
                self.state = TransactionState::Aborted;
                Err(TreeError::Storage {
                    operation: self.operation,
                    source: DatabaseError::sql_execution(format!(
                        "Failed to commit transaction: {}",
                        e
                    )),
                })
            }
        }
    }

    /// Discard every write of this transaction
    pub async fn abort(mut self) {
        if let Err(e) = self.conn.execute("ROLLBACK", ()).await {
            // the connection is dropped below, which rolls back regardless
            tracing::warn!("{}: explicit rollback failed: {}", self.operation, e);
        }
        self.state = TransactionState::Aborted;
        tracing::debug!("{}: transaction aborted", self.operation);
    }
}

impl Drop for TreeTransaction {
    fn drop(&mut self) {
        if self.state == TransactionState::Open {
            tracing::warn!(
                "{}: transaction dropped while open, rolled back with its connection",
                self.operation
            );
        }
    }
}
