//! Database Error Types
//!
//! Error types for the storage layer: connection, schema initialization,
//! SQL execution and row decoding failures. Tree-level failures (not found,
//! conflicts, invariant violations) live in [`crate::operations::TreeError`].

use std::path::PathBuf;
use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish database connection
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Permission denied when accessing database
    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    /// Failed to create parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },

    /// A row could not be converted into a model
    #[error("Failed to decode column '{column}': {reason}")]
    RowDecodeFailed { column: &'static str, reason: String },
}

impl DatabaseError {
    /// Create a connection failed error
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    /// Create a permission denied error
    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    /// Create a row decode error for the given column
    pub fn row_decode(column: &'static str, reason: impl ToString) -> Self {
        Self::RowDecodeFailed {
            column,
            reason: reason.to_string(),
        }
    }
}
