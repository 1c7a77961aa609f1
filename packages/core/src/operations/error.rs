//! Error types for tree operations
//!
//! Every failure of a tree operation maps onto one of four kinds:
//!
//! - **Not found**: a referenced node, parent or path segment does not exist
//! - **Conflict**: sibling path segment collision, or a second root
//! - **Invariant violation**: the index would be left inconsistent; this is a
//!   planner/rebalancer bug and the transaction is aborted
//! - **Storage**: the backing store failed (connectivity, lock timeout); the
//!   whole operation may be retried from scratch
//!
//! # Examples
//!
//! ```rust
//! use wikitree_core::operations::TreeError;
//!
//! let err = TreeError::PathSegmentTaken {
//!     parent_id: 1,
//!     path_segment: "intro".to_string(),
//! };
//! assert!(err.is_conflict());
//! assert!(!err.is_retryable());
//! ```

use crate::db::DatabaseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    /// Referenced entity does not exist
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A sibling already uses this path segment
    #[error("Path segment '{path_segment}' already exists under node {parent_id}")]
    PathSegmentTaken {
        parent_id: i64,
        path_segment: String,
    },

    /// The tree already has its root
    #[error("Tree {tree_id} already has a root article")]
    RootExists { tree_id: i64 },

    /// Path segment rejected before touching the store
    #[error("Invalid path segment '{path_segment}': {reason}")]
    InvalidPathSegment {
        path_segment: String,
        reason: &'static str,
    },

    /// Nested-set invariant broken; never committed
    #[error("Tree invariant violated during {operation}: {detail}")]
    InvariantViolation {
        operation: &'static str,
        detail: String,
    },

    /// Backing store failure
    #[error("Storage failure during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: DatabaseError,
    },
}

impl TreeError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn invariant_violation(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            operation,
            detail: detail.into(),
        }
    }

    /// Adapter for `map_err` that tags a storage error with the operation name
    ///
    /// ```rust,ignore
    /// conn.execute(sql, ()).await.map_err(DatabaseError::from).map_err(TreeError::storage("create_child"))?;
    /// ```
    pub fn storage(operation: &'static str) -> impl FnOnce(DatabaseError) -> Self {
        move |source| Self::Storage { operation, source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::PathSegmentTaken { .. } | Self::RootExists { .. })
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }

    /// Only storage failures are worth retrying; everything else is deterministic
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let not_found = TreeError::not_found("parent article", 42);
        assert!(not_found.is_not_found());
        assert!(!not_found.is_conflict());
        assert_eq!(not_found.to_string(), "parent article not found: 42");

        let root_exists = TreeError::RootExists { tree_id: 1 };
        assert!(root_exists.is_conflict());

        let broken = TreeError::invariant_violation("create_child", "left >= right");
        assert!(broken.is_invariant_violation());
        assert!(!broken.is_retryable());
    }

    #[test]
    fn test_storage_adapter_keeps_operation_and_source() {
        let err = TreeError::storage("create_root")(DatabaseError::sql_execution("disk full"));
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Storage failure during create_root: SQL execution failed: disk full"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
