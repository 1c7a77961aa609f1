//! WikiTree Core
//!
//! Hierarchical wiki articles stored as a nested-set (modified preorder tree
//! traversal) index on libsql. Every article is a node with `left`/`right`
//! bounds and a `level`; a node's descendants are exactly the nodes whose
//! bounds lie strictly inside its own, so subtree and ancestor queries are
//! single range scans.
//!
//! # Modules
//!
//! - [`models`] - tree rows, revisions and the root/child article variants
//! - [`db`] - libsql connection management, schema and row access
//! - [`operations`] - insertion planning, interval rebalancing, lookups
//! - [`services`] - transactional coordinator ([`TreeService`])
//! - [`config`] - runtime configuration ([`TreeConfig`])

pub mod config;
pub mod db;
pub mod models;
pub mod operations;
pub mod services;

// Re-export commonly used types
pub use config::TreeConfig;
pub use models::*;
pub use operations::TreeError;
pub use services::*;
