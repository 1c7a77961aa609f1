//! Tree Services
//!
//! - [`TreeService`] - create and resolve articles in one tree
//! - [`TreeTransaction`] - the unit of work every mutation runs in
//!
//! Services own transaction boundaries; the algorithm itself lives in
//! [`crate::operations`] and row access in [`crate::db`].

pub mod tree_service;
pub mod tree_transaction;

pub use tree_service::{validate_path_segment, TreeService};
pub use tree_transaction::{TransactionMode, TransactionState, TreeTransaction};
