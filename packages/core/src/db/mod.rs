//! Database Layer
//!
//! Storage for the article tree on libsql (embedded, SQLite-compatible):
//!
//! - [`DatabaseService`] - connection management and schema initialization
//! - [`node_store`] - row access for the `tree_node` nested-set index
//! - [`RevisionStore`] - article headers and their content revisions
//!
//! Nothing here knows the nested-set algorithm; see [`crate::operations`].

mod database;
mod error;
pub mod node_store;
mod revision_store;

pub use database::DatabaseService;
pub use error::DatabaseError;
pub use node_store::NewTreeNode;
pub(crate) use revision_store::{decode_revision, REVISION_COLUMNS};
pub use revision_store::{RevisionStore, SqlRevisionStore};
