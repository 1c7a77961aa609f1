//! Data Models
//!
//! - [`TreeNode`] / [`NodeBounds`] - a row of the nested-set index
//! - [`Revision`] - title/content payload owned by the revision store
//! - [`Article`] - a tree position joined with its current revision

mod article;
mod tree_node;

pub use article::{Article, ChildArticle, Revision, RootArticle};
pub use tree_node::{NodeBounds, TreeNode};
