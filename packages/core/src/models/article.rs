//! Article Data Structures
//!
//! An article is a tree position ([`TreeNode`]) joined with its current
//! content [`Revision`]. The root and the children differ only in whether
//! they have a parent and a path segment, so they are two variants of
//! [`Article`] rather than one struct with optional fields:
//!
//! ```rust
//! # use wikitree_core::models::Article;
//! fn describe(article: &Article) -> String {
//!     match article {
//!         Article::Root(root) => format!("root '{}'", root.revision.title),
//!         Article::Child(child) => format!("'{}' under {}", child.path_segment, child.parent_id),
//!     }
//! }
//! ```

use super::tree_node::{NodeBounds, TreeNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A title/content revision of an article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub id: i64,
    pub article_id: i64,
    pub revision_number: i64,
    pub previous_revision_id: Option<i64>,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub deleted: bool,
    pub locked: bool,
}

/// The root article of a tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootArticle {
    /// Tree node id
    pub id: i64,
    pub article_id: i64,
    pub tree_id: i64,
    pub bounds: NodeBounds,
    pub revision: Revision,
}

impl RootArticle {
    /// Compare title and content, ignoring identifiers and bounds
    pub fn same_content(&self, other: &RootArticle) -> bool {
        self.revision.title == other.revision.title
            && self.revision.content == other.revision.content
    }
}

/// A non-root article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildArticle {
    /// Tree node id
    pub id: i64,
    pub article_id: i64,
    pub tree_id: i64,
    /// Tree node id of the parent
    pub parent_id: i64,
    pub path_segment: String,
    pub bounds: NodeBounds,
    pub revision: Revision,
}

impl ChildArticle {
    /// Compare title, content and path segment, ignoring identifiers and bounds
    pub fn same_content(&self, other: &ChildArticle) -> bool {
        self.path_segment == other.path_segment
            && self.revision.title == other.revision.title
            && self.revision.content == other.revision.content
    }
}

/// Root or child article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Article {
    Root(RootArticle),
    Child(ChildArticle),
}

impl Article {
    /// Assemble an article from its tree row and current revision.
    ///
    /// Returns `None` for a child row without a path segment, which the
    /// store never writes.
    pub fn from_parts(node: TreeNode, revision: Revision) -> Option<Self> {
        match (node.parent_id, node.path_segment) {
            (None, _) => Some(Article::Root(RootArticle {
                id: node.id,
                article_id: node.article_id,
                tree_id: node.tree_id,
                bounds: node.bounds,
                revision,
            })),
            (Some(parent_id), Some(path_segment)) => Some(Article::Child(ChildArticle {
                id: node.id,
                article_id: node.article_id,
                tree_id: node.tree_id,
                parent_id,
                path_segment,
                bounds: node.bounds,
                revision,
            })),
            (Some(_), None) => None,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Article::Root(root) => root.id,
            Article::Child(child) => child.id,
        }
    }

    pub fn article_id(&self) -> i64 {
        match self {
            Article::Root(root) => root.article_id,
            Article::Child(child) => child.article_id,
        }
    }

    pub fn tree_id(&self) -> i64 {
        match self {
            Article::Root(root) => root.tree_id,
            Article::Child(child) => child.tree_id,
        }
    }

    pub fn bounds(&self) -> NodeBounds {
        match self {
            Article::Root(root) => root.bounds,
            Article::Child(child) => child.bounds,
        }
    }

    pub fn revision(&self) -> &Revision {
        match self {
            Article::Root(root) => &root.revision,
            Article::Child(child) => &child.revision,
        }
    }

    pub fn title(&self) -> &str {
        &self.revision().title
    }

    pub fn content(&self) -> &str {
        &self.revision().content
    }

    pub fn parent_id(&self) -> Option<i64> {
        match self {
            Article::Root(_) => None,
            Article::Child(child) => Some(child.parent_id),
        }
    }

    pub fn path_segment(&self) -> Option<&str> {
        match self {
            Article::Root(_) => None,
            Article::Child(child) => Some(&child.path_segment),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Article::Root(_))
    }

    /// Path of this article relative to the API base URL
    pub fn resource_path(&self) -> String {
        format!("articles/{}", self.id())
    }

    /// Variant-wise content comparison; articles of different variants never match
    pub fn same_content(&self, other: &Article) -> bool {
        match (self, other) {
            (Article::Root(a), Article::Root(b)) => a.same_content(b),
            (Article::Child(a), Article::Child(b)) => a.same_content(b),
            _ => false,
        }
    }

    /// The tree position of this article
    pub fn to_tree_node(&self) -> TreeNode {
        TreeNode {
            id: self.id(),
            tree_id: self.tree_id(),
            article_id: self.article_id(),
            path_segment: self.path_segment().map(str::to_string),
            parent_id: self.parent_id(),
            bounds: self.bounds(),
        }
    }
}

impl From<RootArticle> for Article {
    fn from(root: RootArticle) -> Self {
        Article::Root(root)
    }
}

impl From<ChildArticle> for Article {
    fn from(child: ChildArticle) -> Self {
        Article::Child(child)
    }
}
