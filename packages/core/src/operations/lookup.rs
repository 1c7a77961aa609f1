//! Lookup Resolver
//!
//! Read-only queries over the nested-set index, joined with each article's
//! current revision. Point lookups are single statements and therefore see
//! one consistent snapshot; callers that chain several lookups run them on a
//! transaction's connection.
//!
//! Containment queries (`descendants`, `ancestors`) compare bounds only and
//! never recurse through parent pointers.

use crate::db::node_store::{self, NODE_COLUMNS, NODE_COLUMN_COUNT};
use crate::db::{decode_revision, DatabaseError, REVISION_COLUMNS};
use crate::models::{Article, RootArticle, TreeNode};
use crate::operations::TreeError;
use libsql::{Connection, Rows};

/// Resolves articles of one tree on a given connection
pub struct LookupResolver<'a> {
    conn: &'a Connection,
    tree_id: i64,
}

impl<'a> LookupResolver<'a> {
    pub fn new(conn: &'a Connection, tree_id: i64) -> Self {
        Self { conn, tree_id }
    }

    fn article_query(filter: &str) -> String {
        format!(
            "SELECT {}, {}
             FROM tree_node AS n
             JOIN wiki_article AS a ON a.id = n.article_id
             JOIN wiki_articlerevision AS r ON r.id = a.current_revision_id
             WHERE n.tree_id = ? AND {}",
            NODE_COLUMNS, REVISION_COLUMNS, filter
        )
    }

    async fn collect(mut rows: Rows) -> Result<Vec<Article>, DatabaseError> {
        let mut articles = Vec::new();
        while let Some(row) = rows.next().await? {
            let node = node_store::decode_node(&row, 0)?;
            let revision = decode_revision(&row, NODE_COLUMN_COUNT)?;
            let id = node.id;
            let article = Article::from_parts(node, revision).ok_or_else(|| {
                DatabaseError::row_decode("path_segment", format!("child node {} has none", id))
            })?;
            articles.push(article);
        }
        Ok(articles)
    }

    async fn query_articles(
        &self,
        operation: &'static str,
        filter: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Article>, TreeError> {
        let rows = self
            .conn
            .query(&Self::article_query(filter), params)
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("{} query failed: {}", operation, e)))
            .map_err(TreeError::storage(operation))?;
        Self::collect(rows)
            .await
            .map_err(TreeError::storage(operation))
    }

    /// Article by tree node id
    pub async fn get_by_id(&self, id: i64) -> Result<Article, TreeError> {
        self.query_articles("get_by_id", "n.id = ?", (self.tree_id, id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TreeError::not_found("article", id))
    }

    /// The unique article without a parent
    pub async fn get_root(&self) -> Result<RootArticle, TreeError> {
        let article = self
            .query_articles("get_root", "n.parent_id IS NULL", [self.tree_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TreeError::not_found("root article", format!("tree {}", self.tree_id)))?;

        match article {
            Article::Root(root) => Ok(root),
            Article::Child(child) => Err(TreeError::invariant_violation(
                "get_root",
                format!("root query returned child {}", child.id),
            )),
        }
    }

    /// Article carrying `segment`
    ///
    /// Segments are only unique among siblings; when several nodes share one,
    /// the shallowest, then left-most, wins.
    pub async fn get_by_path_segment(&self, segment: &str) -> Result<Article, TreeError> {
        let mut found = self
            .query_articles(
                "get_by_path_segment",
                "n.path_segment = ? ORDER BY n.level, n.lft LIMIT 1",
                (self.tree_id, segment),
            )
            .await?;
        found
            .pop()
            .ok_or_else(|| TreeError::not_found("path segment", segment))
    }

    /// Direct child of `parent_id` carrying `segment`
    pub async fn get_child_by_segment(
        &self,
        parent_id: i64,
        segment: &str,
    ) -> Result<Article, TreeError> {
        self.query_articles(
            "get_child_by_segment",
            "n.parent_id = ? AND n.path_segment = ?",
            (self.tree_id, parent_id, segment),
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| TreeError::not_found("path segment", format!("{}/{}", parent_id, segment)))
    }

    /// Resolve a `/`-separated path from the root, one sibling segment at a time
    ///
    /// An empty path (or only slashes) resolves to the root.
    pub async fn get_by_path(&self, path: &str) -> Result<Article, TreeError> {
        let mut current = Article::Root(self.get_root().await?);
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = match self.get_child_by_segment(current.id(), segment).await {
                Ok(child) => child,
                Err(TreeError::NotFound { .. }) => {
                    return Err(TreeError::not_found("path", path));
                }
                Err(e) => return Err(e),
            };
        }
        Ok(current)
    }

    /// The article `article`'s parent pointer refers to
    pub async fn get_parent(&self, article: &Article) -> Result<Article, TreeError> {
        let parent_id = article
            .parent_id()
            .ok_or_else(|| TreeError::not_found("parent article", format!("root {}", article.id())))?;
        self.get_by_id(parent_id).await
    }

    /// Direct children of `id`, left to right
    pub async fn get_children(&self, id: i64) -> Result<Vec<Article>, TreeError> {
        self.node(id).await?;
        self.query_articles(
            "get_children",
            "n.parent_id = ? ORDER BY n.lft",
            (self.tree_id, id),
        )
        .await
    }

    /// Every node strictly inside `id`'s interval, in document order
    pub async fn get_descendants(&self, id: i64) -> Result<Vec<Article>, TreeError> {
        let anchor = self.node(id).await?;
        self.query_articles(
            "get_descendants",
            "n.lft > ? AND n.rght < ? ORDER BY n.lft",
            (self.tree_id, anchor.bounds.left, anchor.bounds.right),
        )
        .await
    }

    /// Every node whose interval strictly contains `id`'s, root first
    pub async fn get_ancestors(&self, id: i64) -> Result<Vec<Article>, TreeError> {
        let anchor = self.node(id).await?;
        self.query_articles(
            "get_ancestors",
            "n.lft < ? AND n.rght > ? ORDER BY n.lft",
            (self.tree_id, anchor.bounds.left, anchor.bounds.right),
        )
        .await
    }

    /// Raw tree row by id, without the revision join
    pub async fn node(&self, id: i64) -> Result<TreeNode, TreeError> {
        node_store::get_node(self.conn, self.tree_id, id)
            .await
            .map_err(TreeError::storage("lookup_node"))?
            .ok_or_else(|| TreeError::not_found("article", id))
    }
}

// Resolver tests over a seeded tree in separate module
#[cfg(test)]
#[path = "lookup_test.rs"]
mod lookup_test;
