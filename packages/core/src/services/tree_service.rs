//! Tree Service
//!
//! The operations the surrounding API layer consumes: creating the root,
//! inserting children, and resolving articles. Each mutating call is one
//! [`TreeTransaction`]; it either commits in full or leaves no trace.
//!
//! # Child insertion sequence
//!
//! Inside one write transaction:
//!
//! 1. create the article header
//! 2. create its first content revision
//! 3. read the parent's current bounds (and reject a colliding sibling segment)
//! 4. plan the new node's `(level, left, right)`
//! 5. store the node row with its planned bounds
//! 6. rebalance every other interval and verify the result
//! 7. attach the revision as the header's current revision
//!
//! After commit the finished article is read back for the response. No step
//! is retried here; a caller may retry a failed operation from scratch when
//! [`TreeError::is_retryable`] says so.
//!
//! # Examples
//!
//! ```no_run
//! # use wikitree_core::config::TreeConfig;
//! # use wikitree_core::services::TreeService;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = TreeService::open(&TreeConfig::with_database_path("./data/wiki.db")).await?;
//! let root = service.create_root("Home", "Welcome").await?;
//! let child = service.create_child(root.id, "intro", "Intro", "").await?;
//! assert_eq!((child.bounds.left, child.bounds.right), (2, 3));
//! # Ok(())
//! # }
//! ```

use crate::config::TreeConfig;
use crate::db::node_store::{self, NewTreeNode};
use crate::db::{DatabaseService, RevisionStore, SqlRevisionStore};
use crate::models::{Article, ChildArticle, RootArticle};
use crate::operations::{
    integrity, InsertPlanner, IntervalRebalancer, LookupResolver, TreeError,
};
use crate::services::tree_transaction::TreeTransaction;
use std::sync::Arc;

const CREATE_ROOT: &str = "create_root";
const CREATE_CHILD: &str = "create_child";

/// Reject segments that cannot name a single path component
pub fn validate_path_segment(path_segment: &str) -> Result<(), TreeError> {
    let reason = if path_segment.trim().is_empty() {
        "must not be empty"
    } else if path_segment.contains('/') {
        "must not contain '/'"
    } else {
        return Ok(());
    };

    Err(TreeError::InvalidPathSegment {
        path_segment: path_segment.to_string(),
        reason,
    })
}

/// Library boundary for the article tree
#[derive(Clone)]
pub struct TreeService {
    db: Arc<DatabaseService>,
    revisions: Arc<dyn RevisionStore>,
    tree_id: i64,
}

impl TreeService {
    /// Service over `db` for the tree named in `config`
    pub fn new(db: Arc<DatabaseService>, config: &TreeConfig) -> Self {
        Self::with_revision_store(db, Arc::new(SqlRevisionStore), config.tree_id)
    }

    /// Service with a custom content-revision collaborator
    pub fn with_revision_store(
        db: Arc<DatabaseService>,
        revisions: Arc<dyn RevisionStore>,
        tree_id: i64,
    ) -> Self {
        Self {
            db,
            revisions,
            tree_id,
        }
    }

    /// Open the database described by `config` and build a service over it
    pub async fn open(config: &TreeConfig) -> Result<Self, TreeError> {
        let db = DatabaseService::from_config(config)
            .await
            .map_err(TreeError::storage("open"))?;
        Ok(Self::new(Arc::new(db), config))
    }

    pub fn tree_id(&self) -> i64 {
        self.tree_id
    }

    pub fn database(&self) -> &Arc<DatabaseService> {
        &self.db
    }

    //
    // MUTATIONS
    //

    /// Create the tree's root article at `(1, 2)`, level 0
    ///
    /// Fails with `RootExists` if the tree already has a root.
    pub async fn create_root(&self, title: &str, content: &str) -> Result<RootArticle, TreeError> {
        let tx = TreeTransaction::begin(&self.db, CREATE_ROOT).await?;

        match self.insert_root(&tx, title, content).await {
            Ok(node_id) => {
                tx.commit().await?;
                tracing::info!("Created root article {} in tree {}", node_id, self.tree_id);
            }
            Err(e) => {
                tx.abort().await;
                tracing::warn!("{} aborted: {}", CREATE_ROOT, e);
                return Err(e);
            }
        }

        self.get_root().await
    }

    async fn insert_root(
        &self,
        tx: &TreeTransaction,
        title: &str,
        content: &str,
    ) -> Result<i64, TreeError> {
        let conn = tx.conn();

        if node_store::get_root(conn, self.tree_id)
            .await
            .map_err(TreeError::storage(CREATE_ROOT))?
            .is_some()
        {
            return Err(TreeError::RootExists {
                tree_id: self.tree_id,
            });
        }

        let article_id = self
            .revisions
            .create_article(conn)
            .await
            .map_err(TreeError::storage(CREATE_ROOT))?;
        let revision_id = self
            .revisions
            .create_revision(conn, article_id, title, content)
            .await
            .map_err(TreeError::storage(CREATE_ROOT))?;

        let node_id = node_store::insert_node(
            conn,
            &NewTreeNode {
                tree_id: self.tree_id,
                article_id,
                path_segment: None,
                parent_id: None,
                bounds: InsertPlanner::plan_root(),
            },
        )
        .await
        .map_err(TreeError::storage(CREATE_ROOT))?;

        self.revisions
            .attach_revision(conn, article_id, revision_id)
            .await
            .map_err(TreeError::storage(CREATE_ROOT))?;

        Ok(node_id)
    }

    /// Insert a child article as the right-most child of `parent_id`
    ///
    /// Fails with `NotFound` if the parent does not exist in this tree and
    /// with `PathSegmentTaken` if a sibling already uses `path_segment`.
    pub async fn create_child(
        &self,
        parent_id: i64,
        path_segment: &str,
        title: &str,
        content: &str,
    ) -> Result<ChildArticle, TreeError> {
        validate_path_segment(path_segment)?;

        let tx = TreeTransaction::begin(&self.db, CREATE_CHILD).await?;

        let node_id = match self
            .insert_child(&tx, parent_id, path_segment, title, content)
            .await
        {
            Ok(node_id) => {
                tx.commit().await?;
                tracing::info!(
                    "Created article {} '{}' under {} in tree {}",
                    node_id,
                    path_segment,
                    parent_id,
                    self.tree_id
                );
                node_id
            }
            Err(e) => {
                tx.abort().await;
                tracing::warn!(
                    "{} aborted (parent {}, segment '{}'): {}",
                    CREATE_CHILD,
                    parent_id,
                    path_segment,
                    e
                );
                return Err(e);
            }
        };

        match self.get_by_id(node_id).await? {
            Article::Child(child) => Ok(child),
            Article::Root(root) => Err(TreeError::invariant_violation(
                CREATE_CHILD,
                format!("inserted child {} reads back as a root", root.id),
            )),
        }
    }

    async fn insert_child(
        &self,
        tx: &TreeTransaction,
        parent_id: i64,
        path_segment: &str,
        title: &str,
        content: &str,
    ) -> Result<i64, TreeError> {
        let conn = tx.conn();

        let article_id = self
            .revisions
            .create_article(conn)
            .await
            .map_err(TreeError::storage(CREATE_CHILD))?;
        tracing::debug!("{}: created article header {}", CREATE_CHILD, article_id);

        let revision_id = self
            .revisions
            .create_revision(conn, article_id, title, content)
            .await
            .map_err(TreeError::storage(CREATE_CHILD))?;
        tracing::debug!("{}: created revision {}", CREATE_CHILD, revision_id);

        let lookup = LookupResolver::new(conn, self.tree_id);
        let parent = match lookup.node(parent_id).await {
            Ok(parent) => parent,
            Err(TreeError::NotFound { .. }) => {
                return Err(TreeError::not_found("parent article", parent_id));
            }
            Err(e) => return Err(e),
        };

        if node_store::get_child_by_segment(conn, parent.id, path_segment)
            .await
            .map_err(TreeError::storage(CREATE_CHILD))?
            .is_some()
        {
            return Err(TreeError::PathSegmentTaken {
                parent_id,
                path_segment: path_segment.to_string(),
            });
        }

        let bounds = InsertPlanner::plan_child(&parent.bounds);
        tracing::debug!(
            "{}: parent {} at {:?}, planned {:?}",
            CREATE_CHILD,
            parent.id,
            parent.bounds,
            bounds
        );

        let node_id = node_store::insert_node(
            conn,
            &NewTreeNode {
                tree_id: self.tree_id,
                article_id,
                path_segment: Some(path_segment),
                parent_id: Some(parent.id),
                bounds,
            },
        )
        .await
        .map_err(TreeError::storage(CREATE_CHILD))?;

        IntervalRebalancer::rebalance(conn, self.tree_id, node_id, bounds.left).await?;
        IntervalRebalancer::verify_insert(conn, self.tree_id, parent.id, node_id).await?;

        self.revisions
            .attach_revision(conn, article_id, revision_id)
            .await
            .map_err(TreeError::storage(CREATE_CHILD))?;

        Ok(node_id)
    }

    //
    // LOOKUPS
    //

    async fn connect(&self, operation: &'static str) -> Result<libsql::Connection, TreeError> {
        self.db
            .connect_with_timeout()
            .await
            .map_err(TreeError::storage(operation))
    }

    pub async fn get_root(&self) -> Result<RootArticle, TreeError> {
        let conn = self.connect("get_root").await?;
        LookupResolver::new(&conn, self.tree_id).get_root().await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Article, TreeError> {
        let conn = self.connect("get_by_id").await?;
        LookupResolver::new(&conn, self.tree_id).get_by_id(id).await
    }

    pub async fn get_by_path_segment(&self, segment: &str) -> Result<Article, TreeError> {
        let conn = self.connect("get_by_path_segment").await?;
        LookupResolver::new(&conn, self.tree_id)
            .get_by_path_segment(segment)
            .await
    }

    pub async fn get_parent(&self, article: &Article) -> Result<Article, TreeError> {
        let conn = self.connect("get_parent").await?;
        LookupResolver::new(&conn, self.tree_id)
            .get_parent(article)
            .await
    }

    /// Resolve a multi-segment path such as `guides/install/linux`
    pub async fn get_by_path(&self, path: &str) -> Result<Article, TreeError> {
        let tx = TreeTransaction::begin_read(&self.db, "get_by_path").await?;
        let result = LookupResolver::new(tx.conn(), self.tree_id)
            .get_by_path(path)
            .await;
        tx.commit().await?;
        result
    }

    pub async fn get_children(&self, id: i64) -> Result<Vec<Article>, TreeError> {
        let tx = TreeTransaction::begin_read(&self.db, "get_children").await?;
        let result = LookupResolver::new(tx.conn(), self.tree_id)
            .get_children(id)
            .await;
        tx.commit().await?;
        result
    }

    pub async fn get_descendants(&self, id: i64) -> Result<Vec<Article>, TreeError> {
        let tx = TreeTransaction::begin_read(&self.db, "get_descendants").await?;
        let result = LookupResolver::new(tx.conn(), self.tree_id)
            .get_descendants(id)
            .await;
        tx.commit().await?;
        result
    }

    pub async fn get_ancestors(&self, id: i64) -> Result<Vec<Article>, TreeError> {
        let tx = TreeTransaction::begin_read(&self.db, "get_ancestors").await?;
        let result = LookupResolver::new(tx.conn(), self.tree_id)
            .get_ancestors(id)
            .await;
        tx.commit().await?;
        result
    }

    /// Check every nested-set invariant over the whole tree
    pub async fn verify_integrity(&self) -> Result<(), TreeError> {
        let conn = self.connect("verify_integrity").await?;
        let nodes = node_store::list_tree(&conn, self.tree_id)
            .await
            .map_err(TreeError::storage("verify_integrity"))?;
        integrity::verify_tree(&nodes)
    }
}

// Scenario tests in separate module
#[cfg(test)]
#[path = "tree_service_test.rs"]
mod tree_service_test;
