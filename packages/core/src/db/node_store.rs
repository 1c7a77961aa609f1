//! Node Store - row access for the `tree_node` table
//!
//! Plain inserts and selects over the nested-set index. No tree algorithm
//! lives here: planning positions and shifting intervals belong to
//! [`crate::operations`]. Every function takes the connection it runs on,
//! so callers decide whether it executes inside a transaction.

use crate::db::error::DatabaseError;
use crate::models::{NodeBounds, TreeNode};
use libsql::{Connection, Row, Rows};

/// Node columns, selected from `tree_node AS n`
pub(crate) const NODE_COLUMNS: &str =
    "n.id, n.tree_id, n.article_id, n.path_segment, n.parent_id, n.lft, n.rght, n.level";

/// Number of columns in [`NODE_COLUMNS`]
pub(crate) const NODE_COLUMN_COUNT: i32 = 8;

/// Parameters for a new `tree_node` row
#[derive(Debug, Clone)]
pub struct NewTreeNode<'a> {
    pub tree_id: i64,
    pub article_id: i64,
    pub path_segment: Option<&'a str>,
    pub parent_id: Option<i64>,
    pub bounds: NodeBounds,
}

/// Decode the node columns starting at `offset`
pub(crate) fn decode_node(row: &Row, offset: i32) -> Result<TreeNode, DatabaseError> {
    let id: i64 = row
        .get(offset)
        .map_err(|e| DatabaseError::row_decode("id", e))?;
    let tree_id: i64 = row
        .get(offset + 1)
        .map_err(|e| DatabaseError::row_decode("tree_id", e))?;
    let article_id: i64 = row
        .get(offset + 2)
        .map_err(|e| DatabaseError::row_decode("article_id", e))?;
    let path_segment: Option<String> = row
        .get(offset + 3)
        .map_err(|e| DatabaseError::row_decode("path_segment", e))?;
    let parent_id: Option<i64> = row
        .get(offset + 4)
        .map_err(|e| DatabaseError::row_decode("parent_id", e))?;
    let left: i64 = row
        .get(offset + 5)
        .map_err(|e| DatabaseError::row_decode("lft", e))?;
    let right: i64 = row
        .get(offset + 6)
        .map_err(|e| DatabaseError::row_decode("rght", e))?;
    let level: i64 = row
        .get(offset + 7)
        .map_err(|e| DatabaseError::row_decode("level", e))?;

    Ok(TreeNode {
        id,
        tree_id,
        article_id,
        path_segment,
        parent_id,
        bounds: NodeBounds::new(left, right, level),
    })
}

async fn collect_nodes(mut rows: Rows) -> Result<Vec<TreeNode>, DatabaseError> {
    let mut nodes = Vec::new();
    while let Some(row) = rows.next().await? {
        nodes.push(decode_node(&row, 0)?);
    }
    Ok(nodes)
}

async fn first_node(mut rows: Rows) -> Result<Option<TreeNode>, DatabaseError> {
    match rows.next().await? {
        Some(row) => Ok(Some(decode_node(&row, 0)?)),
        None => Ok(None),
    }
}

/// Insert a node row with its final bounds, returning the new row id
pub async fn insert_node(conn: &Connection, node: &NewTreeNode<'_>) -> Result<i64, DatabaseError> {
    let affected = conn
        .execute(
            "INSERT INTO tree_node (path_segment, lft, rght, level, tree_id, parent_id, article_id)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                node.path_segment,
                node.bounds.left,
                node.bounds.right,
                node.bounds.level,
                node.tree_id,
                node.parent_id,
                node.article_id,
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert tree node: {}", e)))?;

    if affected != 1 {
        return Err(DatabaseError::sql_execution(format!(
            "Failed to insert tree node: {} rows affected",
            affected
        )));
    }

    Ok(conn.last_insert_rowid())
}

/// Node by id within a tree
pub async fn get_node(
    conn: &Connection,
    tree_id: i64,
    id: i64,
) -> Result<Option<TreeNode>, DatabaseError> {
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM tree_node AS n WHERE n.tree_id = ? AND n.id = ?",
                NODE_COLUMNS
            ),
            (tree_id, id),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to query node {}: {}", id, e)))?;
    first_node(rows).await
}

/// The node without a parent
pub async fn get_root(conn: &Connection, tree_id: i64) -> Result<Option<TreeNode>, DatabaseError> {
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM tree_node AS n WHERE n.tree_id = ? AND n.parent_id IS NULL",
                NODE_COLUMNS
            ),
            [tree_id],
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to query root node: {}", e)))?;
    first_node(rows).await
}

/// Direct child of `parent_id` carrying `path_segment`
pub async fn get_child_by_segment(
    conn: &Connection,
    parent_id: i64,
    path_segment: &str,
) -> Result<Option<TreeNode>, DatabaseError> {
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM tree_node AS n WHERE n.parent_id = ? AND n.path_segment = ?",
                NODE_COLUMNS
            ),
            (parent_id, path_segment),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to query child '{}' of node {}: {}",
                path_segment, parent_id, e
            ))
        })?;
    first_node(rows).await
}

/// All nodes of a tree in document order
pub async fn list_tree(conn: &Connection, tree_id: i64) -> Result<Vec<TreeNode>, DatabaseError> {
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM tree_node AS n WHERE n.tree_id = ? ORDER BY n.lft",
                NODE_COLUMNS
            ),
            [tree_id],
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to list tree nodes: {}", e)))?;
    collect_nodes(rows).await
}

/// Number of nodes in a tree
pub async fn count_nodes(conn: &Connection, tree_id: i64) -> Result<i64, DatabaseError> {
    count(
        conn,
        "SELECT COUNT(*) FROM tree_node WHERE tree_id = ?",
        tree_id,
    )
    .await
}

/// Number of nodes in a tree whose interval is empty or inverted
pub async fn count_malformed(conn: &Connection, tree_id: i64) -> Result<i64, DatabaseError> {
    count(
        conn,
        "SELECT COUNT(*) FROM tree_node WHERE tree_id = ? AND lft >= rght",
        tree_id,
    )
    .await
}

async fn count(conn: &Connection, sql: &str, tree_id: i64) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query(sql, [tree_id])
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to count nodes: {}", e)))?;
    match rows.next().await? {
        Some(row) => row
            .get::<i64>(0)
            .map_err(|e| DatabaseError::row_decode("count", e)),
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseService;
    use tempfile::TempDir;

    async fn setup() -> (DatabaseService, Connection, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let conn = db.connect_with_timeout().await.unwrap();
        (db, conn, temp_dir)
    }

    async fn new_article(conn: &Connection) -> i64 {
        conn.execute("INSERT INTO wiki_article DEFAULT VALUES", ())
            .await
            .unwrap();
        conn.last_insert_rowid()
    }

    #[tokio::test]
    async fn test_insert_and_get_root() {
        let (_db, conn, _temp) = setup().await;
        let article_id = new_article(&conn).await;

        let id = insert_node(
            &conn,
            &NewTreeNode {
                tree_id: 1,
                article_id,
                path_segment: None,
                parent_id: None,
                bounds: NodeBounds::root(),
            },
        )
        .await
        .unwrap();

        let root = get_root(&conn, 1).await.unwrap().unwrap();
        assert_eq!(root.id, id);
        assert_eq!(root.article_id, article_id);
        assert_eq!(root.bounds, NodeBounds::root());
        assert!(root.is_root());

        assert_eq!(get_node(&conn, 1, id).await.unwrap(), Some(root));
        assert!(get_node(&conn, 2, id).await.unwrap().is_none());
        assert!(get_root(&conn, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_root_rejected_by_index() {
        let (_db, conn, _temp) = setup().await;
        for expect_ok in [true, false] {
            let article_id = new_article(&conn).await;
            let result = insert_node(
                &conn,
                &NewTreeNode {
                    tree_id: 1,
                    article_id,
                    path_segment: None,
                    parent_id: None,
                    bounds: NodeBounds::root(),
                },
            )
            .await;
            assert_eq!(result.is_ok(), expect_ok);
        }
    }

    #[tokio::test]
    async fn test_child_lookup_and_counts() {
        let (_db, conn, _temp) = setup().await;
        let root_article = new_article(&conn).await;
        let root_id = insert_node(
            &conn,
            &NewTreeNode {
                tree_id: 1,
                article_id: root_article,
                path_segment: None,
                parent_id: None,
                bounds: NodeBounds::new(1, 4, 0),
            },
        )
        .await
        .unwrap();

        let child_article = new_article(&conn).await;
        let child_id = insert_node(
            &conn,
            &NewTreeNode {
                tree_id: 1,
                article_id: child_article,
                path_segment: Some("intro"),
                parent_id: Some(root_id),
                bounds: NodeBounds::new(2, 3, 1),
            },
        )
        .await
        .unwrap();

        let child = get_child_by_segment(&conn, root_id, "intro")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(child.id, child_id);
        assert_eq!(child.path_segment.as_deref(), Some("intro"));
        assert!(get_child_by_segment(&conn, root_id, "other")
            .await
            .unwrap()
            .is_none());

        let nodes = list_tree(&conn, 1).await.unwrap();
        assert_eq!(
            nodes.iter().map(|n| n.id).collect::<Vec<_>>(),
            vec![root_id, child_id]
        );
        assert_eq!(count_nodes(&conn, 1).await.unwrap(), 2);
        assert_eq!(count_malformed(&conn, 1).await.unwrap(), 0);
    }
}
