//! Revision Store - article headers and their content revisions
//!
//! Title and content are versioned payload attached to an article, not part
//! of the tree index. The tree coordinator only needs three things from the
//! revision side, captured by the [`RevisionStore`] trait:
//!
//! 1. create an article header (`wiki_article`)
//! 2. create its first revision (`wiki_articlerevision`)
//! 3. point the header at that revision (`current_revision_id`)
//!
//! Reads join the current revision directly in the lookup queries.
//!
//! All methods run on the caller's connection so they join the caller's
//! transaction.

use crate::db::error::DatabaseError;
use crate::models::Revision;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::{Connection, Row};

/// Revision columns, selected from `wiki_articlerevision AS r`
pub(crate) const REVISION_COLUMNS: &str = "r.id, r.article_id, r.revision_number, \
     r.previous_revision_id, r.title, r.content, r.created, r.modified, r.deleted, r.locked";

/// Content-revision collaborator consumed by the tree coordinator
#[async_trait]
pub trait RevisionStore: Send + Sync {
    /// Create an article header with no current revision, returning its id
    async fn create_article(&self, conn: &Connection) -> Result<i64, DatabaseError>;

    /// Create the first revision of an article, returning the revision id
    async fn create_revision(
        &self,
        conn: &Connection,
        article_id: i64,
        title: &str,
        content: &str,
    ) -> Result<i64, DatabaseError>;

    /// Make `revision_id` the article's current revision
    async fn attach_revision(
        &self,
        conn: &Connection,
        article_id: i64,
        revision_id: i64,
    ) -> Result<(), DatabaseError>;
}

/// [`RevisionStore`] over the `wiki_article` / `wiki_articlerevision` tables
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlRevisionStore;

#[async_trait]
impl RevisionStore for SqlRevisionStore {
    async fn create_article(&self, conn: &Connection) -> Result<i64, DatabaseError> {
        // current_revision_id is UNIQUE, so it is set once the revision exists
        conn.execute(
            "INSERT INTO wiki_article
                (created, modified, group_read, group_write, other_read, other_write, current_revision_id)
             VALUES (CURRENT_TIMESTAMP, CURRENT_TIMESTAMP, TRUE, TRUE, TRUE, TRUE, NULL)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to insert record into wiki_article: {}", e))
        })?;

        Ok(conn.last_insert_rowid())
    }

    async fn create_revision(
        &self,
        conn: &Connection,
        article_id: i64,
        title: &str,
        content: &str,
    ) -> Result<i64, DatabaseError> {
        conn.execute(
            "INSERT INTO wiki_articlerevision
                (article_id, revision_number, previous_revision_id, title, content,
                 created, modified, deleted, locked, user_message, automatic_log)
             VALUES (?, 1, NULL, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP, FALSE, FALSE, '', '')",
            (article_id, title, content),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to insert record into wiki_articlerevision: {}",
                e
            ))
        })?;

        Ok(conn.last_insert_rowid())
    }

    async fn attach_revision(
        &self,
        conn: &Connection,
        article_id: i64,
        revision_id: i64,
    ) -> Result<(), DatabaseError> {
        let affected = conn
            .execute(
                "UPDATE wiki_article
                 SET current_revision_id = ?, modified = CURRENT_TIMESTAMP
                 WHERE id = ?",
                (revision_id, article_id),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to update 'current_revision_id' in wiki_article: {}",
                    e
                ))
            })?;

        if affected != 1 {
            return Err(DatabaseError::sql_execution(format!(
                "Failed to update 'current_revision_id' in wiki_article: article {} not found",
                article_id
            )));
        }

        Ok(())
    }
}

/// Parse timestamp from database - handles both SQLite and RFC3339 formats
///
/// SQLite CURRENT_TIMESTAMP returns: "YYYY-MM-DD HH:MM:SS"
fn parse_timestamp(column: &'static str, s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    Err(DatabaseError::row_decode(
        column,
        format!("unable to parse timestamp '{}'", s),
    ))
}

/// Decode the revision columns starting at `offset`
pub(crate) fn decode_revision(row: &Row, offset: i32) -> Result<Revision, DatabaseError> {
    let id: i64 = row
        .get(offset)
        .map_err(|e| DatabaseError::row_decode("revision.id", e))?;
    let article_id: i64 = row
        .get(offset + 1)
        .map_err(|e| DatabaseError::row_decode("revision.article_id", e))?;
    let revision_number: i64 = row
        .get(offset + 2)
        .map_err(|e| DatabaseError::row_decode("revision_number", e))?;
    let previous_revision_id: Option<i64> = row
        .get(offset + 3)
        .map_err(|e| DatabaseError::row_decode("previous_revision_id", e))?;
    let title: String = row
        .get(offset + 4)
        .map_err(|e| DatabaseError::row_decode("title", e))?;
    let content: String = row
        .get(offset + 5)
        .map_err(|e| DatabaseError::row_decode("content", e))?;
    let created: String = row
        .get(offset + 6)
        .map_err(|e| DatabaseError::row_decode("created", e))?;
    let modified: String = row
        .get(offset + 7)
        .map_err(|e| DatabaseError::row_decode("modified", e))?;
    let deleted: i64 = row
        .get(offset + 8)
        .map_err(|e| DatabaseError::row_decode("deleted", e))?;
    let locked: i64 = row
        .get(offset + 9)
        .map_err(|e| DatabaseError::row_decode("locked", e))?;

    Ok(Revision {
        id,
        article_id,
        revision_number,
        previous_revision_id,
        title,
        content,
        created: parse_timestamp("created", &created)?,
        modified: parse_timestamp("modified", &modified)?,
        deleted: deleted != 0,
        locked: locked != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseService;
    use tempfile::TempDir;

    #[test]
    fn test_parse_timestamp_formats() {
        let sqlite = parse_timestamp("created", "2024-03-01 12:30:00").unwrap();
        let rfc = parse_timestamp("created", "2024-03-01T12:30:00Z").unwrap();
        assert_eq!(sqlite, rfc);
        assert!(parse_timestamp("created", "yesterday").is_err());
    }

    async fn current_revision(conn: &Connection, article_id: i64) -> Option<Revision> {
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM wiki_article AS a
                     JOIN wiki_articlerevision AS r ON r.id = a.current_revision_id
                     WHERE a.id = ?",
                    REVISION_COLUMNS
                ),
                [article_id],
            )
            .await
            .unwrap();
        rows.next()
            .await
            .unwrap()
            .map(|row| decode_revision(&row, 0).unwrap())
    }

    #[tokio::test]
    async fn test_create_and_attach_revision() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let conn = db.connect_with_timeout().await.unwrap();
        let store = SqlRevisionStore;

        let article_id = store.create_article(&conn).await.unwrap();
        assert!(current_revision(&conn, article_id).await.is_none());

        let revision_id = store
            .create_revision(&conn, article_id, "Title", "Body")
            .await
            .unwrap();
        store
            .attach_revision(&conn, article_id, revision_id)
            .await
            .unwrap();

        let revision = current_revision(&conn, article_id).await.unwrap();
        assert_eq!(revision.id, revision_id);
        assert_eq!(revision.article_id, article_id);
        assert_eq!(revision.revision_number, 1);
        assert_eq!(revision.previous_revision_id, None);
        assert_eq!(revision.title, "Title");
        assert_eq!(revision.content, "Body");
        assert!(!revision.deleted);
        assert!(!revision.locked);
    }

    #[tokio::test]
    async fn test_attach_to_missing_article_fails() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let conn = db.connect_with_timeout().await.unwrap();

        let result = SqlRevisionStore.attach_revision(&conn, 999, 1).await;
        assert!(result.is_err());
    }
}
