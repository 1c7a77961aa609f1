//! Lookup resolver queries over a seeded tree
//!
//! ```text
//! R (1,14)
//! ├── guides (2,9)
//! │   ├── install (3,6)
//! │   │   └── linux (4,5)
//! │   └── notes (7,8)
//! └── faq (10,13)
//!     └── notes (11,12)
//! ```

#[cfg(test)]
mod lookup_tests {
    use crate::db::DatabaseService;
    use crate::models::{Article, NodeBounds};
    use crate::operations::{LookupResolver, TreeError};
    use crate::services::TreeService;
    use crate::TreeConfig;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Seeded {
        _temp: TempDir,
        db: Arc<DatabaseService>,
        ids: HashMap<&'static str, i64>,
    }

    async fn seed() -> Seeded {
        let temp = TempDir::new().unwrap();
        let config = TreeConfig::with_database_path(temp.path().join("test.db"));
        let db = Arc::new(DatabaseService::from_config(&config).await.unwrap());
        let service = TreeService::new(db.clone(), &config);

        let mut ids = HashMap::new();
        let root = service.create_root("R", "").await.unwrap();
        ids.insert("root", root.id);

        let guides = service.create_child(root.id, "guides", "Guides", "").await.unwrap();
        ids.insert("guides", guides.id);
        let install = service.create_child(guides.id, "install", "Install", "").await.unwrap();
        ids.insert("install", install.id);
        let linux = service.create_child(install.id, "linux", "Linux", "").await.unwrap();
        ids.insert("linux", linux.id);
        let notes = service.create_child(guides.id, "notes", "Guide notes", "").await.unwrap();
        ids.insert("guides/notes", notes.id);
        let faq = service.create_child(root.id, "faq", "FAQ", "").await.unwrap();
        ids.insert("faq", faq.id);
        let faq_notes = service.create_child(faq.id, "notes", "FAQ notes", "").await.unwrap();
        ids.insert("faq/notes", faq_notes.id);

        Seeded {
            _temp: temp,
            db,
            ids,
        }
    }

    fn ids(articles: &[Article]) -> Vec<i64> {
        articles.iter().map(Article::id).collect()
    }

    #[tokio::test]
    async fn test_seeded_bounds() {
        let s = seed().await;
        let conn = s.db.connect_with_timeout().await.unwrap();
        let lookup = LookupResolver::new(&conn, 1);

        assert_eq!(lookup.get_root().await.unwrap().bounds, NodeBounds::new(1, 14, 0));
        let linux = lookup.get_by_id(s.ids["linux"]).await.unwrap();
        assert_eq!(linux.bounds(), NodeBounds::new(4, 5, 3));
        let faq = lookup.get_by_id(s.ids["faq"]).await.unwrap();
        assert_eq!(faq.bounds(), NodeBounds::new(10, 13, 1));
    }

    #[tokio::test]
    async fn test_get_by_id_missing() {
        let s = seed().await;
        let conn = s.db.connect_with_timeout().await.unwrap();
        let lookup = LookupResolver::new(&conn, 1);

        let err = lookup.get_by_id(9999).await.unwrap_err();
        assert!(matches!(err, TreeError::NotFound { entity: "article", .. }));
    }

    #[tokio::test]
    async fn test_get_root_of_empty_tree() {
        let s = seed().await;
        let conn = s.db.connect_with_timeout().await.unwrap();

        let err = LookupResolver::new(&conn, 7).get_root().await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_by_id_is_scoped_to_tree() {
        let s = seed().await;
        let conn = s.db.connect_with_timeout().await.unwrap();

        let err = LookupResolver::new(&conn, 2)
            .get_by_id(s.ids["guides"])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_by_path_segment_prefers_shallowest_then_leftmost() {
        let s = seed().await;
        let conn = s.db.connect_with_timeout().await.unwrap();
        let lookup = LookupResolver::new(&conn, 1);

        let notes = lookup.get_by_path_segment("notes").await.unwrap();
        assert_eq!(notes.id(), s.ids["guides/notes"]);
        assert_eq!(notes.title(), "Guide notes");

        let linux = lookup.get_by_path_segment("linux").await.unwrap();
        assert_eq!(linux.id(), s.ids["linux"]);

        assert!(lookup
            .get_by_path_segment("missing")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_get_by_path_walks_segments() {
        let s = seed().await;
        let conn = s.db.connect_with_timeout().await.unwrap();
        let lookup = LookupResolver::new(&conn, 1);

        let linux = lookup.get_by_path("guides/install/linux").await.unwrap();
        assert_eq!(linux.id(), s.ids["linux"]);

        let faq_notes = lookup.get_by_path("/faq/notes/").await.unwrap();
        assert_eq!(faq_notes.id(), s.ids["faq/notes"]);

        assert!(lookup.get_by_path("").await.unwrap().is_root());

        let err = lookup.get_by_path("guides/linux").await.unwrap_err();
        assert!(err.to_string().contains("guides/linux"));
    }

    #[tokio::test]
    async fn test_get_parent() {
        let s = seed().await;
        let conn = s.db.connect_with_timeout().await.unwrap();
        let lookup = LookupResolver::new(&conn, 1);

        let linux = lookup.get_by_id(s.ids["linux"]).await.unwrap();
        let install = lookup.get_parent(&linux).await.unwrap();
        assert_eq!(install.id(), s.ids["install"]);
        assert_eq!(install.path_segment(), Some("install"));

        let root = Article::Root(lookup.get_root().await.unwrap());
        assert!(lookup.get_parent(&root).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_get_children_in_document_order() {
        let s = seed().await;
        let conn = s.db.connect_with_timeout().await.unwrap();
        let lookup = LookupResolver::new(&conn, 1);

        let children = lookup.get_children(s.ids["root"]).await.unwrap();
        assert_eq!(ids(&children), vec![s.ids["guides"], s.ids["faq"]]);

        assert!(lookup.get_children(s.ids["linux"]).await.unwrap().is_empty());
        assert!(lookup.get_children(9999).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_get_descendants_uses_bounds() {
        let s = seed().await;
        let conn = s.db.connect_with_timeout().await.unwrap();
        let lookup = LookupResolver::new(&conn, 1);

        let descendants = lookup.get_descendants(s.ids["guides"]).await.unwrap();
        assert_eq!(
            ids(&descendants),
            vec![s.ids["install"], s.ids["linux"], s.ids["guides/notes"]]
        );

        let all = lookup.get_descendants(s.ids["root"]).await.unwrap();
        assert_eq!(all.len(), 6);
    }

    #[tokio::test]
    async fn test_get_ancestors_root_first() {
        let s = seed().await;
        let conn = s.db.connect_with_timeout().await.unwrap();
        let lookup = LookupResolver::new(&conn, 1);

        let ancestors = lookup.get_ancestors(s.ids["linux"]).await.unwrap();
        assert_eq!(
            ids(&ancestors),
            vec![s.ids["root"], s.ids["guides"], s.ids["install"]]
        );
        assert!(lookup.get_ancestors(s.ids["root"]).await.unwrap().is_empty());
    }
}
