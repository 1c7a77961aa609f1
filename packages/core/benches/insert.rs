//! Insertion benchmarks for the nested-set tree
//!
//! Run with: `cargo bench -p wikitree-core`
//!
//! Every child insertion rewrites the bounds of all nodes to its right, so
//! cost grows with the number of nodes after the insertion point:
//! - appending under the root shifts only the root
//! - inserting under the left-most leaf shifts the whole tree

use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use wikitree_core::db::DatabaseService;
use wikitree_core::{TreeConfig, TreeService};

/// Setup a service with a fresh database
async fn setup_test_service() -> (TreeService, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = TreeConfig::with_database_path(temp_dir.path().join("bench.db"));
    let db = Arc::new(DatabaseService::from_config(&config).await.unwrap());
    (TreeService::new(db, &config), temp_dir)
}

/// Benchmark appending children under the root
fn bench_append_under_root(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    c.bench_function("create_child_append", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let (service, _temp) = setup_test_service().await;
                let root = service.create_root("Root", "").await.unwrap();

                let start = std::time::Instant::now();
                for i in 0..iters {
                    service
                        .create_child(root.id, &format!("child-{}", i), "Child", "")
                        .await
                        .unwrap();
                }
                start.elapsed()
            })
        });
    });
}

/// Benchmark inserting at the far left of a 500-node tree
///
/// Every insertion shifts both bounds of every existing node.
fn bench_insert_far_left(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("create_child_far_left");
    group.sample_size(20);
    group.bench_function("500_nodes", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let (service, _temp) = setup_test_service().await;
                let root = service.create_root("Root", "").await.unwrap();
                let first = service.create_child(root.id, "first", "First", "").await.unwrap();
                for i in 0..500 {
                    service
                        .create_child(root.id, &format!("filler-{}", i), "Filler", "")
                        .await
                        .unwrap();
                }

                let start = std::time::Instant::now();
                for i in 0..iters {
                    service
                        .create_child(first.id, &format!("leaf-{}", i), "Leaf", "")
                        .await
                        .unwrap();
                }
                start.elapsed()
            })
        });
    });
    group.finish();
}

criterion_group!(benches, bench_append_under_root, bench_insert_far_left);
criterion_main!(benches);
