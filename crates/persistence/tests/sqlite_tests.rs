//! SQLite backend integration tests.
//!
//! These tests verify the SQLite backend against the public storage traits.

mod common;

use serde_json::json;

use bookstore_persistence::backends::sqlite::{SqliteBackend, SqliteBackendConfig};
use bookstore_persistence::core::{
    AtomicWrites, Backend, CodeAssignment, EntityStorage, WriteOp, WriteOutcome,
};
use bookstore_persistence::query::{EntityQuery, Filter};
use bookstore_persistence::types::{EntityKind, PageWindow, RowState};

use common::*;

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let backend = create_file_backend(&dir, 2);
        backend
            .create(EntityKind::Author, Some("AU01".into()), json!({"name": "Le Guin"}))
            .await
            .unwrap();
    }

    let reopened = create_file_backend(&dir, 2);
    let author = reopened.read(EntityKind::Author, 1).await.unwrap().unwrap();
    assert_eq!(author.code(), Some("AU01"));
    assert_eq!(author.data()["name"], "Le Guin");
}

#[tokio::test]
async fn test_in_memory_backend_keeps_data_between_calls() {
    let backend = create_backend();
    backend
        .create(EntityKind::Category, None, json!({"name": "Poetry"}))
        .await
        .unwrap();
    let count = backend
        .count(&EntityQuery::new(EntityKind::Category))
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_backend_lifecycle() {
    let backend = SqliteBackend::with_config(":memory:", SqliteBackendConfig::default()).unwrap();
    backend.initialize().await.unwrap();
    backend.health_check().await.unwrap();
    assert_eq!(backend.name(), "sqlite");
    assert!(backend.is_memory());
}

// ============================================================================
// Rows
// ============================================================================

#[tokio::test]
async fn test_stored_entity_metadata() {
    let backend = create_backend();
    let created = backend
        .create(EntityKind::Book, Some("BO01".into()), json!({"title": "Dune"}))
        .await
        .unwrap();

    assert_eq!(created.kind(), EntityKind::Book);
    assert_eq!(created.state(), RowState::Active);
    assert_eq!(created.created_at(), created.updated_at());
    assert!(created.deleted_at().is_none());

    let serialized = serde_json::to_value(&created).unwrap();
    assert_eq!(serialized["id"], 1);
    assert_eq!(serialized["code"], "BO01");
    assert_eq!(serialized["title"], "Dune");
}

#[tokio::test]
async fn test_deleted_row_is_visible_only_with_include_deleted() {
    let backend = create_backend();
    backend
        .create(EntityKind::Book, None, json!({"title": "Dune"}))
        .await
        .unwrap();
    backend.delete(EntityKind::Book, 1).await.unwrap();

    let all = EntityQuery::new(EntityKind::Book).include_deleted();
    let rows = backend.fetch(&all, PageWindow::all()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].state(), RowState::Deleted);
    assert!(rows[0].deleted_at().is_some());

    assert_not_found(backend.update(EntityKind::Book, 1, 2, json!({"title": "x"})).await);
}

#[tokio::test]
async fn test_update_of_missing_row_is_not_found() {
    let backend = create_backend();
    assert_not_found(backend.update(EntityKind::Author, 9, 1, json!({})).await);
    assert_not_found(backend.delete(EntityKind::Author, 9).await);
}

#[tokio::test]
async fn test_stale_version_is_rejected() {
    let backend = create_backend();
    let created = backend
        .create(EntityKind::Author, None, json!({"name": "A"}))
        .await
        .unwrap();
    backend
        .update(EntityKind::Author, created.id(), 1, json!({"name": "B"}))
        .await
        .unwrap();

    assert_version_conflict(
        backend
            .update(EntityKind::Author, created.id(), 1, json!({"name": "C"}))
            .await,
    );
    let current = backend.read(EntityKind::Author, created.id()).await.unwrap().unwrap();
    assert_eq!(current.data()["name"], "B");
}

#[tokio::test]
async fn test_duplicate_code_is_already_exists() {
    let backend = create_backend();
    backend
        .create(EntityKind::Book, Some("BO01".into()), json!({}))
        .await
        .unwrap();
    assert_already_exists(
        backend
            .create(EntityKind::Book, Some("BO01".into()), json!({}))
            .await,
    );
    // Same code under another kind is fine.
    backend
        .create(EntityKind::Author, Some("BO01".into()), json!({}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_null_filter_matches_missing_fields() {
    let backend = create_backend();
    backend
        .create(EntityKind::Purchase, None, json!({"transaction_id": null}))
        .await
        .unwrap();
    backend
        .create(EntityKind::Purchase, None, json!({"transaction_id": 4}))
        .await
        .unwrap();
    backend.create(EntityKind::Purchase, None, json!({})).await.unwrap();

    let open = EntityQuery::new(EntityKind::Purchase).filter(Filter::is_null("transaction_id"));
    let ids: Vec<u64> = backend
        .fetch_all(&open)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id())
        .collect();
    assert_eq!(ids, vec![1, 3]);
}

// ============================================================================
// Batches
// ============================================================================

#[tokio::test]
async fn test_batch_outcomes_follow_op_order() {
    let backend = create_backend();
    let book = backend
        .create(EntityKind::Book, None, json!({"title": "Dune"}))
        .await
        .unwrap();

    let outcomes = backend
        .apply_batch(vec![
            WriteOp::create(
                EntityKind::Purchase,
                CodeAssignment::Sequential {
                    prefix: "PC".to_string(),
                },
                json!({"book_id": book.id()}),
            ),
            WriteOp::update(EntityKind::Book, book.id(), book.version(), json!({"title": "Dune II"})),
            WriteOp::delete(EntityKind::Book, book.id(), book.version() + 1),
        ])
        .await
        .unwrap();

    assert!(matches!(&outcomes[0], WriteOutcome::Created(r) if r.code() == Some("PC01")));
    assert!(matches!(&outcomes[1], WriteOutcome::Updated(r) if r.version() == 2));
    assert!(matches!(
        outcomes[2],
        WriteOutcome::Deleted {
            kind: EntityKind::Book,
            id: 1
        }
    ));
    assert!(backend.read(EntityKind::Book, book.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_batch_leaves_no_trace() {
    let backend = create_backend();
    let book = backend
        .create(EntityKind::Book, None, json!({"title": "Dune"}))
        .await
        .unwrap();

    let result = backend
        .apply_batch(vec![
            WriteOp::update(EntityKind::Book, book.id(), book.version(), json!({"title": "Changed"})),
            WriteOp::create(EntityKind::Purchase, CodeAssignment::None, json!({})),
            WriteOp::delete(EntityKind::Author, 42, 1),
        ])
        .await;
    assert_not_found(result);

    let unchanged = backend.read(EntityKind::Book, book.id()).await.unwrap().unwrap();
    assert_eq!(unchanged.data()["title"], "Dune");
    assert_eq!(unchanged.version(), 1);
    let purchases = EntityQuery::new(EntityKind::Purchase).include_deleted();
    assert_eq!(backend.count(&purchases).await.unwrap(), 0);
}

#[tokio::test]
async fn test_link_to_a_later_op_is_rejected() {
    let backend = create_backend();
    let purchase = backend.create(EntityKind::Purchase, None, json!({})).await.unwrap();

    let result = backend
        .apply_batch(vec![
            WriteOp::update(EntityKind::Purchase, purchase.id(), 1, json!({})).linking("transaction_id", 1),
            WriteOp::create(EntityKind::Transaction, CodeAssignment::None, json!({})),
        ])
        .await;
    assert_invalid_parameter(result, "link");
}
