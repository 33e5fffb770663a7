//! Memory CRUD, snapshot fetches, and lifecycle transitions.

use chrono::{Duration, Utc};

use hindsight_core::models::{MemoryStatus, Tier};
use hindsight_storage::queries::memory_ops;
use hindsight_storage::StorageEngine;
use test_fixtures::make_memory;

#[test]
fn insert_and_get_round_trips_all_fields() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mem = make_memory("user-a", "the capital of france is paris", 32);
    engine.create_memory(&mem).unwrap();

    let got = engine.get_memory(mem.id).unwrap().unwrap();
    assert_eq!(got.id, mem.id);
    assert_eq!(got.owner, mem.owner);
    assert_eq!(got.content, mem.content);
    assert_eq!(got.embedding, mem.embedding);
    assert_eq!(got.token_count, mem.token_count);
    assert_eq!(got.status, MemoryStatus::Active);
    assert_eq!(got.shard_id, mem.shard_id);
    assert_eq!(got.content_hash, mem.content_hash);
    assert!(got.deleted_at.is_none());
}

#[test]
fn snapshot_fetch_ignores_soft_delete_and_sorts_by_id() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let a = make_memory("u", "alpha", 16);
    let b = make_memory("u", "bravo", 16);
    let c = make_memory("u", "charlie", 16);
    for m in [&a, &b, &c] {
        engine.create_memory(m).unwrap();
    }

    // Soft-delete b between snapshot and fetch.
    engine
        .advance_memory_status(b.id, MemoryStatus::PendingDeletion, Utc::now())
        .unwrap();

    let rows = engine
        .memories_by_ids_any_status(&[a.id, b.id, c.id])
        .unwrap();
    assert_eq!(rows.len(), 3, "soft-deleted row must still be fetched");

    // Sorted by id (uuidv7 ids sort by creation order).
    let ids: Vec<_> = rows.iter().map(|m| m.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[test]
fn status_regression_is_rejected() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mem = make_memory("u", "x", 8);
    engine.create_memory(&mem).unwrap();

    engine
        .advance_memory_status(mem.id, MemoryStatus::PendingDeletion, Utc::now())
        .unwrap();
    engine
        .advance_memory_status(mem.id, MemoryStatus::Deleted, Utc::now())
        .unwrap();

    // Deleted can never return to active.
    let err = engine
        .advance_memory_status(mem.id, MemoryStatus::Active, Utc::now())
        .unwrap_err();
    assert!(err.to_string().contains("illegal status transition"));
}

#[test]
fn soft_delete_stamps_deleted_at_once() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mem = make_memory("u", "y", 8);
    engine.create_memory(&mem).unwrap();

    let t0 = Utc::now();
    engine
        .advance_memory_status(mem.id, MemoryStatus::PendingDeletion, t0)
        .unwrap();
    let first = engine.get_memory(mem.id).unwrap().unwrap().deleted_at.unwrap();

    engine
        .advance_memory_status(mem.id, MemoryStatus::Deleted, t0 + Duration::days(31))
        .unwrap();
    let second = engine.get_memory(mem.id).unwrap().unwrap().deleted_at.unwrap();
    assert_eq!(first, second, "deleted_at must not move on later transitions");
}

#[test]
fn patch_updates_tier_only() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mem = make_memory("u", "z", 8);
    engine.create_memory(&mem).unwrap();

    engine.patch_memory(mem.id, Some(Tier::Cold)).unwrap();
    let got = engine.get_memory(mem.id).unwrap().unwrap();
    assert_eq!(got.tier, Tier::Cold);
    assert_eq!(got.content, mem.content);
}

#[test]
fn hard_delete_scrubs_content_after_grace() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mem = make_memory("u", "sensitive payload", 8);
    engine.create_memory(&mem).unwrap();

    let now = Utc::now();
    // Soft-deleted 40 days ago; 30-day grace has lapsed.
    engine
        .advance_memory_status(mem.id, MemoryStatus::PendingDeletion, now - Duration::days(40))
        .unwrap();

    let deleted = engine
        .with_txn(|conn| memory_ops::hard_delete_expired(conn, now, 30))
        .unwrap();
    assert_eq!(deleted, vec![mem.id]);

    let got = engine.get_memory(mem.id).unwrap().unwrap();
    assert_eq!(got.status, MemoryStatus::Deleted);
    assert!(got.content.is_empty(), "content must be scrubbed");
    assert!(got.embedding.is_empty(), "embedding must be scrubbed");
}

#[test]
fn recent_soft_delete_survives_gc() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mem = make_memory("u", "fresh delete", 8);
    engine.create_memory(&mem).unwrap();

    let now = Utc::now();
    engine
        .advance_memory_status(mem.id, MemoryStatus::PendingDeletion, now - Duration::days(5))
        .unwrap();

    let deleted = engine
        .with_txn(|conn| memory_ops::hard_delete_expired(conn, now, 30))
        .unwrap();
    assert!(deleted.is_empty(), "grace period has not lapsed");
    let got = engine.get_memory(mem.id).unwrap().unwrap();
    assert_eq!(got.status, MemoryStatus::PendingDeletion);
    assert_eq!(got.content, "fresh delete");
}
