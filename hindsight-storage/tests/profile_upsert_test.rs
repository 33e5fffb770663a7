//! The atomic Welford upsert must match the in-process accumulator and
//! survive concurrent writers.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use hindsight_profile::Welford;
use hindsight_storage::queries::profile_ops;
use hindsight_storage::StorageEngine;

#[test]
fn sql_upsert_matches_welford_accumulator() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let memory_id = Uuid::now_v7();
    let scores = [0.31, 0.72, 0.05, 0.44, 0.91, 0.28, 0.13];

    let mut expected = Welford::new();
    for &x in &scores {
        engine
            .with_txn(|conn| profile_ops::upsert_profile(conn, memory_id, x, Utc::now()))
            .unwrap();
        expected.push(x);
    }

    let profile = engine.get_profile(memory_id).unwrap().unwrap();
    assert_eq!(profile.count, expected.count);
    assert!((profile.mean - expected.mean).abs() < 1e-9);
    assert!((profile.m2 - expected.m2).abs() < 1e-9);
    assert!(
        (profile.variance().unwrap() - expected.variance().unwrap()).abs() < 1e-9
    );
}

#[test]
fn concurrent_upserts_lose_no_update() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(StorageEngine::open(&dir.path().join("p.db")).unwrap());
    let memory_id = Uuid::now_v7();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let eng = Arc::clone(&engine);
            std::thread::spawn(move || {
                for i in 0..25 {
                    let score = (t * 25 + i) as f64 / 200.0;
                    eng.with_txn(|conn| {
                        profile_ops::upsert_profile(conn, memory_id, score, Utc::now())
                    })
                    .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let profile = engine.get_profile(memory_id).unwrap().unwrap();
    assert_eq!(profile.count, 200, "every update must land exactly once");

    // Welford is permutation-invariant on mean; check against the batch mean.
    let batch_mean = (0..200).map(|i| i as f64 / 200.0).sum::<f64>() / 200.0;
    assert!((profile.mean - batch_mean).abs() < 1e-9);
}

#[test]
fn profile_absent_before_first_write() {
    let engine = StorageEngine::open_in_memory().unwrap();
    assert!(engine.get_profile(Uuid::now_v7()).unwrap().is_none());
}
