//! Migration runner and schema shape.

use hindsight_storage::{migrations, StorageEngine};

#[test]
fn migrations_apply_once_and_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hindsight.db");

    let engine = StorageEngine::open(&path).unwrap();
    let version = engine
        .pool()
        .writer
        .with_conn_sync(|conn| migrations::current_version(conn))
        .unwrap();
    assert_eq!(version, migrations::LATEST_VERSION);
    drop(engine);

    // Reopen: nothing new to apply.
    let engine = StorageEngine::open(&path).unwrap();
    let applied = engine
        .pool()
        .writer
        .with_conn_sync(|conn| migrations::run_migrations(conn))
        .unwrap();
    assert_eq!(applied, 0);
}

#[test]
fn all_tables_exist_after_migration() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let expected = [
        "memories",
        "interactions",
        "attribution_scores",
        "memory_profiles",
        "interaction_nodes",
        "memory_nodes",
        "summary_nodes",
        "embedding_nodes",
        "response_nodes",
        "creation_edges",
        "derivation_edges",
        "attribution_edges",
        "statement_attribution_edges",
        "compliance_certificates",
        "contradictions",
        "health_snapshots",
        "calibration_pairs",
        "agent_cost_configs",
    ];

    engine
        .pool()
        .writer
        .with_conn_sync(|conn| {
            for table in expected {
                let exists: bool = conn
                    .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1")
                    .and_then(|mut stmt| stmt.exists([table]))
                    .unwrap();
                assert!(exists, "missing table {table}");
            }
            Ok(())
        })
        .unwrap();
}
