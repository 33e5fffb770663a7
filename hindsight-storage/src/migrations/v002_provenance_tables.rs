//! v002 — provenance DAG nodes, edges, compliance certificates.
//!
//! Derivation edges hold logical FKs plus (source_type, target_type) tags;
//! endpoints span three node tables so there is no cross-table constraint.
//! The partial unique index on attribution_edges enforces the one-current-
//! edge-per-pair invariant at the schema level.

use rusqlite::Connection;

use hindsight_core::HindsightResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> HindsightResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE interaction_nodes (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL,
            agent_id    TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );
        CREATE INDEX idx_inodes_user ON interaction_nodes (user_id);

        CREATE TABLE memory_nodes (
            id          TEXT PRIMARY KEY,
            owner       TEXT NOT NULL,
            shard_id    INTEGER NOT NULL,
            status      TEXT NOT NULL DEFAULT 'active',
            created_at  TEXT NOT NULL
        );
        CREATE INDEX idx_mnodes_owner ON memory_nodes (owner);
        CREATE INDEX idx_mnodes_shard ON memory_nodes (shard_id);

        CREATE TABLE summary_nodes (
            id            TEXT PRIMARY KEY,
            content_hash  TEXT NOT NULL,
            token_count   INTEGER NOT NULL,
            created_at    TEXT NOT NULL
        );

        CREATE TABLE embedding_nodes (
            id          TEXT PRIMARY KEY,
            vector_ref  TEXT NOT NULL,
            dim         INTEGER NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE response_nodes (
            id              TEXT PRIMARY KEY,
            interaction_id  TEXT NOT NULL,
            model           TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE creation_edges (
            interaction_id  TEXT NOT NULL,
            memory_id       TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            PRIMARY KEY (interaction_id, memory_id)
        );
        CREATE INDEX idx_creation_memory ON creation_edges (memory_id);

        CREATE TABLE derivation_edges (
            source_id        TEXT NOT NULL,
            source_type      TEXT NOT NULL,
            target_id        TEXT NOT NULL,
            target_type      TEXT NOT NULL,
            derivation_type  TEXT NOT NULL,
            created_at       TEXT NOT NULL,
            PRIMARY KEY (source_id, target_id, derivation_type)
        );
        CREATE INDEX idx_derivation_source ON derivation_edges (source_id);

        CREATE TABLE attribution_edges (
            id                     TEXT PRIMARY KEY,
            source_memory_id       TEXT NOT NULL,
            target_interaction_id  TEXT NOT NULL,
            score                  REAL NOT NULL,
            score_type             TEXT NOT NULL,
            version                INTEGER NOT NULL,
            is_current             INTEGER NOT NULL DEFAULT 1,
            month_bucket           TEXT NOT NULL,
            created_at             TEXT NOT NULL
        );
        CREATE UNIQUE INDEX idx_attr_edges_current
            ON attribution_edges (source_memory_id, target_interaction_id)
            WHERE is_current = 1;
        CREATE UNIQUE INDEX idx_attr_edges_version
            ON attribution_edges (source_memory_id, target_interaction_id, version);
        CREATE INDEX idx_attr_edges_month ON attribution_edges (month_bucket);
        CREATE INDEX idx_attr_edges_source ON attribution_edges (source_memory_id);

        CREATE TABLE statement_attribution_edges (
            memory_id        TEXT NOT NULL,
            response_id      TEXT NOT NULL,
            statement_index  INTEGER NOT NULL,
            score            REAL NOT NULL,
            created_at       TEXT NOT NULL,
            PRIMARY KEY (memory_id, response_id, statement_index)
        );

        CREATE TABLE compliance_certificates (
            id                TEXT PRIMARY KEY,
            user_id           TEXT NOT NULL,
            request_type      TEXT NOT NULL,
            footprint         TEXT NOT NULL,
            snapshot_hash     TEXT NOT NULL,
            grace_period_end  TEXT NOT NULL,
            verified          INTEGER NOT NULL DEFAULT 0,
            created_at        TEXT NOT NULL
        );
        CREATE INDEX idx_certs_user ON compliance_certificates (user_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))
}
