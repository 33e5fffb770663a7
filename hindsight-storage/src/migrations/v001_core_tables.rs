//! v001 — memories, interactions, positional attribution scores, profiles.

use rusqlite::Connection;

use hindsight_core::HindsightResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> HindsightResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE memories (
            id              TEXT PRIMARY KEY,
            owner           TEXT NOT NULL,
            content         TEXT NOT NULL,
            embedding       BLOB NOT NULL,
            token_count     INTEGER NOT NULL,
            memory_type     TEXT NOT NULL DEFAULT 'raw',
            criticality     TEXT NOT NULL DEFAULT 'normal',
            tier            TEXT NOT NULL DEFAULT 'hot',
            status          TEXT NOT NULL DEFAULT 'active',
            shard_id        INTEGER NOT NULL,
            content_hash    TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            last_accessed   TEXT NOT NULL,
            deleted_at      TEXT
        );
        CREATE INDEX idx_memories_owner ON memories (owner);
        CREATE INDEX idx_memories_status ON memories (status);
        CREATE INDEX idx_memories_shard ON memories (shard_id);

        CREATE TABLE interactions (
            id                   TEXT PRIMARY KEY,
            agent_id             TEXT NOT NULL,
            user_id              TEXT NOT NULL,
            query_text           TEXT NOT NULL,
            query_embedding      BLOB NOT NULL,
            response_text        TEXT,
            response_embedding   BLOB,
            response_token_count INTEGER,
            model                TEXT,
            memory_ids           TEXT NOT NULL,
            status               TEXT NOT NULL DEFAULT 'pending',
            cost                 REAL NOT NULL DEFAULT 0,
            created_at           TEXT NOT NULL,
            completed_at         TEXT
        );
        CREATE INDEX idx_interactions_agent ON interactions (agent_id);
        CREATE INDEX idx_interactions_user ON interactions (user_id);
        CREATE INDEX idx_interactions_status ON interactions (status);

        CREATE TABLE attribution_scores (
            interaction_id  TEXT NOT NULL,
            memory_id       TEXT NOT NULL,
            rank            INTEGER NOT NULL,
            score           REAL NOT NULL,
            score_type      TEXT NOT NULL,
            confidence      REAL NOT NULL DEFAULT 1.0,
            created_at      TEXT NOT NULL,
            PRIMARY KEY (interaction_id, rank)
        );
        CREATE INDEX idx_scores_memory ON attribution_scores (memory_id);

        CREATE TABLE memory_profiles (
            memory_id   TEXT PRIMARY KEY,
            count       INTEGER NOT NULL,
            mean        REAL NOT NULL,
            m2          REAL NOT NULL,
            updated_at  TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))
}
