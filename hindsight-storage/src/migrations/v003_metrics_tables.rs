//! v003 — portfolio metrics inputs and dashboard history.

use rusqlite::Connection;

use hindsight_core::HindsightResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> HindsightResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE contradictions (
            memory_a     TEXT NOT NULL,
            memory_b     TEXT NOT NULL,
            probability  REAL NOT NULL,
            kind         TEXT NOT NULL,
            created_at   TEXT NOT NULL,
            PRIMARY KEY (memory_a, memory_b)
        );

        CREATE TABLE health_snapshots (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            payload     TEXT NOT NULL,
            gini        REAL NOT NULL,
            snr_db      REAL NOT NULL,
            waste_rate  REAL NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE calibration_pairs (
            interaction_id   TEXT NOT NULL,
            memory_id        TEXT NOT NULL,
            eas_score        REAL NOT NULL,
            reference_score  REAL NOT NULL,
            created_at       TEXT NOT NULL,
            PRIMARY KEY (interaction_id, memory_id)
        );

        CREATE TABLE agent_cost_configs (
            agent_id           TEXT PRIMARY KEY,
            input_token_cost   REAL NOT NULL,
            output_token_cost  REAL NOT NULL,
            queries_per_day    REAL NOT NULL
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))
}
