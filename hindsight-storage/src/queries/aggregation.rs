//! Aggregation queries feeding the portfolio metrics engine and dashboard.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use hindsight_core::models::{AgentAggregate, AgentCostConfig, CalibrationPair, Contradiction, DashboardOverview};
use hindsight_core::HindsightResult;

use crate::to_storage_err;

use super::{parse_dt, parse_uuid, OptionalRow};

/// Per-agent interaction counts, summed cost, and mean attribution score.
pub fn agent_aggregates(conn: &Connection) -> HindsightResult<Vec<AgentAggregate>> {
    let mut stmt = conn
        .prepare(
            "SELECT i.agent_id,
                    COUNT(*),
                    COALESCE(SUM(i.cost), 0),
                    COALESCE((
                        SELECT AVG(s.score)
                        FROM attribution_scores s
                        JOIN interactions i2 ON i2.id = s.interaction_id
                        WHERE i2.agent_id = i.agent_id
                    ), 0)
             FROM interactions i
             GROUP BY i.agent_id
             ORDER BY i.agent_id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(AgentAggregate {
                agent_id: row.get(0)?,
                interaction_count: row.get::<_, i64>(1)? as u64,
                total_cost: row.get(2)?,
                mean_score: row.get(3)?,
            })
        })
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))
}

/// Current attribution-edge scores across the whole record, in edge-id order.
pub fn all_current_scores(conn: &Connection) -> HindsightResult<Vec<f64>> {
    let mut stmt = conn
        .prepare("SELECT score FROM attribution_edges WHERE is_current = 1 ORDER BY id")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, f64>(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))
}

/// (memory_id, token_count, best |score| across positional rows) for every
/// memory that appears in at least one scored interaction.
pub fn retrieved_token_scores(conn: &Connection) -> HindsightResult<Vec<(Uuid, u32, f64)>> {
    let mut stmt = conn
        .prepare(
            "SELECT m.id, m.token_count, COALESCE(MAX(ABS(s.score)), 0)
             FROM memories m
             JOIN attribution_scores s ON s.memory_id = m.id
             GROUP BY m.id, m.token_count
             ORDER BY m.id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        let (id_str, tokens, score) = row.map_err(|e| to_storage_err(e.to_string()))?;
        out.push((parse_uuid(&id_str)?, tokens, score));
    }
    Ok(out)
}

pub fn insert_contradiction(conn: &Connection, c: &Contradiction) -> HindsightResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO contradictions (memory_a, memory_b, probability, kind, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            c.memory_a.to_string(),
            c.memory_b.to_string(),
            c.probability,
            c.kind,
            c.created_at.to_rfc3339()
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn all_contradictions(conn: &Connection) -> HindsightResult<Vec<Contradiction>> {
    let mut stmt = conn
        .prepare(
            "SELECT memory_a, memory_b, probability, kind, created_at
             FROM contradictions ORDER BY memory_a, memory_b",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        let (a, b, p, kind, at) = row.map_err(|e| to_storage_err(e.to_string()))?;
        out.push(Contradiction {
            memory_a: parse_uuid(&a)?,
            memory_b: parse_uuid(&b)?,
            probability: p,
            kind,
            created_at: parse_dt(&at)?,
        });
    }
    Ok(out)
}

pub fn insert_calibration_pair(conn: &Connection, pair: &CalibrationPair) -> HindsightResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO calibration_pairs
            (interaction_id, memory_id, eas_score, reference_score, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            pair.interaction_id.to_string(),
            pair.memory_id.to_string(),
            pair.eas_score,
            pair.reference_score,
            pair.created_at.to_rfc3339()
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn upsert_agent_cost_config(conn: &Connection, cfg: &AgentCostConfig) -> HindsightResult<()> {
    conn.execute(
        "INSERT INTO agent_cost_configs (agent_id, input_token_cost, output_token_cost, queries_per_day)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(agent_id) DO UPDATE SET
            input_token_cost = excluded.input_token_cost,
            output_token_cost = excluded.output_token_cost,
            queries_per_day = excluded.queries_per_day",
        params![cfg.agent_id, cfg.input_token_cost, cfg.output_token_cost, cfg.queries_per_day],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_agent_cost_config(
    conn: &Connection,
    agent_id: &str,
) -> HindsightResult<Option<AgentCostConfig>> {
    conn.query_row(
        "SELECT agent_id, input_token_cost, output_token_cost, queries_per_day
         FROM agent_cost_configs WHERE agent_id = ?1",
        params![agent_id],
        |row| {
            Ok(AgentCostConfig {
                agent_id: row.get(0)?,
                input_token_cost: row.get(1)?,
                output_token_cost: row.get(2)?,
                queries_per_day: row.get(3)?,
            })
        },
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Append a dashboard overview to the health history.
pub fn insert_health_snapshot(
    conn: &Connection,
    overview: &DashboardOverview,
    at: DateTime<Utc>,
) -> HindsightResult<()> {
    let payload = serde_json::to_string(overview).map_err(|e| to_storage_err(e.to_string()))?;
    conn.execute(
        "INSERT INTO health_snapshots (payload, gini, snr_db, waste_rate, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![payload, overview.gini, overview.snr_db, overview.waste_rate, at.to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn health_snapshot_count(conn: &Connection) -> HindsightResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM health_snapshots", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))
}
