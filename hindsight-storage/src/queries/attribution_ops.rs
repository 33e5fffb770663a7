//! Positional attribution score rows written by the transaction protocol.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use hindsight_core::models::AttributionScore;
use hindsight_core::HindsightResult;

use crate::to_storage_err;

use super::{enum_str, parse_enum, parse_uuid};

/// Insert the full score vector for one interaction.
pub fn insert_scores(
    conn: &Connection,
    scores: &[AttributionScore],
    at: DateTime<Utc>,
) -> HindsightResult<()> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO attribution_scores
                (interaction_id, memory_id, rank, score, score_type, confidence, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    for s in scores {
        stmt.execute(params![
            s.interaction_id.to_string(),
            s.memory_id.to_string(),
            s.rank as i64,
            s.score,
            enum_str(&s.score_type)?,
            s.confidence,
            at.to_rfc3339(),
        ])
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

/// Scores for one interaction, in snapshot (rank) order.
pub fn get_scores_by_interaction(
    conn: &Connection,
    interaction_id: Uuid,
) -> HindsightResult<Vec<AttributionScore>> {
    let mut stmt = conn
        .prepare(
            "SELECT interaction_id, memory_id, rank, score, score_type, confidence
             FROM attribution_scores WHERE interaction_id = ?1 ORDER BY rank",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    collect_scores(&mut stmt, params![interaction_id.to_string()])
}

/// Every score ever written for one memory, newest interaction first.
pub fn get_scores_by_memory(
    conn: &Connection,
    memory_id: Uuid,
) -> HindsightResult<Vec<AttributionScore>> {
    let mut stmt = conn
        .prepare(
            "SELECT interaction_id, memory_id, rank, score, score_type, confidence
             FROM attribution_scores WHERE memory_id = ?1 ORDER BY interaction_id DESC",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    collect_scores(&mut stmt, params![memory_id.to_string()])
}

fn collect_scores(
    stmt: &mut rusqlite::Statement<'_>,
    params: impl rusqlite::Params,
) -> HindsightResult<Vec<AttributionScore>> {
    let rows = stmt
        .query_map(params, |row| Ok(row_to_score(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(out)
}

fn row_to_score(row: &Row<'_>) -> HindsightResult<AttributionScore> {
    let interaction_str: String = row.get(0).map_err(|e| to_storage_err(e.to_string()))?;
    let memory_str: String = row.get(1).map_err(|e| to_storage_err(e.to_string()))?;
    let score_type_str: String = row.get(4).map_err(|e| to_storage_err(e.to_string()))?;
    Ok(AttributionScore {
        interaction_id: parse_uuid(&interaction_str)?,
        memory_id: parse_uuid(&memory_str)?,
        rank: row.get::<_, i64>(2).map_err(|e| to_storage_err(e.to_string()))? as usize,
        score: row.get(3).map_err(|e| to_storage_err(e.to_string()))?,
        score_type: parse_enum("score_type", &score_type_str)?,
        confidence: row.get(5).map_err(|e| to_storage_err(e.to_string()))?,
    })
}
