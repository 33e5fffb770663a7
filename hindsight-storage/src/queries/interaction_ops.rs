//! Interaction lifecycle: insert, fetch, complete, expire.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use hindsight_core::models::{Interaction, InteractionStatus};
use hindsight_core::HindsightResult;

use crate::{blob_to_embedding, embedding_to_blob, to_storage_err};

use super::{parse_dt, parse_enum, parse_uuid, OptionalRow};

const INTERACTION_COLUMNS: &str = "id, agent_id, user_id, query_text, query_embedding,
     response_text, response_embedding, response_token_count, model,
     memory_ids, status, cost, created_at, completed_at";

/// Insert an interaction in whatever state the caller built it.
pub fn insert_interaction(conn: &Connection, interaction: &Interaction) -> HindsightResult<()> {
    let memory_ids_json = serde_json::to_string(
        &interaction
            .memory_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>(),
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT INTO interactions (
            id, agent_id, user_id, query_text, query_embedding,
            response_text, response_embedding, response_token_count, model,
            memory_ids, status, cost, created_at, completed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            interaction.id.to_string(),
            interaction.agent_id,
            interaction.user_id,
            interaction.query_text,
            embedding_to_blob(&interaction.query_embedding),
            interaction.response_text,
            interaction.response_embedding.as_deref().map(embedding_to_blob),
            interaction.response_token_count,
            interaction.model,
            memory_ids_json,
            status_str(interaction.status),
            interaction.cost,
            interaction.created_at.to_rfc3339(),
            interaction.completed_at.map(|t| t.to_rfc3339()),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_interaction(conn: &Connection, id: Uuid) -> HindsightResult<Option<Interaction>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {INTERACTION_COLUMNS} FROM interactions WHERE id = ?1"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;

    stmt.query_row(params![id.to_string()], |row| Ok(row_to_interaction(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?
        .transpose()
}

/// Fill in the response side and flip pending -> completed.
/// Only touches rows still pending; the caller handles idempotency.
pub fn complete_interaction(
    conn: &Connection,
    id: Uuid,
    response_text: &str,
    response_embedding: &[f32],
    response_token_count: u32,
    cost: f64,
    completed_at: DateTime<Utc>,
) -> HindsightResult<bool> {
    let rows = conn
        .execute(
            "UPDATE interactions SET
                response_text = ?2, response_embedding = ?3,
                response_token_count = ?4, cost = cost + ?5,
                status = 'completed', completed_at = ?6
             WHERE id = ?1 AND status = 'pending'",
            params![
                id.to_string(),
                response_text,
                embedding_to_blob(response_embedding),
                response_token_count,
                cost,
                completed_at.to_rfc3339(),
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(rows == 1)
}

/// Transition pending interactions older than the TTL to failed.
/// Returns the number garbage-collected.
pub fn fail_expired(
    conn: &Connection,
    now: DateTime<Utc>,
    ttl_hours: i64,
) -> HindsightResult<usize> {
    let cutoff = (now - Duration::hours(ttl_hours)).to_rfc3339();
    conn.execute(
        "UPDATE interactions SET status = 'failed'
         WHERE status = 'pending' AND created_at < ?1",
        params![cutoff],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

fn status_str(s: InteractionStatus) -> &'static str {
    match s {
        InteractionStatus::Pending => "pending",
        InteractionStatus::Completed => "completed",
        InteractionStatus::Failed => "failed",
    }
}

fn row_to_interaction(row: &Row<'_>) -> HindsightResult<Interaction> {
    let id_str: String = row.get(0).map_err(|e| to_storage_err(e.to_string()))?;
    let query_blob: Vec<u8> = row.get(4).map_err(|e| to_storage_err(e.to_string()))?;
    let response_blob: Option<Vec<u8>> = row.get(6).map_err(|e| to_storage_err(e.to_string()))?;
    let memory_ids_json: String = row.get(9).map_err(|e| to_storage_err(e.to_string()))?;
    let status_str: String = row.get(10).map_err(|e| to_storage_err(e.to_string()))?;
    let created_str: String = row.get(12).map_err(|e| to_storage_err(e.to_string()))?;
    let completed_str: Option<String> = row.get(13).map_err(|e| to_storage_err(e.to_string()))?;

    let memory_id_strings: Vec<String> = serde_json::from_str(&memory_ids_json)
        .map_err(|e| to_storage_err(format!("parse memory_ids: {e}")))?;
    let memory_ids = memory_id_strings
        .iter()
        .map(|s| parse_uuid(s))
        .collect::<HindsightResult<Vec<Uuid>>>()?;

    Ok(Interaction {
        id: parse_uuid(&id_str)?,
        agent_id: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
        user_id: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
        query_text: row.get(3).map_err(|e| to_storage_err(e.to_string()))?,
        query_embedding: blob_to_embedding(&query_blob)?,
        response_text: row.get(5).map_err(|e| to_storage_err(e.to_string()))?,
        response_embedding: response_blob.as_deref().map(blob_to_embedding).transpose()?,
        response_token_count: row.get(7).map_err(|e| to_storage_err(e.to_string()))?,
        model: row.get(8).map_err(|e| to_storage_err(e.to_string()))?,
        memory_ids,
        status: parse_enum("status", &status_str)?,
        cost: row.get(11).map_err(|e| to_storage_err(e.to_string()))?,
        created_at: parse_dt(&created_str)?,
        completed_at: completed_str.as_deref().map(parse_dt).transpose()?,
    })
}
