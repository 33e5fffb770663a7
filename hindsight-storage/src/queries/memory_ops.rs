//! Insert, fetch, patch, status transitions, and grace-period GC for memories.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use hindsight_core::errors::StorageError;
use hindsight_core::models::{Memory, MemoryStatus, Tier};
use hindsight_core::{HindsightError, HindsightResult};

use crate::{blob_to_embedding, embedding_to_blob, to_storage_err};

use super::{enum_str, parse_dt, parse_enum, parse_uuid, OptionalRow};

const MEMORY_COLUMNS: &str = "id, owner, content, embedding, token_count, memory_type,
     criticality, tier, status, shard_id, content_hash, created_at, last_accessed, deleted_at";

/// Insert a single memory.
pub fn insert_memory(conn: &Connection, memory: &Memory) -> HindsightResult<()> {
    conn.execute(
        "INSERT INTO memories (
            id, owner, content, embedding, token_count, memory_type,
            criticality, tier, status, shard_id, content_hash,
            created_at, last_accessed, deleted_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            memory.id.to_string(),
            memory.owner,
            memory.content,
            embedding_to_blob(&memory.embedding),
            memory.token_count,
            enum_str(&memory.memory_type)?,
            enum_str(&memory.criticality)?,
            enum_str(&memory.tier)?,
            memory.status.as_str(),
            memory.shard_id,
            memory.content_hash,
            memory.created_at.to_rfc3339(),
            memory.last_accessed.to_rfc3339(),
            memory.deleted_at.map(|t| t.to_rfc3339()),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Get a single memory by ID regardless of status.
pub fn get_memory(conn: &Connection, id: Uuid) -> HindsightResult<Option<Memory>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1"))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let result = stmt
        .query_row(params![id.to_string()], |row| Ok(row_to_memory(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    result.transpose()
}

/// Fetch the snapshot rows for an id list, **ignoring soft-delete**, sorted
/// by id. The caller re-aligns rows to its stored snapshot order.
pub fn get_memories_by_ids_any_status(
    conn: &Connection,
    ids: &[Uuid],
) -> HindsightResult<Vec<Memory>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = std::iter::repeat("?")
        .take(ids.len())
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {MEMORY_COLUMNS} FROM memories WHERE id IN ({placeholders}) ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;

    let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    let rows = stmt
        .query_map(rusqlite::params_from_iter(id_strings.iter()), |row| {
            Ok(row_to_memory(row))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut out = Vec::with_capacity(ids.len());
    for row in rows {
        out.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(out)
}

/// All active memories (the live retrieval view).
pub fn get_active_memories(conn: &Connection) -> HindsightResult<Vec<Memory>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories WHERE status = 'active' ORDER BY id"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| Ok(row_to_memory(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(out)
}

/// Patch mutable metadata (tier). Other fields are immutable after create.
pub fn patch_memory(conn: &Connection, id: Uuid, tier: Option<Tier>) -> HindsightResult<()> {
    if let Some(tier) = tier {
        let rows = conn
            .execute(
                "UPDATE memories SET tier = ?2 WHERE id = ?1",
                params![id.to_string(), enum_str(&tier)?],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        if rows == 0 {
            return Err(HindsightError::MemoryNotFound { id: id.to_string() });
        }
    }
    Ok(())
}

pub fn touch_last_accessed(conn: &Connection, id: Uuid, at: DateTime<Utc>) -> HindsightResult<()> {
    conn.execute(
        "UPDATE memories SET last_accessed = ?2 WHERE id = ?1",
        params![id.to_string(), at.to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Advance a memory's lifecycle status. Rejects regressions; stamps
/// `deleted_at` when entering pending_deletion or deleted.
pub fn advance_status(
    conn: &Connection,
    id: Uuid,
    next: MemoryStatus,
    at: DateTime<Utc>,
) -> HindsightResult<()> {
    let memory =
        get_memory(conn, id)?.ok_or_else(|| HindsightError::MemoryNotFound { id: id.to_string() })?;

    if !memory.status.can_advance_to(next) {
        return Err(HindsightError::StorageError(StorageError::IllegalStatusTransition {
            id: id.to_string(),
            from: memory.status.as_str().into(),
            to: next.as_str().into(),
        }));
    }

    let stamps_deletion =
        matches!(next, MemoryStatus::PendingDeletion | MemoryStatus::Deleted)
            && memory.deleted_at.is_none();

    conn.execute(
        "UPDATE memories SET status = ?2,
            deleted_at = CASE WHEN ?3 THEN ?4 ELSE deleted_at END
         WHERE id = ?1",
        params![id.to_string(), next.as_str(), stamps_deletion, at.to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Hard-delete memories whose grace period has lapsed. Returns deleted ids.
pub fn hard_delete_expired(
    conn: &Connection,
    now: DateTime<Utc>,
    grace_days: i64,
) -> HindsightResult<Vec<Uuid>> {
    let cutoff = (now - Duration::days(grace_days)).to_rfc3339();

    let mut stmt = conn
        .prepare(
            "SELECT id FROM memories
             WHERE status = 'pending_deletion' AND deleted_at IS NOT NULL AND deleted_at < ?1",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let ids: Vec<String> = stmt
        .query_map(params![cutoff], |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<_, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut deleted = Vec::with_capacity(ids.len());
    for id in &ids {
        conn.execute(
            "UPDATE memories SET status = 'deleted', content = '', embedding = x'' WHERE id = ?1",
            params![id],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
        deleted.push(parse_uuid(id)?);
    }
    Ok(deleted)
}

fn row_to_memory(row: &Row<'_>) -> HindsightResult<Memory> {
    let id_str: String = row.get(0).map_err(|e| to_storage_err(e.to_string()))?;
    let embedding_blob: Vec<u8> = row.get(3).map_err(|e| to_storage_err(e.to_string()))?;
    let memory_type_str: String = row.get(5).map_err(|e| to_storage_err(e.to_string()))?;
    let criticality_str: String = row.get(6).map_err(|e| to_storage_err(e.to_string()))?;
    let tier_str: String = row.get(7).map_err(|e| to_storage_err(e.to_string()))?;
    let status_str: String = row.get(8).map_err(|e| to_storage_err(e.to_string()))?;
    let created_str: String = row.get(11).map_err(|e| to_storage_err(e.to_string()))?;
    let accessed_str: String = row.get(12).map_err(|e| to_storage_err(e.to_string()))?;
    let deleted_str: Option<String> = row.get(13).map_err(|e| to_storage_err(e.to_string()))?;

    Ok(Memory {
        id: parse_uuid(&id_str)?,
        owner: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
        content: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
        embedding: blob_to_embedding(&embedding_blob)?,
        token_count: row.get(4).map_err(|e| to_storage_err(e.to_string()))?,
        memory_type: parse_enum("memory_type", &memory_type_str)?,
        criticality: parse_enum("criticality", &criticality_str)?,
        tier: parse_enum("tier", &tier_str)?,
        status: parse_enum("status", &status_str)?,
        shard_id: row.get(9).map_err(|e| to_storage_err(e.to_string()))?,
        content_hash: row.get(10).map_err(|e| to_storage_err(e.to_string()))?,
        created_at: parse_dt(&created_str)?,
        last_accessed: parse_dt(&accessed_str)?,
        deleted_at: deleted_str.as_deref().map(parse_dt).transpose()?,
    })
}
