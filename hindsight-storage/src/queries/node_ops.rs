//! Provenance node inserts and lookups. Nodes never mutate after creation
//! except MemoryNode.status, which only advances.

use rusqlite::{params, Connection};
use uuid::Uuid;

use hindsight_core::errors::StorageError;
use hindsight_core::models::{
    EmbeddingNode, InteractionNode, MemoryNode, MemoryStatus, ResponseNode, SummaryNode,
};
use hindsight_core::{HindsightError, HindsightResult};

use crate::to_storage_err;

use super::{parse_dt, parse_enum, parse_uuid, OptionalRow};

pub fn insert_interaction_node(conn: &Connection, node: &InteractionNode) -> HindsightResult<()> {
    conn.execute(
        "INSERT INTO interaction_nodes (id, user_id, agent_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            node.id.to_string(),
            node.user_id,
            node.agent_id,
            node.created_at.to_rfc3339()
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn insert_memory_node(conn: &Connection, node: &MemoryNode) -> HindsightResult<()> {
    conn.execute(
        "INSERT INTO memory_nodes (id, owner, shard_id, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            node.id.to_string(),
            node.owner,
            node.shard_id,
            node.status.as_str(),
            node.created_at.to_rfc3339()
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn insert_summary_node(conn: &Connection, node: &SummaryNode) -> HindsightResult<()> {
    conn.execute(
        "INSERT INTO summary_nodes (id, content_hash, token_count, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            node.id.to_string(),
            node.content_hash,
            node.token_count,
            node.created_at.to_rfc3339()
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn insert_embedding_node(conn: &Connection, node: &EmbeddingNode) -> HindsightResult<()> {
    conn.execute(
        "INSERT INTO embedding_nodes (id, vector_ref, dim, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            node.id.to_string(),
            node.vector_ref,
            node.dim,
            node.created_at.to_rfc3339()
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn insert_response_node(conn: &Connection, node: &ResponseNode) -> HindsightResult<()> {
    conn.execute(
        "INSERT INTO response_nodes (id, interaction_id, model, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            node.id.to_string(),
            node.interaction_id.to_string(),
            node.model,
            node.created_at.to_rfc3339()
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_memory_node(conn: &Connection, id: Uuid) -> HindsightResult<Option<MemoryNode>> {
    conn.query_row(
        "SELECT id, owner, shard_id, status, created_at FROM memory_nodes WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        },
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))?
    .map(|(id_str, owner, shard_id, status_str, created_str)| {
        Ok(MemoryNode {
            id: parse_uuid(&id_str)?,
            owner,
            shard_id,
            status: parse_enum("status", &status_str)?,
            created_at: parse_dt(&created_str)?,
        })
    })
    .transpose()
}

/// Interaction node ids for a user — the footprint seed set.
pub fn interaction_nodes_for_user(conn: &Connection, user_id: &str) -> HindsightResult<Vec<Uuid>> {
    let mut stmt = conn
        .prepare("SELECT id FROM interaction_nodes WHERE user_id = ?1 ORDER BY id")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![user_id], |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(parse_uuid(&row.map_err(|e| to_storage_err(e.to_string()))?)?);
    }
    Ok(out)
}

/// Advance a memory node's status (monotonic, mirrors the memories table).
pub fn advance_memory_node_status(
    conn: &Connection,
    id: Uuid,
    next: MemoryStatus,
) -> HindsightResult<()> {
    let node = get_memory_node(conn, id)?.ok_or_else(|| {
        HindsightError::ProvenanceError(hindsight_core::errors::ProvenanceError::NodeNotFound {
            node_type: "memory".into(),
            id: id.to_string(),
        })
    })?;

    if !node.status.can_advance_to(next) {
        return Err(HindsightError::StorageError(StorageError::IllegalStatusTransition {
            id: id.to_string(),
            from: node.status.as_str().into(),
            to: next.as_str().into(),
        }));
    }

    conn.execute(
        "UPDATE memory_nodes SET status = ?2 WHERE id = ?1",
        params![id.to_string(), next.as_str()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
