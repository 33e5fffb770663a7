//! Provenance edge writes and reads. Everything here is append-only;
//! attribution-edge versioning is a flip-plus-insert inside the caller's
//! transaction.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use hindsight_core::models::{
    month_bucket, AttributionEdge, CreationEdge, DerivationEdge, ScoreType,
    StatementAttributionEdge,
};
use hindsight_core::HindsightResult;

use crate::to_storage_err;

use super::{enum_str, parse_dt, parse_enum, parse_uuid};

pub fn insert_creation_edge(conn: &Connection, edge: &CreationEdge) -> HindsightResult<()> {
    conn.execute(
        "INSERT INTO creation_edges (interaction_id, memory_id, created_at)
         VALUES (?1, ?2, ?3)",
        params![
            edge.interaction_id.to_string(),
            edge.memory_id.to_string(),
            edge.created_at.to_rfc3339()
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn insert_derivation_edge(conn: &Connection, edge: &DerivationEdge) -> HindsightResult<()> {
    conn.execute(
        "INSERT INTO derivation_edges
            (source_id, source_type, target_id, target_type, derivation_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            edge.source_id.to_string(),
            edge.source_type.as_str(),
            edge.target_id.to_string(),
            edge.target_type.as_str(),
            edge.derivation_type.as_str(),
            edge.created_at.to_rfc3339()
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Insert a fresh attribution edge at the given version. The partial unique
/// index rejects a second current edge for the same pair.
pub fn insert_attribution_edge(conn: &Connection, edge: &AttributionEdge) -> HindsightResult<()> {
    conn.execute(
        "INSERT INTO attribution_edges
            (id, source_memory_id, target_interaction_id, score, score_type,
             version, is_current, month_bucket, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            edge.id.to_string(),
            edge.source_memory_id.to_string(),
            edge.target_interaction_id.to_string(),
            edge.score,
            enum_str(&edge.score_type)?,
            edge.version,
            edge.is_current as i32,
            edge.month_bucket,
            edge.created_at.to_rfc3339()
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Retire the current edge for a pair and insert its successor. Must run
/// inside the caller's transaction so flip and insert land together.
/// Returns the new version.
pub fn flip_and_insert(
    conn: &Connection,
    source_memory_id: Uuid,
    target_interaction_id: Uuid,
    score: f64,
    score_type: ScoreType,
    at: DateTime<Utc>,
) -> HindsightResult<u32> {
    conn.execute(
        "UPDATE attribution_edges SET is_current = 0
         WHERE source_memory_id = ?1 AND target_interaction_id = ?2 AND is_current = 1",
        params![source_memory_id.to_string(), target_interaction_id.to_string()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let next_version: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM attribution_edges
             WHERE source_memory_id = ?1 AND target_interaction_id = ?2",
            params![source_memory_id.to_string(), target_interaction_id.to_string()],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    insert_attribution_edge(
        conn,
        &AttributionEdge {
            id: Uuid::now_v7(),
            source_memory_id,
            target_interaction_id,
            score,
            score_type,
            version: next_version,
            is_current: true,
            month_bucket: month_bucket(at),
            created_at: at,
        },
    )?;
    Ok(next_version)
}

/// Every version for one (source, target) pair, oldest first.
pub fn edge_history(
    conn: &Connection,
    source_memory_id: Uuid,
    target_interaction_id: Uuid,
) -> HindsightResult<Vec<AttributionEdge>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, source_memory_id, target_interaction_id, score, score_type,
                    version, is_current, month_bucket, created_at
             FROM attribution_edges
             WHERE source_memory_id = ?1 AND target_interaction_id = ?2
             ORDER BY version",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    collect_edges(
        &mut stmt,
        params![source_memory_id.to_string(), target_interaction_id.to_string()],
    )
}

/// Current edges out of the given memories with score above the floor.
/// The influence query's edge set.
pub fn current_edges_from_memories(
    conn: &Connection,
    memory_ids: &[Uuid],
    min_score: f64,
) -> HindsightResult<Vec<AttributionEdge>> {
    if memory_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = std::iter::repeat("?")
        .take(memory_ids.len())
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT id, source_memory_id, target_interaction_id, score, score_type,
                version, is_current, month_bucket, created_at
         FROM attribution_edges
         WHERE is_current = 1 AND source_memory_id IN ({placeholders})
         ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let id_strings: Vec<String> = memory_ids.iter().map(|id| id.to_string()).collect();
    let rows = stmt
        .query_map(rusqlite::params_from_iter(id_strings.iter()), |row| {
            Ok(row_to_edge(row))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        let edge = row.map_err(|e| to_storage_err(e.to_string()))??;
        if edge.score > min_score {
            out.push(edge);
        }
    }
    Ok(out)
}

/// Current edges for one memory (audit view).
pub fn current_edges_for_memory(
    conn: &Connection,
    memory_id: Uuid,
) -> HindsightResult<Vec<AttributionEdge>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, source_memory_id, target_interaction_id, score, score_type,
                    version, is_current, month_bucket, created_at
             FROM attribution_edges
             WHERE source_memory_id = ?1 AND is_current = 1
             ORDER BY id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    collect_edges(&mut stmt, params![memory_id.to_string()])
}

/// Creation edges out of the given interactions.
pub fn creation_edges_from(
    conn: &Connection,
    interaction_ids: &[Uuid],
) -> HindsightResult<Vec<CreationEdge>> {
    if interaction_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = std::iter::repeat("?")
        .take(interaction_ids.len())
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT interaction_id, memory_id, created_at FROM creation_edges
         WHERE interaction_id IN ({placeholders}) ORDER BY interaction_id, memory_id"
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let id_strings: Vec<String> = interaction_ids.iter().map(|id| id.to_string()).collect();
    let rows = stmt
        .query_map(rusqlite::params_from_iter(id_strings.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        let (i, m, at) = row.map_err(|e| to_storage_err(e.to_string()))?;
        out.push(CreationEdge {
            interaction_id: parse_uuid(&i)?,
            memory_id: parse_uuid(&m)?,
            created_at: parse_dt(&at)?,
        });
    }
    Ok(out)
}

/// Every derivation edge in the DAG. The footprint closure loads the full
/// edge set once and traverses in memory.
pub fn all_derivation_edges(conn: &Connection) -> HindsightResult<Vec<DerivationEdge>> {
    let mut stmt = conn
        .prepare(
            "SELECT source_id, source_type, target_id, target_type, derivation_type, created_at
             FROM derivation_edges ORDER BY source_id, target_id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        let (s, st, t, tt, dt, at) = row.map_err(|e| to_storage_err(e.to_string()))?;
        out.push(DerivationEdge {
            source_id: parse_uuid(&s)?,
            source_type: parse_enum("source_type", &st)?,
            target_id: parse_uuid(&t)?,
            target_type: parse_enum("target_type", &tt)?,
            derivation_type: parse_enum("derivation_type", &dt)?,
            created_at: parse_dt(&at)?,
        });
    }
    Ok(out)
}

pub fn insert_statement_edge(
    conn: &Connection,
    edge: &StatementAttributionEdge,
) -> HindsightResult<()> {
    conn.execute(
        "INSERT INTO statement_attribution_edges
            (memory_id, response_id, statement_index, score, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            edge.memory_id.to_string(),
            edge.response_id.to_string(),
            edge.statement_index,
            edge.score,
            edge.created_at.to_rfc3339()
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Derivation edges whose source is a deleted memory but whose target
/// survives — the orphan check in deletion verification.
pub fn orphan_derivation_edges(
    conn: &Connection,
    deleted_memory_ids: &[Uuid],
) -> HindsightResult<usize> {
    if deleted_memory_ids.is_empty() {
        return Ok(0);
    }
    let placeholders = std::iter::repeat("?")
        .take(deleted_memory_ids.len())
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT COUNT(*) FROM derivation_edges d
         WHERE d.source_id IN ({placeholders})
           AND d.target_type = 'memory'
           AND EXISTS (
               SELECT 1 FROM memory_nodes m
               WHERE m.id = d.target_id AND m.status NOT IN ('pending_deletion', 'deleted')
           )"
    );
    let id_strings: Vec<String> = deleted_memory_ids.iter().map(|id| id.to_string()).collect();
    conn.query_row(&sql, rusqlite::params_from_iter(id_strings.iter()), |row| {
        row.get::<_, i64>(0)
    })
    .map(|n| n as usize)
    .map_err(|e| to_storage_err(e.to_string()))
}

fn collect_edges(
    stmt: &mut rusqlite::Statement<'_>,
    params: impl rusqlite::Params,
) -> HindsightResult<Vec<AttributionEdge>> {
    let rows = stmt
        .query_map(params, |row| Ok(row_to_edge(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(out)
}

fn row_to_edge(row: &Row<'_>) -> HindsightResult<AttributionEdge> {
    let id_str: String = row.get(0).map_err(|e| to_storage_err(e.to_string()))?;
    let source_str: String = row.get(1).map_err(|e| to_storage_err(e.to_string()))?;
    let target_str: String = row.get(2).map_err(|e| to_storage_err(e.to_string()))?;
    let score_type_str: String = row.get(4).map_err(|e| to_storage_err(e.to_string()))?;
    let created_str: String = row.get(8).map_err(|e| to_storage_err(e.to_string()))?;
    Ok(AttributionEdge {
        id: parse_uuid(&id_str)?,
        source_memory_id: parse_uuid(&source_str)?,
        target_interaction_id: parse_uuid(&target_str)?,
        score: row.get(3).map_err(|e| to_storage_err(e.to_string()))?,
        score_type: parse_enum("score_type", &score_type_str)?,
        version: row.get(5).map_err(|e| to_storage_err(e.to_string()))?,
        is_current: row.get::<_, i32>(6).map_err(|e| to_storage_err(e.to_string()))? != 0,
        month_bucket: row.get(7).map_err(|e| to_storage_err(e.to_string()))?,
        created_at: parse_dt(&created_str)?,
    })
}
