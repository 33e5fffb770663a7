//! Atomic Welford upsert for memory profiles.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use hindsight_core::models::MemoryProfile;
use hindsight_core::HindsightResult;

use crate::to_storage_err;

use super::{parse_dt, parse_uuid, OptionalRow};

/// Fold one attribution score into a memory's profile as a single atomic
/// statement.
///
/// SQLite evaluates every SET expression against the pre-update row, which
/// is exactly the (mean, mean') pairing Welford needs:
///
/// ```text
/// count' = count + 1
/// mean'  = mean + (x - mean) / count'
/// m2'    = m2 + (x - mean) * (x - mean')
/// ```
///
/// Two concurrent writers therefore cannot interleave a read-modify-write.
pub fn upsert_profile(
    conn: &Connection,
    memory_id: Uuid,
    score: f64,
    at: DateTime<Utc>,
) -> HindsightResult<()> {
    conn.execute(
        "INSERT INTO memory_profiles (memory_id, count, mean, m2, updated_at)
         VALUES (?1, 1, ?2, 0.0, ?3)
         ON CONFLICT(memory_id) DO UPDATE SET
            count = count + 1,
            mean = mean + (excluded.mean - mean) / (count + 1),
            m2 = m2 + (excluded.mean - mean)
                    * (excluded.mean - (mean + (excluded.mean - mean) / (count + 1))),
            updated_at = excluded.updated_at",
        params![memory_id.to_string(), score, at.to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_profile(conn: &Connection, memory_id: Uuid) -> HindsightResult<Option<MemoryProfile>> {
    conn.query_row(
        "SELECT memory_id, count, mean, m2, updated_at
         FROM memory_profiles WHERE memory_id = ?1",
        params![memory_id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
            ))
        },
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))?
    .map(|(id_str, count, mean, m2, updated_str)| {
        Ok(MemoryProfile {
            memory_id: parse_uuid(&id_str)?,
            count: count as u64,
            mean,
            m2,
            updated_at: parse_dt(&updated_str)?,
        })
    })
    .transpose()
}

/// All profiles, for portfolio-level aggregation.
pub fn all_profiles(conn: &Connection) -> HindsightResult<Vec<MemoryProfile>> {
    let mut stmt = conn
        .prepare("SELECT memory_id, count, mean, m2, updated_at FROM memory_profiles")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut out = Vec::new();
    for row in rows {
        let (id_str, count, mean, m2, updated_str) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        out.push(MemoryProfile {
            memory_id: parse_uuid(&id_str)?,
            count: count as u64,
            mean,
            m2,
            updated_at: parse_dt(&updated_str)?,
        });
    }
    Ok(out)
}
