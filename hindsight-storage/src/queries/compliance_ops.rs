//! Compliance certificate persistence. Certificates are append-only and
//! never deleted; only the verified flag flips after the verification pass.

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use hindsight_core::models::{ComplianceCertificate, Footprint};
use hindsight_core::HindsightResult;

use crate::to_storage_err;

use super::{enum_str, parse_dt, parse_enum, parse_uuid, OptionalRow};

const CERT_COLUMNS: &str =
    "id, user_id, request_type, footprint, snapshot_hash, grace_period_end, verified, created_at";

pub fn insert_certificate(
    conn: &Connection,
    cert: &ComplianceCertificate,
) -> HindsightResult<()> {
    let footprint_json =
        serde_json::to_string(&cert.footprint).map_err(|e| to_storage_err(e.to_string()))?;
    conn.execute(
        "INSERT INTO compliance_certificates
            (id, user_id, request_type, footprint, snapshot_hash,
             grace_period_end, verified, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            cert.id.to_string(),
            cert.user_id,
            enum_str(&cert.request_type)?,
            footprint_json,
            cert.snapshot_hash,
            cert.grace_period_end.to_rfc3339(),
            cert.verified as i32,
            cert.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_certificate(
    conn: &Connection,
    id: Uuid,
) -> HindsightResult<Option<ComplianceCertificate>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {CERT_COLUMNS} FROM compliance_certificates WHERE id = ?1"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    stmt.query_row(params![id.to_string()], |row| Ok(row_to_certificate(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?
        .transpose()
}

pub fn certificates_for_user(
    conn: &Connection,
    user_id: &str,
) -> HindsightResult<Vec<ComplianceCertificate>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {CERT_COLUMNS} FROM compliance_certificates WHERE user_id = ?1 ORDER BY id"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![user_id], |row| Ok(row_to_certificate(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(out)
}

pub fn set_verified(conn: &Connection, id: Uuid, verified: bool) -> HindsightResult<()> {
    conn.execute(
        "UPDATE compliance_certificates SET verified = ?2 WHERE id = ?1",
        params![id.to_string(), verified as i32],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

fn row_to_certificate(row: &Row<'_>) -> HindsightResult<ComplianceCertificate> {
    let id_str: String = row.get(0).map_err(|e| to_storage_err(e.to_string()))?;
    let request_type_str: String = row.get(2).map_err(|e| to_storage_err(e.to_string()))?;
    let footprint_json: String = row.get(3).map_err(|e| to_storage_err(e.to_string()))?;
    let grace_str: String = row.get(5).map_err(|e| to_storage_err(e.to_string()))?;
    let created_str: String = row.get(7).map_err(|e| to_storage_err(e.to_string()))?;

    let footprint: Footprint = serde_json::from_str(&footprint_json)
        .map_err(|e| to_storage_err(format!("parse footprint: {e}")))?;

    Ok(ComplianceCertificate {
        id: parse_uuid(&id_str)?,
        user_id: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
        request_type: parse_enum("request_type", &request_type_str)?,
        footprint,
        snapshot_hash: row.get(4).map_err(|e| to_storage_err(e.to_string()))?,
        grace_period_end: parse_dt(&grace_str)?,
        verified: row.get::<_, i32>(6).map_err(|e| to_storage_err(e.to_string()))? != 0,
        created_at: parse_dt(&created_str)?,
    })
}
