//! Shared row-parsing helpers + re-exports for all query modules.

pub mod aggregation;
pub mod attribution_ops;
pub mod compliance_ops;
pub mod edge_ops;
pub mod interaction_ops;
pub mod memory_ops;
pub mod node_ops;
pub mod profile_ops;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use hindsight_core::HindsightResult;

use crate::to_storage_err;

/// Parse an RFC 3339 text column.
pub(crate) fn parse_dt(s: &str) -> HindsightResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| to_storage_err(format!("parse datetime '{s}': {e}")))
}

/// Parse a uuid text column.
pub(crate) fn parse_uuid(s: &str) -> HindsightResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| to_storage_err(format!("parse uuid '{s}': {e}")))
}

/// Parse a snake_case enum stored as bare text via its serde form.
pub(crate) fn parse_enum<T: serde::de::DeserializeOwned>(
    column: &str,
    s: &str,
) -> HindsightResult<T> {
    serde_json::from_str(&format!("\"{s}\""))
        .map_err(|e| to_storage_err(format!("parse {column} '{s}': {e}")))
}

/// Serialize a snake_case enum to its bare stored text.
pub(crate) fn enum_str<T: serde::Serialize>(v: &T) -> HindsightResult<String> {
    Ok(serde_json::to_string(v)
        .map_err(|e| to_storage_err(e.to_string()))?
        .trim_matches('"')
        .to_string())
}

/// Helper trait to make `query_row` return `Option` on not-found.
pub(crate) trait OptionalRow<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalRow<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
