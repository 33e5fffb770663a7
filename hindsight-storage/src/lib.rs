//! # hindsight-storage
//!
//! SQLite persistence layer for the Hindsight attribution system.
//! Single write connection + read pool (WAL mode); forward-only
//! transactional migrations; query modules as free functions over
//! `&Connection` composed into transactions by [`StorageEngine`].

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use hindsight_core::errors::StorageError;
use hindsight_core::HindsightError;

/// Helper to convert a string message into a HindsightError::Storage.
pub fn to_storage_err(msg: String) -> HindsightError {
    HindsightError::StorageError(StorageError::SqliteError { message: msg })
}

/// Encode an embedding as a little-endian f32 BLOB.
pub fn embedding_to_blob(v: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(v.len() * 4);
    for x in v {
        out.extend_from_slice(&x.to_le_bytes());
    }
    out
}

/// Decode a little-endian f32 BLOB back into an embedding.
pub fn blob_to_embedding(blob: &[u8]) -> Result<Vec<f32>, HindsightError> {
    if blob.len() % 4 != 0 {
        return Err(HindsightError::StorageError(StorageError::CorruptColumn {
            table: "-".into(),
            column: "embedding".into(),
            reason: format!("blob length {} not a multiple of 4", blob.len()),
        }));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_blob_round_trip() {
        let v = vec![0.25f32, -1.5, 0.0, 3.75];
        let blob = embedding_to_blob(&v);
        assert_eq!(blob.len(), 16);
        assert_eq!(blob_to_embedding(&blob).unwrap(), v);
    }

    #[test]
    fn truncated_blob_is_corrupt() {
        assert!(blob_to_embedding(&[1, 2, 3]).is_err());
    }
}
