//! Storage engine configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Read-pool size for file-backed databases.
    pub read_pool_size: usize,
    /// Pending interactions older than this are garbage-collected to failed.
    pub pending_ttl_hours: i64,
    /// Memory shard count (blake3(owner) mod this).
    pub shard_count: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            read_pool_size: 4,
            pending_ttl_hours: 24,
            shard_count: 16,
        }
    }
}
