//! Memory entity and its lifecycle enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of memory content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Raw,
    Consolidated,
    Critical,
}

/// Lifecycle status. Transitions only advance, never regress:
/// `active -> archived -> pending_deletion -> deleted` (archived may be
/// skipped). A deleted memory can never return to active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryStatus {
    Active,
    Archived,
    Deleted,
    PendingDeletion,
}

impl MemoryStatus {
    /// Position in the monotonic lifecycle sequence.
    fn ordinal(self) -> u8 {
        match self {
            MemoryStatus::Active => 0,
            MemoryStatus::Archived => 1,
            MemoryStatus::PendingDeletion => 2,
            MemoryStatus::Deleted => 3,
        }
    }

    /// Whether a transition from `self` to `next` advances the lifecycle.
    pub fn can_advance_to(self, next: MemoryStatus) -> bool {
        next.ordinal() > self.ordinal()
    }

    /// The stored string form (matches the serde rename).
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryStatus::Active => "active",
            MemoryStatus::Archived => "archived",
            MemoryStatus::Deleted => "deleted",
            MemoryStatus::PendingDeletion => "pending_deletion",
        }
    }
}

/// Operational criticality of a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Normal,
    SafetyCritical,
    Protected,
}

/// Storage tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Hot,
    Warm,
    Cold,
}

/// A retrieved memory as the attribution layer sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: Uuid,
    pub owner: String,
    pub content: String,
    /// Unit-norm embedding, fixed dimension for the whole store.
    pub embedding: Vec<f32>,
    pub token_count: u32,
    pub memory_type: MemoryType,
    pub criticality: Criticality,
    pub tier: Tier,
    pub status: MemoryStatus,
    pub shard_id: u32,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    /// Set when the memory is soft-deleted; cleared never.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Memory {
    /// Content hash used for dedup and audit (blake3 hex).
    pub fn compute_content_hash(content: &str) -> String {
        blake3::hash(content.as_bytes()).to_hex().to_string()
    }
}

/// Application-level shard assignment: blake3(owner) mod shard_count.
/// Stable across runs and platforms.
pub fn shard_for(owner: &str, shard_count: u32) -> u32 {
    let digest = blake3::hash(owner.as_bytes());
    let mut first = [0u8; 8];
    first.copy_from_slice(&digest.as_bytes()[..8]);
    (u64::from_le_bytes(first) % shard_count as u64) as u32
}
