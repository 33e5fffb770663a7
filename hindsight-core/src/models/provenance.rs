//! Provenance DAG node and edge types.
//!
//! Five node kinds and four edge kinds. Nodes are immutable after creation
//! except `MemoryNode.status`, which only advances. Edges are append-only;
//! attribution edges version via `is_current` flips rather than mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::attribution::ScoreType;
use super::memory::MemoryStatus;

/// Discriminant carried on polymorphic derivation-edge endpoints.
/// Endpoints span three node tables, so edges hold logical FKs plus this tag
/// rather than a cross-table constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Interaction,
    Memory,
    Summary,
    Embedding,
    Response,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Interaction => "interaction",
            NodeType::Memory => "memory",
            NodeType::Summary => "summary",
            NodeType::Embedding => "embedding",
            NodeType::Response => "response",
        }
    }
}

/// How a derivation edge's target was produced from its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationType {
    Consolidation,
    Embedding,
    ReEmbedding,
    Summary,
}

impl DerivationType {
    pub fn as_str(self) -> &'static str {
        match self {
            DerivationType::Consolidation => "consolidation",
            DerivationType::Embedding => "embedding",
            DerivationType::ReEmbedding => "re_embedding",
            DerivationType::Summary => "summary",
        }
    }
}

/// One query/response exchange as a DAG node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionNode {
    pub id: Uuid,
    pub user_id: String,
    pub agent_id: String,
    pub created_at: DateTime<Utc>,
}

/// A memory as a DAG node. Horizontally partitioned by `shard_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryNode {
    pub id: Uuid,
    pub owner: String,
    pub shard_id: u32,
    pub status: MemoryStatus,
    pub created_at: DateTime<Utc>,
}

/// A consolidation summary node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryNode {
    pub id: Uuid,
    pub content_hash: String,
    pub token_count: u32,
    pub created_at: DateTime<Utc>,
}

/// An embedding node. The vector itself lives in the vector store, reached
/// only through the opaque `vector_ref`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingNode {
    pub id: Uuid,
    pub vector_ref: String,
    pub dim: u32,
    pub created_at: DateTime<Utc>,
}

/// A generated response as a DAG node (created on ContextCite runs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseNode {
    pub id: Uuid,
    pub interaction_id: Uuid,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

/// interaction -> memory: the interaction that created the memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationEdge {
    pub interaction_id: Uuid,
    pub memory_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Polymorphic derivation edge. Target must be newer than source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivationEdge {
    pub source_id: Uuid,
    pub source_type: NodeType,
    pub target_id: Uuid,
    pub target_type: NodeType,
    pub derivation_type: DerivationType,
    pub created_at: DateTime<Utc>,
}

/// Versioned memory -> interaction attribution edge.
///
/// At most one edge per (source, target) pair has `is_current = true`;
/// versions are strictly increasing. Range-partitioned by `month_bucket`
/// (`YYYY-MM` of `created_at`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionEdge {
    pub id: Uuid,
    pub source_memory_id: Uuid,
    pub target_interaction_id: Uuid,
    pub score: f64,
    pub score_type: ScoreType,
    pub version: u32,
    pub is_current: bool,
    pub month_bucket: String,
    pub created_at: DateTime<Utc>,
}

/// Per-statement attribution produced by ContextCite runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementAttributionEdge {
    pub memory_id: Uuid,
    pub response_id: Uuid,
    pub statement_index: u32,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

/// Month bucket for range partitioning of attribution edges.
pub fn month_bucket(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_type_round_trips_snake_case() {
        let s = serde_json::to_string(&DerivationType::ReEmbedding).unwrap();
        assert_eq!(s, "\"re_embedding\"");
        let back: DerivationType = serde_json::from_str(&s).unwrap();
        assert_eq!(back, DerivationType::ReEmbedding);
    }

    #[test]
    fn month_bucket_format() {
        let at = chrono::DateTime::parse_from_rfc3339("2026-03-07T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(month_bucket(at), "2026-03");
    }
}
