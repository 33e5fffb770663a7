//! DAG write operations. Each runs in a single storage transaction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use hindsight_core::config::ComplianceConfig;
use hindsight_core::models::{
    month_bucket, AttributionEdge, AttributionScore, CreationEdge, DerivationEdge, DerivationType,
    EmbeddingNode, Interaction, InteractionNode, Memory, NodeType, ResponseNode, ScoreType,
    StatementAttributionEdge, SummaryNode,
};
use hindsight_core::HindsightResult;
use hindsight_storage::queries::{edge_ops, node_ops};
use hindsight_storage::StorageEngine;

/// Write and query surface for the provenance DAG.
pub struct ProvenanceService {
    storage: Arc<StorageEngine>,
    pub(crate) compliance: ComplianceConfig,
}

impl ProvenanceService {
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self::with_config(storage, ComplianceConfig::default())
    }

    pub fn with_config(storage: Arc<StorageEngine>, compliance: ComplianceConfig) -> Self {
        Self { storage, compliance }
    }

    pub fn storage(&self) -> &StorageEngine {
        &self.storage
    }

    /// InteractionNode + one version-1 attribution edge per score.
    pub fn record_transaction(
        &self,
        interaction: &Interaction,
        scores: &[AttributionScore],
    ) -> HindsightResult<()> {
        self.storage
            .with_txn(|conn| record_transaction_tx(conn, interaction, scores))?;
        debug!(interaction = %interaction.id, edges = scores.len(), "recorded transaction");
        Ok(())
    }

    /// MemoryNode + CreationEdge + EmbeddingNode + DerivationEdge
    /// (memory -> embedding). Returns the embedding node id.
    pub fn record_memory_creation(
        &self,
        memory: &Memory,
        interaction_id: Uuid,
        vector_ref: &str,
    ) -> HindsightResult<Uuid> {
        let embedding_id = self
            .storage
            .with_txn(|conn| record_memory_creation_tx(conn, memory, interaction_id, vector_ref))?;
        debug!(memory = %memory.id, embedding = %embedding_id, "recorded memory creation");
        Ok(embedding_id)
    }

    /// SummaryNode + one consolidation derivation edge per source memory.
    pub fn record_consolidation(
        &self,
        summary: &SummaryNode,
        source_memory_ids: &[Uuid],
    ) -> HindsightResult<()> {
        self.storage.with_txn(|conn| {
            node_ops::insert_summary_node(conn, summary)?;
            for &memory_id in source_memory_ids {
                edge_ops::insert_derivation_edge(
                    conn,
                    &DerivationEdge {
                        source_id: memory_id,
                        source_type: NodeType::Memory,
                        target_id: summary.id,
                        target_type: NodeType::Summary,
                        derivation_type: DerivationType::Consolidation,
                        created_at: summary.created_at,
                    },
                )?;
            }
            Ok(())
        })?;
        debug!(summary = %summary.id, sources = source_memory_ids.len(), "recorded consolidation");
        Ok(())
    }

    /// EmbeddingNode + re-embedding derivation edge from an existing
    /// memory or summary node.
    pub fn record_reembedding(
        &self,
        source_id: Uuid,
        source_type: NodeType,
        vector_ref: &str,
        dim: u32,
        at: DateTime<Utc>,
    ) -> HindsightResult<Uuid> {
        let embedding_id = Uuid::now_v7();
        self.storage.with_txn(|conn| {
            node_ops::insert_embedding_node(
                conn,
                &EmbeddingNode {
                    id: embedding_id,
                    vector_ref: vector_ref.to_string(),
                    dim,
                    created_at: at,
                },
            )?;
            edge_ops::insert_derivation_edge(
                conn,
                &DerivationEdge {
                    source_id,
                    source_type,
                    target_id: embedding_id,
                    target_type: NodeType::Embedding,
                    derivation_type: DerivationType::ReEmbedding,
                    created_at: at,
                },
            )?;
            Ok(())
        })?;
        Ok(embedding_id)
    }

    /// ResponseNode + per-statement attribution edges (ContextCite runs only).
    pub fn record_contextcite(
        &self,
        response: &ResponseNode,
        statement_scores: &[(Uuid, u32, f64)],
    ) -> HindsightResult<()> {
        self.storage
            .with_txn(|conn| record_contextcite_tx(conn, response, statement_scores))
    }

    /// Retire the current attribution edge for a pair and append its
    /// successor — one atomic flip-plus-insert. Returns the new version.
    pub fn update_attribution(
        &self,
        source_memory_id: Uuid,
        target_interaction_id: Uuid,
        score: f64,
        score_type: ScoreType,
    ) -> HindsightResult<u32> {
        self.storage.with_txn(|conn| {
            edge_ops::flip_and_insert(
                conn,
                source_memory_id,
                target_interaction_id,
                score,
                score_type,
                Utc::now(),
            )
        })
    }
}

/// Connection-level form of [`ProvenanceService::record_transaction`], for
/// callers composing the DAG write into a larger transaction.
pub fn record_transaction_tx(
    conn: &rusqlite::Connection,
    interaction: &Interaction,
    scores: &[AttributionScore],
) -> HindsightResult<()> {
    let at = interaction.completed_at.unwrap_or(interaction.created_at);
    node_ops::insert_interaction_node(
        conn,
        &InteractionNode {
            id: interaction.id,
            user_id: interaction.user_id.clone(),
            agent_id: interaction.agent_id.clone(),
            created_at: interaction.created_at,
        },
    )?;
    for score in scores {
        edge_ops::insert_attribution_edge(
            conn,
            &AttributionEdge {
                id: Uuid::now_v7(),
                source_memory_id: score.memory_id,
                target_interaction_id: interaction.id,
                score: score.score,
                score_type: score.score_type,
                version: 1,
                is_current: true,
                month_bucket: month_bucket(at),
                created_at: at,
            },
        )?;
    }
    Ok(())
}

/// Connection-level form of [`ProvenanceService::record_contextcite`].
pub fn record_contextcite_tx(
    conn: &rusqlite::Connection,
    response: &ResponseNode,
    statement_scores: &[(Uuid, u32, f64)],
) -> HindsightResult<()> {
    node_ops::insert_response_node(conn, response)?;
    for &(memory_id, statement_index, score) in statement_scores {
        edge_ops::insert_statement_edge(
            conn,
            &StatementAttributionEdge {
                memory_id,
                response_id: response.id,
                statement_index,
                score,
                created_at: response.created_at,
            },
        )?;
    }
    Ok(())
}

/// Connection-level form of [`ProvenanceService::record_memory_creation`].
pub fn record_memory_creation_tx(
    conn: &rusqlite::Connection,
    memory: &Memory,
    interaction_id: Uuid,
    vector_ref: &str,
) -> HindsightResult<Uuid> {
    let embedding_id = Uuid::now_v7();
    let at = memory.created_at;
    node_ops::insert_memory_node(
        conn,
        &hindsight_core::models::MemoryNode {
            id: memory.id,
            owner: memory.owner.clone(),
            shard_id: memory.shard_id,
            status: memory.status,
            created_at: at,
        },
    )?;
    edge_ops::insert_creation_edge(
        conn,
        &CreationEdge {
            interaction_id,
            memory_id: memory.id,
            created_at: at,
        },
    )?;
    node_ops::insert_embedding_node(
        conn,
        &EmbeddingNode {
            id: embedding_id,
            vector_ref: vector_ref.to_string(),
            dim: memory.embedding.len() as u32,
            created_at: at,
        },
    )?;
    edge_ops::insert_derivation_edge(
        conn,
        &DerivationEdge {
            source_id: memory.id,
            source_type: NodeType::Memory,
            target_id: embedding_id,
            target_type: NodeType::Embedding,
            derivation_type: DerivationType::Embedding,
            created_at: at,
        },
    )?;
    Ok(embedding_id)
}
