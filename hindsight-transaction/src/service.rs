//! TransactionService — memory lifecycle ops and the two scoring paths.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use hindsight_attribution::{contextcite, eas, shapley, Deadline};
use hindsight_core::config::HindsightConfig;
use hindsight_core::errors::TransactionError;
use hindsight_core::models::{
    shard_for, AttributionOutcome, AttributionScore, Criticality, Interaction, InteractionStatus,
    Memory, MemoryStatus, MemoryType, ScoreMethod, ScoreType, Tier,
};
use hindsight_core::traits::{Embedder, LogProb, ValueFunction};
use hindsight_core::{HindsightError, HindsightResult};
use hindsight_provenance::{
    record_contextcite_tx, record_memory_creation_tx, record_transaction_tx,
};
use hindsight_storage::queries::{
    attribution_ops, interaction_ops, memory_ops, node_ops, profile_ops,
};
use hindsight_storage::StorageEngine;

/// `memory.create` input.
#[derive(Debug, Clone)]
pub struct CreateMemoryRequest {
    pub content: String,
    pub owner: String,
    pub tier: Tier,
    pub criticality: Criticality,
    pub memory_type: MemoryType,
    /// Interaction that produced the memory. A system creation event is
    /// synthesized when absent so every memory has a creation edge.
    pub created_by: Option<Uuid>,
}

/// `transaction.single_shot` input.
#[derive(Debug, Clone)]
pub struct SingleShotRequest {
    pub query_text: String,
    pub response_text: String,
    pub memory_ids: Vec<Uuid>,
    pub agent_id: String,
    pub user_id: String,
    pub method: ScoreMethod,
    pub model: Option<String>,
}

/// Drives attribution transactions over storage, an embedder, and an
/// optional `LogProb` oracle (required for ContextCite and Shapley, whose
/// value function scores the response log-probability under a subset).
pub struct TransactionService {
    storage: Arc<StorageEngine>,
    embedder: Arc<dyn Embedder>,
    oracle: Option<Arc<dyn LogProb>>,
    config: HindsightConfig,
    bpe: tiktoken_rs::CoreBPE,
}

impl TransactionService {
    pub fn new(storage: Arc<StorageEngine>, embedder: Arc<dyn Embedder>) -> HindsightResult<Self> {
        Self::with_config(storage, embedder, None, HindsightConfig::default())
    }

    pub fn with_config(
        storage: Arc<StorageEngine>,
        embedder: Arc<dyn Embedder>,
        oracle: Option<Arc<dyn LogProb>>,
        config: HindsightConfig,
    ) -> HindsightResult<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| HindsightError::ConfigError(format!("tokenizer init: {e}")))?;
        Ok(Self {
            storage,
            embedder,
            oracle,
            config,
            bpe,
        })
    }

    pub fn storage(&self) -> &StorageEngine {
        &self.storage
    }

    pub fn config(&self) -> &HindsightConfig {
        &self.config
    }

    fn count_tokens(&self, text: &str) -> u32 {
        self.bpe.encode_with_special_tokens(text).len() as u32
    }

    // ── Memory lifecycle ───────────────────────────────────────────────────

    /// `memory.create`: embed, persist, and record provenance (memory node,
    /// creation edge, embedding node, derivation edge) in one transaction.
    pub fn create_memory(&self, request: CreateMemoryRequest) -> HindsightResult<Uuid> {
        let now = Utc::now();
        let embedding = self.embedder.embed(&request.content)?;
        let memory = Memory {
            id: Uuid::now_v7(),
            owner: request.owner.clone(),
            content: request.content.clone(),
            token_count: self.count_tokens(&request.content),
            memory_type: request.memory_type,
            criticality: request.criticality,
            tier: request.tier,
            status: MemoryStatus::Active,
            shard_id: shard_for(&request.owner, self.config.storage.shard_count),
            content_hash: Memory::compute_content_hash(&request.content),
            created_at: now,
            last_accessed: now,
            deleted_at: None,
            embedding,
        };

        let vector_ref = format!("mem://{}", memory.id);
        self.storage.with_txn(|conn| {
            memory_ops::insert_memory(conn, &memory)?;
            let creator = match request.created_by {
                Some(id) => id,
                None => {
                    // Synthetic creation event so the creation edge has an
                    // interaction endpoint.
                    let event = hindsight_core::models::InteractionNode {
                        id: Uuid::now_v7(),
                        user_id: request.owner.clone(),
                        agent_id: "memory.create".into(),
                        created_at: now,
                    };
                    node_ops::insert_interaction_node(conn, &event)?;
                    event.id
                }
            };
            record_memory_creation_tx(conn, &memory, creator, &vector_ref)?;
            Ok(())
        })?;

        debug!(memory = %memory.id, owner = %request.owner, "memory created");
        Ok(memory.id)
    }

    /// `memory.patch`: tier/metadata only.
    pub fn patch_memory(&self, id: Uuid, tier: Option<Tier>) -> HindsightResult<()> {
        self.storage.patch_memory(id, tier)
    }

    /// `memory.soft_delete`: advance to pending-deletion in both the memory
    /// row and its provenance node.
    pub fn soft_delete_memory(&self, id: Uuid) -> HindsightResult<()> {
        let now = Utc::now();
        self.storage.with_txn(|conn| {
            memory_ops::advance_status(conn, id, MemoryStatus::PendingDeletion, now)?;
            if node_ops::get_memory_node(conn, id)?.is_some() {
                node_ops::advance_memory_node_status(conn, id, MemoryStatus::PendingDeletion)?;
            }
            Ok(())
        })?;
        info!(memory = %id, "memory soft-deleted (30-day grace)");
        Ok(())
    }

    // ── Scoring paths ──────────────────────────────────────────────────────

    /// `transaction.single_shot`: embed, score, persist, all at once.
    pub fn single_shot(&self, request: SingleShotRequest) -> HindsightResult<AttributionOutcome> {
        let now = Utc::now();
        let interaction_id = Uuid::now_v7();

        let embeddings = self
            .embedder
            .embed_batch(&[&request.query_text, &request.response_text])?;
        let mut embeddings = embeddings.into_iter();
        let query_embedding = embeddings.next().unwrap_or_default();
        let response_embedding = embeddings.next().unwrap_or_default();

        let memories = self.fetch_snapshot(interaction_id, &request.memory_ids)?;
        let (scores, oracle_calls) = self.score_snapshot(
            interaction_id,
            &request.query_text,
            &request.response_text,
            &query_embedding,
            &response_embedding,
            &memories,
            request.method,
        )?;

        let interaction = Interaction {
            id: interaction_id,
            agent_id: request.agent_id,
            user_id: request.user_id,
            query_text: request.query_text,
            query_embedding,
            response_text: Some(request.response_text.clone()),
            response_embedding: Some(response_embedding),
            response_token_count: Some(self.count_tokens(&request.response_text)),
            model: request.model,
            memory_ids: request.memory_ids,
            status: InteractionStatus::Completed,
            cost: oracle_calls as f64,
            created_at: now,
            completed_at: Some(now),
        };

        self.storage.with_txn(|conn| {
            interaction_ops::insert_interaction(conn, &interaction)?;
            attribution_ops::insert_scores(conn, &scores, now)?;
            for score in &scores {
                profile_ops::upsert_profile(conn, score.memory_id, score.score, now)?;
                memory_ops::touch_last_accessed(conn, score.memory_id, now)?;
            }
            record_transaction_tx(conn, &interaction, &scores)?;
            record_statement_attribution(conn, &interaction, &scores)?;
            Ok(())
        })?;

        debug!(interaction = %interaction_id, k = scores.len(), "single-shot complete");
        Ok(AttributionOutcome {
            interaction_id,
            scores,
            oracle_calls,
        })
    }

    /// `transaction.initiate`: embed the query and snapshot the retrieved
    /// set into a pending interaction.
    pub fn initiate(
        &self,
        query_text: &str,
        memory_ids: Vec<Uuid>,
        agent_id: &str,
        user_id: &str,
    ) -> HindsightResult<Uuid> {
        let now = Utc::now();
        let interaction = Interaction {
            id: Uuid::now_v7(),
            agent_id: agent_id.to_string(),
            user_id: user_id.to_string(),
            query_text: query_text.to_string(),
            query_embedding: self.embedder.embed(query_text)?,
            response_text: None,
            response_embedding: None,
            response_token_count: None,
            model: None,
            memory_ids,
            status: InteractionStatus::Pending,
            cost: 0.0,
            created_at: now,
            completed_at: None,
        };
        self.storage
            .with_txn(|conn| interaction_ops::insert_interaction(conn, &interaction))?;
        debug!(interaction = %interaction.id, "transaction initiated");
        Ok(interaction.id)
    }

    /// `transaction.complete`: score the stored snapshot against the now-
    /// known response. Idempotent on duplicate completes.
    pub fn complete(
        &self,
        transaction_id: Uuid,
        response_text: &str,
        method: ScoreMethod,
    ) -> HindsightResult<AttributionOutcome> {
        let interaction = self
            .storage
            .get_interaction(transaction_id)?
            .ok_or(TransactionError::UnknownTransaction { id: transaction_id })?;

        match interaction.status {
            InteractionStatus::Completed => {
                // Duplicate complete: return the stored scores.
                let scores = self.storage.scores_by_interaction(transaction_id)?;
                return Ok(AttributionOutcome {
                    interaction_id: transaction_id,
                    scores,
                    oracle_calls: 0,
                });
            }
            InteractionStatus::Failed => {
                return Err(TransactionError::ExpiredTransaction {
                    id: transaction_id,
                    pending_since: interaction.created_at.to_rfc3339(),
                }
                .into());
            }
            InteractionStatus::Pending => {}
        }

        let now = Utc::now();
        let ttl = Duration::hours(self.config.storage.pending_ttl_hours);
        if now - interaction.created_at > ttl {
            return Err(TransactionError::ExpiredTransaction {
                id: transaction_id,
                pending_since: interaction.created_at.to_rfc3339(),
            }
            .into());
        }

        let response_embedding = self.embedder.embed(response_text)?;
        let memories = self.fetch_snapshot(transaction_id, &interaction.memory_ids)?;
        let (scores, oracle_calls) = self.score_snapshot(
            transaction_id,
            &interaction.query_text,
            response_text,
            &interaction.query_embedding,
            &response_embedding,
            &memories,
            method,
        )?;

        let mut completed = interaction.clone();
        completed.response_text = Some(response_text.to_string());
        completed.response_embedding = Some(response_embedding.clone());
        completed.response_token_count = Some(self.count_tokens(response_text));
        completed.status = InteractionStatus::Completed;
        completed.cost += oracle_calls as f64;
        completed.completed_at = Some(now);

        let response_tokens = self.count_tokens(response_text);
        let flipped = self.storage.with_txn(|conn| {
            let flipped = interaction_ops::complete_interaction(
                conn,
                transaction_id,
                response_text,
                &response_embedding,
                response_tokens,
                oracle_calls as f64,
                now,
            )?;
            if !flipped {
                // Lost the race to a concurrent complete; nothing written.
                return Ok(false);
            }
            attribution_ops::insert_scores(conn, &scores, now)?;
            for score in &scores {
                profile_ops::upsert_profile(conn, score.memory_id, score.score, now)?;
                memory_ops::touch_last_accessed(conn, score.memory_id, now)?;
            }
            record_transaction_tx(conn, &completed, &scores)?;
            record_statement_attribution(conn, &completed, &scores)?;
            Ok(true)
        })?;

        if !flipped {
            // The concurrent winner's scores are the scores of record.
            let scores = self.storage.scores_by_interaction(transaction_id)?;
            return Ok(AttributionOutcome {
                interaction_id: transaction_id,
                scores,
                oracle_calls,
            });
        }

        debug!(interaction = %transaction_id, k = scores.len(), "two-phase complete");
        Ok(AttributionOutcome {
            interaction_id: transaction_id,
            scores,
            oracle_calls,
        })
    }

    // ── Scoring core ───────────────────────────────────────────────────────

    /// Fetch the snapshot rows ignoring soft-delete, then re-align to the
    /// stored snapshot order. A missing row corrupts the snapshot.
    fn fetch_snapshot(
        &self,
        transaction_id: Uuid,
        memory_ids: &[Uuid],
    ) -> HindsightResult<Vec<Memory>> {
        let rows = self.storage.memories_by_ids_any_status(memory_ids)?;
        let mut aligned = Vec::with_capacity(memory_ids.len());
        for &id in memory_ids {
            let row = rows.iter().find(|m| m.id == id).ok_or(
                TransactionError::SnapshotCorrupted {
                    id: transaction_id,
                    memory_id: id,
                },
            )?;
            aligned.push(row.clone());
        }
        Ok(aligned)
    }

    /// The scoring core shared by both paths: same inputs, same engine,
    /// byte-identical output.
    #[allow(clippy::too_many_arguments)]
    fn score_snapshot(
        &self,
        interaction_id: Uuid,
        query_text: &str,
        response_text: &str,
        query_embedding: &[f32],
        response_embedding: &[f32],
        memories: &[Memory],
        method: ScoreMethod,
    ) -> HindsightResult<(Vec<AttributionScore>, u32)> {
        let embeddings: Vec<Vec<f32>> = memories.iter().map(|m| m.embedding.clone()).collect();
        let deadline = Deadline::after_ms(self.config.attribution.deadline_ms);
        let seed = scoring_seed(query_text, response_text, memories);

        let (values, score_type, confidences, oracle_calls): (Vec<f64>, ScoreType, Vec<f64>, u32) =
            match method {
                ScoreMethod::Eas => {
                    let values = eas::score(&embeddings, query_embedding, response_embedding)?;
                    let confidences = vec![1.0; values.len()];
                    (values, ScoreType::Eas, confidences, 0)
                }
                ScoreMethod::Contextcite => {
                    let oracle = self.require_oracle()?;
                    let contents: Vec<&str> = memories.iter().map(|m| m.content.as_str()).collect();
                    let result = contextcite::run(
                        query_text,
                        response_text,
                        &contents,
                        oracle.as_ref(),
                        &self.config.contextcite,
                        &self.config.attribution,
                        seed,
                        deadline,
                    )?;
                    let confidences = vec![result.lds; result.weights.len()];
                    (result.weights, ScoreType::Contextcite, confidences, result.oracle_calls)
                }
                ScoreMethod::ShapleyExact => {
                    let value_fn = self.oracle_value_fn(query_text, response_text, memories)?;
                    let values = shapley::exact(
                        memories.len(),
                        &value_fn,
                        &self.config.shapley,
                        &self.config.attribution,
                        deadline,
                    )?;
                    let calls = 1u32.checked_shl(memories.len() as u32).unwrap_or(u32::MAX);
                    let confidences = vec![1.0; values.len()];
                    (values, ScoreType::Exact, confidences, calls)
                }
                ScoreMethod::ShapleyApprox => {
                    let value_fn = self.oracle_value_fn(query_text, response_text, memories)?;
                    let result = shapley::sampled(
                        memories.len(),
                        &value_fn,
                        &self.config.shapley,
                        &self.config.attribution,
                        seed,
                        deadline,
                    )?;
                    let calls = (result.samples * (memories.len() + 1)) as u32;
                    (result.phi, ScoreType::Approx, result.confidence, calls)
                }
            };

        let scores = values
            .into_iter()
            .zip(confidences)
            .enumerate()
            .map(|(rank, (score, confidence))| AttributionScore {
                memory_id: memories[rank].id,
                interaction_id,
                score,
                score_type,
                confidence,
                rank,
            })
            .collect();
        Ok((scores, oracle_calls))
    }

    fn require_oracle(&self) -> HindsightResult<&Arc<dyn LogProb>> {
        self.oracle.as_ref().ok_or_else(|| {
            hindsight_core::errors::AttributionError::OracleError(
                "no log-prob oracle configured for this method".into(),
            )
            .into()
        })
    }

    /// Shapley value function over the oracle: v(S) is the response
    /// log-probability given only the subset's contents.
    fn oracle_value_fn(
        &self,
        query_text: &str,
        response_text: &str,
        memories: &[Memory],
    ) -> HindsightResult<OracleValue> {
        let oracle = self.require_oracle()?.clone();
        Ok(OracleValue {
            oracle,
            query: query_text.to_string(),
            response: response_text.to_string(),
            contents: memories.iter().map(|m| m.content.clone()).collect(),
        })
    }
}

struct OracleValue {
    oracle: Arc<dyn LogProb>,
    query: String,
    response: String,
    contents: Vec<String>,
}

impl ValueFunction for OracleValue {
    fn value(&self, subset: &[usize]) -> HindsightResult<f64> {
        let context: Vec<&str> = subset.iter().map(|&i| self.contents[i].as_str()).collect();
        self.oracle.log_prob(&self.query, &self.response, &context)
    }
}

/// ContextCite runs additionally record a response node and statement-level
/// attribution edges. The surrogate attributes the response as one
/// statement; finer statement splitting happens upstream of this core.
fn record_statement_attribution(
    conn: &rusqlite::Connection,
    interaction: &Interaction,
    scores: &[AttributionScore],
) -> HindsightResult<()> {
    if !scores.iter().any(|s| s.score_type == ScoreType::Contextcite) {
        return Ok(());
    }
    let response = hindsight_core::models::ResponseNode {
        id: Uuid::now_v7(),
        interaction_id: interaction.id,
        model: interaction.model.clone().unwrap_or_else(|| "unknown".into()),
        created_at: interaction.completed_at.unwrap_or(interaction.created_at),
    };
    let statement_scores: Vec<(Uuid, u32, f64)> = scores
        .iter()
        .map(|s| (s.memory_id, 0u32, s.score))
        .collect();
    record_contextcite_tx(conn, &response, &statement_scores)
}

/// Deterministic sampling seed from the scoring inputs, so single-shot and
/// two-phase runs over the same (M, q, r) draw identical masks and
/// permutations.
fn scoring_seed(query_text: &str, response_text: &str, memories: &[Memory]) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(query_text.as_bytes());
    hasher.update(&[0]);
    hasher.update(response_text.as_bytes());
    for memory in memories {
        hasher.update(&[0]);
        hasher.update(memory.id.as_bytes());
    }
    let digest = hasher.finalize();
    let mut first = [0u8; 8];
    first.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(first)
}
