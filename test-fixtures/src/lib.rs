//! Shared fixtures for the hindsight test suites: a deterministic embedder,
//! `LogProb` and `ValueFunction` fakes, and entity builders.
//!
//! Nothing here talks to a live model; every fake is a pure function of its
//! inputs so scenario tests are reproducible.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use uuid::Uuid;

use hindsight_core::errors::HindsightResult;
use hindsight_core::models::{Criticality, Memory, MemoryStatus, MemoryType, Tier, shard_for};
use hindsight_core::traits::{Embedder, LogProb, ValueFunction};

/// Deterministic embedder: expands blake3(text) into a unit-norm vector.
/// Same text always embeds identically; distinct texts land far apart.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> HindsightResult<Vec<f32>> {
        let mut reader = blake3::Hasher::new().update(text.as_bytes()).finalize_xof();
        let mut bytes = vec![0u8; self.dim * 4];
        reader.fill(&mut bytes);
        let raw: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| {
                let v = u32::from_le_bytes([c[0], c[1], c[2], c[3]]);
                // Map to [-1, 1).
                (v as f64 / u32::MAX as f64 * 2.0 - 1.0) as f32
            })
            .collect();
        Ok(hindsight_vector::normalize(&raw))
    }
}

/// `LogProb` fake: base log-prob plus a fixed bonus per included content
/// string. Contents absent from the table contribute nothing.
pub struct LinearOracle {
    pub base: f64,
    pub bonuses: HashMap<String, f64>,
    calls: AtomicU32,
}

impl LinearOracle {
    pub fn new(base: f64, bonuses: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            base,
            bonuses: bonuses.into_iter().collect(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LogProb for LinearOracle {
    fn log_prob(&self, _query: &str, _response: &str, context: &[&str]) -> HindsightResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bonus: f64 = context
            .iter()
            .filter_map(|c| self.bonuses.get(*c))
            .sum();
        Ok(self.base + bonus)
    }
}

/// `LogProb` fake that fails its first `failures` calls, then delegates.
pub struct FlakyOracle<O> {
    inner: O,
    failures: AtomicU32,
}

impl<O> FlakyOracle<O> {
    pub fn new(inner: O, failures: u32) -> Self {
        Self {
            inner,
            failures: AtomicU32::new(failures),
        }
    }
}

impl<O: LogProb> LogProb for FlakyOracle<O> {
    fn log_prob(&self, query: &str, response: &str, context: &[&str]) -> HindsightResult<f64> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(hindsight_core::errors::AttributionError::OracleError(
                "synthetic outage".into(),
            )
            .into());
        }
        self.inner.log_prob(query, response, context)
    }
}

/// Value function over embeddings: `base + scale * mean(cos(mᵢ, q))` for the
/// included subset, `base` for the empty coalition.
pub struct CosineValue {
    pub base: f64,
    pub scale: f64,
    pub memories: Vec<Vec<f32>>,
    pub query: Vec<f32>,
}

impl ValueFunction for CosineValue {
    fn value(&self, subset: &[usize]) -> HindsightResult<f64> {
        if subset.is_empty() {
            return Ok(self.base);
        }
        let mut total = 0.0;
        for &i in subset {
            total += hindsight_vector::cosine(&self.memories[i], &self.query)?;
        }
        Ok(self.base + self.scale * total / subset.len() as f64)
    }
}

/// An active memory with a deterministic embedding derived from its content.
pub fn make_memory(owner: &str, content: &str, dim: usize) -> Memory {
    let embedder = HashEmbedder::new(dim);
    let now = Utc::now();
    Memory {
        id: Uuid::now_v7(),
        owner: owner.to_string(),
        content: content.to_string(),
        embedding: embedder.embed(content).expect("hash embedder is infallible"),
        token_count: (content.split_whitespace().count() as u32).max(1),
        memory_type: MemoryType::Raw,
        criticality: Criticality::Normal,
        tier: Tier::Hot,
        status: MemoryStatus::Active,
        shard_id: shard_for(owner, 16),
        content_hash: Memory::compute_content_hash(content),
        created_at: now,
        last_accessed: now,
        deleted_at: None,
    }
}

/// Same as [`make_memory`] but with a caller-chosen embedding.
pub fn make_memory_with_embedding(owner: &str, content: &str, embedding: Vec<f32>) -> Memory {
    let mut m = make_memory(owner, content, embedding.len());
    m.embedding = embedding;
    m
}
