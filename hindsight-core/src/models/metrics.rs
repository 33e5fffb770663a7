//! Portfolio metrics records and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded pairwise contradiction probability between two memories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contradiction {
    pub memory_a: Uuid,
    pub memory_b: Uuid,
    /// Probability the pair contradicts, in [0, 1].
    pub probability: f64,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

/// EAS-vs-reference score pair backing the `calibrated` score type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationPair {
    pub interaction_id: Uuid,
    pub memory_id: Uuid,
    pub eas_score: f64,
    pub reference_score: f64,
    pub created_at: DateTime<Utc>,
}

/// Per-agent pricing overrides. Falls back to `PricingConfig` defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCostConfig {
    pub agent_id: String,
    pub input_token_cost: f64,
    pub output_token_cost: f64,
    pub queries_per_day: f64,
}

/// Per-memory return on investment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRoi {
    pub memory_id: Uuid,
    pub mean_attribution: f64,
    pub monthly_token_cost: f64,
    /// (mean attribution / monthly token cost) * 1000.
    pub roi: f64,
}

/// A near-duplicate memory pair charged by the redundancy tax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedundantPair {
    pub memory_a: Uuid,
    pub memory_b: Uuid,
    pub similarity: f64,
    /// min(tokens(a), tokens(b)) — the duplicated payload.
    pub overlap_tokens: u32,
}

/// Aggregates for one agent in the dashboard overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAggregate {
    pub agent_id: String,
    pub interaction_count: u64,
    pub total_cost: f64,
    pub mean_score: f64,
}

/// The `dashboard.overview` payload, also persisted as a health snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub agents: Vec<AgentAggregate>,
    pub gini: f64,
    pub snr_db: f64,
    /// Token waste rate, percent.
    pub waste_rate: f64,
    pub generated_at: DateTime<Utc>,
}
