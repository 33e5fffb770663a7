//! MetricsEngine — feeds the pure portfolio functions from storage and
//! appends dashboard overviews to the health history.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use hindsight_core::config::{MetricsConfig, PricingConfig};
use hindsight_core::models::{
    AgentCostConfig, CalibrationPair, Contradiction, DashboardOverview, MemoryRoi, RedundantPair,
};
use hindsight_core::HindsightResult;
use hindsight_storage::queries::{aggregation, memory_ops, profile_ops};
use hindsight_storage::StorageEngine;

use crate::portfolio;

pub struct MetricsEngine {
    storage: Arc<StorageEngine>,
    metrics: MetricsConfig,
    pricing: PricingConfig,
}

impl MetricsEngine {
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self::with_config(storage, MetricsConfig::default(), PricingConfig::default())
    }

    pub fn with_config(
        storage: Arc<StorageEngine>,
        metrics: MetricsConfig,
        pricing: PricingConfig,
    ) -> Self {
        Self {
            storage,
            metrics,
            pricing,
        }
    }

    /// Token Waste Rate over every memory that has been scored at least once.
    pub fn waste_rate(&self) -> HindsightResult<f64> {
        let rows = self
            .storage
            .read(|conn| aggregation::retrieved_token_scores(conn))?;
        let token_scores: Vec<(u32, f64)> =
            rows.iter().map(|&(_, tokens, score)| (tokens, score)).collect();
        Ok(portfolio::token_waste_rate(
            &token_scores,
            self.metrics.waste_score_threshold,
        ))
    }

    /// Per-memory ROI from profiles and token counts, sorted descending.
    pub fn roi_ranking(&self) -> HindsightResult<Vec<MemoryRoi>> {
        let (profiles, token_by_memory) = self.storage.read(|conn| {
            let profiles = profile_ops::all_profiles(conn)?;
            let tokens: Vec<(Uuid, u32)> = memory_ops::get_active_memories(conn)?
                .into_iter()
                .map(|m| (m.id, m.token_count))
                .collect();
            Ok((profiles, tokens))
        })?;

        let mut ranking: Vec<MemoryRoi> = profiles
            .into_iter()
            .filter_map(|profile| {
                let token_count = token_by_memory
                    .iter()
                    .find(|(id, _)| *id == profile.memory_id)
                    .map(|&(_, t)| t)?;
                let monthly_cost = portfolio::memory_token_cost(
                    token_count,
                    self.pricing.input_token_cost,
                    self.pricing.queries_per_day,
                ) * 30.0;
                Some(MemoryRoi {
                    memory_id: profile.memory_id,
                    mean_attribution: profile.mean,
                    monthly_token_cost: monthly_cost,
                    roi: portfolio::memory_roi(profile.mean, monthly_cost),
                })
            })
            .collect();
        ranking.sort_by(|a, b| b.roi.total_cmp(&a.roi));
        Ok(ranking)
    }

    /// Near-duplicate pairs among active memories plus the monthly tax.
    pub fn redundancy_report(&self) -> HindsightResult<(Vec<RedundantPair>, f64)> {
        let memories = self.storage.read(|conn| {
            Ok(memory_ops::get_active_memories(conn)?
                .into_iter()
                .map(|m| (m.id, m.token_count, m.embedding))
                .collect::<Vec<_>>())
        })?;
        let pairs = portfolio::redundancy_pairs(&memories, self.metrics.redundancy_threshold)?;
        let tax = portfolio::redundancy_tax(
            &pairs,
            self.pricing.input_token_cost,
            self.pricing.queries_per_day,
            self.metrics.co_retrieval_rate,
        );
        Ok((pairs, tax))
    }

    /// 1 − Π(1 − pᵢⱼ) over the recorded contradiction pairs.
    pub fn contradiction_risk(&self) -> HindsightResult<f64> {
        let contradictions = self.storage.read(|conn| aggregation::all_contradictions(conn))?;
        let probabilities: Vec<f64> = contradictions.iter().map(|c| c.probability).collect();
        Ok(portfolio::contradiction_risk(&probabilities))
    }

    /// Fraction of the frequently-accessed set older than the staleness
    /// window, percent.
    pub fn staleness_index(&self) -> HindsightResult<f64> {
        let now = Utc::now();
        let ages = self.storage.read(|conn| {
            Ok(memory_ops::get_active_memories(conn)?
                .iter()
                .map(|m| {
                    (
                        (now - m.created_at).num_days(),
                        (now - m.last_accessed).num_days(),
                    )
                })
                .collect::<Vec<_>>())
        })?;
        Ok(portfolio::staleness_index(
            &ages,
            self.metrics.frequent_access_days,
            self.metrics.staleness_window_days,
        ))
    }

    /// `dashboard.overview`: per-agent aggregates plus global Gini, SNR, and
    /// waste; appended to the health history.
    pub fn overview(&self) -> HindsightResult<DashboardOverview> {
        let agents = self.storage.read(|conn| aggregation::agent_aggregates(conn))?;
        let scores = self.storage.read(|conn| aggregation::all_current_scores(conn))?;
        let waste_rate = self.waste_rate()?;

        let overview = DashboardOverview {
            agents,
            gini: portfolio::gini(&scores),
            snr_db: portfolio::snr_db(&scores),
            waste_rate,
            generated_at: Utc::now(),
        };

        self.storage.with_txn(|conn| {
            aggregation::insert_health_snapshot(conn, &overview, overview.generated_at)
        })?;
        debug!(
            gini = overview.gini,
            snr_db = overview.snr_db,
            waste = overview.waste_rate,
            "dashboard overview generated"
        );
        Ok(overview)
    }

    // ── Metric inputs ──────────────────────────────────────────────────────

    pub fn record_contradiction(
        &self,
        memory_a: Uuid,
        memory_b: Uuid,
        probability: f64,
        kind: &str,
    ) -> HindsightResult<()> {
        self.storage.with_txn(|conn| {
            aggregation::insert_contradiction(
                conn,
                &Contradiction {
                    memory_a,
                    memory_b,
                    probability,
                    kind: kind.to_string(),
                    created_at: Utc::now(),
                },
            )
        })
    }

    pub fn record_calibration_pair(
        &self,
        interaction_id: Uuid,
        memory_id: Uuid,
        eas_score: f64,
        reference_score: f64,
    ) -> HindsightResult<()> {
        self.storage.with_txn(|conn| {
            aggregation::insert_calibration_pair(
                conn,
                &CalibrationPair {
                    interaction_id,
                    memory_id,
                    eas_score,
                    reference_score,
                    created_at: Utc::now(),
                },
            )
        })
    }

    pub fn set_agent_cost_config(&self, config: &AgentCostConfig) -> HindsightResult<()> {
        self.storage
            .with_txn(|conn| aggregation::upsert_agent_cost_config(conn, config))
    }

    pub fn agent_cost_config(&self, agent_id: &str) -> HindsightResult<AgentCostConfig> {
        let stored = self
            .storage
            .read(|conn| aggregation::get_agent_cost_config(conn, agent_id))?;
        Ok(stored.unwrap_or(AgentCostConfig {
            agent_id: agent_id.to_string(),
            input_token_cost: self.pricing.input_token_cost,
            output_token_cost: self.pricing.output_token_cost,
            queries_per_day: self.pricing.queries_per_day,
        }))
    }
}
