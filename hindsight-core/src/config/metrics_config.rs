//! Portfolio metrics thresholds.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Cosine similarity above which a memory pair counts as redundant.
    pub redundancy_threshold: f64,
    /// Estimated fraction of queries retrieving both halves of a redundant
    /// pair. Surfaced as config rather than baked into the tax formula.
    pub co_retrieval_rate: f64,
    /// A memory older than this, still in the frequently-accessed set,
    /// counts as stale.
    pub staleness_window_days: i64,
    /// Last-accessed window defining the frequently-accessed set.
    pub frequent_access_days: i64,
    /// |score| below this counts the memory's tokens as waste.
    pub waste_score_threshold: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            redundancy_threshold: 0.92,
            co_retrieval_rate: 0.3,
            staleness_window_days: 90,
            frequent_access_days: 30,
            waste_score_threshold: 0.01,
        }
    }
}
