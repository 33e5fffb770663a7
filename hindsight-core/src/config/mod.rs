pub mod attribution_config;
pub mod compliance_config;
pub mod contextcite_config;
pub mod metrics_config;
pub mod pricing_config;
pub mod shapley_config;
pub mod storage_config;

use serde::{Deserialize, Serialize};

pub use attribution_config::AttributionConfig;
pub use compliance_config::ComplianceConfig;
pub use contextcite_config::ContextCiteConfig;
pub use metrics_config::MetricsConfig;
pub use pricing_config::PricingConfig;
pub use shapley_config::ShapleyConfig;
pub use storage_config::StorageConfig;

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HindsightConfig {
    pub attribution: AttributionConfig,
    pub contextcite: ContextCiteConfig,
    pub shapley: ShapleyConfig,
    pub pricing: PricingConfig,
    pub metrics: MetricsConfig,
    pub compliance: ComplianceConfig,
    pub storage: StorageConfig,
}

impl HindsightConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_literals() {
        let cfg = HindsightConfig::default();
        assert_eq!(cfg.contextcite.num_samples, 64);
        assert!((cfg.contextcite.lasso_lambda - 0.1).abs() < f64::EPSILON);
        assert!((cfg.contextcite.min_confidence - 0.8).abs() < f64::EPSILON);
        assert_eq!(cfg.shapley.max_exact_k, 15);
        assert_eq!(cfg.shapley.mc_samples, 100);
        assert!((cfg.metrics.redundancy_threshold - 0.92).abs() < f64::EPSILON);
        assert!((cfg.metrics.co_retrieval_rate - 0.3).abs() < f64::EPSILON);
        assert_eq!(cfg.metrics.staleness_window_days, 90);
        assert_eq!(cfg.storage.pending_ttl_hours, 24);
        assert_eq!(cfg.compliance.grace_period_days, 30);
        assert_eq!(cfg.storage.shard_count, 16);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg = HindsightConfig::from_toml(
            "[contextcite]\nnum_samples = 128\n\n[metrics]\nco_retrieval_rate = 0.5\n",
        )
        .unwrap();
        assert_eq!(cfg.contextcite.num_samples, 128);
        assert!((cfg.metrics.co_retrieval_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(cfg.shapley.max_exact_k, 15);
    }
}
