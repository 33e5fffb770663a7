//! Attribution tiering configuration.

use serde::{Deserialize, Serialize};

use crate::models::ScoreMethod;

/// Which engine handles which share of traffic.
///
/// EAS is the production default (closed form, no oracle calls).
/// ContextCite runs on a sampled slice of low-confidence or debug traffic;
/// exact Shapley is reserved for offline ground-truth generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    pub default_method: ScoreMethod,
    /// Fraction of traffic escalated to ContextCite.
    pub contextcite_sample_rate: f64,
    /// EAS confidence below which an interaction is eligible for escalation.
    pub escalation_confidence_floor: f64,
    /// Deadline for a single attribution call, milliseconds.
    pub deadline_ms: u64,
    /// Oracle retry budget.
    pub oracle_max_attempts: u32,
    /// Base backoff between oracle retries, milliseconds (doubles per retry).
    pub oracle_backoff_base_ms: u64,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            default_method: ScoreMethod::Eas,
            contextcite_sample_rate: 0.01,
            escalation_confidence_floor: 0.5,
            deadline_ms: 30_000,
            oracle_max_attempts: 3,
            oracle_backoff_base_ms: 50,
        }
    }
}

impl AttributionConfig {
    /// Tiering policy: which engine handles this interaction.
    ///
    /// `sample_draw` is a uniform draw in [0, 1) (callers derive it from a
    /// deterministic hash of the interaction when replayability matters);
    /// `prior_confidence` is the confidence of the last score for this
    /// traffic slice, when known. Low-confidence or sampled traffic
    /// escalates to ContextCite; everything else takes the default path.
    pub fn select_method(&self, sample_draw: f64, prior_confidence: Option<f64>) -> ScoreMethod {
        if let Some(confidence) = prior_confidence {
            if confidence < self.escalation_confidence_floor {
                return ScoreMethod::Contextcite;
            }
        }
        if sample_draw < self.contextcite_sample_rate {
            return ScoreMethod::Contextcite;
        }
        self.default_method
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_traffic_takes_the_oracle_free_path() {
        let cfg = AttributionConfig::default();
        assert_eq!(cfg.select_method(0.5, Some(0.9)), ScoreMethod::Eas);
        assert_eq!(cfg.select_method(0.5, None), ScoreMethod::Eas);
    }

    #[test]
    fn sampled_and_low_confidence_traffic_escalates() {
        let cfg = AttributionConfig::default();
        assert_eq!(cfg.select_method(0.005, None), ScoreMethod::Contextcite);
        assert_eq!(cfg.select_method(0.5, Some(0.2)), ScoreMethod::Contextcite);
    }
}
