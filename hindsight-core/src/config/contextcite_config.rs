//! ContextCite configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextCiteConfig {
    /// Number of ablation masks (includes the all-zeros and all-ones rows).
    pub num_samples: usize,
    /// L1 regularization strength for the LASSO fit.
    pub lasso_lambda: f64,
    /// LDS below this marks the surrogate low-confidence.
    pub min_confidence: f64,
    /// Coordinate-descent convergence tolerance.
    pub lasso_tolerance: f64,
    /// Coordinate-descent iteration cap.
    pub lasso_max_iter: usize,
}

impl Default for ContextCiteConfig {
    fn default() -> Self {
        Self {
            num_samples: 64,
            lasso_lambda: 0.1,
            min_confidence: 0.8,
            lasso_tolerance: 1e-6,
            lasso_max_iter: 1000,
        }
    }
}
