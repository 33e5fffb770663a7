//! Shapley engine configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapleyConfig {
    /// Largest k accepted by exact enumeration (2^k value calls).
    pub max_exact_k: usize,
    /// Permutations sampled by the Monte-Carlo variant.
    pub mc_samples: usize,
}

impl Default for ShapleyConfig {
    fn default() -> Self {
        Self {
            max_exact_k: 15,
            mc_samples: 100,
        }
    }
}
