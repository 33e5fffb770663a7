//! Token pricing defaults, overridable per agent.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Dollars per input token.
    pub input_token_cost: f64,
    /// Dollars per output token.
    pub output_token_cost: f64,
    pub queries_per_day: f64,
    /// Memories fetched per retrieval.
    pub retrieval_count: usize,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_token_cost: 3e-6,
            output_token_cost: 15e-6,
            queries_per_day: 1000.0,
            retrieval_count: 10,
        }
    }
}
