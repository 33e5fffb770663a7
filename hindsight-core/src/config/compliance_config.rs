//! Compliance deletion configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    /// Days between soft delete and hard delete.
    pub grace_period_days: i64,
    /// Cosine similarity above which a surviving embedding is flagged as a
    /// residual of a deleted memory during verification.
    pub proximity_threshold: f64,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            grace_period_days: 30,
            proximity_threshold: 0.92,
        }
    }
}
