//! Running quality profile per memory (Welford state).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted Welford accumulator over a memory's attribution scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryProfile {
    pub memory_id: Uuid,
    pub count: u64,
    pub mean: f64,
    /// Sum of squared deviations from the running mean.
    pub m2: f64,
    pub updated_at: DateTime<Utc>,
}

impl MemoryProfile {
    /// Sample variance, `m2 / (count - 1)`. None below two observations.
    pub fn variance(&self) -> Option<f64> {
        if self.count > 1 {
            Some(self.m2 / (self.count - 1) as f64)
        } else {
            None
        }
    }

    pub fn stddev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }
}
