//! Attribution score records and engine selection.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which engine produced a score. Stored bit-exact as snake_case strings.
///
/// `Approx` is used for sampled Shapley results; sampling never labels its
/// output `exact`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreType {
    Eas,
    Contextcite,
    Exact,
    Approx,
    Calibrated,
}

impl ScoreType {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreType::Eas => "eas",
            ScoreType::Contextcite => "contextcite",
            ScoreType::Exact => "exact",
            ScoreType::Approx => "approx",
            ScoreType::Calibrated => "calibrated",
        }
    }
}

/// Engine requested by a caller. Distinct from [`ScoreType`]: a request for
/// sampled Shapley yields scores typed `Approx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMethod {
    /// Closed-form embedding attribution — the zero-oracle default path.
    #[default]
    Eas,
    /// Ablation + LASSO surrogate; needs a `LogProb` oracle.
    Contextcite,
    /// Exact Shapley enumeration; needs a value function, k bounded.
    ShapleyExact,
    /// Monte-Carlo permutation Shapley; needs a value function.
    ShapleyApprox,
}

/// One memory's attribution within one interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionScore {
    pub memory_id: Uuid,
    pub interaction_id: Uuid,
    /// The unified score field shared by every engine.
    pub score: f64,
    pub score_type: ScoreType,
    /// Engine self-confidence: LDS for ContextCite, sampling confidence for
    /// approximate Shapley, 1.0 for closed-form paths.
    pub confidence: f64,
    /// Position in the snapshot order of `retrieved_memory_ids`.
    pub rank: usize,
}

/// The full result of scoring one interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionOutcome {
    pub interaction_id: Uuid,
    pub scores: Vec<AttributionScore>,
    /// Number of oracle invocations spent producing the scores.
    pub oracle_calls: u32,
}
