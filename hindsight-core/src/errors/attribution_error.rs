/// Errors produced by the attribution kernel (EAS, ContextCite, Shapley).
#[derive(Debug, thiserror::Error)]
pub enum AttributionError {
    #[error("vector dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("retrieved memory set is empty")]
    EmptyRetrievedSet,

    #[error("exact Shapley infeasible for k = {k} (max {max})")]
    InfeasibleExactShapley { k: usize, max: usize },

    #[error("deadline elapsed during {phase}")]
    DeadlineExceeded { phase: String },

    #[error("oracle failed after {attempts} attempts: {reason}")]
    OracleExhausted { attempts: u32, reason: String },

    #[error("oracle error: {0}")]
    OracleError(String),
}
