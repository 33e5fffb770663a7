use super::{AttributionError, ProvenanceError, StorageError, TransactionError};

/// Top-level error type for the Hindsight attribution system.
/// All subsystem errors convert into this via `From` impls.
#[derive(Debug, thiserror::Error)]
pub enum HindsightError {
    #[error("memory not found: {id}")]
    MemoryNotFound { id: String },

    #[error("attribution error: {0}")]
    AttributionError(#[from] AttributionError),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("transaction error: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("provenance error: {0}")]
    ProvenanceError(#[from] ProvenanceError),

    #[error("embedding failed: {0}")]
    EmbeddingError(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("config error: {0}")]
    ConfigError(String),
}

/// Convenience type alias.
pub type HindsightResult<T> = Result<T, HindsightError>;
