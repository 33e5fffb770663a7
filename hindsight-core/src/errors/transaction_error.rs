use uuid::Uuid;

/// Errors from the two-phase transaction protocol.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("unknown transaction: {id}")]
    UnknownTransaction { id: Uuid },

    #[error("transaction {id} expired (pending since {pending_since})")]
    ExpiredTransaction { id: Uuid, pending_since: String },

    #[error("transaction {id} snapshot corrupted: memory {memory_id} missing")]
    SnapshotCorrupted { id: Uuid, memory_id: Uuid },

    #[error("transaction {id} already failed")]
    AlreadyFailed { id: Uuid },
}
