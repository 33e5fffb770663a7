/// Errors from the SQLite persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {message}")]
    SqliteError { message: String },

    #[error("migration v{version:03} failed: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("row not found in {table}: {key}")]
    RowNotFound { table: String, key: String },

    #[error("illegal status transition for memory {id}: {from} -> {to}")]
    IllegalStatusTransition { id: String, from: String, to: String },

    #[error("corrupt column {column} in {table}: {reason}")]
    CorruptColumn {
        table: String,
        column: String,
        reason: String,
    },
}
