//! Garbage collection: abandon expired pending transactions and hard-delete
//! memories whose deletion grace has lapsed.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use hindsight_core::HindsightResult;
use hindsight_storage::queries::{interaction_ops, memory_ops};

use crate::service::TransactionService;

/// What one GC sweep did.
#[derive(Debug, Clone, Default)]
pub struct GcOutcome {
    /// Pending interactions transitioned to failed.
    pub abandoned_transactions: usize,
    /// Memories hard-deleted after their grace period.
    pub hard_deleted_memories: Vec<Uuid>,
}

impl TransactionService {
    /// One sweep: expired pending -> failed, lapsed grace -> hard delete.
    pub fn gc(&self, now: DateTime<Utc>) -> HindsightResult<GcOutcome> {
        let ttl_hours = self.config().storage.pending_ttl_hours;
        let grace_days = self.config().compliance.grace_period_days;

        let outcome = self.storage().with_txn(|conn| {
            let abandoned = interaction_ops::fail_expired(conn, now, ttl_hours)?;
            let hard_deleted = memory_ops::hard_delete_expired(conn, now, grace_days)?;
            Ok(GcOutcome {
                abandoned_transactions: abandoned,
                hard_deleted_memories: hard_deleted,
            })
        })?;

        if outcome.abandoned_transactions > 0 || !outcome.hard_deleted_memories.is_empty() {
            info!(
                abandoned = outcome.abandoned_transactions,
                hard_deleted = outcome.hard_deleted_memories.len(),
                "gc sweep"
            );
        }
        Ok(outcome)
    }
}
