//! StorageEngine — pool + migrations + the typed query surface the service
//! crates compose into transactions.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use hindsight_core::config::StorageConfig;
use hindsight_core::models::{
    AttributionScore, Interaction, Memory, MemoryProfile, MemoryStatus, Tier,
};
use hindsight_core::HindsightResult;

use crate::pool::Pool;
use crate::queries::{attribution_ops, interaction_ops, memory_ops, profile_ops};
use crate::{migrations, to_storage_err};

/// Owns the connection pool. Multi-step writes compose query-module
/// functions inside [`StorageEngine::with_txn`]; reads route through the
/// read pool (or the writer for in-memory databases).
pub struct StorageEngine {
    pool: Pool,
    config: StorageConfig,
}

impl StorageEngine {
    /// Open (or create) a file-backed database and run pending migrations.
    pub fn open(path: &Path) -> HindsightResult<Self> {
        Self::open_with_config(path, StorageConfig::default())
    }

    pub fn open_with_config(path: &Path, config: StorageConfig) -> HindsightResult<Self> {
        let pool = Pool::open(path, config.read_pool_size)?;
        pool.writer.with_conn_sync(migrations::run_migrations)?;
        Ok(Self { pool, config })
    }

    /// Open an in-memory database (tests, ephemeral runs).
    pub fn open_in_memory() -> HindsightResult<Self> {
        let pool = Pool::open_in_memory()?;
        pool.writer.with_conn_sync(migrations::run_migrations)?;
        Ok(Self {
            pool,
            config: StorageConfig::default(),
        })
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Run a read. In-memory databases route through the writer.
    pub fn read<T>(
        &self,
        f: impl FnOnce(&Connection) -> HindsightResult<T>,
    ) -> HindsightResult<T> {
        if self.pool.readers.is_empty() {
            self.pool.writer.with_conn_sync(f)
        } else {
            self.pool.readers.with_conn(f)
        }
    }

    /// Run a multi-statement write in one `BEGIN IMMEDIATE` transaction.
    pub fn with_txn<T>(
        &self,
        f: impl FnOnce(&Connection) -> HindsightResult<T>,
    ) -> HindsightResult<T> {
        self.pool.writer.with_txn(f)
    }

    // ── Memories ───────────────────────────────────────────────────────────

    pub fn create_memory(&self, memory: &Memory) -> HindsightResult<()> {
        self.with_txn(|conn| memory_ops::insert_memory(conn, memory))
    }

    pub fn get_memory(&self, id: Uuid) -> HindsightResult<Option<Memory>> {
        self.read(|conn| memory_ops::get_memory(conn, id))
    }

    /// Snapshot fetch: by id, ignoring soft-delete, sorted by id.
    pub fn memories_by_ids_any_status(&self, ids: &[Uuid]) -> HindsightResult<Vec<Memory>> {
        self.read(|conn| memory_ops::get_memories_by_ids_any_status(conn, ids))
    }

    pub fn active_memories(&self) -> HindsightResult<Vec<Memory>> {
        self.read(|conn| memory_ops::get_active_memories(conn))
    }

    pub fn patch_memory(&self, id: Uuid, tier: Option<Tier>) -> HindsightResult<()> {
        self.with_txn(|conn| memory_ops::patch_memory(conn, id, tier))
    }

    pub fn advance_memory_status(
        &self,
        id: Uuid,
        next: MemoryStatus,
        at: DateTime<Utc>,
    ) -> HindsightResult<()> {
        self.with_txn(|conn| memory_ops::advance_status(conn, id, next, at))
    }

    // ── Interactions & scores ──────────────────────────────────────────────

    pub fn get_interaction(&self, id: Uuid) -> HindsightResult<Option<Interaction>> {
        self.read(|conn| interaction_ops::get_interaction(conn, id))
    }

    /// `attribution.by_transaction`: stored scores in snapshot order.
    pub fn scores_by_interaction(
        &self,
        interaction_id: Uuid,
    ) -> HindsightResult<Vec<AttributionScore>> {
        self.read(|conn| attribution_ops::get_scores_by_interaction(conn, interaction_id))
    }

    /// `attribution.by_memory`: score history plus the profile snapshot.
    pub fn scores_by_memory(
        &self,
        memory_id: Uuid,
    ) -> HindsightResult<(Vec<AttributionScore>, Option<MemoryProfile>)> {
        self.read(|conn| {
            let scores = attribution_ops::get_scores_by_memory(conn, memory_id)?;
            let profile = profile_ops::get_profile(conn, memory_id)?;
            Ok((scores, profile))
        })
    }

    pub fn get_profile(&self, memory_id: Uuid) -> HindsightResult<Option<MemoryProfile>> {
        self.read(|conn| profile_ops::get_profile(conn, memory_id))
    }

    /// Force a WAL checkpoint (file-backed only; no-op otherwise).
    pub fn checkpoint(&self) -> HindsightResult<()> {
        self.pool.writer.with_conn_sync(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")
                .map_err(|e| to_storage_err(e.to_string()))
        })
    }
}
