//! Connection pool: one serialized writer, round-robin readers.
//!
//! File-backed databases run in WAL mode so readers see every committed
//! write immediately. In-memory databases have no read pool; the engine
//! routes reads through the writer instead.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::Connection;

use hindsight_core::HindsightResult;

use crate::to_storage_err;

/// The single write connection. All mutations serialize through this.
pub struct Writer {
    conn: Mutex<Connection>,
}

impl Writer {
    pub(crate) fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    /// Run `f` against the write connection.
    pub fn with_conn_sync<T>(
        &self,
        f: impl FnOnce(&Connection) -> HindsightResult<T>,
    ) -> HindsightResult<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| to_storage_err("writer mutex poisoned".into()))?;
        f(&conn)
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction; commit on Ok,
    /// roll back on Err.
    pub fn with_txn<T>(
        &self,
        f: impl FnOnce(&Connection) -> HindsightResult<T>,
    ) -> HindsightResult<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| to_storage_err("writer mutex poisoned".into()))?;
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| to_storage_err(format!("begin: {e}")))?;
        match f(&conn) {
            Ok(v) => {
                conn.execute_batch("COMMIT")
                    .map_err(|e| to_storage_err(format!("commit: {e}")))?;
                Ok(v)
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }
}

/// Round-robin pool of read-only connections. Empty for in-memory mode.
pub struct ReadPool {
    conns: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ReadPool {
    pub(crate) fn new(conns: Vec<Connection>) -> Self {
        Self {
            conns: conns.into_iter().map(Mutex::new).collect(),
            next: AtomicUsize::new(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    /// Run `f` against the next reader in rotation.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> HindsightResult<T>,
    ) -> HindsightResult<T> {
        if self.conns.is_empty() {
            return Err(to_storage_err("read pool is empty (in-memory mode)".into()));
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.conns.len();
        let conn = self.conns[idx]
            .lock()
            .map_err(|_| to_storage_err("reader mutex poisoned".into()))?;
        f(&conn)
    }
}

/// Writer + readers for one database.
pub struct Pool {
    pub writer: Writer,
    pub readers: ReadPool,
}

impl Pool {
    /// Open a file-backed pool in WAL mode with `read_pool_size` readers.
    pub fn open(path: &Path, read_pool_size: usize) -> HindsightResult<Self> {
        let writer = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        writer
            .pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| to_storage_err(e.to_string()))?;
        writer
            .pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| to_storage_err(e.to_string()))?;

        let size = read_pool_size.clamp(1, 16);
        let mut readers = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
            conn.pragma_update(None, "query_only", "ON")
                .map_err(|e| to_storage_err(e.to_string()))?;
            readers.push(conn);
        }

        Ok(Self {
            writer: Writer::new(writer),
            readers: ReadPool::new(readers),
        })
    }

    /// Open an in-memory pool. Reads route through the writer.
    pub fn open_in_memory() -> HindsightResult<Self> {
        let writer = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        writer
            .pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| to_storage_err(e.to_string()))?;
        Ok(Self {
            writer: Writer::new(writer),
            readers: ReadPool::new(Vec::new()),
        })
    }
}
