//! SQLite implementation of the NodeInfoStore trait.
//!
//! This is the primary storage backend for the identity record. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};

use originator_core::NodeInfo;

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{InsertResult, NodeInfoStore, StoredNodeInfo};

/// How long a writer waits on another process's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

#[async_trait]
impl NodeInfoStore for SqliteStore {
    async fn insert_node_info(&self, info: &NodeInfo) -> Result<InsertResult> {
        let info = *info;

        self.with_conn(move |conn| {
            // The CHECK'd singleton key makes this atomic across processes.
            let rows = conn.execute(
                "INSERT INTO node_info (singleton_id, node_id, public_key, created_at)
                 VALUES (1, ?1, ?2, ?3)
                 ON CONFLICT (singleton_id) DO NOTHING",
                params![
                    info.node_id.get(),
                    info.public_key.as_bytes().as_slice(),
                    now_millis()
                ],
            )?;

            Ok(if rows == 0 {
                InsertResult::AlreadyExists
            } else {
                InsertResult::Inserted
            })
        })
        .await
    }

    async fn select_node_info(&self) -> Result<Option<StoredNodeInfo>> {
        self.with_conn(|conn| {
            let record = conn
                .query_row(
                    "SELECT node_id, public_key FROM node_info WHERE singleton_id = 1",
                    [],
                    |row| {
                        // Any storage class is accepted so that a foreign
                        // value reaches the identity comparison.
                        let public_key = match row.get_ref(1)? {
                            ValueRef::Blob(bytes) | ValueRef::Text(bytes) => bytes.to_vec(),
                            _ => Vec::new(),
                        };
                        Ok(StoredNodeInfo {
                            node_id: row.get(0)?,
                            public_key,
                        })
                    },
                )
                .optional()?;
            Ok(record)
        })
        .await
    }
}
