//! In-memory implementation of the NodeInfoStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::sync::RwLock;

use async_trait::async_trait;
use originator_core::NodeInfo;

use crate::error::{Result, StoreError};
use crate::traits::{InsertResult, NodeInfoStore, StoredNodeInfo};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Option<StoredNodeInfo>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `info`.
    pub fn with_node_info(info: NodeInfo) -> Self {
        Self::with_record(info.into())
    }

    /// Create a store that already holds `record`, verbatim.
    pub fn with_record(record: StoredNodeInfo) -> Self {
        Self {
            inner: RwLock::new(Some(record)),
        }
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Unavailable(format!("lock poisoned: {}", e))
}

#[async_trait]
impl NodeInfoStore for MemoryStore {
    async fn insert_node_info(&self, info: &NodeInfo) -> Result<InsertResult> {
        let mut inner = self.inner.write().map_err(poisoned)?;

        if inner.is_some() {
            return Ok(InsertResult::AlreadyExists);
        }
        *inner = Some((*info).into());
        Ok(InsertResult::Inserted)
    }

    async fn select_node_info(&self) -> Result<Option<StoredNodeInfo>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.clone())
    }
}
