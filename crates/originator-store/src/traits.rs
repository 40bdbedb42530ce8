//! Store trait: the abstract interface for node identity persistence.
//!
//! The database holds at most one identity record. It is written once, on
//! the first successful startup, and only read afterwards.

use async_trait::async_trait;
use originator_core::NodeInfo;

use crate::error::Result;

/// The identity record exactly as persisted.
///
/// Nothing is parsed or normalized on the way out of the database, so a
/// record written by a different configuration (or damaged on disk) still
/// reads back with the bytes it actually holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNodeInfo {
    /// The stored node ID column.
    pub node_id: i64,
    /// The stored public key bytes.
    pub public_key: Vec<u8>,
}

impl StoredNodeInfo {
    /// Returns true if this record holds exactly `info`.
    pub fn matches(&self, info: &NodeInfo) -> bool {
        self.node_id == i64::from(info.node_id.get())
            && self.public_key.as_slice() == info.public_key.as_bytes().as_slice()
    }
}

impl From<NodeInfo> for StoredNodeInfo {
    fn from(info: NodeInfo) -> Self {
        Self {
            node_id: i64::from(info.node_id.get()),
            public_key: info.public_key.as_bytes().to_vec(),
        }
    }
}

/// Result of inserting the identity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// The record was written (one row).
    Inserted,
    /// A record already existed; nothing was written (zero rows).
    AlreadyExists,
}

impl InsertResult {
    /// Number of rows written.
    pub const fn rows_written(&self) -> u64 {
        match self {
            InsertResult::Inserted => 1,
            InsertResult::AlreadyExists => 0,
        }
    }
}

/// The NodeInfoStore trait: async interface for the identity record.
///
/// # Design Notes
///
/// - **Insert-if-absent**: `insert_node_info` never overwrites. Two processes
///   racing on an empty database cannot both get `Inserted`.
/// - **Never updated**: there is no update or delete operation.
#[async_trait]
pub trait NodeInfoStore: Send + Sync {
    /// Insert the identity record if none exists.
    async fn insert_node_info(&self, info: &NodeInfo) -> Result<InsertResult>;

    /// Read the identity record, if any, without interpreting it.
    async fn select_node_info(&self) -> Result<Option<StoredNodeInfo>>;
}
