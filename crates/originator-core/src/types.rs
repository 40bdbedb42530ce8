//! Strong type definitions for node identity.

use std::fmt;

use crate::crypto::PublicKey;

/// A node's numeric slot in the network-wide log.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u16);

impl NodeId {
    /// Create a new NodeId.
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub const fn get(&self) -> u16 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for NodeId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

/// The binding between a node identity and its signing key.
///
/// Resolved once at startup and persisted as the database's identity record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeInfo {
    /// The node's numeric identity.
    pub node_id: NodeId,
    /// The node's public key.
    pub public_key: PublicKey,
}

impl NodeInfo {
    /// Create a new binding.
    pub const fn new(node_id: NodeId, public_key: PublicKey) -> Self {
        Self {
            node_id,
            public_key,
        }
    }
}
