//! Registry abstraction: the authoritative list of nodes.
//!
//! Implementations may read a smart contract, a config service or a fixed
//! list. The registrant only needs a snapshot of every entry.

use async_trait::async_trait;
use originator_core::{NodeId, NodeInfo, PublicKey};

use crate::error::Result;

/// A roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// The node's assigned numeric identity.
    pub node_id: NodeId,
    /// The key the node signs originator envelopes with.
    pub signing_key: PublicKey,
    /// Where the node serves its API.
    pub http_address: String,
    /// Whether the operator currently marks the node healthy.
    pub is_healthy: bool,
}

impl Node {
    /// Create a healthy entry with no address.
    pub fn new(node_id: NodeId, signing_key: PublicKey) -> Self {
        Self {
            node_id,
            signing_key,
            http_address: String::new(),
            is_healthy: true,
        }
    }

    /// Set the HTTP address.
    pub fn with_http_address(mut self, address: impl Into<String>) -> Self {
        self.http_address = address.into();
        self
    }

    /// The identity binding this entry describes.
    pub fn info(&self) -> NodeInfo {
        NodeInfo::new(self.node_id, self.signing_key)
    }
}

/// Registry trait for fetching the node roster.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait NodeRegistry: Send + Sync {
    /// Fetch a snapshot of every registered node.
    async fn get_nodes(&self) -> Result<Vec<Node>>;
}

/// A simple in-memory registry.
///
/// Holds a fixed roster that tests can replace between runs to simulate
/// changes made by the registry's operators.
pub mod memory {
    use super::*;
    use tokio::sync::RwLock;

    /// In-memory registry implementation.
    #[derive(Default)]
    pub struct StaticRegistry {
        nodes: RwLock<Vec<Node>>,
    }

    impl StaticRegistry {
        /// Create a registry holding `nodes`.
        pub fn new(nodes: Vec<Node>) -> Self {
            Self {
                nodes: RwLock::new(nodes),
            }
        }

        /// Append an entry.
        pub async fn add_node(&self, node: Node) {
            self.nodes.write().await.push(node);
        }

        /// Replace the whole roster.
        pub async fn replace(&self, nodes: Vec<Node>) {
            *self.nodes.write().await = nodes;
        }
    }

    #[async_trait]
    impl NodeRegistry for StaticRegistry {
        async fn get_nodes(&self) -> Result<Vec<Node>> {
            let nodes = self.nodes.read().await.clone();
            tracing::debug!(count = nodes.len(), "served registry snapshot");
            Ok(nodes)
        }
    }
}
