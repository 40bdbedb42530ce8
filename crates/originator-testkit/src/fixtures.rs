//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use rand::RngCore;

use originator_core::{
    NodeId, NodeInfo, NodeSigningKey, PayerEnvelope, PublicKey, StagedEnvelope,
};
use originator_registry::{Node, NodeRegistry, RegistryError, StaticRegistry};
use originator_store::{InsertResult, NodeInfoStore, StoreError, StoredNodeInfo};

/// A node with a known secret and an assigned ID.
pub struct TestNode {
    pub node_id: NodeId,
    pub secret: [u8; 32],
    pub key: NodeSigningKey,
}

impl TestNode {
    /// Create a node with a random key.
    pub fn new(node_id: u16) -> Self {
        loop {
            let mut secret = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut secret);
            if let Ok(node) = Self::try_with_seed(node_id, secret) {
                return node;
            }
        }
    }

    /// Create a node with a deterministic key.
    ///
    /// # Panics
    ///
    /// Panics if `seed` is not a valid secp256k1 scalar.
    pub fn with_seed(node_id: u16, seed: [u8; 32]) -> Self {
        Self::try_with_seed(node_id, seed).expect("seed is a valid scalar")
    }

    fn try_with_seed(node_id: u16, seed: [u8; 32]) -> Result<Self, originator_core::CoreError> {
        Ok(Self {
            node_id: NodeId::new(node_id),
            secret: seed,
            key: NodeSigningKey::from_bytes(&seed)?,
        })
    }

    /// The secret as bare hex.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret)
    }

    /// The secret as `0x`-prefixed hex.
    pub fn prefixed_secret_hex(&self) -> String {
        format!("0x{}", self.secret_hex())
    }

    /// The node's public key.
    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    /// The roster entry for this node.
    pub fn registry_entry(&self) -> Node {
        Node::new(self.node_id, self.public_key())
            .with_http_address(format!("http://node-{}.test:5050", self.node_id))
    }

    /// The identity record this node binds its database to.
    pub fn node_info(&self) -> NodeInfo {
        NodeInfo::new(self.node_id, self.public_key())
    }
}

/// A set of nodes and a registry listing all of them.
pub struct TestNetwork {
    pub nodes: Vec<TestNode>,
}

impl TestNetwork {
    /// Create one node per ID, each with a random key.
    pub fn new(node_ids: &[u16]) -> Self {
        Self {
            nodes: node_ids.iter().map(|&id| TestNode::new(id)).collect(),
        }
    }

    /// The node at `index`.
    pub fn node(&self, index: usize) -> &TestNode {
        &self.nodes[index]
    }

    /// Build a registry listing every node, in order.
    pub fn registry(&self) -> StaticRegistry {
        StaticRegistry::new(self.nodes.iter().map(TestNode::registry_entry).collect())
    }
}

/// Build a payer envelope signed by a fresh payer key.
pub fn payer_envelope(client_envelope: &[u8], target_originator: u32) -> PayerEnvelope {
    let payer = NodeSigningKey::generate();
    let payer_signature = payer
        .sign(client_envelope)
        .expect("signing a keccak digest cannot fail");

    PayerEnvelope {
        unsigned_client_envelope: Bytes::copy_from_slice(client_envelope),
        payer_signature,
        target_originator,
    }
}

/// Stage `payer` under local ID `id`, accepted at `time`.
pub fn staged_envelope(id: i64, time: SystemTime, payer: &PayerEnvelope) -> StagedEnvelope {
    StagedEnvelope {
        id,
        originator_time: time,
        payer_envelope: Bytes::from(payer.to_bytes().expect("payer envelope encodes")),
    }
}

/// 2024-01-01T00:00:00Z
pub fn fixed_time() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_704_067_200)
}

/// Random bytes of length `len`.
pub fn random_payload(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

/// A registry that can never be reached.
#[derive(Debug, Default)]
pub struct UnavailableRegistry;

#[async_trait]
impl NodeRegistry for UnavailableRegistry {
    async fn get_nodes(&self) -> originator_registry::Result<Vec<Node>> {
        Err(RegistryError::Unavailable("connection refused".into()))
    }
}

/// A store that can never be reached.
#[derive(Debug, Default)]
pub struct UnavailableStore;

#[async_trait]
impl NodeInfoStore for UnavailableStore {
    async fn insert_node_info(&self, _info: &NodeInfo) -> originator_store::Result<InsertResult> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn select_node_info(&self) -> originator_store::Result<Option<StoredNodeInfo>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// A store that rejects every insert yet holds no record.
#[derive(Debug, Default)]
pub struct InconsistentStore;

#[async_trait]
impl NodeInfoStore for InconsistentStore {
    async fn insert_node_info(&self, _info: &NodeInfo) -> originator_store::Result<InsertResult> {
        Ok(InsertResult::AlreadyExists)
    }

    async fn select_node_info(&self) -> originator_store::Result<Option<StoredNodeInfo>> {
        Ok(None)
    }
}
