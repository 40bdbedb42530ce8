//! The registrant: a node's verified identity and its envelope signer.

use bytes::Bytes;
use originator_core::{
    unix_nanos, CoreError, Keccak256Hash, NodeId, NodeInfo, NodeSigningKey, OriginatorEnvelope,
    PayerEnvelope, PublicKey, SequenceId, StagedEnvelope, UnsignedOriginatorEnvelope,
};
use originator_registry::{Node, NodeRegistry};
use originator_store::NodeInfoStore;

use crate::error::{RegistrantError, Result, SignError};
use crate::guard::ensure_database_matches;
use crate::resolver::fetch_registry_record;

/// What to do when the registry lists our public key more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeyPolicy {
    /// Take the first matching entry in roster order and log a warning.
    #[default]
    FirstMatch,
    /// Refuse to start.
    Reject,
}

/// Configuration for a registrant.
#[derive(Clone)]
pub struct RegistrantConfig {
    /// Hex-encoded 32-byte secp256k1 private key, optionally `0x`-prefixed.
    pub signing_key: String,
    /// Handling of duplicate registry entries.
    pub duplicate_key_policy: DuplicateKeyPolicy,
}

impl RegistrantConfig {
    /// Create a config with the default duplicate-key policy.
    pub fn new(signing_key: impl Into<String>) -> Self {
        Self {
            signing_key: signing_key.into(),
            duplicate_key_policy: DuplicateKeyPolicy::default(),
        }
    }

    /// Set the duplicate-key policy.
    pub fn duplicate_key_policy(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicate_key_policy = policy;
        self
    }
}

impl std::fmt::Debug for RegistrantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrantConfig")
            .field("signing_key", &"<redacted>")
            .field("duplicate_key_policy", &self.duplicate_key_policy)
            .finish()
    }
}

/// A node identity that has been checked against the registry and bound
/// to the local database.
///
/// Immutable after construction; share it across tasks behind an `Arc`.
pub struct Registrant {
    record: Node,
    signing_key: NodeSigningKey,
}

impl Registrant {
    /// Establish the node's identity.
    ///
    /// Parses the private key, finds the registry entry carrying its public
    /// key, then binds the database to that identity (first run) or checks
    /// the existing binding (every later run). Nothing is returned unless
    /// every step succeeds.
    pub async fn new<R, S>(registry: &R, store: &S, config: &RegistrantConfig) -> Result<Self>
    where
        R: NodeRegistry + ?Sized,
        S: NodeInfoStore + ?Sized,
    {
        let signing_key = NodeSigningKey::from_hex(&config.signing_key)
            .map_err(|e| RegistrantError::InvalidPrivateKey(e.to_string()))?;
        let public_key = signing_key.public_key();

        let record =
            fetch_registry_record(registry, &public_key, config.duplicate_key_policy).await?;

        ensure_database_matches(store, &record.info()).await?;

        tracing::info!(
            node_id = %record.node_id,
            http_address = %record.http_address,
            "registrant ready"
        );

        Ok(Self {
            record,
            signing_key,
        })
    }

    /// This node's ID.
    pub fn node_id(&self) -> NodeId {
        self.record.node_id
    }

    /// This node's public key.
    pub fn public_key(&self) -> PublicKey {
        self.record.signing_key
    }

    /// The identity binding recorded in the database.
    pub fn node_info(&self) -> NodeInfo {
        self.record.info()
    }

    /// The registry entry this node resolved to.
    pub fn record(&self) -> &Node {
        &self.record
    }

    /// Pack a local ID into a sequence ID owned by this node.
    pub fn sid(&self, local_id: i64) -> std::result::Result<SequenceId, SignError> {
        SequenceId::new(self.record.node_id, local_id).map_err(|e| match e {
            CoreError::InvalidLocalId(id) => SignError::SequenceExhausted(id),
            other => SignError::Encoding(other),
        })
    }

    /// Attest to a staged envelope.
    ///
    /// The result carries the exact unsigned bytes that were hashed, so a
    /// verifier can recover this node's key without re-encoding anything.
    pub fn sign_staged_envelope(
        &self,
        staged: &StagedEnvelope,
    ) -> std::result::Result<OriginatorEnvelope, SignError> {
        let payer_envelope = PayerEnvelope::from_bytes(&staged.payer_envelope)
            .map_err(SignError::MalformedPayerEnvelope)?;

        let originator_sid = self.sid(staged.id)?;
        let originator_ns =
            unix_nanos(staged.originator_time).map_err(|_| SignError::InvalidTimestamp)?;

        let unsigned = UnsignedOriginatorEnvelope {
            originator_sid,
            originator_ns,
            payer_envelope,
        };
        let unsigned_bytes = unsigned.to_bytes().map_err(SignError::Encoding)?;

        let digest = Keccak256Hash::hash(&unsigned_bytes);
        let originator_signature = self
            .signing_key
            .sign_prehash(&digest)
            .map_err(SignError::Signing)?;

        tracing::debug!(
            node_id = %self.record.node_id,
            sid = %originator_sid,
            originator_ns,
            digest = %digest.to_hex(),
            "signed staged envelope"
        );

        Ok(OriginatorEnvelope {
            unsigned_originator_envelope: Bytes::from(unsigned_bytes),
            originator_signature,
        })
    }
}

impl std::fmt::Debug for Registrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrant")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}
