//! Error types for the registrant.
//!
//! Startup failures ([`RegistrantError`]) abort construction: no
//! registrant is returned. Per-message failures ([`SignError`]) reject one
//! staged envelope and leave the registrant usable.

use originator_core::{CoreError, NodeId, PublicKey};
use originator_registry::RegistryError;
use originator_store::StoreError;
use thiserror::Error;

/// Errors that can occur while constructing a registrant.
#[derive(Debug, Error)]
pub enum RegistrantError {
    /// The configured private key could not be parsed.
    #[error("unable to parse private key: {0}")]
    InvalidPrivateKey(String),

    /// No registry entry carries this node's public key.
    #[error("no matching public key found in registry")]
    NotRegistered,

    /// The public key is registered under more than one node ID.
    #[error("public key is registered under multiple node IDs: {0:?}")]
    DuplicateRegistration(Vec<NodeId>),

    /// The registry could not be read.
    #[error("unable to get nodes from registry: {0}")]
    RegistryUnavailable(#[from] RegistryError),

    /// The identity record could not be written or read.
    #[error("unable to access node info in database: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// The database is bound to a different node ID. `database` is the
    /// stored value as-is and need not be a valid node ID.
    #[error("registry node ID {registry} does not match ID {database} in database")]
    NodeIdMismatch { registry: NodeId, database: i64 },

    /// The database is bound to different public key bytes.
    #[error("registry public key does not match public key in database")]
    PublicKeyMismatch {
        registry: PublicKey,
        database: Vec<u8>,
    },

    /// The store refused the insert as a duplicate but holds no record.
    #[error("database reports an existing node identity but none could be read")]
    RecordMissing,
}

/// Coarse classification of startup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad key or no slot in the network. Fix the configuration.
    Configuration,
    /// The database disagrees with the registry. Never retry blindly.
    Consistency,
    /// A collaborator could not be reached. Safe to retry.
    Unavailable,
}

impl RegistrantError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            RegistrantError::InvalidPrivateKey(_)
            | RegistrantError::NotRegistered
            | RegistrantError::DuplicateRegistration(_) => ErrorCategory::Configuration,
            RegistrantError::NodeIdMismatch { .. }
            | RegistrantError::PublicKeyMismatch { .. }
            | RegistrantError::RecordMissing => ErrorCategory::Consistency,
            RegistrantError::RegistryUnavailable(_) | RegistrantError::StoreUnavailable(_) => {
                ErrorCategory::Unavailable
            }
        }
    }
}

/// Errors that can occur while signing one staged envelope.
#[derive(Debug, Error)]
pub enum SignError {
    /// The staged payload is not a valid payer envelope.
    #[error("could not decode payer envelope: {0}")]
    MalformedPayerEnvelope(CoreError),

    /// The acceptance time cannot be expressed as i64 nanoseconds.
    #[error("originator time is out of range")]
    InvalidTimestamp,

    /// The local ID does not fit in a sequence ID.
    #[error("invalid local ID {0}, likely due to ID exhaustion")]
    SequenceExhausted(i64),

    /// The unsigned envelope could not be encoded.
    #[error("could not encode unsigned originator envelope: {0}")]
    Encoding(CoreError),

    /// The signing primitive failed.
    #[error("could not sign originator envelope: {0}")]
    Signing(CoreError),
}

/// Result type for registrant construction.
pub type Result<T> = std::result::Result<T, RegistrantError>;
