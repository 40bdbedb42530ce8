//! # Originator Core
//!
//! Pure primitives for stamping messages into a shared, append-only log:
//! secp256k1 keys, recoverable signatures, sequence IDs and envelopes.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`NodeSigningKey`] - A node's secp256k1 signing key
//! - [`RecoverableSignature`] - `r || s || v` signature; the signer's key is recoverable
//! - [`SequenceId`] - Node ID and local ID packed into one ordering key
//! - [`PayerEnvelope`] - A client message as submitted by its payer
//! - [`UnsignedOriginatorEnvelope`] - The attestation a node signs
//! - [`OriginatorEnvelope`] - The signed attestation
//!
//! ## Canonicalization
//!
//! All envelopes are encoded using deterministic CBOR. See [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod sid;
pub mod types;

pub use crypto::{Keccak256Hash, NodeSigningKey, PublicKey, RecoverableSignature};
pub use envelope::{
    unix_nanos, OriginatorEnvelope, PayerEnvelope, StagedEnvelope, UnsignedOriginatorEnvelope,
};
pub use error::CoreError;
pub use sid::{is_valid_local_id, SequenceId, MAX_LOCAL_ID};
pub use types::{NodeId, NodeInfo};
