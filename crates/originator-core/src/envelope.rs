//! Envelope types: the payer envelope a client submits, the unsigned
//! attestation a node builds around it, and the signed originator envelope.
//!
//! All three are encoded as canonical CBOR maps with small integer keys.

use bytes::Bytes;
use ciborium::value::Value;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::canonical::{decode_value, encode_canonical, entry, FieldMap};
use crate::crypto::{Keccak256Hash, PublicKey, RecoverableSignature};
use crate::error::CoreError;
use crate::sid::SequenceId;

/// Map keys for [`PayerEnvelope`].
mod payer_keys {
    pub const UNSIGNED_CLIENT_ENVELOPE: u64 = 0;
    pub const PAYER_SIGNATURE: u64 = 1;
    pub const TARGET_ORIGINATOR: u64 = 2;
}

/// Map keys for [`UnsignedOriginatorEnvelope`].
mod unsigned_keys {
    pub const ORIGINATOR_SID: u64 = 0;
    pub const ORIGINATOR_NS: u64 = 1;
    pub const PAYER_ENVELOPE: u64 = 2;
}

/// Map keys for [`OriginatorEnvelope`].
mod signed_keys {
    pub const UNSIGNED_ORIGINATOR_ENVELOPE: u64 = 0;
    pub const ORIGINATOR_SIGNATURE: u64 = 1;
}

/// A client message as submitted and signed by its payer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayerEnvelope {
    /// The client's envelope, opaque to the originator.
    pub unsigned_client_envelope: Bytes,
    /// The payer's recoverable signature over the client envelope.
    pub payer_signature: RecoverableSignature,
    /// The node the payer addressed this message to.
    pub target_originator: u32,
}

impl PayerEnvelope {
    fn to_cbor_value(&self) -> Value {
        Value::Map(vec![
            entry(
                payer_keys::UNSIGNED_CLIENT_ENVELOPE,
                Value::Bytes(self.unsigned_client_envelope.to_vec()),
            ),
            entry(
                payer_keys::PAYER_SIGNATURE,
                Value::Bytes(self.payer_signature.0.to_vec()),
            ),
            entry(
                payer_keys::TARGET_ORIGINATOR,
                Value::Integer(self.target_originator.into()),
            ),
        ])
    }

    fn from_cbor_value(value: &Value) -> Result<Self, CoreError> {
        let map = FieldMap::new("payer envelope", value)?;

        let unsigned_client_envelope = Bytes::copy_from_slice(
            map.bytes(payer_keys::UNSIGNED_CLIENT_ENVELOPE, "unsigned_client_envelope")?,
        );
        let payer_signature =
            RecoverableSignature::from_slice(map.bytes(payer_keys::PAYER_SIGNATURE, "payer_signature")?)
                .map_err(|_| {
                    CoreError::MalformedEnvelope("payer envelope: bad payer_signature length".into())
                })?;
        let target_originator = u32::try_from(
            map.u64(payer_keys::TARGET_ORIGINATOR, "target_originator")?,
        )
        .map_err(|_| CoreError::MalformedEnvelope("payer envelope: target_originator out of range".into()))?;

        Ok(Self {
            unsigned_client_envelope,
            payer_signature,
            target_originator,
        })
    }

    /// Encode to canonical bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        encode_canonical(&self.to_cbor_value())
    }

    /// Decode from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        Self::from_cbor_value(&decode_value(bytes)?)
    }
}

/// The attestation a node signs: "at this position, at this time, I stamped
/// this payer envelope".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedOriginatorEnvelope {
    /// Node-scoped sequence ID.
    pub originator_sid: SequenceId,
    /// Acceptance time, nanoseconds since the Unix epoch.
    pub originator_ns: i64,
    /// The payer's envelope.
    pub payer_envelope: PayerEnvelope,
}

impl UnsignedOriginatorEnvelope {
    /// Encode to canonical bytes (the signing input).
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let value = Value::Map(vec![
            entry(
                unsigned_keys::ORIGINATOR_SID,
                Value::Integer(self.originator_sid.as_u64().into()),
            ),
            entry(
                unsigned_keys::ORIGINATOR_NS,
                Value::Integer(self.originator_ns.into()),
            ),
            entry(
                unsigned_keys::PAYER_ENVELOPE,
                self.payer_envelope.to_cbor_value(),
            ),
        ]);
        encode_canonical(&value)
    }

    /// Decode from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let value = decode_value(bytes)?;
        let map = FieldMap::new("unsigned originator envelope", &value)?;

        Ok(Self {
            originator_sid: SequenceId::from_u64(
                map.u64(unsigned_keys::ORIGINATOR_SID, "originator_sid")?,
            ),
            originator_ns: map.i64(unsigned_keys::ORIGINATOR_NS, "originator_ns")?,
            payer_envelope: PayerEnvelope::from_cbor_value(
                map.value(unsigned_keys::PAYER_ENVELOPE, "payer_envelope")?,
            )?,
        })
    }
}

/// A signed originator envelope.
///
/// The unsigned envelope is carried as the exact bytes that were signed so
/// verifiers never re-encode before hashing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OriginatorEnvelope {
    /// Canonical bytes of the [`UnsignedOriginatorEnvelope`].
    pub unsigned_originator_envelope: Bytes,
    /// Recoverable signature over Keccak-256 of `unsigned_originator_envelope`.
    pub originator_signature: RecoverableSignature,
}

impl OriginatorEnvelope {
    /// The digest that was signed.
    pub fn digest(&self) -> Keccak256Hash {
        Keccak256Hash::hash(&self.unsigned_originator_envelope)
    }

    /// Decode the unsigned envelope.
    pub fn unsigned(&self) -> Result<UnsignedOriginatorEnvelope, CoreError> {
        UnsignedOriginatorEnvelope::from_bytes(&self.unsigned_originator_envelope)
    }

    /// Recover the public key of the node that signed this envelope.
    pub fn recover_signer(&self) -> Result<PublicKey, CoreError> {
        self.originator_signature.recover(&self.digest())
    }

    /// Encode to canonical bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let value = Value::Map(vec![
            entry(
                signed_keys::UNSIGNED_ORIGINATOR_ENVELOPE,
                Value::Bytes(self.unsigned_originator_envelope.to_vec()),
            ),
            entry(
                signed_keys::ORIGINATOR_SIGNATURE,
                Value::Bytes(self.originator_signature.0.to_vec()),
            ),
        ]);
        encode_canonical(&value)
    }

    /// Decode from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let value = decode_value(bytes)?;
        let map = FieldMap::new("originator envelope", &value)?;

        let unsigned_originator_envelope = Bytes::copy_from_slice(map.bytes(
            signed_keys::UNSIGNED_ORIGINATOR_ENVELOPE,
            "unsigned_originator_envelope",
        )?);
        let originator_signature = RecoverableSignature::from_slice(
            map.bytes(signed_keys::ORIGINATOR_SIGNATURE, "originator_signature")?,
        )?;

        Ok(Self {
            unsigned_originator_envelope,
            originator_signature,
        })
    }
}

/// A message accepted locally and waiting to be stamped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedEnvelope {
    /// Local, monotonically increasing identifier.
    pub id: i64,
    /// When the node accepted the message.
    pub originator_time: SystemTime,
    /// Serialized [`PayerEnvelope`].
    pub payer_envelope: Bytes,
}

/// Convert a timestamp to signed nanoseconds since the Unix epoch.
///
/// Times before the epoch yield negative values.
pub fn unix_nanos(time: SystemTime) -> Result<i64, CoreError> {
    // Signed before narrowing, so i64::MIN itself is representable.
    let nanos = match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i128::try_from(after.as_nanos()),
        Err(before) => i128::try_from(before.duration().as_nanos()).map(|n| -n),
    };
    nanos
        .ok()
        .and_then(|n| i64::try_from(n).ok())
        .ok_or(CoreError::TimestampOutOfRange)
}
