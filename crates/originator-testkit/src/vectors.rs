//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the sequence ID layout and the canonical encoding of
//! payer and unsigned originator envelopes. Another implementation that
//! produces different bytes for the same inputs will produce different
//! signatures, so any mismatch here is a wire-compatibility break.

use bytes::Bytes;
use serde::Serialize;

use originator_core::{
    NodeId, NodeSigningKey, OriginatorEnvelope, PayerEnvelope, RecoverableSignature, SequenceId,
    UnsignedOriginatorEnvelope,
};

/// A golden test vector.
#[derive(Debug, Clone, Serialize)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Node ID of the originator.
    pub node_id: u16,
    /// Local ID of the staged envelope.
    pub local_id: i64,
    /// Acceptance time, nanoseconds since the Unix epoch.
    pub originator_ns: i64,
    /// Client envelope bytes.
    #[serde(with = "hex_bytes")]
    pub client_envelope: &'static [u8],
    /// Byte the payer signature is filled with.
    pub payer_signature_fill: u8,
    /// Target originator named by the payer.
    pub target_originator: u32,
    /// Expected sequence ID.
    pub expected_sid: u64,
    /// Expected canonical payer envelope (hex).
    pub expected_payer_envelope: &'static str,
    /// Expected canonical unsigned originator envelope (hex).
    pub expected_unsigned_envelope: &'static str,
}

mod hex_bytes {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &&'static [u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "basic envelope",
            node_id: 7,
            local_id: 42,
            originator_ns: 1_704_067_200_000_000_000, // 2024-01-01T00:00:00Z
            client_envelope: b"hello",
            payer_signature_fill: 0x11,
            target_originator: 7,
            expected_sid: 0x0007_0000_0000_002a,
            expected_payer_envelope: concat!(
                "a3004568656c6c6f015841",
                "1111111111111111111111111111111111111111111111111111111111111111",
                "1111111111111111111111111111111111111111111111111111111111111111",
                "11",
                "0207"
            ),
            expected_unsigned_envelope: concat!(
                "a3001b000700000000002a011b17a610170165000002",
                "a3004568656c6c6f015841",
                "1111111111111111111111111111111111111111111111111111111111111111",
                "1111111111111111111111111111111111111111111111111111111111111111",
                "11",
                "0207"
            ),
        },
        GoldenVector {
            name: "highest node and local ID at epoch",
            node_id: u16::MAX,
            local_id: (1 << 48) - 1,
            originator_ns: 0,
            client_envelope: b"",
            payer_signature_fill: 0x22,
            target_originator: 0,
            expected_sid: u64::MAX,
            expected_payer_envelope: concat!(
                "a30040015841",
                "2222222222222222222222222222222222222222222222222222222222222222",
                "2222222222222222222222222222222222222222222222222222222222222222",
                "22",
                "0200"
            ),
            expected_unsigned_envelope: concat!(
                "a3001bffffffffffffffff010002",
                "a30040015841",
                "2222222222222222222222222222222222222222222222222222222222222222",
                "2222222222222222222222222222222222222222222222222222222222222222",
                "22",
                "0200"
            ),
        },
        GoldenVector {
            name: "one second before the epoch",
            node_id: 1,
            local_id: 1,
            originator_ns: -1_000_000_000,
            client_envelope: &[0x00, 0x01, 0x02],
            payer_signature_fill: 0x33,
            target_originator: u32::MAX,
            expected_sid: 0x0001_0000_0000_0001,
            expected_payer_envelope: concat!(
                "a30043000102015841",
                "3333333333333333333333333333333333333333333333333333333333333333",
                "3333333333333333333333333333333333333333333333333333333333333333",
                "33",
                "021affffffff"
            ),
            expected_unsigned_envelope: concat!(
                "a3001b0001000000000001013a3b9ac9ff02",
                "a30043000102015841",
                "3333333333333333333333333333333333333333333333333333333333333333",
                "3333333333333333333333333333333333333333333333333333333333333333",
                "33",
                "021affffffff"
            ),
        },
    ]
}

/// Build the unsigned envelope a vector describes.
///
/// # Panics
///
/// Panics if the vector's local ID does not fit in a sequence ID.
pub fn unsigned_envelope_from_vector(vector: &GoldenVector) -> UnsignedOriginatorEnvelope {
    UnsignedOriginatorEnvelope {
        originator_sid: SequenceId::new(NodeId::new(vector.node_id), vector.local_id)
            .expect("vector local ID is valid"),
        originator_ns: vector.originator_ns,
        payer_envelope: PayerEnvelope {
            unsigned_client_envelope: Bytes::from_static(vector.client_envelope),
            payer_signature: RecoverableSignature::from_bytes([vector.payer_signature_fill; 65]),
            target_originator: vector.target_originator,
        },
    }
}

/// Verify every golden vector.
///
/// Checks the SID, both canonical encodings, and that a signature over the
/// unsigned bytes recovers the signer. Returns the names of failing vectors.
pub fn verify_all_vectors() -> Result<(), Vec<String>> {
    let signer = NodeSigningKey::from_bytes(&[0x42; 32]).map_err(|e| vec![e.to_string()])?;
    let mut failures = Vec::new();

    for vector in all_vectors() {
        let unsigned = unsigned_envelope_from_vector(&vector);

        if unsigned.originator_sid.as_u64() != vector.expected_sid {
            failures.push(format!("{}: sid mismatch", vector.name));
            continue;
        }

        let payer_hex = unsigned.payer_envelope.to_bytes().map(hex::encode).ok();
        if payer_hex.as_deref() != Some(vector.expected_payer_envelope) {
            failures.push(format!("{}: payer envelope mismatch", vector.name));
            continue;
        }

        let unsigned_bytes = match unsigned.to_bytes() {
            Ok(bytes) if hex::encode(&bytes) == vector.expected_unsigned_envelope => bytes,
            _ => {
                failures.push(format!("{}: unsigned envelope mismatch", vector.name));
                continue;
            }
        };

        let recovered = signer
            .sign(&unsigned_bytes)
            .map(|sig| OriginatorEnvelope {
                unsigned_originator_envelope: Bytes::from(unsigned_bytes),
                originator_signature: sig,
            })
            .and_then(|env| env.recover_signer());
        if recovered.ok() != Some(signer.public_key()) {
            failures.push(format!("{}: signer not recoverable", vector.name));
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

/// Export the vectors as pretty JSON for other implementations.
pub fn vectors_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&all_vectors())
}
