//! Proptest generators for property-based testing.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use proptest::prelude::*;

use originator_core::{
    NodeId, NodeSigningKey, PayerEnvelope, RecoverableSignature, MAX_LOCAL_ID,
};

/// Generate a 32-byte secret that is a valid secp256k1 scalar.
pub fn signing_seed() -> impl Strategy<Value = [u8; 32]> {
    any::<[u8; 32]>().prop_filter("scalar out of range", |seed| {
        NodeSigningKey::from_bytes(seed).is_ok()
    })
}

/// Generate any node ID.
pub fn node_id() -> impl Strategy<Value = NodeId> {
    any::<u16>().prop_map(NodeId::new)
}

/// Generate a local ID that fits in a sequence ID.
pub fn valid_local_id() -> impl Strategy<Value = i64> {
    1i64..=MAX_LOCAL_ID
}

/// Generate a local ID that does not fit in a sequence ID.
pub fn invalid_local_id() -> impl Strategy<Value = i64> {
    prop_oneof![i64::MIN..=0i64, (MAX_LOCAL_ID + 1)..=i64::MAX]
}

/// Generate a timestamp between 1970 and roughly 2250.
pub fn originator_time() -> impl Strategy<Value = SystemTime> {
    (0u64..8_000_000_000u64, 0u32..1_000_000_000u32)
        .prop_map(|(secs, nanos)| UNIX_EPOCH + Duration::new(secs, nanos))
}

/// Generate a payer envelope with an arbitrary (not necessarily valid) signature.
pub fn payer_envelope() -> impl Strategy<Value = PayerEnvelope> {
    (
        proptest::collection::vec(any::<u8>(), 0..256),
        proptest::collection::vec(any::<u8>(), 65),
        any::<u32>(),
    )
        .prop_map(|(client, sig, target_originator)| {
            let mut signature = [0u8; 65];
            signature.copy_from_slice(&sig);
            PayerEnvelope {
                unsigned_client_envelope: Bytes::from(client),
                payer_signature: RecoverableSignature::from_bytes(signature),
                target_originator,
            }
        })
}
