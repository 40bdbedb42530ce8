//! Error types for the originator core.

use thiserror::Error;

/// Core errors that can occur while handling keys, sequence IDs and envelopes.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("invalid local ID {0}, likely due to ID exhaustion")]
    InvalidLocalId(i64),

    #[error("timestamp is outside the representable nanosecond range")]
    TimestampOutOfRange,

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}
