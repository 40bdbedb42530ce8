//! Cryptographic primitives for originator envelopes.
//!
//! Wraps secp256k1 recoverable ECDSA (k256) and Keccak-256 hashing with
//! strong types. Signatures are recoverable so verifiers can derive the
//! signer's public key from the signature and the digest alone.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use std::fmt;

use crate::error::CoreError;

/// Length of an uncompressed SEC1 public key (`0x04 || X || Y`).
pub const PUBLIC_KEY_LEN: usize = 65;

/// Length of a recoverable signature (`r || s || v`).
pub const SIGNATURE_LEN: usize = 65;

/// A 32-byte Keccak-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keccak256Hash(pub [u8; 32]);

impl Keccak256Hash {
    /// Compute the Keccak-256 digest of the given data.
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Keccak256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keccak256({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Keccak256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Keccak256Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A secp256k1 public key, held as its 65-byte uncompressed SEC1 encoding.
///
/// Equality is byte equality of the uncompressed form, so keys parsed from
/// compressed and uncompressed encodings of the same point compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    /// Parse from SEC1 bytes (compressed or uncompressed).
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let key = VerifyingKey::from_sec1_bytes(bytes).map_err(|_| CoreError::InvalidPublicKey)?;
        Ok(Self::from_verifying_key(&key))
    }

    /// Parse from a hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(strip_hex_prefix(s)).map_err(|_| CoreError::InvalidPublicKey)?;
        Self::from_sec1_bytes(&bytes)
    }

    fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        let mut arr = [0u8; PUBLIC_KEY_LEN];
        arr.copy_from_slice(point.as_bytes());
        Self(arr)
    }

    /// Get the uncompressed SEC1 bytes.
    pub const fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Skip the 0x04 tag byte.
        write!(f, "Secp256k1Pub({})", &hex::encode(&self.0[1..9]))
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A 65-byte recoverable ECDSA signature: `r (32) || s (32) || v (1)`.
///
/// `v` is the raw recovery ID (0 or 1). `s` is always in the lower half of
/// the curve order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoverableSignature(pub [u8; SIGNATURE_LEN]);

impl RecoverableSignature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; SIGNATURE_LEN] =
            bytes.try_into().map_err(|_| CoreError::InvalidSignature)?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The recovery ID byte.
    pub const fn v(&self) -> u8 {
        self.0[64]
    }

    /// Recover the public key that produced this signature over `digest`.
    pub fn recover(&self, digest: &Keccak256Hash) -> Result<PublicKey, CoreError> {
        let signature =
            Signature::from_slice(&self.0[..64]).map_err(|_| CoreError::InvalidSignature)?;
        let recovery_id = RecoveryId::from_byte(self.v()).ok_or(CoreError::InvalidSignature)?;

        let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature, recovery_id)
            .map_err(|_| CoreError::InvalidSignature)?;
        Ok(PublicKey::from_verifying_key(&key))
    }

    /// Check that this signature over `digest` was produced by `expected`.
    pub fn verify(&self, digest: &Keccak256Hash, expected: &PublicKey) -> Result<(), CoreError> {
        if &self.recover(digest)? == expected {
            Ok(())
        } else {
            Err(CoreError::InvalidSignature)
        }
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSig({}...)", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for RecoverableSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A node's secp256k1 signing key.
///
/// This wraps k256's SigningKey. The secret never appears in `Debug` output.
#[derive(Clone)]
pub struct NodeSigningKey {
    signing_key: SigningKey,
}

impl NodeSigningKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::random(&mut rng),
        }
    }

    /// Create from a 32-byte secret scalar.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CoreError> {
        let signing_key = SigningKey::from_slice(bytes)
            .map_err(|_| CoreError::InvalidPrivateKey("scalar out of range".into()))?;
        Ok(Self { signing_key })
    }

    /// Parse a hex-encoded secret, optionally prefixed with `0x`.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(strip_hex_prefix(s.trim()))
            .map_err(|e| CoreError::InvalidPrivateKey(e.to_string()))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            CoreError::InvalidPrivateKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Self::from_bytes(&arr)
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.signing_key.verifying_key())
    }

    /// Sign a precomputed Keccak-256 digest.
    pub fn sign_prehash(&self, digest: &Keccak256Hash) -> Result<RecoverableSignature, CoreError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|e| CoreError::SigningFailed(e.to_string()))?;

        let mut out = [0u8; SIGNATURE_LEN];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = recovery_id.to_byte();
        Ok(RecoverableSignature(out))
    }

    /// Hash `message` with Keccak-256 and sign the digest.
    pub fn sign(&self, message: &[u8]) -> Result<RecoverableSignature, CoreError> {
        self.sign_prehash(&Keccak256Hash::hash(message))
    }
}

impl fmt::Debug for NodeSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeSigningKey({:?})", self.public_key())
    }
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
