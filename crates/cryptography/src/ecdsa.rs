//! ECDSA over secp256r1 (P-256), Neo's signing curve.
//!
//! Signatures are the fixed 64-byte `r || s` form Neo witnesses carry,
//! computed over SHA-256 of the message with RFC 6979 nonces.

use p256::{
    ecdsa::{
        signature::hazmat::{PrehashSigner, PrehashVerifier},
        Signature, SigningKey, VerifyingKey,
    },
    elliptic_curve::sec1::ToEncodedPoint,
    PublicKey, SecretKey,
};

use crate::error::{HdError, HdResult};
use crate::hash::sha256;

/// Size of a raw private scalar
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Size of a compressed SEC1 public key
pub const PUBLIC_KEY_SIZE: usize = 33;

/// Size of an `r || s` signature
pub const SIGNATURE_SIZE: usize = 64;

/// ECDSA implementation for Neo N3 keys.
pub struct ECDsa;

impl ECDsa {
    /// Signs `SHA-256(data)` with the given private key.
    ///
    /// `r` and `s` are each left-padded to 32 bytes.
    pub fn sign(
        data: &[u8],
        private_key: &[u8; PRIVATE_KEY_SIZE],
    ) -> HdResult<[u8; SIGNATURE_SIZE]> {
        let secret_key = SecretKey::from_slice(private_key)
            .map_err(|e| HdError::SigningFailed(format!("invalid private key: {e}")))?;
        let signing_key = SigningKey::from(secret_key);

        let digest = sha256(data);
        let signature: Signature = signing_key
            .sign_prehash(&digest)
            .map_err(|e| HdError::SigningFailed(e.to_string()))?;

        let mut out = [0u8; SIGNATURE_SIZE];
        out.copy_from_slice(&signature.to_bytes());
        Ok(out)
    }

    /// Verifies an `r || s` signature over `SHA-256(data)`.
    ///
    /// An undecodable public key is an error; a signature that does not
    /// verify (including out-of-range `r` or `s`) is `Ok(false)`.
    pub fn verify(
        data: &[u8],
        signature: &[u8; SIGNATURE_SIZE],
        public_key: &[u8],
    ) -> HdResult<bool> {
        let verifying_key =
            VerifyingKey::from_sec1_bytes(public_key).map_err(|_| HdError::InvalidPublicKey)?;

        let Ok(signature) = Signature::from_slice(signature) else {
            return Ok(false);
        };

        let digest = sha256(data);
        Ok(verifying_key.verify_prehash(&digest, &signature).is_ok())
    }

    /// Derives the compressed public key from a private key.
    pub fn derive_compressed_public_key(
        private_key: &[u8; PRIVATE_KEY_SIZE],
    ) -> HdResult<[u8; PUBLIC_KEY_SIZE]> {
        let secret_key = SecretKey::from_slice(private_key)
            .map_err(|e| HdError::DerivationFailed(format!("invalid private scalar: {e}")))?;
        Ok(Self::compress(&secret_key.public_key()))
    }

    /// Parses a 33-byte compressed public key and checks it lies on the curve.
    pub fn parse_compressed(bytes: &[u8]) -> HdResult<PublicKey> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(HdError::InvalidKeyLength {
                expected: PUBLIC_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        if bytes[0] != 0x02 && bytes[0] != 0x03 {
            return Err(HdError::InvalidPublicKey);
        }
        PublicKey::from_sec1_bytes(bytes).map_err(|_| HdError::InvalidPublicKey)
    }

    /// Expands a compressed key to the 65-byte uncompressed SEC1 form.
    pub fn decompress(bytes: &[u8]) -> HdResult<[u8; 65]> {
        let point = Self::parse_compressed(bytes)?.to_encoded_point(false);
        let mut out = [0u8; 65];
        out.copy_from_slice(point.as_bytes());
        Ok(out)
    }

    /// Encodes a point as compressed SEC1.
    pub fn compress(public_key: &PublicKey) -> [u8; PUBLIC_KEY_SIZE] {
        let encoded = public_key.to_encoded_point(true);
        let mut out = [0u8; PUBLIC_KEY_SIZE];
        out.copy_from_slice(encoded.as_bytes());
        out
    }
}
