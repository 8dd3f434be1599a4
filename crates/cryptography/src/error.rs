//! Error types for key derivation and signing.

use thiserror::Error;

/// Result type for derivation and signing operations
pub type HdResult<T> = std::result::Result<T, HdError>;

/// Errors raised by the extended key deriver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HdError {
    /// Seed length is outside the accepted 16..=64 byte range
    #[error("invalid seed: length {0} is outside 16..=64 bytes")]
    InvalidSeed(usize),

    /// Key material has the wrong length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Hardened child requested from a public-only key
    #[error("cannot derive hardened child {0:#010x} from a public key")]
    HardenedFromPublicKey(u32),

    /// Index is outside the range allowed for this derivation
    #[error("invalid index {0:#010x}")]
    InvalidIndex(u32),

    /// Derived scalar or point is unusable (zero, overflow, infinity)
    #[error("derivation failed: {0}")]
    DerivationFailed(String),

    /// Bytes do not encode a point on secp256r1
    #[error("invalid public key encoding")]
    InvalidPublicKey,

    /// Textual derivation path could not be parsed
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    /// Signing operation failed
    #[error("signing failed: {0}")]
    SigningFailed(String),
}
