//! Error types for multi-signature account construction.

use thiserror::Error;

/// Result type for multi-signature operations
pub type MultiSigResult<T> = std::result::Result<T, MultiSigError>;

/// Multi-signature and address errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultiSigError {
    /// Fewer public keys than a multi-signature account needs
    #[error("at least {required} public keys are required, got {actual}")]
    InsufficientSigners { required: usize, actual: usize },

    /// More public keys than a verification script may list
    #[error("too many public keys: {0}")]
    TooManyPublicKeys(usize),

    /// Threshold is zero or larger than the key count
    #[error("invalid threshold {threshold} for {keys} public keys")]
    InvalidThreshold { threshold: usize, keys: usize },

    /// Key at `position` is not a compressed point on the curve
    #[error("invalid public key at position {position} ({len} bytes)")]
    InvalidPublicKey { position: usize, len: usize },

    /// Master public key is not a 33-byte compressed point
    #[error("invalid master public key ({0} bytes)")]
    InvalidMasterKey(usize),

    /// Address is not valid Base58Check or has the wrong version byte
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Base58Check checksum does not match the payload
    #[error("address checksum mismatch")]
    ChecksumMismatch,

    /// Integer push outside the non-negative `PUSHINT16` range
    #[error("script integer {0} is out of range")]
    ScriptIntegerOutOfRange(usize),

    /// Data push longer than `PUSHDATA4` can encode
    #[error("script data push of {0} bytes is too long")]
    ScriptDataTooLong(usize),
}
