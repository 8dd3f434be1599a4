//! TEE manager error types

use neo_mixer_crypto::HdError;
use neo_mixer_wallets::MultiSigError;
use thiserror::Error;

/// Result type for TEE manager operations
pub type TeeResult<T> = std::result::Result<T, TeeError>;

/// TEE manager error types
#[derive(Error, Debug)]
pub enum TeeError {
    /// Key derivation or signing failed
    #[error(transparent)]
    Hd(#[from] HdError),

    /// Multi-signature account construction failed
    #[error(transparent)]
    MultiSig(#[from] MultiSigError),

    /// Master public key is not a 33-byte compressed point
    #[error("Invalid master public key ({0} bytes)")]
    InvalidMasterKey(usize),

    /// Attestation signature could not be decoded
    #[error("Attestation decode error: {0}")]
    AttestationDecode(String),

    /// Seed sealing failed
    #[error("Sealing failed: {0}")]
    SealingFailed(String),

    /// Seed unsealing failed
    #[error("Unsealing failed: {0}")]
    UnsealingFailed(String),

    /// Recovery store rejected an operation
    #[error("Recovery store error: {0}")]
    Store(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Master key provider has no key for the index
    #[error("Master key unavailable for index {0}")]
    MasterKeyUnavailable(u32),

    /// Operation needs Master private keys the provider does not hold
    #[error("Master private keys not available")]
    PrivateKeysUnavailable,
}

impl From<serde_json::Error> for TeeError {
    fn from(err: serde_json::Error) -> Self {
        TeeError::Serialization(err.to_string())
    }
}
