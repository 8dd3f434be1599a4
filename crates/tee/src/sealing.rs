//! Root seed sealing.
//!
//! A [`SeedSealer`] turns the plaintext root seed into a [`SealedSeed`]
//! that can be persisted by the recovery store. The software sealers here
//! stand in for hardware sealing keys; an enclave-backed sealer plugs in
//! behind the same trait.

use std::fmt;

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use neo_mixer_wallets::serde_hex;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::warn;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{TeeError, TeeResult};

/// Sealed seed container
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SealedSeed {
    /// Sealed payload
    #[serde(with = "serde_hex")]
    pub payload: Vec<u8>,
    /// Nonce used for sealing, empty when the sealer uses none
    #[serde(default, with = "serde_hex")]
    pub nonce: Vec<u8>,
    /// Name of the sealer that produced this blob
    pub sealer: String,
    /// Version of the sealing format
    pub version: u8,
}

impl SealedSeed {
    /// Current sealing format version
    pub const CURRENT_VERSION: u8 = 1;

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> TeeResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(data: &[u8]) -> TeeResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    fn check_header(&self, sealer: &str) -> TeeResult<()> {
        if self.version != Self::CURRENT_VERSION {
            return Err(TeeError::UnsealingFailed(format!(
                "unsupported sealing version: {}",
                self.version
            )));
        }
        if self.sealer != sealer {
            return Err(TeeError::UnsealingFailed(format!(
                "seed was sealed by '{}', not '{sealer}'",
                self.sealer
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for SealedSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedSeed")
            .field("payload_len", &self.payload.len())
            .field("sealer", &self.sealer)
            .field("version", &self.version)
            .finish()
    }
}

/// Seals and unseals the root seed.
pub trait SeedSealer: Send + Sync {
    /// Identifier recorded in every [`SealedSeed`]
    fn name(&self) -> &'static str;

    fn seal(&self, seed: &[u8]) -> TeeResult<SealedSeed>;

    fn unseal(&self, sealed: &SealedSeed) -> TeeResult<Zeroizing<Vec<u8>>>;
}

/// Stores the seed unchanged.
///
/// Provides no confidentiality at rest. Only for tests and simulation.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughSealer;

impl SeedSealer for PassthroughSealer {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn seal(&self, seed: &[u8]) -> TeeResult<SealedSeed> {
        warn!(
            target: "neo::tee",
            "passthrough sealer in use: root seed is not protected at rest"
        );
        Ok(SealedSeed {
            payload: seed.to_vec(),
            nonce: Vec::new(),
            sealer: self.name().to_string(),
            version: SealedSeed::CURRENT_VERSION,
        })
    }

    fn unseal(&self, sealed: &SealedSeed) -> TeeResult<Zeroizing<Vec<u8>>> {
        sealed.check_header(self.name())?;
        Ok(Zeroizing::new(sealed.payload.clone()))
    }
}

/// Additional authenticated data bound to every sealed seed
const SEED_AAD: &[u8] = b"neo-mixer/tee-root-seed/v1";

const NONCE_SIZE: usize = 12;

/// AES-256-GCM sealing under a software sealing key.
pub struct AesGcmSealer {
    key: Zeroizing<[u8; 32]>,
}

impl AesGcmSealer {
    pub fn new(sealing_key: [u8; 32]) -> Self {
        Self {
            key: Zeroizing::new(sealing_key),
        }
    }

    /// Creates a sealer with a fresh random key.
    pub fn generate() -> Self {
        let mut key = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut key[..]);
        Self { key }
    }

    fn cipher(&self) -> TeeResult<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.key[..])
            .map_err(|e| TeeError::SealingFailed(format!("failed to create cipher: {e}")))
    }
}

impl fmt::Debug for AesGcmSealer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcmSealer").field("key", &"***").finish()
    }
}

impl SeedSealer for AesGcmSealer {
    fn name(&self) -> &'static str {
        "aes-256-gcm"
    }

    fn seal(&self, seed: &[u8]) -> TeeResult<SealedSeed> {
        // a fresh OsRng nonce per seal; never reuse under the same key
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let payload = self
            .cipher()?
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: seed,
                    aad: SEED_AAD,
                },
            )
            .map_err(|e| TeeError::SealingFailed(format!("encryption failed: {e}")))?;

        Ok(SealedSeed {
            payload,
            nonce: nonce_bytes.to_vec(),
            sealer: self.name().to_string(),
            version: SealedSeed::CURRENT_VERSION,
        })
    }

    fn unseal(&self, sealed: &SealedSeed) -> TeeResult<Zeroizing<Vec<u8>>> {
        sealed.check_header(self.name())?;
        if sealed.nonce.len() != NONCE_SIZE {
            return Err(TeeError::UnsealingFailed(format!(
                "nonce must be {NONCE_SIZE} bytes, got {}",
                sealed.nonce.len()
            )));
        }

        let plaintext = self
            .cipher()?
            .decrypt(
                Nonce::from_slice(&sealed.nonce),
                Payload {
                    msg: &sealed.payload,
                    aad: SEED_AAD,
                },
            )
            .map_err(|e| TeeError::UnsealingFailed(format!("decryption failed: {e}")))?;

        Ok(Zeroizing::new(plaintext))
    }
}
