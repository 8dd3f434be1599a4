//! Neo Mixer Cryptography
//!
//! Key derivation and signing primitives for the mixer's pool accounts:
//!
//! - **HD derivation**: BIP32-style extended keys on secp256r1, with the
//!   `m/44'/888'/0'/0/index` pool layout
//! - **ECDSA**: SHA-256 + P-256 signatures in Neo's 64-byte `r || s` form
//! - **Hashing**: SHA-256, RIPEMD-160, Hash160, Hash256 and HMAC-SHA512
//!
//! ## Example
//!
//! ```rust
//! use neo_mixer_crypto::{mixer_derivation_path, ExtendedKey};
//!
//! let master = ExtendedKey::from_seed(&[0u8; 32]).unwrap();
//! let pool_key = master.derive_path(mixer_derivation_path(1).unwrap()).unwrap();
//! assert_eq!(pool_key.public_key().len(), 33);
//! ```

pub mod ecdsa;
pub mod error;
pub mod hash;
pub mod hd;

pub use ecdsa::{ECDsa, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
pub use error::{HdError, HdResult};
pub use hash::{hash160, hash256, hmac_sha512, ripemd160, sha256};
pub use hd::{
    hardened, is_hardened, mixer_chain_path, mixer_derivation_path, DerivationPath, ExtendedKey,
    CHAIN_CODE_SIZE, HARDENED_OFFSET, MAX_POOL_INDEX, MIXER_CHAIN_DEPTH,
};

/// Verifies a 64-byte `r || s` signature over `SHA-256(data)`.
///
/// Signatures of any other length are reported as not verifying.
pub fn verify_signature(public_key: &[u8], data: &[u8], signature: &[u8]) -> HdResult<bool> {
    let Ok(signature) = <&[u8; SIGNATURE_SIZE]>::try_from(signature) else {
        return Ok(false);
    };
    ECDsa::verify(data, signature, public_key)
}
