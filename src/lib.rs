//! # Neo Mixer: double-blind pool keys for a Neo N3 mixer
//!
//! Every pool account of the mixer is a 1-of-2 multi-signature account.
//! One key is derived from a seed sealed inside the TEE, the other from a
//! Master seed held by an offline signer. Both sides derive along
//! `m/44'/888'/0'/0/index`, so either can sign for the account on its own
//! and the Master signer can recover all funds without the TEE.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use neo_mixer::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = SealedTeeManager::new(
//!         TeeManagerConfig::default(),
//!         Arc::new(AesGcmSealer::generate()),
//!     )?;
//!     let master = HdMasterKeyProvider::from_seed(&[0x42; 32])?;
//!
//!     let pool = manager.mint_pool_account(&master)?;
//!     let signature = manager.sign_transaction(pool.index, b"tx")?;
//!     assert!(verify_signature(&pool.tee_public_key, b"tx", &signature)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`crypto`] - P-256 HD derivation, hashing and ECDSA
//! - [`wallets`] - Neo N3 verification scripts, addresses and pool key pairs
//! - [`tee`] - The sealed TEE manager, Master key providers and recovery stores

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub use neo_mixer_crypto as crypto;
pub use neo_mixer_tee as tee;
pub use neo_mixer_wallets as wallets;

/// Common imports for mixer key management
pub mod prelude {
    pub use crate::crypto::{
        mixer_chain_path, mixer_derivation_path, verify_signature, DerivationPath, ExtendedKey,
        HdError,
    };
    pub use crate::tee::{
        AesGcmSealer, Attestation, FileRecoveryStore, HdMasterKeyProvider, MasterKeyProvider,
        MemoryRecoveryStore, PassthroughSealer, SealedTeeManager, TeeError, TeeManagerConfig,
    };
    pub use crate::wallets::{
        create_1of2_multisig, verify_multisig_address, MultiSigAccount, MultiSigError, PoolKeyPair,
    };
}
