//! Neo Mixer TEE Key Manager
//!
//! Holds the TEE side of the double-blind pool key scheme:
//! - A sealed root seed from which every pool key is derived
//! - The 1-of-2 pool accounts pairing each TEE key with a Master key
//! - Transaction and attestation signing
//! - A monotonic pool index counter that survives restarts
//!
//! # Architecture
//!
//! ```text
//!   TEE root seed                        Master root seed (offline)
//!        │                                        │
//!   m/44'/888'/0'/0/i                        m/44'/888'/0'/0/i
//!        │                                        │
//!   TEE key (i) ──────────┐        ┌────────── Master key (i)
//!                         ▼        ▼
//!                 1-of-2 multisig pool account
//! ```
//!
//! The Master private key never enters this crate. The manager only sees
//! Master public keys, supplied per index by a [`MasterKeyProvider`].

pub mod attestation;
pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod master;
pub mod proof;
pub mod sealing;
pub mod store;

// Re-export main types
pub use attestation::{attestation_message, Attestation, ATTESTATION_KEY_INDEX};
pub use cache::KeyCache;
pub use config::{
    TeeManagerConfig, DEFAULT_ATTESTATION_TIMEOUT_SECS, DEFAULT_CACHE_SIZE, DEFAULT_SEED_SIZE,
};
pub use error::{TeeError, TeeResult};
pub use manager::SealedTeeManager;
pub use master::{HdMasterKeyProvider, MasterKeyProvider};
pub use proof::{CommitmentProofEngine, MixRequest, MixTarget, ProofEngine};
pub use sealing::{AesGcmSealer, PassthroughSealer, SealedSeed, SeedSealer};
pub use store::{FileRecoveryStore, MemoryRecoveryStore, RecoveryStore};
