//! Neo Mixer Wallets
//!
//! Builds the on-chain accounts that hold mixer pool funds:
//! - Neo N3 multi-signature verification scripts
//! - Script hashes and Base58Check addresses
//! - 1-of-2 pool key pairs combining a TEE key with a Master key
//!
//! Either key alone can sign for a pool account, so the offline Master
//! signer can recover funds if the TEE is lost.

pub mod address;
pub mod error;
pub mod multisig;
pub mod pool;
pub mod script;
pub mod serde_hex;

// Re-export main types
pub use address::{
    address_to_script_hash, public_key_to_address, script_hash_to_address, ADDRESS_VERSION,
    SCRIPT_HASH_SIZE,
};
pub use error::{MultiSigError, MultiSigResult};
pub use multisig::{
    create_1of2_multisig, create_multisig_account, verify_multisig_address, MultiSigAccount,
    MAX_MULTISIG_KEYS, MIN_MULTISIG_KEYS,
};
pub use pool::{compose_pool_key_pair, PoolKeyPair};
pub use script::{signature_redeem_script, ScriptBuilder, MAX_PUSH_INT};
