//! Hierarchical deterministic derivation.
//!
//! Master keys come from `HMAC-SHA512("Bitcoin seed", seed)`; children
//! follow BIP32 with scalar arithmetic modulo the secp256r1 order.

mod extended_key;
mod path;

pub use extended_key::{ExtendedKey, CHAIN_CODE_SIZE, MAX_SEED_SIZE, MIN_SEED_SIZE};
pub use path::{
    hardened, is_hardened, mixer_chain_path, mixer_derivation_path, DerivationPath,
    BIP44_PURPOSE, EXTERNAL_CHAIN, HARDENED_OFFSET, MAX_POOL_INDEX, MIXER_ACCOUNT,
    MIXER_CHAIN_DEPTH, NEO_COIN_TYPE,
};
