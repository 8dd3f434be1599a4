//! Neo N3 Base58Check addresses.

use neo_mixer_crypto::{hash160, hash256};

use crate::error::{MultiSigError, MultiSigResult};
use crate::script::signature_redeem_script;

/// Neo N3 address version byte
pub const ADDRESS_VERSION: u8 = 0x35;

/// Size of a script hash
pub const SCRIPT_HASH_SIZE: usize = 20;

const ADDRESS_PAYLOAD_SIZE: usize = 1 + SCRIPT_HASH_SIZE;

/// Encodes `version || script_hash` with a four byte double SHA-256 checksum.
pub fn script_hash_to_address(script_hash: &[u8; SCRIPT_HASH_SIZE]) -> String {
    let mut data = [0u8; ADDRESS_PAYLOAD_SIZE + 4];
    data[0] = ADDRESS_VERSION;
    data[1..ADDRESS_PAYLOAD_SIZE].copy_from_slice(script_hash);

    let checksum = hash256(&data[..ADDRESS_PAYLOAD_SIZE]);
    data[ADDRESS_PAYLOAD_SIZE..].copy_from_slice(&checksum[..4]);

    bs58::encode(data).into_string()
}

/// Decodes an address back to its script hash.
pub fn address_to_script_hash(address: &str) -> MultiSigResult<[u8; SCRIPT_HASH_SIZE]> {
    let data = bs58::decode(address)
        .into_vec()
        .map_err(|e| MultiSigError::InvalidAddress(e.to_string()))?;

    if data.len() != ADDRESS_PAYLOAD_SIZE + 4 {
        return Err(MultiSigError::InvalidAddress(format!(
            "expected {} bytes after decoding, got {}",
            ADDRESS_PAYLOAD_SIZE + 4,
            data.len()
        )));
    }

    let (payload, checksum) = data.split_at(ADDRESS_PAYLOAD_SIZE);
    if hash256(payload)[..4] != *checksum {
        return Err(MultiSigError::ChecksumMismatch);
    }
    if payload[0] != ADDRESS_VERSION {
        return Err(MultiSigError::InvalidAddress(format!(
            "unsupported version {:#04x}",
            payload[0]
        )));
    }

    let mut script_hash = [0u8; SCRIPT_HASH_SIZE];
    script_hash.copy_from_slice(&payload[1..]);
    Ok(script_hash)
}

/// Address of the single-signature account for `public_key`.
pub fn public_key_to_address(public_key: &[u8; 33]) -> String {
    script_hash_to_address(&hash160(&signature_redeem_script(public_key)))
}
