//! Hash functions used by key derivation and Neo N3 addressing.
//!
//! SHA-256, RIPEMD-160, their Neo combinations, and HMAC-SHA512 for
//! BIP32-style chain code expansion.

use hmac::{Hmac, Mac};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroizing;

use crate::error::{HdError, HdResult};

type HmacSha512 = Hmac<Sha512>;

/// Computes SHA-256 hash of the input data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes RIPEMD-160 hash of the input data.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes Hash160 (RIPEMD-160 of SHA-256) of the input data.
/// This is the script hash used for Neo addresses.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha256_hash = sha256(data);
    ripemd160(&sha256_hash)
}

/// Computes Hash256 (double SHA-256) of the input data.
/// Base58Check checksums are the first four bytes of this.
pub fn hash256(data: &[u8]) -> [u8; 32] {
    let first_hash = sha256(data);
    sha256(&first_hash)
}

/// Computes HMAC-SHA512 over the concatenation of `parts`.
///
/// The output is key material, so it is wiped when dropped.
pub fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> HdResult<Zeroizing<[u8; 64]>> {
    let mut mac = <HmacSha512 as Mac>::new_from_slice(key)
        .map_err(|e| HdError::DerivationFailed(format!("HMAC init failed: {e}")))?;
    for part in parts {
        mac.update(part);
    }
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash160_is_ripemd_of_sha() {
        let data = b"neo";
        assert_eq!(hash160(data), ripemd160(&sha256(data)));
    }

    #[test]
    fn test_hmac_sha512_rfc4231_case2() {
        let parts = [b"what do ya want ".as_slice(), b"for nothing?".as_slice()];
        let out = hmac_sha512(b"Jefe", &parts).unwrap();
        assert_eq!(
            hex::encode(&out[..]),
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
             9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        );
    }
}
