//! m-of-n multi-signature verification scripts.
//!
//! Keys are ordered the way Neo orders `ECPoint`s (X coordinate, then Y),
//! so the same key set yields the same script for any input order.

use neo_mixer_crypto::{hash160, ECDsa, PUBLIC_KEY_SIZE};
use tracing::debug;

use crate::address::{script_hash_to_address, SCRIPT_HASH_SIZE};
use crate::error::{MultiSigError, MultiSigResult};
use crate::script::{ScriptBuilder, CHECK_MULTISIG_SYSCALL};

/// Fewest keys accepted for a multi-signature account
pub const MIN_MULTISIG_KEYS: usize = 2;

/// Most keys NeoVM accepts in `CheckMultisig`
pub const MAX_MULTISIG_KEYS: usize = 1024;

/// A multi-signature account and its derived identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSigAccount {
    threshold: usize,
    public_keys: Vec<[u8; PUBLIC_KEY_SIZE]>,
    verification_script: Vec<u8>,
    script_hash: [u8; SCRIPT_HASH_SIZE],
    address: String,
}

impl MultiSigAccount {
    #[inline]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Keys in script order.
    #[inline]
    pub fn public_keys(&self) -> &[[u8; PUBLIC_KEY_SIZE]] {
        &self.public_keys
    }

    #[inline]
    pub fn verification_script(&self) -> &[u8] {
        &self.verification_script
    }

    /// `RIPEMD160(SHA256(script))` in storage (little-endian) order.
    #[inline]
    pub fn script_hash(&self) -> &[u8; SCRIPT_HASH_SIZE] {
        &self.script_hash
    }

    #[inline]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Script hash in Neo's big-endian display form.
    pub fn script_hash_hex(&self) -> String {
        let mut reversed = self.script_hash;
        reversed.reverse();
        hex::encode(reversed)
    }

    pub fn verification_script_hex(&self) -> String {
        hex::encode(&self.verification_script)
    }

    pub fn contains_key(&self, public_key: &[u8]) -> bool {
        self.public_keys.iter().any(|key| key.as_slice() == public_key)
    }
}

/// Builds a `threshold`-of-`n` account over `public_keys`.
pub fn create_multisig_account<K: AsRef<[u8]>>(
    threshold: usize,
    public_keys: &[K],
) -> MultiSigResult<MultiSigAccount> {
    let n = public_keys.len();
    if n < MIN_MULTISIG_KEYS {
        return Err(MultiSigError::InsufficientSigners {
            required: MIN_MULTISIG_KEYS,
            actual: n,
        });
    }
    if n > MAX_MULTISIG_KEYS {
        return Err(MultiSigError::TooManyPublicKeys(n));
    }
    if threshold == 0 || threshold > n {
        return Err(MultiSigError::InvalidThreshold { threshold, keys: n });
    }

    let mut keys = Vec::with_capacity(n);
    for (position, key) in public_keys.iter().enumerate() {
        let key = key.as_ref();
        let invalid = || MultiSigError::InvalidPublicKey {
            position,
            len: key.len(),
        };
        let uncompressed = ECDsa::decompress(key).map_err(|_| invalid())?;
        let compressed: [u8; PUBLIC_KEY_SIZE] = key.try_into().map_err(|_| invalid())?;
        keys.push((uncompressed, compressed));
    }
    // X then Y, both big-endian, is byte order on the uncompressed body
    keys.sort_by(|lhs, rhs| lhs.0[1..].cmp(&rhs.0[1..]));
    let public_keys: Vec<[u8; PUBLIC_KEY_SIZE]> = keys.into_iter().map(|(_, key)| key).collect();

    let mut builder = ScriptBuilder::with_capacity((2 + PUBLIC_KEY_SIZE) * n + 16);
    builder.emit_push_int(threshold)?;
    for key in &public_keys {
        builder.emit_push_key(key);
    }
    builder
        .emit_push_int(n)?
        .emit_syscall(CHECK_MULTISIG_SYSCALL);
    let verification_script = builder.into_bytes();

    let script_hash = hash160(&verification_script);
    let address = script_hash_to_address(&script_hash);
    debug!(target: "neo::multisig", threshold, keys = n, %address, "multisig account built");

    Ok(MultiSigAccount {
        threshold,
        public_keys,
        verification_script,
        script_hash,
        address,
    })
}

/// The 1-of-2 account either party can spend from alone.
pub fn create_1of2_multisig(
    tee_public_key: &[u8],
    master_public_key: &[u8],
) -> MultiSigResult<MultiSigAccount> {
    create_multisig_account(1, &[tee_public_key, master_public_key])
}

/// Whether `address` is the `threshold`-of-n account over `public_keys`.
pub fn verify_multisig_address<K: AsRef<[u8]>>(
    address: &str,
    threshold: usize,
    public_keys: &[K],
) -> bool {
    create_multisig_account(threshold, public_keys)
        .map(|account| account.address == address)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const KEY_A: [u8; 33] =
        hex!("03cdb067d930fd5adaa6c68545016044aaddec64ba39e548250eaea551172e535c");
    const KEY_B: [u8; 33] =
        hex!("036c8431cc78b33177a60b4bcc02baf60d05fee5038e7339d3a688e394c2cbd843");

    #[test]
    fn test_one_of_two_vector() {
        let account = create_1of2_multisig(&KEY_A, &KEY_B).unwrap();
        assert_eq!(account.address(), "NVz3NkQQGGhjM1HxHp6ZpXL3EKCHeKvarv");
        assert_eq!(account.threshold(), 1);
        assert_eq!(account.public_keys(), &[KEY_B, KEY_A]);
    }

    #[test]
    fn test_script_layout() {
        let account = create_1of2_multisig(&KEY_A, &KEY_B).unwrap();
        let script = account.verification_script();

        assert_eq!(script.len(), 1 + 2 * 35 + 1 + 5);
        assert_eq!(script[0], 0x11);
        assert_eq!(&script[1..3], &[0x0c, 0x21]);
        assert_eq!(script[71], 0x12);
        assert_eq!(script[72], 0x41);
        assert_eq!(&script[73..], &CHECK_MULTISIG_SYSCALL);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert_eq!(
            create_multisig_account(1, &[KEY_A]).unwrap_err(),
            MultiSigError::InsufficientSigners {
                required: 2,
                actual: 1
            }
        );
        assert_eq!(
            create_multisig_account(0, &[KEY_A, KEY_B]).unwrap_err(),
            MultiSigError::InvalidThreshold {
                threshold: 0,
                keys: 2
            }
        );
        assert_eq!(
            create_multisig_account(3, &[KEY_A, KEY_B]).unwrap_err(),
            MultiSigError::InvalidThreshold {
                threshold: 3,
                keys: 2
            }
        );
        assert_eq!(
            create_multisig_account(1, &[&KEY_A[..], &KEY_B[..32]]).unwrap_err(),
            MultiSigError::InvalidPublicKey {
                position: 1,
                len: 32
            }
        );
    }

    #[test]
    fn test_script_hash_display_is_reversed() {
        let account = create_1of2_multisig(&KEY_A, &KEY_B).unwrap();
        let mut display = hex::decode(account.script_hash_hex()).unwrap();
        display.reverse();
        assert_eq!(display, account.script_hash());
        assert_eq!(
            account.verification_script_hex(),
            hex::encode(account.verification_script())
        );
    }

    #[test]
    fn test_verify_multisig_address() {
        let keys = [KEY_A, KEY_B];
        assert!(verify_multisig_address(
            "NVz3NkQQGGhjM1HxHp6ZpXL3EKCHeKvarv",
            1,
            &keys
        ));
        assert!(!verify_multisig_address(
            "NVz3NkQQGGhjM1HxHp6ZpXL3EKCHeKvarv",
            2,
            &keys
        ));
        assert!(!verify_multisig_address(
            "NVz3NkQQGGhjM1HxHp6ZpXL3EKCHeKvarv",
            1,
            &[KEY_A]
        ));
    }
}
