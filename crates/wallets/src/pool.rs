//! Pool key pairs: one TEE key and one Master key behind a 1-of-2 account.

use neo_mixer_crypto::{ECDsa, PUBLIC_KEY_SIZE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::address::SCRIPT_HASH_SIZE;
use crate::error::{MultiSigError, MultiSigResult};
use crate::multisig::create_1of2_multisig;
use crate::serde_hex;

/// The keys, script and address of one pool account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolKeyPair {
    pub index: u32,
    #[serde(with = "serde_hex")]
    pub tee_public_key: [u8; PUBLIC_KEY_SIZE],
    #[serde(with = "serde_hex")]
    pub master_public_key: [u8; PUBLIC_KEY_SIZE],
    #[serde(with = "serde_hex")]
    pub multisig_script: Vec<u8>,
    #[serde(with = "serde_hex")]
    pub script_hash: [u8; SCRIPT_HASH_SIZE],
    pub address: String,
}

impl PoolKeyPair {
    /// Rebuilds the account from the two keys and checks the stored
    /// script and address still match.
    pub fn verify(&self) -> bool {
        match create_1of2_multisig(&self.tee_public_key, &self.master_public_key) {
            Ok(account) => {
                account.verification_script() == self.multisig_script.as_slice()
                    && account.script_hash() == &self.script_hash
                    && account.address() == self.address
            }
            Err(_) => false,
        }
    }
}

/// Combines a TEE-derived key with an externally supplied Master key.
///
/// The Master key must be exactly 33 bytes and decode to a curve point,
/// otherwise [`MultiSigError::InvalidMasterKey`] is returned.
pub fn compose_pool_key_pair(
    index: u32,
    tee_public_key: &[u8; PUBLIC_KEY_SIZE],
    master_public_key: &[u8],
) -> MultiSigResult<PoolKeyPair> {
    let invalid_master = || MultiSigError::InvalidMasterKey(master_public_key.len());
    let master: [u8; PUBLIC_KEY_SIZE] = master_public_key
        .try_into()
        .map_err(|_| invalid_master())?;
    ECDsa::parse_compressed(&master).map_err(|_| invalid_master())?;

    let account = create_1of2_multisig(tee_public_key, &master)?;
    debug!(target: "neo::pool", index, address = account.address(), "pool key pair composed");

    Ok(PoolKeyPair {
        index,
        tee_public_key: *tee_public_key,
        master_public_key: master,
        multisig_script: account.verification_script().to_vec(),
        script_hash: *account.script_hash(),
        address: account.address().to_string(),
    })
}
