//! Mix request commitments.
//!
//! [`CommitmentProofEngine`] is a binding SHA-256 commitment, NOT a
//! zero-knowledge proof: anyone holding the request can recompute it, and
//! it hides nothing about the input to output mapping. A production
//! deployment must replace it with a real circuit (Groth16, PLONK, Halo2)
//! proving value conservation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{TeeError, TeeResult};

/// A destination of a mix request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixTarget {
    /// Destination wallet address
    pub address: String,
    /// Amount to deliver (decimal string)
    pub amount: String,
}

/// The fields of a mix request that the commitment covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixRequest {
    pub id: String,
    pub account_id: String,
    /// User's source wallet
    pub source_wallet: String,
    /// Total amount to mix (decimal string)
    pub amount: String,
    #[serde(default)]
    pub targets: Vec<MixTarget>,
}

/// Produces and checks proofs over mix requests.
pub trait ProofEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the hex-encoded proof for `request`.
    fn prove(&self, request: &MixRequest) -> TeeResult<String>;

    fn verify(&self, request: &MixRequest, proof: &str) -> TeeResult<bool>;
}

/// SHA-256 commitment placeholder.
///
/// The encoding length-prefixes every field, so its commitments differ
/// from a hash over the plain concatenation of the same fields. Proofs
/// from services that concatenate directly do not verify here.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommitmentProofEngine;

impl CommitmentProofEngine {
    /// Hashes every field with a big-endian u32 length prefix so that
    /// distinct requests never share an encoding.
    ///
    /// Fails with [`TeeError::Serialization`] when a field or the target
    /// list is longer than `u32::MAX`.
    pub fn commitment(request: &MixRequest) -> TeeResult<[u8; 32]> {
        fn put(hasher: &mut Sha256, field: &str) -> TeeResult<()> {
            hasher.update(length_prefix(field.len())?);
            hasher.update(field.as_bytes());
            Ok(())
        }

        let mut hasher = Sha256::new();
        put(&mut hasher, &request.id)?;
        put(&mut hasher, &request.account_id)?;
        put(&mut hasher, &request.amount)?;
        put(&mut hasher, &request.source_wallet)?;
        hasher.update(length_prefix(request.targets.len())?);
        for target in &request.targets {
            put(&mut hasher, &target.address)?;
            put(&mut hasher, &target.amount)?;
        }
        Ok(hasher.finalize().into())
    }
}

fn length_prefix(len: usize) -> TeeResult<[u8; 4]> {
    u32::try_from(len)
        .map(u32::to_be_bytes)
        .map_err(|_| TeeError::Serialization(format!("commitment field of {len} bytes too long")))
}

impl ProofEngine for CommitmentProofEngine {
    fn name(&self) -> &'static str {
        "sha256-commitment"
    }

    fn prove(&self, request: &MixRequest) -> TeeResult<String> {
        Ok(hex::encode(Self::commitment(request)?))
    }

    fn verify(&self, request: &MixRequest, proof: &str) -> TeeResult<bool> {
        let Ok(proof) = hex::decode(proof) else {
            return Ok(false);
        };
        let expected = Self::commitment(request)?;
        Ok(expected[..].ct_eq(&proof[..]).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> MixRequest {
        MixRequest {
            id: "mix-1".into(),
            account_id: "acct-7".into(),
            source_wallet: "NYKKYTmv3dJ4NDz6f9VqW3w5u96Bftr8CX".into(),
            amount: "100".into(),
            targets: vec![
                MixTarget {
                    address: "NVz3NkQQGGhjM1HxHp6ZpXL3EKCHeKvarv".into(),
                    amount: "60".into(),
                },
                MixTarget {
                    address: "Neh1Lx4PVfVS18NqWdNBFm458rdfCTicbA".into(),
                    amount: "40".into(),
                },
            ],
        }
    }

    #[test]
    fn test_commitment_is_deterministic() {
        let engine = CommitmentProofEngine;
        let first = engine.prove(&request()).unwrap();
        assert_eq!(first, engine.prove(&request()).unwrap());
        assert_eq!(first.len(), 64);
        assert!(engine.verify(&request(), &first).unwrap());
    }

    #[test]
    fn test_target_amount_changes_commitment() {
        let engine = CommitmentProofEngine;
        let original = engine.prove(&request()).unwrap();

        let mut changed = request();
        changed.targets[1].amount = "41".into();
        let altered = engine.prove(&changed).unwrap();

        assert_ne!(original, altered);
        assert!(!engine.verify(&changed, &original).unwrap());
    }

    #[test]
    fn test_field_boundaries_are_bound() {
        let mut shifted = request();
        shifted.id = "mix-1a".into();
        shifted.account_id = "cct-7".into();
        assert_ne!(
            CommitmentProofEngine::commitment(&request()).unwrap(),
            CommitmentProofEngine::commitment(&shifted).unwrap()
        );
    }

    #[test]
    fn test_commitment_encoding_is_length_prefixed() {
        let request = MixRequest {
            id: "a".into(),
            account_id: "bc".into(),
            source_wallet: "d".into(),
            amount: "1".into(),
            targets: Vec::new(),
        };

        let mut encoded = Vec::new();
        for field in ["a", "bc", "1", "d"] {
            encoded.extend_from_slice(&(field.len() as u32).to_be_bytes());
            encoded.extend_from_slice(field.as_bytes());
        }
        encoded.extend_from_slice(&0u32.to_be_bytes());

        let commitment = CommitmentProofEngine::commitment(&request).unwrap();
        assert_eq!(commitment, <[u8; 32]>::from(Sha256::digest(&encoded)));

        let concatenated: [u8; 32] = Sha256::digest(b"abc1d").into();
        assert_ne!(commitment, concatenated);
    }

    #[test]
    fn test_length_prefix_is_checked() {
        assert_eq!(length_prefix(0).unwrap(), [0, 0, 0, 0]);
        assert_eq!(length_prefix(0x0102).unwrap(), [0, 0, 1, 2]);
        assert_eq!(length_prefix(u32::MAX as usize).unwrap(), [0xff; 4]);
        #[cfg(target_pointer_width = "64")]
        assert!(matches!(
            length_prefix(u32::MAX as usize + 1),
            Err(TeeError::Serialization(_))
        ));
    }

    #[test]
    fn test_verify_rejects_malformed_proof() {
        let engine = CommitmentProofEngine;
        assert!(!engine.verify(&request(), "zz").unwrap());
        assert!(!engine.verify(&request(), "abcd").unwrap());
    }

    #[test]
    fn test_request_uses_service_json_names() {
        let json = r#"{
            "id": "mix-1",
            "account_id": "acct-7",
            "source_wallet": "NYKKYTmv3dJ4NDz6f9VqW3w5u96Bftr8CX",
            "amount": "100",
            "targets": [{"address": "NVz3NkQQGGhjM1HxHp6ZpXL3EKCHeKvarv", "amount": "100"}]
        }"#;
        let parsed: MixRequest = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.account_id, "acct-7");
        assert_eq!(parsed.targets.len(), 1);
    }
}
