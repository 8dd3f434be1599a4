//! Timestamped attestations signed by the index-0 TEE key.

use std::time::{SystemTime, UNIX_EPOCH};

use neo_mixer_crypto::SIGNATURE_SIZE;
use serde::{Deserialize, Serialize};

use crate::error::{TeeError, TeeResult};

/// Pool index reserved for the attestation identity
pub const ATTESTATION_KEY_INDEX: u32 = 0;

/// A signature over `data || be64(timestamp)` plus the timestamp it covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// Hex-encoded 64-byte `r || s` signature
    pub signature: String,
    /// Unix seconds folded into the signed message
    pub timestamp: u64,
}

/// `data || be64(timestamp)`
pub fn attestation_message(data: &[u8], timestamp: u64) -> Vec<u8> {
    let mut message = Vec::with_capacity(data.len() + 8);
    message.extend_from_slice(data);
    message.extend_from_slice(&timestamp.to_be_bytes());
    message
}

pub(crate) fn decode_signature(signature_hex: &str) -> TeeResult<[u8; SIGNATURE_SIZE]> {
    let bytes = hex::decode(signature_hex)
        .map_err(|e| TeeError::AttestationDecode(format!("invalid hex: {e}")))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        TeeError::AttestationDecode(format!(
            "signature must be {SIGNATURE_SIZE} bytes, got {len}"
        ))
    })
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Whether `timestamp` lies within `timeout_secs` of `now`, in either
/// direction.
pub(crate) fn is_fresh(timestamp: u64, now: u64, timeout_secs: u64) -> bool {
    timestamp.abs_diff(now) <= timeout_secs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_layout() {
        let message = attestation_message(b"abc", 0x0102_0304_0506_0708);
        assert_eq!(message, b"abc\x01\x02\x03\x04\x05\x06\x07\x08");
    }

    #[test]
    fn test_decode_signature() {
        assert!(decode_signature(&"00".repeat(64)).is_ok());
        assert!(matches!(
            decode_signature("xyz"),
            Err(TeeError::AttestationDecode(_))
        ));
        assert!(matches!(
            decode_signature(&"00".repeat(63)),
            Err(TeeError::AttestationDecode(_))
        ));
    }

    #[test]
    fn test_freshness_window() {
        assert!(is_fresh(1_000, 1_000, 30));
        assert!(is_fresh(970, 1_000, 30));
        assert!(!is_fresh(969, 1_000, 30));
        assert!(is_fresh(1_030, 1_000, 30));
        assert!(!is_fresh(1_031, 1_000, 30));
    }
}
