//! NeoVM verification script encoding.

use neo_mixer_crypto::PUBLIC_KEY_SIZE;

use crate::error::{MultiSigError, MultiSigResult};

/// Pushes a signed 8-bit integer
pub const PUSHINT8: u8 = 0x00;

/// Pushes a signed 16-bit little-endian integer
pub const PUSHINT16: u8 = 0x01;

/// `PUSH0`; `PUSH1..PUSH16` follow it directly
pub const PUSH0: u8 = 0x10;

/// Pushes up to 255 bytes of data
pub const PUSHDATA1: u8 = 0x0c;

/// Pushes data with a 16-bit little-endian length
pub const PUSHDATA2: u8 = 0x0d;

/// Pushes data with a 32-bit little-endian length
pub const PUSHDATA4: u8 = 0x0e;

/// Largest integer [`ScriptBuilder::emit_push_int`] accepts; `PUSHINT16`
/// is signed, so anything above reads back negative
pub const MAX_PUSH_INT: usize = 0x7fff;

/// Invokes an interop service by its 4-byte id
pub const SYSCALL: u8 = 0x41;

/// `sha256("System.Crypto.CheckSig")[..4]`
pub const CHECK_SIG_SYSCALL: [u8; 4] = [0x56, 0xe7, 0xb3, 0x27];

/// `sha256("System.Crypto.CheckMultisig")[..4]`
pub const CHECK_MULTISIG_SYSCALL: [u8; 4] = [0x9e, 0xd0, 0xdc, 0x3a];

/// Incremental NeoVM script writer.
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    buf: Vec<u8>,
}

impl ScriptBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Emits the shortest push for an integer in `0..=MAX_PUSH_INT`.
    pub fn emit_push_int(&mut self, value: usize) -> MultiSigResult<&mut Self> {
        match value {
            0..=16 => self.buf.push(PUSH0 + value as u8),
            17..=0x7f => {
                self.buf.push(PUSHINT8);
                self.buf.push(value as u8);
            }
            0x80..=MAX_PUSH_INT => {
                self.buf.push(PUSHINT16);
                self.buf.extend_from_slice(&(value as u16).to_le_bytes());
            }
            _ => return Err(MultiSigError::ScriptIntegerOutOfRange(value)),
        }
        Ok(self)
    }

    /// Emits `data` behind the smallest `PUSHDATA` prefix that fits it.
    pub fn emit_push_data(&mut self, data: &[u8]) -> MultiSigResult<&mut Self> {
        let len = data.len();
        if let Ok(len) = u8::try_from(len) {
            self.buf.push(PUSHDATA1);
            self.buf.push(len);
        } else if let Ok(len) = u16::try_from(len) {
            self.buf.push(PUSHDATA2);
            self.buf.extend_from_slice(&len.to_le_bytes());
        } else {
            let len = u32::try_from(len).map_err(|_| MultiSigError::ScriptDataTooLong(len))?;
            self.buf.push(PUSHDATA4);
            self.buf.extend_from_slice(&len.to_le_bytes());
        }
        self.buf.extend_from_slice(data);
        Ok(self)
    }

    /// Emits `PUSHDATA1 33 key`.
    pub fn emit_push_key(&mut self, public_key: &[u8; PUBLIC_KEY_SIZE]) -> &mut Self {
        self.buf.push(PUSHDATA1);
        self.buf.push(PUBLIC_KEY_SIZE as u8);
        self.buf.extend_from_slice(public_key);
        self
    }

    pub fn emit_syscall(&mut self, id: [u8; 4]) -> &mut Self {
        self.buf.push(SYSCALL);
        self.buf.extend_from_slice(&id);
        self
    }

    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// `PUSHDATA1 key SYSCALL CheckSig`, the single-key verification script.
pub fn signature_redeem_script(public_key: &[u8; PUBLIC_KEY_SIZE]) -> Vec<u8> {
    let mut builder = ScriptBuilder::with_capacity(40);
    builder
        .emit_push_key(public_key)
        .emit_syscall(CHECK_SIG_SYSCALL);
    builder.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo_mixer_crypto::sha256;

    #[test]
    fn test_syscall_ids_match_interop_names() {
        assert_eq!(
            sha256(b"System.Crypto.CheckSig")[..4],
            CHECK_SIG_SYSCALL
        );
        assert_eq!(
            sha256(b"System.Crypto.CheckMultisig")[..4],
            CHECK_MULTISIG_SYSCALL
        );
    }

    #[test]
    fn test_push_int_encoding() {
        let cases: [(usize, &[u8]); 8] = [
            (0, &[0x10]),
            (1, &[0x11]),
            (16, &[0x20]),
            (17, &[0x00, 0x11]),
            (127, &[0x00, 0x7f]),
            (128, &[0x01, 0x80, 0x00]),
            (1024, &[0x01, 0x00, 0x04]),
            (MAX_PUSH_INT, &[0x01, 0xff, 0x7f]),
        ];
        for (value, expected) in cases {
            let mut builder = ScriptBuilder::default();
            builder.emit_push_int(value).unwrap();
            assert_eq!(builder.into_bytes(), expected, "value {value}");
        }
    }

    #[test]
    fn test_push_int_rejects_negative_range() {
        for value in [0x8000usize, 0xffff, 0x1_0000] {
            let mut builder = ScriptBuilder::default();
            assert_eq!(
                builder.emit_push_int(value).unwrap_err(),
                MultiSigError::ScriptIntegerOutOfRange(value)
            );
            assert!(builder.into_bytes().is_empty());
        }
    }

    #[test]
    fn test_push_data_prefix_grows_with_length() {
        let mut builder = ScriptBuilder::default();
        builder.emit_push_data(&[0xab; 255]).unwrap();
        let script = builder.into_bytes();
        assert_eq!(script[..2], [PUSHDATA1, 0xff]);
        assert_eq!(script.len(), 2 + 255);

        let mut builder = ScriptBuilder::default();
        builder.emit_push_data(&[0xab; 300]).unwrap();
        let script = builder.into_bytes();
        assert_eq!(script[..3], [PUSHDATA2, 0x2c, 0x01]);
        assert_eq!(script.len(), 3 + 300);

        let mut builder = ScriptBuilder::default();
        builder.emit_push_data(&vec![0xab; 0x1_0000]).unwrap();
        let script = builder.into_bytes();
        assert_eq!(script[..5], [PUSHDATA4, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(script.len(), 5 + 0x1_0000);
    }

    #[test]
    fn test_push_key_matches_push_data() {
        let key = [0x03u8; PUBLIC_KEY_SIZE];
        let mut by_key = ScriptBuilder::default();
        by_key.emit_push_key(&key);
        let mut by_data = ScriptBuilder::default();
        by_data.emit_push_data(&key).unwrap();
        assert_eq!(by_key.into_bytes(), by_data.into_bytes());
    }

    #[test]
    fn test_signature_redeem_script_layout() {
        let key = [0x02u8; 33];
        let script = signature_redeem_script(&key);
        assert_eq!(script.len(), 40);
        assert_eq!(script[0], PUSHDATA1);
        assert_eq!(script[1], 33);
        assert_eq!(script[35], SYSCALL);
        assert_eq!(script[36..], CHECK_SIG_SYSCALL);
    }
}
