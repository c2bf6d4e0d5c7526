//! Wire schema primitives for FSA request buffers
//!
//! Fields are placed at fixed byte offsets; nothing here relies on Rust
//! struct layout. Integer byte order comes from a [`WireEncoding`] chosen
//! once per service session.

use super::transport::AbiRevision;

/// Integer byte order of one ABI revision
pub trait WireEncoding {
    const NAME: &'static str;
    const REVISION: AbiRevision;

    fn encode_u32(value: u32) -> [u8; 4];

    fn decode_u32(bytes: [u8; 4]) -> u32;
}

/// Legacy revision: every integer written most significant byte first
pub struct BigEndianWire;

impl WireEncoding for BigEndianWire {
    const NAME: &'static str = "big-endian";
    const REVISION: AbiRevision = AbiRevision::Legacy;

    #[inline]
    fn encode_u32(value: u32) -> [u8; 4] {
        value.to_be_bytes()
    }

    #[inline]
    fn decode_u32(bytes: [u8; 4]) -> u32 {
        u32::from_be_bytes(bytes)
    }
}

/// Revised revision: the record is a host-order struct overlay
pub struct NativeWire;

impl WireEncoding for NativeWire {
    const NAME: &'static str = "native";
    const REVISION: AbiRevision = AbiRevision::NativeOverlay;

    #[inline]
    fn encode_u32(value: u32) -> [u8; 4] {
        value.to_ne_bytes()
    }

    #[inline]
    fn decode_u32(bytes: [u8; 4]) -> u32 {
        u32::from_ne_bytes(bytes)
    }
}

/// 32-bit integer at a fixed offset
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct U32Field {
    pub offset: usize,
}

impl U32Field {
    pub const fn at(offset: usize) -> Self {
        Self { offset }
    }

    pub fn write<E: WireEncoding>(&self, buf: &mut [u8], value: u32) {
        buf[self.offset..self.offset + 4].copy_from_slice(&E::encode_u32(value));
    }

    pub fn read<E: WireEncoding>(&self, buf: &[u8]) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&buf[self.offset..self.offset + 4]);
        E::decode_u32(raw)
    }
}

/// NUL-terminated string in a fixed-width field
///
/// At most `width - 1` bytes are stored so the terminator always survives
/// truncation. Copying stops at an embedded NUL like `strncpy`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StrField {
    pub offset: usize,
    pub width: usize,
}

impl StrField {
    pub const fn new(offset: usize, width: usize) -> Self {
        Self { offset, width }
    }

    pub const fn max_len(&self) -> usize {
        self.width - 1
    }

    pub fn write(&self, buf: &mut [u8], value: &str) {
        let field = &mut buf[self.offset..self.offset + self.width];
        field.fill(0);
        let bytes = value.as_bytes();
        let len = bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(bytes.len())
            .min(self.max_len());
        field[..len].copy_from_slice(&bytes[..len]);
    }

    /// Raw bytes up to the terminator
    pub fn read_bytes<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        let field = &buf[self.offset..self.offset + self.width];
        let len = field.iter().position(|&b| b == 0).unwrap_or(self.width);
        &field[..len]
    }

    /// `None` when truncation split a multi-byte character
    pub fn read<'a>(&self, buf: &'a [u8]) -> Option<&'a str> {
        core::str::from_utf8(self.read_bytes(buf)).ok()
    }
}
