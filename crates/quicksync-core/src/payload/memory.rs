//! Memory status decoding.
//!
//! An APP-PARAMETERS memory query is answered with `[tag][width][value...]`
//! where `width` is 1, 2 or 4 and the value is big-endian.

use byteorder::{BigEndian, ByteOrder};

/// Offset of the width byte in a memory status response.
pub const MEMORY_WIDTH_OFFSET: usize = 1;

/// Decode a memory status value in bytes.
///
/// Unknown widths and truncated values decode as 0.
pub fn parse_memory_response(data: &[u8]) -> u32 {
    parse_memory_response_at(data, MEMORY_WIDTH_OFFSET)
}

/// Decode a memory status value whose width byte sits at `offset`.
pub fn parse_memory_response_at(data: &[u8], offset: usize) -> u32 {
    let Some(&width) = data.get(offset) else {
        return 0;
    };
    let value = &data[offset + 1..];
    match width {
        1 if !value.is_empty() => value[0] as u32,
        2 if value.len() >= 2 => BigEndian::read_u16(value) as u32,
        4 if value.len() >= 4 => BigEndian::read_u32(value),
        _ => 0,
    }
}

/// Total and free storage as reported by the handset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryStatus {
    pub total: u32,
    pub free: u32,
}

impl MemoryStatus {
    pub fn used(&self) -> u32 {
        self.total.saturating_sub(self.free)
    }
}
