//! Framing primitives shared by replies and commands.

/// Frame synchronization byte, first byte of every reply and command
pub const FRAME_SYNC: u8 = 0xFE;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// First byte is not [`FRAME_SYNC`]
    BadSync,
    /// Checksum mismatch
    InvalidChecksum,
    /// Input shorter than a frame, or output buffer too small
    BufferTooSmall,
    /// Structurally valid bytes with a meaningless field (unknown opcode)
    InvalidFrame,
}

/// Read a little-endian `u16` at `offset`
pub(crate) fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

/// Read a little-endian `i16` at `offset`
pub(crate) fn read_i16(bytes: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

/// Write `value` little-endian at `offset`
pub(crate) fn write_u16(bytes: &mut [u8], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_helpers() {
        let mut buf = [0u8; 4];
        write_u16(&mut buf, 1, 0xBEEF);
        assert_eq!(buf, [0x00, 0xEF, 0xBE, 0x00]);
        assert_eq!(read_u16(&buf, 1), 0xBEEF);
        assert_eq!(read_i16(&[0xFF, 0xFF], 0), -1);
    }
}
