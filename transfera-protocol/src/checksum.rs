//! Fletcher-16 checksum
//!
//! Two running sums modulo 255: `c0` over the bytes and `c1` over the values
//! of `c0`. The result packs them as `(c1 << 8) | c0`.
//!
//! A previous result can be passed as `seed` to continue a computation, so the
//! header and payload of a frame can be summed separately:
//!
//! ```
//! use transfera_protocol::checksum::{fletcher16, fletcher16_with_seed};
//!
//! let frame = b"header+payload";
//! let head = fletcher16(&frame[..7]);
//! assert_eq!(fletcher16_with_seed(&frame[7..], head), fletcher16(frame));
//! ```

/// Longest run of bytes that can be summed before `c1` would overflow a u32.
///
/// Largest `n` with `n * (n + 1) / 2 * 255` plus the largest seed contribution
/// still below `u32::MAX`.
const MAX_BLOCK_LEN: usize = 5802;

/// Fletcher-16 of `data`, starting from zero
pub fn fletcher16(data: &[u8]) -> u16 {
    fletcher16_with_seed(data, 0)
}

/// Fletcher-16 of `data`, continuing from a previous result
///
/// An empty slice returns `seed` unchanged.
pub fn fletcher16_with_seed(data: &[u8], seed: u16) -> u16 {
    let mut c0 = u32::from(seed & 0x00FF);
    let mut c1 = u32::from(seed >> 8);

    // Reduce once per block rather than once per byte
    for block in data.chunks(MAX_BLOCK_LEN) {
        for &byte in block {
            c0 += u32::from(byte);
            c1 += c0;
        }
        c0 %= 255;
        c1 %= 255;
    }

    ((c1 << 8) | c0) as u16
}

/// Check `data` against a received checksum
pub fn is_valid(data: &[u8], expected: u16) -> bool {
    is_valid_with_seed(data, expected, 0)
}

/// Check `data` against a received checksum, continuing from `seed`
pub fn is_valid_with_seed(data: &[u8], expected: u16, seed: u16) -> bool {
    fletcher16_with_seed(data, seed) == expected
}
