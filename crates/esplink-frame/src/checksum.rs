//! CRC-8 used for both the header and payload checksums.
//!
//! Bit-serial over a 16-bit accumulator; must match the device bit for bit.

const POLYNOMIAL: u16 = 0x1070 << 3;

/// Compute the 8-bit checksum of `bytes`.
pub fn checksum(bytes: &[u8]) -> u8 {
    let mut acc: u16 = 0;
    for &byte in bytes {
        acc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            if acc & 0x8000 != 0 {
                acc ^= POLYNOMIAL;
            }
            acc <<= 1;
        }
    }
    (acc >> 8) as u8
}
