//! CRC-16/X25 frame checksum
//!
//! Covers every byte between the start marker and the checksum field:
//!
//! ```text
//! [START (2)] [ ...checksummed... ] [CRC (2)] [END (2)]
//! ```

use crc::{CRC_16_IBM_SDLC, Crc};

use super::{CHECKSUM_SIZE, END_MARKER};

/// CRC-16/X25: poly 0x1021 reflected, init 0xFFFF, xorout 0xFFFF.
///
/// The crc crate catalogues this algorithm as IBM-SDLC.
const X25: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// Bytes after the checksummed range (checksum field + end marker)
const TRAILER_SIZE: usize = CHECKSUM_SIZE + END_MARKER.len();

/// Compute the CRC-16/X25 of `bytes`.
#[must_use]
pub fn crc16(bytes: &[u8]) -> u16 {
    X25.checksum(bytes)
}

/// Compute the checksum of `bytes` as the `(hi, lo)` pair written on the wire.
#[must_use]
pub fn compute_checksum(bytes: &[u8]) -> (u8, u8) {
    let [hi, lo] = crc16(bytes).to_be_bytes();
    (hi, lo)
}

/// Checksum a complete frame would carry, computed over `[2, len - 4)`.
///
/// `None` when the frame is too short to hold a start marker and trailer.
#[must_use]
pub fn expected_checksum(frame: &[u8]) -> Option<u16> {
    let end = frame.len().checked_sub(TRAILER_SIZE)?;
    frame.get(2..end).map(crc16)
}

/// Checksum field carried by a frame (big-endian).
#[must_use]
pub fn carried_checksum(frame: &[u8]) -> Option<u16> {
    let start = frame.len().checked_sub(TRAILER_SIZE)?;
    let field = frame.get(start..start + CHECKSUM_SIZE)?;
    Some(u16::from_be_bytes([field[0], field[1]]))
}

/// Check that a frame's checksum field matches its contents.
///
/// Pure; truncated input simply fails the check.
#[must_use]
pub fn validate_checksum(frame: &[u8]) -> bool {
    match (expected_checksum(frame), carried_checksum(frame)) {
        (Some(expected), Some(found)) => expected == found,
        _ => false,
    }
}
