//! Frame validation
//!
//! A frame is accepted only when every check passes:
//! start marker, end marker, declared length, catalog opcode, checksum.

use super::checksum::{carried_checksum, expected_checksum};
use super::metrics::Metrics;
use super::{END_MARKER, Error, Frame, Result, classify};

/// Validate a complete frame and return a typed view over it.
///
/// Never panics on untrusted input.
///
/// # Errors
///
/// Returns the first failed check: `IncompleteFrame`, `UnrecognizedMarker`,
/// `UnknownOpcode`, `InvalidEndMarker`, `MalformedLength` or
/// `ChecksumMismatch`.
pub fn validate(bytes: &[u8]) -> Result<Frame<'_>> {
    let frame = check(bytes)?;
    Metrics::record_accepted(frame.protocol());
    Ok(frame)
}

/// Validation without touching the accepted-frame counters.
pub(crate) fn check(bytes: &[u8]) -> Result<Frame<'_>> {
    let class = classify(bytes)?;
    let kind = class.kind;

    if bytes.len() < kind.min_len() {
        return Err(Error::IncompleteFrame {
            needed: kind.min_len(),
            got: bytes.len(),
        });
    }

    let end = [bytes[bytes.len() - 2], bytes[bytes.len() - 1]];
    if end != END_MARKER {
        return Err(Error::InvalidEndMarker { found: end });
    }

    if let Some(declared) = kind.declared_len(bytes) {
        if declared != bytes.len() {
            return Err(Error::MalformedLength {
                declared,
                actual: bytes.len(),
            });
        }
    }

    if let (Some(expected), Some(found)) = (expected_checksum(bytes), carried_checksum(bytes)) {
        if expected != found {
            return Err(Error::ChecksumMismatch { expected, found });
        }
    }

    Ok(Frame::from_parts(bytes, kind, class.entry))
}

/// Whether `bytes` is one well-formed frame.
#[must_use]
pub fn is_valid(bytes: &[u8]) -> bool {
    validate(bytes).is_ok()
}
