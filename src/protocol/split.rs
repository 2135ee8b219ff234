//! Frame boundary detection over a raw byte stream
//!
//! TCP gives no message boundaries: one read may hold part of a frame, one
//! frame, or several frames back to back. The splitter walks the buffer with
//! an explicit cursor, using each header's declared length to find the next
//! boundary.

use std::ops::Range;

use tracing::{debug, trace};

use super::metrics::Metrics;
use super::validate::check;
use super::{FrameKind, MIN_FRAME_SIZE};

/// Why the splitter stopped consuming input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStop {
    /// Every byte was consumed.
    Exhausted,
    /// The remaining bytes are the start of a frame that has not fully arrived.
    Incomplete,
    /// The remaining bytes do not start with a normal or long marker.
    Unrecognized,
}

/// Result of one splitting pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutcome {
    /// Byte ranges of emitted frames, in arrival order
    pub frames: Vec<Range<usize>>,
    /// Bytes consumed from the front of the input
    pub consumed: usize,
    /// Reason the pass ended
    pub stop: SplitStop,
}

/// Split a buffer into candidate frames.
///
/// - fewer than 10 bytes, or no normal/long marker: nothing
/// - buffer exactly one declared frame long: the whole buffer
/// - buffer longer: the leading frame if it validates, then the rest
/// - trailing bytes shorter than their declared frame: dropped
///
/// A corrupt leading frame is skipped and splitting resumes right after it.
#[must_use]
pub fn split_frames(input: &[u8]) -> Vec<&[u8]> {
    split_ranges(input)
        .frames
        .into_iter()
        .map(|range| &input[range])
        .collect()
}

/// Split a buffer and report frame ranges plus where unconsumed input starts.
#[must_use]
pub fn split_ranges(input: &[u8]) -> SplitOutcome {
    let mut frames = Vec::new();
    let mut cursor = 0;

    let stop = loop {
        let rest = &input[cursor..];
        if rest.is_empty() {
            break SplitStop::Exhausted;
        }

        let kind = match FrameKind::from_marker(rest) {
            Some(kind) if kind.is_streamed() => kind,
            _ if rest.len() < 2 => break SplitStop::Incomplete,
            _ => break SplitStop::Unrecognized,
        };
        if rest.len() < MIN_FRAME_SIZE {
            break SplitStop::Incomplete;
        }
        let Some(frame_len) = kind.declared_len(rest) else {
            break SplitStop::Incomplete;
        };

        if rest.len() == frame_len {
            trace!(offset = cursor, len = frame_len, %kind, "frame fills buffer");
            frames.push(cursor..input.len());
            cursor = input.len();
            break SplitStop::Exhausted;
        }
        if rest.len() < frame_len {
            trace!(
                offset = cursor,
                have = rest.len(),
                need = frame_len,
                "incomplete trailing frame"
            );
            break SplitStop::Incomplete;
        }

        match check(&rest[..frame_len]) {
            Ok(frame) => {
                trace!(
                    offset = cursor,
                    len = frame_len,
                    protocol = %frame.protocol(),
                    "frame split"
                );
                frames.push(cursor..cursor + frame_len);
            }
            Err(err) => {
                debug!(offset = cursor, len = frame_len, error = %err, "dropping invalid frame");
                Metrics::record_rejected(&err);
            }
        }
        cursor += frame_len;
    };

    Metrics::record_split(frames.len());
    SplitOutcome {
        frames,
        consumed: cursor,
        stop,
    }
}
