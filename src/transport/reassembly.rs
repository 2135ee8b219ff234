//! Per-connection reassembly of GT06 frames across socket reads.
//!
//! [`split_frames`](crate::protocol::split_frames) is stateless and drops a
//! trailing partial frame. A [`Reassembler`] keeps that tail in a growable
//! `BytesMut` until the rest of the frame arrives. Every frame it returns
//! has passed validation, whatever the read boundaries were.

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::protocol::metrics::Metrics;
use crate::protocol::{Error, FrameKind, SplitStop, classify, split_ranges, validate};

/// Reassembly buffer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReassemblyConfig {
    /// Initial buffer capacity in bytes.
    pub initial_capacity: usize,
    /// Bytes a connection may hold without completing a frame before the
    /// buffer is discarded.
    pub max_buffered: usize,
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            // Largest long frame: 0xFFFF + 6 bytes
            max_buffered: 128 * 1024,
        }
    }
}

/// Accumulates bytes from one connection and yields complete frames.
#[derive(Debug)]
pub struct Reassembler {
    buffer: BytesMut,
    config: ReassemblyConfig,
}

impl Reassembler {
    /// Create a reassembler with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ReassemblyConfig::default())
    }

    /// Create a reassembler with custom settings.
    #[must_use]
    pub fn with_config(config: ReassemblyConfig) -> Self {
        Self {
            buffer: BytesMut::with_capacity(config.initial_capacity),
            config,
        }
    }

    /// Push a socket read and extract every frame it completes.
    ///
    /// Frames come back in arrival order and only if they validate. Bytes
    /// that cannot start a frame are skipped up to the next start marker,
    /// as is a partial frame whose opcode is not in the catalog. Any other
    /// partial frame stays buffered for the next push.
    pub fn push(&mut self, data: &[u8]) -> Vec<Bytes> {
        self.buffer.extend_from_slice(data);
        trace!(len = data.len(), buffered = self.buffer.len(), "reassembly push");

        let mut frames = Vec::new();
        loop {
            let outcome = split_ranges(&self.buffer);
            let chunk = self.buffer.split_to(outcome.consumed).freeze();
            for range in outcome.frames {
                let frame = chunk.slice(range);
                match validate(&frame) {
                    Ok(_) => frames.push(frame),
                    Err(err) => {
                        debug!(len = frame.len(), error = %err, "dropping invalid frame");
                        Metrics::record_rejected(&err);
                    }
                }
            }

            match outcome.stop {
                SplitStop::Exhausted => break,
                SplitStop::Incomplete => match classify(&self.buffer) {
                    Err(err @ Error::UnknownOpcode { .. }) => {
                        debug!(error = %err, "partial frame cannot be valid");
                        Metrics::record_rejected(&err);
                        self.resync();
                    }
                    _ => break,
                },
                SplitStop::Unrecognized => self.resync(),
            }
        }

        if self.buffer.len() > self.config.max_buffered {
            debug!(
                buffered = self.buffer.len(),
                max = self.config.max_buffered,
                "reassembly buffer overflow, discarding"
            );
            Metrics::record_overflow();
            Metrics::record_discarded(self.buffer.len());
            self.buffer.clear();
        }

        frames
    }

    /// Drop bytes up to the next normal/long start marker.
    fn resync(&mut self) {
        let skip = self
            .buffer
            .windows(2)
            .skip(1)
            .position(|pair| FrameKind::from_marker(pair).is_some_and(FrameKind::is_streamed))
            .map_or_else(|| self.trailing_keep(), |index| index + 1);

        debug!(skipped = skip, "resynchronising on next start marker");
        Metrics::record_discarded(skip);
        self.buffer.advance(skip);
    }

    /// Without a marker in sight keep only a last byte that could begin one.
    fn trailing_keep(&self) -> usize {
        match self.buffer.last() {
            Some(&byte)
                if byte == FrameKind::Normal.marker_byte()
                    || byte == FrameKind::Long.marker_byte() =>
            {
                self.buffer.len() - 1
            }
            _ => self.buffer.len(),
        }
    }

    /// Number of buffered bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discard buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}
