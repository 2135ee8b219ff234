//! GT06 protocol core implementation
//!
//! This module provides the wire format, frame classification, stream
//! splitting, validation and the command encoder.

pub mod catalog;
pub mod checksum;
mod classify;
mod codec;
mod error;
pub mod fields;
mod frame;
pub(crate) mod metrics;
mod sequence;
mod split;
mod types;
mod validate;

pub use catalog::{CATALOG, CatalogEntry, ProtocolKind};
pub use checksum::{compute_checksum, validate_checksum};
pub use classify::{Classification, classify, is_from_device, is_from_server, is_login};
pub use codec::{CalibrationTime, Encoder};
pub use error::{Error, Result};
pub use frame::Frame;
pub use metrics::{AcceptedFrames, MetricsSnapshot};
pub use sequence::SequenceGenerator;
pub use split::{SplitOutcome, SplitStop, split_frames, split_ranges};
pub use types::{Direction, FrameKind};
pub use validate::{is_valid, validate};

/// End marker closing every frame
pub const END_MARKER: [u8; 2] = [0x0D, 0x0A];

/// Checksum size in bytes
pub const CHECKSUM_SIZE: usize = 2;

/// Serial number size in bytes
pub const SERIAL_SIZE: usize = 2;

/// Bytes outside the 1-byte length field's count: start marker, the
/// length byte itself and the end marker.
pub const LENGTH_OVERHEAD: usize = 5;

/// Minimum frame size (normal frame with an empty payload)
pub const MIN_FRAME_SIZE: usize = 10;

/// Largest command payload that fits a normal (1-byte length) frame
pub const MAX_NORMAL_COMMAND_PAYLOAD: usize = u8::MAX as usize - 10;

/// Largest command payload that fits a long (2-byte length) frame
pub const MAX_COMMAND_PAYLOAD: usize = u16::MAX as usize - 11;

/// Process-wide protocol counters.
#[must_use]
pub fn metrics_snapshot() -> MetricsSnapshot {
    metrics::Metrics::totals()
}
