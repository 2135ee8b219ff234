//! GT06 / Concox GPS tracker wire protocol
//!
//! Frame boundary detection, validation and command encoding for trackers
//! speaking the GT06 family of binary protocols over TCP.
//!
//! # Quick Start
//!
//! ```rust
//! use gt06::{Encoder, ProtocolKind, fields, split_frames, validate};
//!
//! // One socket read holding a login frame
//! let read = [
//!     0x78, 0x78, 0x0D, 0x01, 0x01, 0x23, 0x45, 0x67, 0x89, 0x01, 0x23, 0x45, 0x00, 0x01,
//!     0x8C, 0xDD, 0x0D, 0x0A,
//! ];
//!
//! let encoder = Encoder::new();
//! for candidate in split_frames(&read) {
//!     let frame = validate(candidate)?;
//!     assert_eq!(frame.protocol(), ProtocolKind::Login);
//!     assert_eq!(fields::device_identifier(candidate)?, "123456789012345");
//!
//!     // Reply so the tracker keeps the session
//!     let ack = encoder.acknowledge(&frame)?;
//!     assert_eq!(ack.len(), 10);
//! }
//!
//! // Outbound command
//! let command = encoder.command(b"WHERE#")?;
//! assert!(gt06::is_valid(&command));
//! # Ok::<(), gt06::Error>(())
//! ```
//!
//! # Frame layout
//!
//! ```text
//! [78 78 | 79 79] [LEN (1|2)] [OPCODE] [PAYLOAD] [SERIAL (2)] [CRC-16/X25 (2)] [0D 0A]
//! ```
//!
//! Streams that fragment frames across reads should go through
//! [`transport::Reassembler`] (or [`transport::ConnectionTable`] for many
//! connections), which keeps partial frames until they complete.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;
pub mod transport;

pub use protocol::{
    AcceptedFrames, CalibrationTime, Classification, Direction, Encoder, Error, Frame, FrameKind,
    MetricsSnapshot, ProtocolKind, Result, SequenceGenerator, classify, compute_checksum, fields,
    is_valid, metrics_snapshot, split_frames, validate, validate_checksum,
};
pub use transport::{ConnectionTable, Reassembler, ReassemblyConfig};
