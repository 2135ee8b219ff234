//! GT06 protocol error types

use thiserror::Error;

/// GT06 protocol errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffer holds fewer bytes than the frame needs
    #[error("incomplete frame: need {needed} bytes, got {got}")]
    IncompleteFrame {
        /// Needed size
        needed: usize,
        /// Actual size
        got: usize,
    },

    /// Start marker is not one of 78 78 / 79 79 / 70 70
    #[error("unrecognized start marker: {found:02x?}")]
    UnrecognizedMarker {
        /// Found marker bytes
        found: [u8; 2],
    },

    /// End marker is not 0D 0A
    #[error("invalid end marker: {found:02x?}")]
    InvalidEndMarker {
        /// Found marker bytes
        found: [u8; 2],
    },

    /// Opcode is absent from the protocol catalog
    #[error("unknown opcode: {opcode:#04x}")]
    UnknownOpcode {
        /// Opcode byte
        opcode: u8,
    },

    /// Checksum mismatch
    #[error("checksum mismatch: expected {expected:#06x}, got {found:#06x}")]
    ChecksumMismatch {
        /// Checksum computed over the frame body
        expected: u16,
        /// Checksum carried by the frame
        found: u16,
    },

    /// Declared length disagrees with the on-wire length
    #[error("malformed length: header declares {declared} bytes, frame has {actual}")]
    MalformedLength {
        /// Length computed from the header
        declared: usize,
        /// Actual frame length
        actual: usize,
    },

    /// Payload too large to frame
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Payload size
        size: usize,
        /// Maximum allowed
        max: usize,
    },

    /// The frame's protocol does not expect a server acknowledgement
    #[error("protocol {opcode:#04x} has no acknowledgement frame")]
    NoAcknowledgement {
        /// Opcode byte
        opcode: u8,
    },

    /// Input is not a valid hex string
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Two catalog entries claim the same opcode
    #[error("protocol catalog lists opcode {opcode:#04x} more than once")]
    CatalogConflict {
        /// Duplicated opcode
        opcode: u8,
    },
}

impl Error {
    /// Short, stable label used for metrics and log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::IncompleteFrame { .. } => "incomplete_frame",
            Self::UnrecognizedMarker { .. } => "unrecognized_marker",
            Self::InvalidEndMarker { .. } => "invalid_end_marker",
            Self::UnknownOpcode { .. } => "unknown_opcode",
            Self::ChecksumMismatch { .. } => "checksum_mismatch",
            Self::MalformedLength { .. } => "malformed_length",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::NoAcknowledgement { .. } => "no_acknowledgement",
            Self::InvalidHex(_) => "invalid_hex",
            Self::CatalogConflict { .. } => "catalog_conflict",
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
