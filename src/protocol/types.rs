//! GT06 frame kinds and traffic direction

use std::fmt;

use super::{LENGTH_OVERHEAD, MIN_FRAME_SIZE};

/// Frame family, identified by the 2-byte start marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum FrameKind {
    /// `78 78`: one length byte
    Normal = 0x78,
    /// `79 79`: two length bytes (big-endian)
    Long = 0x79,
    /// `70 70`: online command request relayed from the platform
    OnlineCommandRequest = 0x70,
}

impl FrameKind {
    /// Identify the frame kind from the first two bytes of a buffer.
    ///
    /// Both marker bytes must match; a buffer shorter than two bytes has no kind.
    #[must_use]
    pub fn from_marker(bytes: &[u8]) -> Option<Self> {
        let [first, second, ..] = bytes else {
            return None;
        };
        if first != second {
            return None;
        }
        match *first {
            0x78 => Some(Self::Normal),
            0x79 => Some(Self::Long),
            0x70 => Some(Self::OnlineCommandRequest),
            _ => None,
        }
    }

    /// Marker byte (written twice at the start of the frame)
    #[must_use]
    pub const fn marker_byte(self) -> u8 {
        self as u8
    }

    /// Full 2-byte start marker
    #[must_use]
    pub const fn marker(self) -> [u8; 2] {
        [self as u8, self as u8]
    }

    /// Width of the length field that follows the marker
    #[must_use]
    pub const fn length_width(self) -> usize {
        match self {
            Self::Long => 2,
            Self::Normal | Self::OnlineCommandRequest => 1,
        }
    }

    /// Offset of the opcode byte
    #[must_use]
    pub const fn opcode_offset(self) -> usize {
        2 + self.length_width()
    }

    /// Whether the stream splitter frames this kind.
    #[must_use]
    pub const fn is_streamed(self) -> bool {
        matches!(self, Self::Normal | Self::Long)
    }

    /// Direction of traffic carried by this kind
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::Normal | Self::Long => Direction::DeviceToServer,
            Self::OnlineCommandRequest => Direction::ServerToDevice,
        }
    }

    /// Total on-wire frame length declared by the header.
    ///
    /// Returns `None` when the header itself is not complete yet.
    #[must_use]
    pub fn declared_len(self, bytes: &[u8]) -> Option<usize> {
        match self {
            Self::Long => {
                let field = bytes.get(2..4)?;
                let declared = u16::from_be_bytes([field[0], field[1]]);
                Some(usize::from(declared) + 1 + LENGTH_OVERHEAD)
            }
            Self::Normal | Self::OnlineCommandRequest => {
                Some(usize::from(*bytes.get(2)?) + LENGTH_OVERHEAD)
            }
        }
    }

    /// Smallest frame of this kind (empty payload)
    #[must_use]
    pub const fn min_len(self) -> usize {
        MIN_FRAME_SIZE + self.length_width() - 1
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "Normal",
            Self::Long => "Long",
            Self::OnlineCommandRequest => "OnlineCommandRequest",
        };
        write!(f, "{name}")
    }
}

/// Who originated a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Tracker → server
    DeviceToServer,
    /// Server/platform → tracker
    ServerToDevice,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceToServer => write!(f, "device->server"),
            Self::ServerToDevice => write!(f, "server->device"),
        }
    }
}
