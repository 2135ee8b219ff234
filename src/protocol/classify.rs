//! Frame classification from start marker and opcode

use super::{CatalogEntry, Direction, Error, FrameKind, ProtocolKind, Result, catalog};

/// What a frame header says about the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Marker family
    pub kind: FrameKind,
    /// Catalog row for the opcode
    pub entry: CatalogEntry,
}

impl Classification {
    /// Direction implied by the start marker
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.kind.direction()
    }

    /// Opcode byte
    #[must_use]
    pub const fn opcode(&self) -> u8 {
        self.entry.opcode
    }

    /// Catalog protocol
    #[must_use]
    pub const fn protocol(&self) -> ProtocolKind {
        self.entry.kind
    }
}

/// Classify a frame (or the header prefix of one).
///
/// # Errors
///
/// - `IncompleteFrame` when the buffer ends before the opcode
/// - `UnrecognizedMarker` when the start marker is not a GT06 marker
/// - `UnknownOpcode` when the opcode is absent from the catalog
pub fn classify(bytes: &[u8]) -> Result<Classification> {
    let kind = frame_kind(bytes)?;

    let offset = kind.opcode_offset();
    let opcode = *bytes.get(offset).ok_or(Error::IncompleteFrame {
        needed: offset + 1,
        got: bytes.len(),
    })?;

    let entry = catalog::lookup(opcode).ok_or(Error::UnknownOpcode { opcode })?;
    Ok(Classification { kind, entry })
}

pub(crate) fn frame_kind(bytes: &[u8]) -> Result<FrameKind> {
    let [first, second, ..] = bytes else {
        return Err(Error::IncompleteFrame {
            needed: 2,
            got: bytes.len(),
        });
    };
    FrameKind::from_marker(bytes).ok_or(Error::UnrecognizedMarker {
        found: [*first, *second],
    })
}

/// Frame was sent by a tracker (`78 78` or `79 79`).
#[must_use]
pub fn is_from_device(bytes: &[u8]) -> bool {
    FrameKind::from_marker(bytes).is_some_and(|kind| kind.direction() == Direction::DeviceToServer)
}

/// Frame is an online command request relayed by the platform (`70 70`).
#[must_use]
pub fn is_from_server(bytes: &[u8]) -> bool {
    FrameKind::from_marker(bytes).is_some_and(|kind| kind.direction() == Direction::ServerToDevice)
}

/// Frame carries the login opcode.
#[must_use]
pub fn is_login(bytes: &[u8]) -> bool {
    classify(bytes).is_ok_and(|class| class.protocol() == ProtocolKind::Login)
}
