//! Validated GT06 frame view

use super::{
    CHECKSUM_SIZE, CatalogEntry, Direction, END_MARKER, FrameKind, ProtocolKind, SERIAL_SIZE,
};

/// Borrowed view over a frame that passed [`validate`](super::validate).
///
/// ```text
/// [START (2)] [LEN (1|2)] [OPCODE (1)] [PAYLOAD] [SERIAL (2)] [CRC (2)] [0D 0A]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    bytes: &'a [u8],
    kind: FrameKind,
    entry: CatalogEntry,
}

impl<'a> Frame<'a> {
    pub(crate) const fn from_parts(bytes: &'a [u8], kind: FrameKind, entry: CatalogEntry) -> Self {
        Self { bytes, kind, entry }
    }

    /// Raw frame bytes, markers included
    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Frame length on the wire
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; a validated frame holds at least its envelope.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Marker family
    #[must_use]
    pub const fn kind(&self) -> FrameKind {
        self.kind
    }

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

    /// Catalog row for the opcode
    #[must_use]
    pub const fn entry(&self) -> CatalogEntry {
        self.entry
    }

    /// Opcode-specific content between the opcode and the serial number
    #[must_use]
    pub fn payload(&self) -> &'a [u8] {
        let start = self.kind.opcode_offset() + 1;
        let end = self.serial_offset();
        &self.bytes[start..end]
    }

    /// Serial number assigned by the producer
    #[must_use]
    pub fn serial(&self) -> u16 {
        let offset = self.serial_offset();
        u16::from_be_bytes([self.bytes[offset], self.bytes[offset + 1]])
    }

    /// Checksum field
    #[must_use]
    pub fn checksum(&self) -> u16 {
        let offset = self.bytes.len() - END_MARKER.len() - CHECKSUM_SIZE;
        u16::from_be_bytes([self.bytes[offset], self.bytes[offset + 1]])
    }

    const fn serial_offset(&self) -> usize {
        self.bytes.len() - END_MARKER.len() - CHECKSUM_SIZE - SERIAL_SIZE
    }
}

impl AsRef<[u8]> for Frame<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::{ProtocolKind, validate};

    const LOGIN: [u8; 18] = [
        0x78, 0x78, 0x0D, 0x01, 0x01, 0x23, 0x45, 0x67, 0x89, 0x01, 0x23, 0x45, 0x00, 0x01, 0x8C,
        0xDD, 0x0D, 0x0A,
    ];

    #[test]
    fn test_frame_accessors() {
        let frame = validate(&LOGIN).unwrap();

        assert_eq!(frame.len(), 18);
        assert_eq!(frame.opcode(), 0x01);
        assert_eq!(frame.protocol(), ProtocolKind::Login);
        assert_eq!(
            frame.payload(),
            &[0x01, 0x23, 0x45, 0x67, 0x89, 0x01, 0x23, 0x45]
        );
        assert_eq!(frame.serial(), 1);
        assert_eq!(frame.checksum(), 0x8CDD);
    }

    #[test]
    fn test_empty_payload() {
        let ack = [0x78, 0x78, 0x05, 0x01, 0x00, 0x01, 0xD9, 0xDC, 0x0D, 0x0A];
        let frame = validate(&ack).unwrap();
        assert!(frame.payload().is_empty());
        assert_eq!(frame.serial(), 1);
    }
}
