//! GT06 protocol catalog
//!
//! Single source of truth for recognised opcodes. The opcode lookup table
//! is built from [`CATALOG`] at compile time; listing an opcode twice
//! fails the build.

use std::fmt;

use super::{Direction, Error, Result};

/// Semantic protocol of a frame, keyed by opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProtocolKind {
    /// Device login carrying the IMEI
    Login,
    /// Heartbeat / terminal status
    Status,
    /// GPS location (GT06 `0x12`, X3 `0x22`)
    Location,
    /// Alarm report (GT06 `0x16`, X3 `0x26`/`0x27`)
    Alarm,
    /// Cell-tower location (GT06 `0x18`, X3 `0x28`)
    LbsLocation,
    /// WiFi scan report
    WifiInformation,
    /// Information transmission
    Information,
    /// Device asks for the current time
    TimeCalibration,
    /// Reply to an online command
    OnlineCommandResponse,
    /// Reply to an online command, long form
    OnlineCommandLongResponse,
    /// Online command sent by the server
    OnlineCommand,
}

impl ProtocolKind {
    /// Human-readable protocol name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Status => "Status",
            Self::Location => "Location",
            Self::Alarm => "Alarm",
            Self::LbsLocation => "LBS Location",
            Self::WifiInformation => "Wifi Information",
            Self::Information => "Information",
            Self::TimeCalibration => "Time Calibration",
            Self::OnlineCommandResponse => "Online Command Response",
            Self::OnlineCommandLongResponse => "Online Command Response Long",
            Self::OnlineCommand => "Online Command",
        }
    }

    /// Whether the server answers this protocol with a short echo frame.
    #[must_use]
    pub const fn expects_acknowledgement(self) -> bool {
        matches!(self, Self::Login | Self::Status | Self::Alarm)
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Opcode byte
    pub opcode: u8,
    /// Semantic protocol
    pub kind: ProtocolKind,
    /// Which side originates frames with this opcode
    pub direction: Direction,
}

const fn device(opcode: u8, kind: ProtocolKind) -> CatalogEntry {
    CatalogEntry {
        opcode,
        kind,
        direction: Direction::DeviceToServer,
    }
}

const fn server(opcode: u8, kind: ProtocolKind) -> CatalogEntry {
    CatalogEntry {
        opcode,
        kind,
        direction: Direction::ServerToDevice,
    }
}

/// Login opcode
pub const LOGIN: u8 = 0x01;
/// Time calibration opcode
pub const TIME_CALIBRATION: u8 = 0x8A;
/// Outbound online command opcode
pub const ONLINE_COMMAND: u8 = 0x80;

/// Every recognised opcode.
pub const CATALOG: &[CatalogEntry] = &[
    device(LOGIN, ProtocolKind::Login),
    device(0x13, ProtocolKind::Status),
    device(0x12, ProtocolKind::Location),
    device(0x22, ProtocolKind::Location),
    device(0x16, ProtocolKind::Alarm),
    device(0x26, ProtocolKind::Alarm),
    device(0x27, ProtocolKind::Alarm),
    device(0x18, ProtocolKind::LbsLocation),
    device(0x28, ProtocolKind::LbsLocation),
    device(0x2C, ProtocolKind::WifiInformation),
    device(0x94, ProtocolKind::Information),
    device(TIME_CALIBRATION, ProtocolKind::TimeCalibration),
    device(0x15, ProtocolKind::OnlineCommandResponse),
    device(0x21, ProtocolKind::OnlineCommandLongResponse),
    server(ONLINE_COMMAND, ProtocolKind::OnlineCommand),
];

static LOOKUP: [Option<CatalogEntry>; 256] = build_lookup(CATALOG);

const fn build_lookup(entries: &[CatalogEntry]) -> [Option<CatalogEntry>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < entries.len() {
        let entry = entries[i];
        assert!(
            table[entry.opcode as usize].is_none(),
            "duplicate opcode in protocol catalog"
        );
        table[entry.opcode as usize] = Some(entry);
        i += 1;
    }
    table
}

/// Look up an opcode.
#[must_use]
pub fn lookup(opcode: u8) -> Option<CatalogEntry> {
    LOOKUP[usize::from(opcode)]
}

/// Whether `opcode` is recognised.
#[must_use]
pub fn contains(opcode: u8) -> bool {
    lookup(opcode).is_some()
}

/// Re-check a catalog for duplicate opcodes.
///
/// The built-in catalog is already checked at compile time; this is for
/// startup checks over [`CATALOG`] or any table a caller assembles.
pub fn verify_catalog(entries: &[CatalogEntry]) -> Result<()> {
    let mut seen = [false; 256];
    for entry in entries {
        let slot = &mut seen[usize::from(entry.opcode)];
        if *slot {
            return Err(Error::CatalogConflict {
                opcode: entry.opcode,
            });
        }
        *slot = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_consistent() {
        verify_catalog(CATALOG).unwrap();
        for entry in CATALOG {
            assert_eq!(lookup(entry.opcode), Some(*entry));
        }
    }

    #[test]
    fn test_known_opcodes() {
        assert_eq!(lookup(0x01).unwrap().kind, ProtocolKind::Login);
        assert_eq!(lookup(0x22).unwrap().kind, ProtocolKind::Location);
        assert_eq!(lookup(0x27).unwrap().kind, ProtocolKind::Alarm);
        assert_eq!(lookup(0x2C).unwrap().kind, ProtocolKind::WifiInformation);
        assert_eq!(
            lookup(ONLINE_COMMAND).unwrap().direction,
            Direction::ServerToDevice
        );
    }

    #[test]
    fn test_unknown_opcode() {
        assert!(!contains(0x00));
        assert!(!contains(0xFF));
        assert!(lookup(0xAF).is_none());
    }

    #[test]
    fn test_duplicate_detected() {
        let entries = [
            device(0x01, ProtocolKind::Login),
            device(0x01, ProtocolKind::Status),
        ];
        assert_eq!(
            verify_catalog(&entries),
            Err(Error::CatalogConflict { opcode: 0x01 })
        );
    }
}
