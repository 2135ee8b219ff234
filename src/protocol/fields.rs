//! Structural field decoders
//!
//! Only the fields needed to route and order frames: device identifier,
//! fixed-point coordinates and serial numbers.

use super::{CHECKSUM_SIZE, END_MARKER, Error, Result, SERIAL_SIZE};

/// Offset of the terminal ID in a login frame
const IMEI_OFFSET: usize = 4;
/// Terminal ID length in bytes (BCD, 16 nibbles)
const IMEI_SIZE: usize = 8;
/// Rendered device identifier length
pub const DEVICE_ID_LEN: usize = 15;

/// Raw coordinate units per degree: 30000 per minute, 60 minutes
const COORDINATE_MINUTES: f64 = 60.0;
const COORDINATE_SCALE: f64 = 30000.0;

/// Mean equatorial radius used for distances (metres)
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Device identifier (IMEI) from the terminal ID field of a login frame.
///
/// The 8-byte field holds 16 hex digits; the leading digit is padding.
///
/// # Errors
///
/// `IncompleteFrame` when the frame ends before the terminal ID does.
pub fn device_identifier(frame: &[u8]) -> Result<String> {
    let field = frame
        .get(IMEI_OFFSET..IMEI_OFFSET + IMEI_SIZE)
        .ok_or(Error::IncompleteFrame {
            needed: IMEI_OFFSET + IMEI_SIZE,
            got: frame.len(),
        })?;

    let digits = hex_string(field);
    Ok(left_pad(&digits[1..], '0', DEVICE_ID_LEN))
}

/// Decode a fixed-point latitude or longitude into signed decimal degrees.
///
/// `raw / 60 / 30000`, rounded half away from zero to 6 decimal places.
#[must_use]
pub fn decode_coordinate(raw: i64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let degrees = raw as f64 / COORDINATE_MINUTES / COORDINATE_SCALE;
    round_to(degrees, 6)
}

/// Serial number carried in the two bytes before the checksum.
///
/// # Errors
///
/// `IncompleteFrame` when the buffer cannot hold a serial and trailer.
pub fn frame_sequence_number(frame: &[u8]) -> Result<u16> {
    let trailer = SERIAL_SIZE + CHECKSUM_SIZE + END_MARKER.len();
    let offset = frame
        .len()
        .checked_sub(trailer)
        .filter(|offset| *offset >= 2)
        .ok_or(Error::IncompleteFrame {
            needed: trailer + 2,
            got: frame.len(),
        })?;
    Ok(u16::from_be_bytes([frame[offset], frame[offset + 1]]))
}

/// Order frames by embedded serial number, independent of arrival order.
///
/// Frames without a readable serial sort first; the sort is stable.
pub fn sort_by_serial<T: AsRef<[u8]>>(frames: &mut [T]) {
    frames.sort_by_key(|frame| frame_sequence_number(frame.as_ref()).ok());
}

/// Lowercase two-digit hex for every byte.
#[must_use]
pub fn to_hex(bytes: &[u8]) -> Vec<String> {
    bytes.iter().map(|byte| hex::encode([*byte])).collect()
}

/// Lowercase hex rendering of a byte slice.
#[must_use]
pub fn hex_string(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Parse a hex string (whitespace between byte pairs allowed).
///
/// # Errors
///
/// `InvalidHex` on odd length or non-hex characters.
pub fn from_hex(input: &str) -> Result<Vec<u8>> {
    let digits: String = input.split_whitespace().collect();
    hex::decode(&digits).map_err(|err| Error::InvalidHex(format!("{err} in {input:?}")))
}

/// Position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Latitude, positive north
    pub latitude: f64,
    /// Longitude, positive east
    pub longitude: f64,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Great-circle (haversine) distance between two positions, in metres.
#[must_use]
pub fn distance_meters(from: Position, to: Position) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    // f64::round rounds half away from zero
    (value * factor).round() / factor
}

fn left_pad(value: &str, pad: char, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.chars().skip(len - width).collect();
    }
    let mut out = String::with_capacity(width);
    out.extend(std::iter::repeat_n(pad, width - len));
    out.push_str(value);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN: [u8; 18] = [
        0x78, 0x78, 0x0D, 0x01, 0x01, 0x23, 0x45, 0x67, 0x89, 0x01, 0x23, 0x45, 0x00, 0x01, 0x8C,
        0xDD, 0x0D, 0x0A,
    ];

    #[test]
    fn test_device_identifier() {
        assert_eq!(device_identifier(&LOGIN).unwrap(), "123456789012345");
    }

    #[test]
    fn test_device_identifier_keeps_leading_zeros() {
        let mut frame = LOGIN;
        frame[4..12].copy_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x12, 0x34]);
        assert_eq!(device_identifier(&frame).unwrap(), "000000000001234");
    }

    #[test]
    fn test_device_identifier_short_frame() {
        assert_eq!(
            device_identifier(&LOGIN[..10]),
            Err(Error::IncompleteFrame { needed: 12, got: 10 })
        );
    }

    #[test]
    fn test_decode_coordinate() {
        // 40582974 / 1_800_000 = 22.5460966...
        let degrees = decode_coordinate(0x026B_3F3E);
        assert!((degrees - 22.546_097).abs() < 1e-6, "{degrees}");

        let degrees = decode_coordinate(0x0C38_C9F0);
        assert!((degrees - 113.915_724).abs() < 1e-6, "{degrees}");
    }

    #[test]
    fn test_decode_coordinate_sign_and_rounding() {
        assert!((decode_coordinate(-0x026B_3F3E) + 22.546_097).abs() < 1e-6);
        // 1 / 1_800_000 = 0.00000055... rounds up in magnitude on both sides of zero
        assert!((decode_coordinate(1) - 0.000_001).abs() < 1e-12);
        assert!((decode_coordinate(-1) + 0.000_001).abs() < 1e-12);
        assert!((decode_coordinate(9) - 0.000_005).abs() < 1e-12);
        assert!(decode_coordinate(0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_frame_sequence_number() {
        assert_eq!(frame_sequence_number(&LOGIN).unwrap(), 1);
        let ack = [0x78, 0x78, 0x05, 0x01, 0x01, 0x2C, 0x00, 0x00, 0x0D, 0x0A];
        assert_eq!(frame_sequence_number(&ack).unwrap(), 0x012C);
        assert!(frame_sequence_number(&ack[..7]).is_err());
    }

    #[test]
    fn test_sort_by_serial() {
        let frame = |serial: u16| {
            let [hi, lo] = serial.to_be_bytes();
            vec![0x78, 0x78, 0x05, 0x13, hi, lo, 0x00, 0x00, 0x0D, 0x0A]
        };
        let mut frames = vec![frame(3), frame(1), frame(0x0100), frame(2)];
        sort_by_serial(&mut frames);

        let serials: Vec<u16> = frames
            .iter()
            .map(|f| frame_sequence_number(f).unwrap())
            .collect();
        assert_eq!(serials, vec![1, 2, 3, 0x0100]);
    }

    #[test]
    fn test_hex_helpers() {
        assert_eq!(to_hex(&[0x0D, 0xAF]), vec!["0d", "af"]);
        assert_eq!(hex_string(&[0x78, 0x78, 0x05]), "787805");
        assert_eq!(from_hex("78 78 05 01").unwrap(), vec![0x78, 0x78, 0x05, 0x01]);
        assert_eq!(from_hex("0D0a").unwrap(), vec![0x0D, 0x0A]);
        assert!(matches!(from_hex("787"), Err(Error::InvalidHex(_))));
        assert!(matches!(from_hex("zz"), Err(Error::InvalidHex(_))));
        assert!(matches!(from_hex("78 7"), Err(Error::InvalidHex(_))));
        assert_eq!(from_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_distance() {
        let tehran = Position::new(35.6892, 51.3890);
        assert!(distance_meters(tehran, tehran).abs() < 1e-9);

        // One degree of latitude on the equatorial-radius sphere
        let north = Position::new(1.0, 0.0);
        let origin = Position::new(0.0, 0.0);
        let expected = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        assert!((distance_meters(origin, north) - expected).abs() < 1e-6);
    }
}
