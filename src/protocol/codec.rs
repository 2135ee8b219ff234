//! GT06 outbound frame encoder
//!
//! Builds the frames the server sends to a tracker: online commands and
//! the short acknowledgements some device protocols expect.

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{instrument, trace};

use super::catalog::{ONLINE_COMMAND, TIME_CALIBRATION};
use super::checksum::crc16;
use super::metrics::Metrics;
use super::{
    END_MARKER, Error, Frame, FrameKind, MAX_COMMAND_PAYLOAD, MAX_NORMAL_COMMAND_PAYLOAD,
    ProtocolKind, Result, SequenceGenerator,
};

/// Server flag bytes carried by every online command
const SERVER_FLAG_SIZE: usize = 4;

/// Length byte of an acknowledgement: opcode + serial + checksum
const ACK_LENGTH: u8 = 0x05;

/// Length byte of a time calibration reply: opcode + 6 date bytes + serial + checksum
const TIME_CALIBRATION_LENGTH: u8 = 0x0B;

/// UTC timestamp written into a time calibration reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationTime {
    /// Full year; only the last two digits go on the wire
    pub year: u16,
    /// 1-12
    pub month: u8,
    /// 1-31
    pub day: u8,
    /// 0-23
    pub hour: u8,
    /// 0-59
    pub minute: u8,
    /// 0-59
    pub second: u8,
}

impl CalibrationTime {
    fn to_bytes(self) -> [u8; 6] {
        // year % 100 always fits in a byte
        #[allow(clippy::cast_possible_truncation)]
        let year = (self.year % 100) as u8;
        [year, self.month, self.day, self.hour, self.minute, self.second]
    }
}

/// Outbound frame builder.
///
/// Owns the serial counter for frames it creates. Clone the encoder (or
/// share its [`SequenceGenerator`]) to keep serials distinct across sessions.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    sequence: Arc<SequenceGenerator>,
}

impl Encoder {
    /// Create an encoder with a fresh counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder that draws serials from an existing generator.
    #[must_use]
    pub fn with_sequence(sequence: Arc<SequenceGenerator>) -> Self {
        Self { sequence }
    }

    /// Serial counter used for outbound commands
    #[must_use]
    pub fn sequence(&self) -> &Arc<SequenceGenerator> {
        &self.sequence
    }

    /// Build an online command frame with a zero server flag.
    ///
    /// # Errors
    ///
    /// `PayloadTooLarge` when the payload exceeds [`MAX_COMMAND_PAYLOAD`].
    pub fn command(&self, payload: &[u8]) -> Result<Bytes> {
        self.command_with_flag(0, payload)
    }

    /// Build an online command frame.
    ///
    /// ```text
    /// normal: [78 78] [LEN = P+10]    [80] [P+4]    [FLAG (4)] [P] [SERIAL] [CRC] [0D 0A]
    /// long:   [79 79] [LEN = P+11 (2)] [80] [P+4 (2)] [FLAG (4)] [P] [SERIAL] [CRC] [0D 0A]
    /// ```
    ///
    /// The long form is only used when the payload does not fit a one-byte
    /// length field.
    ///
    /// # Errors
    ///
    /// `PayloadTooLarge` when the payload exceeds [`MAX_COMMAND_PAYLOAD`].
    #[instrument(level = "trace", skip(self, payload), fields(len = payload.len()))]
    pub fn command_with_flag(&self, server_flag: u32, payload: &[u8]) -> Result<Bytes> {
        if payload.len() > MAX_COMMAND_PAYLOAD {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: MAX_COMMAND_PAYLOAD,
            });
        }

        let kind = if payload.len() <= MAX_NORMAL_COMMAND_PAYLOAD {
            FrameKind::Normal
        } else {
            FrameKind::Long
        };
        let inner_len = payload.len() + SERVER_FLAG_SIZE;

        let mut frame = start_frame(kind, payload.len() + 17);
        match kind {
            FrameKind::Long => {
                frame.put_u16(to_u16(payload.len() + 11));
                frame.put_u8(ONLINE_COMMAND);
                frame.put_u16(to_u16(inner_len));
            }
            _ => {
                frame.put_u8(to_u8(payload.len() + 10));
                frame.put_u8(ONLINE_COMMAND);
                frame.put_u8(to_u8(inner_len));
            }
        }
        frame.put_u32(server_flag);
        frame.put_slice(payload);

        let serial = self.sequence.next_value();
        trace!(serial, %kind, "encoding online command");
        Ok(finish(frame, serial))
    }

    /// Build the acknowledgement for a login, status or alarm frame.
    ///
    /// Echoes the opcode and serial number of the received frame.
    ///
    /// # Errors
    ///
    /// `NoAcknowledgement` when the frame's protocol is not acknowledged.
    pub fn acknowledge(&self, received: &Frame<'_>) -> Result<Bytes> {
        if !received.protocol().expects_acknowledgement() {
            return Err(Error::NoAcknowledgement {
                opcode: received.opcode(),
            });
        }

        let mut frame = start_frame(FrameKind::Normal, 10);
        frame.put_u8(ACK_LENGTH);
        frame.put_u8(received.opcode());
        Ok(finish(frame, received.serial()))
    }

    /// Build the reply to a time calibration request.
    ///
    /// # Errors
    ///
    /// `NoAcknowledgement` when `received` is not a time calibration frame.
    pub fn time_calibration(&self, received: &Frame<'_>, now: CalibrationTime) -> Result<Bytes> {
        if received.protocol() != ProtocolKind::TimeCalibration {
            return Err(Error::NoAcknowledgement {
                opcode: received.opcode(),
            });
        }

        let mut frame = start_frame(FrameKind::Normal, 16);
        frame.put_u8(TIME_CALIBRATION_LENGTH);
        frame.put_u8(TIME_CALIBRATION);
        frame.put_slice(&now.to_bytes());
        Ok(finish(frame, received.serial()))
    }
}

/// Start an outbound frame buffer with its start marker written.
fn start_frame(kind: FrameKind, capacity: usize) -> BytesMut {
    let mut buf = BytesMut::with_capacity(capacity);
    buf.put_slice(&kind.marker());
    buf
}

/// Append serial, checksum over `[2, ..)` and end marker.
fn finish(mut frame: BytesMut, serial: u16) -> Bytes {
    frame.put_u16(serial);
    let checksum = crc16(&frame[2..]);
    frame.put_u16(checksum);
    frame.put_slice(&END_MARKER);
    Metrics::record_encoded();
    frame.freeze()
}

// Callers bound payload sizes before narrowing.
#[allow(clippy::cast_possible_truncation)]
const fn to_u8(value: usize) -> u8 {
    value as u8
}

#[allow(clippy::cast_possible_truncation)]
const fn to_u16(value: usize) -> u16 {
    value as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{is_valid, validate};

    #[test]
    fn test_command_layout() {
        let encoder = Encoder::new();
        let frame = encoder.command(b"WHERE#").unwrap();

        assert_eq!(frame.len(), 6 + 15);
        assert_eq!(&frame[..2], &[0x78, 0x78]);
        assert_eq!(frame[2], 16);
        assert_eq!(frame[3], ONLINE_COMMAND);
        assert_eq!(frame[4], 10);
        assert_eq!(&frame[5..9], &[0, 0, 0, 0]);
        assert_eq!(&frame[9..15], b"WHERE#");
        assert_eq!(&frame[15..17], &[0x00, 0x01]);
        assert_eq!(&frame[19..], &END_MARKER);
        assert!(is_valid(&frame));
    }

    #[test]
    fn test_command_serials_increment() {
        let encoder = Encoder::new();
        let first = encoder.command(b"A").unwrap();
        let second = encoder.command(b"B").unwrap();

        assert_eq!(validate(&first).unwrap().serial(), 1);
        assert_eq!(validate(&second).unwrap().serial(), 2);
    }

    #[test]
    fn test_cloned_encoders_share_counter() {
        let encoder = Encoder::new();
        let clone = encoder.clone();
        encoder.command(b"A").unwrap();
        let frame = clone.command(b"B").unwrap();
        assert_eq!(validate(&frame).unwrap().serial(), 2);
    }

    #[test]
    fn test_server_flag_written() {
        let encoder = Encoder::new();
        let frame = encoder.command_with_flag(0xDEAD_BEEF, b"RESET#").unwrap();
        assert_eq!(&frame[5..9], &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(is_valid(&frame));
    }

    #[test]
    fn test_largest_normal_command() {
        let encoder = Encoder::new();
        let frame = encoder.command(&[b'x'; MAX_NORMAL_COMMAND_PAYLOAD]).unwrap();
        assert_eq!(frame[2], 0xFF);
        assert_eq!(validate(&frame).unwrap().kind(), FrameKind::Normal);
    }

    #[test]
    fn test_long_command() {
        let encoder = Encoder::new();
        let payload = vec![b'y'; 500];
        let frame = encoder.command(&payload).unwrap();

        assert_eq!(frame.len(), 500 + 17);
        assert_eq!(&frame[..2], &[0x79, 0x79]);
        assert_eq!(u16::from_be_bytes([frame[2], frame[3]]), 511);
        assert_eq!(frame[4], ONLINE_COMMAND);
        assert_eq!(u16::from_be_bytes([frame[5], frame[6]]), 504);
        assert_eq!(&frame[11..511], &payload[..]);

        let parsed = validate(&frame).unwrap();
        assert_eq!(parsed.kind(), FrameKind::Long);
        assert_eq!(parsed.protocol(), ProtocolKind::OnlineCommand);
    }

    #[test]
    fn test_payload_too_large() {
        let encoder = Encoder::new();
        let payload = vec![0u8; MAX_COMMAND_PAYLOAD + 1];
        assert!(matches!(
            encoder.command(&payload),
            Err(Error::PayloadTooLarge { .. })
        ));
        // Rejected payloads do not consume a serial
        assert_eq!(encoder.sequence().last(), 0);
    }

    #[test]
    fn test_login_acknowledgement() {
        let login = [
            0x78, 0x78, 0x0D, 0x01, 0x01, 0x23, 0x45, 0x67, 0x89, 0x01, 0x23, 0x45, 0x00, 0x01,
            0x8C, 0xDD, 0x0D, 0x0A,
        ];
        let encoder = Encoder::new();
        let ack = encoder.acknowledge(&validate(&login).unwrap()).unwrap();

        assert_eq!(
            &ack[..],
            &[0x78, 0x78, 0x05, 0x01, 0x00, 0x01, 0xD9, 0xDC, 0x0D, 0x0A]
        );
        // Acknowledgements echo the device serial instead of drawing one
        assert_eq!(encoder.sequence().last(), 0);
    }

    #[test]
    fn test_no_acknowledgement_for_command() {
        let encoder = Encoder::new();
        let command = encoder.command(b"X").unwrap();
        let frame = validate(&command).unwrap();
        assert_eq!(
            encoder.acknowledge(&frame),
            Err(Error::NoAcknowledgement {
                opcode: ONLINE_COMMAND
            })
        );
    }

    #[test]
    fn test_time_calibration_reply() {
        let mut request = vec![0x78, 0x78, 0x05, TIME_CALIBRATION, 0x00, 0x2A, 0, 0, 0x0D, 0x0A];
        let (hi, lo) = crate::protocol::compute_checksum(&request[2..6]);
        request[6] = hi;
        request[7] = lo;

        let now = CalibrationTime {
            year: 2026,
            month: 10,
            day: 16,
            hour: 8,
            minute: 30,
            second: 5,
        };
        let reply = Encoder::new()
            .time_calibration(&validate(&request).unwrap(), now)
            .unwrap();

        assert_eq!(reply.len(), 16);
        assert_eq!(reply[2], 0x0B);
        assert_eq!(reply[3], TIME_CALIBRATION);
        assert_eq!(&reply[4..10], &[26, 10, 16, 8, 30, 5]);
        assert_eq!(&reply[10..12], &[0x00, 0x2A]);
        assert!(is_valid(&reply));
    }

    // Property-based tests
    #[cfg(test)]
    mod proptests {
        use super::*;
        use crate::protocol::validate_checksum;
        use proptest::prelude::*;

        proptest! {
            /// Property: every encoded command validates
            #[test]
            fn prop_encoded_command_is_valid(payload in prop::collection::vec(any::<u8>(), 1..=500)) {
                let frame = Encoder::new().command(&payload).unwrap();
                prop_assert!(is_valid(&frame));

                let parsed = validate(&frame).unwrap();
                prop_assert_eq!(parsed.len(), frame.len());
                prop_assert_eq!(parsed.protocol(), ProtocolKind::OnlineCommand);
            }

            /// Property: flipping any bit between the marker and checksum breaks the checksum
            #[test]
            fn prop_single_bit_flip_detected(
                payload in prop::collection::vec(any::<u8>(), 1..=200),
                position_ratio in 0.0f64..1.0,
                bit in 0u8..8,
            ) {
                let mut frame = Encoder::new().command(&payload).unwrap().to_vec();
                let start = 2;
                let end = frame.len() - 4;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
                let offset = start + ((end - start) as f64 * position_ratio) as usize;
                frame[offset] ^= 1 << bit;

                prop_assert!(!validate_checksum(&frame));
                prop_assert!(!is_valid(&frame));
            }
        }
    }
}
