use std::sync::atomic::{AtomicU64, Ordering};

use super::{Error, ProtocolKind};

/// Track GT06 protocol metrics without external dependencies.
pub(crate) struct Metrics;

static FRAMES_SPLIT: AtomicU64 = AtomicU64::new(0);
static FRAMES_ENCODED: AtomicU64 = AtomicU64::new(0);
static BYTES_DISCARDED: AtomicU64 = AtomicU64::new(0);
static BUFFER_OVERFLOWS: AtomicU64 = AtomicU64::new(0);

struct RejectionCounters {
    incomplete_frame: AtomicU64,
    unrecognized_marker: AtomicU64,
    invalid_end_marker: AtomicU64,
    unknown_opcode: AtomicU64,
    checksum_mismatch: AtomicU64,
    malformed_length: AtomicU64,
    other: AtomicU64,
}

static REJECTIONS: RejectionCounters = RejectionCounters::new();

struct ProtocolCounters {
    login: AtomicU64,
    status: AtomicU64,
    location: AtomicU64,
    alarm: AtomicU64,
    lbs_location: AtomicU64,
    wifi_information: AtomicU64,
    information: AtomicU64,
    time_calibration: AtomicU64,
    online_command_response: AtomicU64,
    online_command_long_response: AtomicU64,
    online_command: AtomicU64,
}

static ACCEPTED: ProtocolCounters = ProtocolCounters::new();

impl ProtocolCounters {
    const fn new() -> Self {
        Self {
            login: AtomicU64::new(0),
            status: AtomicU64::new(0),
            location: AtomicU64::new(0),
            alarm: AtomicU64::new(0),
            lbs_location: AtomicU64::new(0),
            wifi_information: AtomicU64::new(0),
            information: AtomicU64::new(0),
            time_calibration: AtomicU64::new(0),
            online_command_response: AtomicU64::new(0),
            online_command_long_response: AtomicU64::new(0),
            online_command: AtomicU64::new(0),
        }
    }

    fn counter(&self, kind: ProtocolKind) -> &AtomicU64 {
        match kind {
            ProtocolKind::Login => &self.login,
            ProtocolKind::Status => &self.status,
            ProtocolKind::Location => &self.location,
            ProtocolKind::Alarm => &self.alarm,
            ProtocolKind::LbsLocation => &self.lbs_location,
            ProtocolKind::WifiInformation => &self.wifi_information,
            ProtocolKind::Information => &self.information,
            ProtocolKind::TimeCalibration => &self.time_calibration,
            ProtocolKind::OnlineCommandResponse => &self.online_command_response,
            ProtocolKind::OnlineCommandLongResponse => &self.online_command_long_response,
            ProtocolKind::OnlineCommand => &self.online_command,
        }
    }

    fn snapshot(&self) -> AcceptedFrames {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        AcceptedFrames {
            login: load(&self.login),
            status: load(&self.status),
            location: load(&self.location),
            alarm: load(&self.alarm),
            lbs_location: load(&self.lbs_location),
            wifi_information: load(&self.wifi_information),
            information: load(&self.information),
            time_calibration: load(&self.time_calibration),
            online_command_response: load(&self.online_command_response),
            online_command_long_response: load(&self.online_command_long_response),
            online_command: load(&self.online_command),
        }
    }
}

impl RejectionCounters {
    const fn new() -> Self {
        Self {
            incomplete_frame: AtomicU64::new(0),
            unrecognized_marker: AtomicU64::new(0),
            invalid_end_marker: AtomicU64::new(0),
            unknown_opcode: AtomicU64::new(0),
            checksum_mismatch: AtomicU64::new(0),
            malformed_length: AtomicU64::new(0),
            other: AtomicU64::new(0),
        }
    }

    fn increment(&self, err: &Error) {
        let counter = match err {
            Error::IncompleteFrame { .. } => &self.incomplete_frame,
            Error::UnrecognizedMarker { .. } => &self.unrecognized_marker,
            Error::InvalidEndMarker { .. } => &self.invalid_end_marker,
            Error::UnknownOpcode { .. } => &self.unknown_opcode,
            Error::ChecksumMismatch { .. } => &self.checksum_mismatch,
            Error::MalformedLength { .. } => &self.malformed_length,
            _ => &self.other,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn total(&self) -> u64 {
        [
            &self.incomplete_frame,
            &self.unrecognized_marker,
            &self.invalid_end_marker,
            &self.unknown_opcode,
            &self.checksum_mismatch,
            &self.malformed_length,
            &self.other,
        ]
        .iter()
        .map(|counter| counter.load(Ordering::Relaxed))
        .sum()
    }
}

impl Metrics {
    #[inline]
    pub(crate) fn record_split(frames: usize) {
        FRAMES_SPLIT.fetch_add(frames as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_accepted(kind: ProtocolKind) {
        ACCEPTED.counter(kind).fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejected(err: &Error) {
        REJECTIONS.increment(err);
    }

    #[inline]
    pub(crate) fn record_encoded() {
        FRAMES_ENCODED.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_discarded(bytes: usize) {
        BYTES_DISCARDED.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_overflow() {
        BUFFER_OVERFLOWS.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn totals() -> MetricsSnapshot {
        MetricsSnapshot {
            frames_split: FRAMES_SPLIT.load(Ordering::Relaxed),
            frames_encoded: FRAMES_ENCODED.load(Ordering::Relaxed),
            accepted: ACCEPTED.snapshot(),
            frames_rejected: REJECTIONS.total(),
            checksum_mismatches: REJECTIONS.checksum_mismatch.load(Ordering::Relaxed),
            unknown_opcodes: REJECTIONS.unknown_opcode.load(Ordering::Relaxed),
            malformed_lengths: REJECTIONS.malformed_length.load(Ordering::Relaxed),
            bytes_discarded: BYTES_DISCARDED.load(Ordering::Relaxed),
            buffer_overflows: BUFFER_OVERFLOWS.load(Ordering::Relaxed),
        }
    }
}

/// Lightweight snapshot of protocol counters.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MetricsSnapshot {
    /// Frames emitted by the splitter
    pub frames_split: u64,
    /// Frames built by encoders
    pub frames_encoded: u64,
    /// Frames accepted by validation, per protocol
    pub accepted: AcceptedFrames,
    /// Split candidates dropped for any reason
    pub frames_rejected: u64,
    /// Rejections caused by a bad checksum
    pub checksum_mismatches: u64,
    /// Rejections caused by an opcode missing from the catalog
    pub unknown_opcodes: u64,
    /// Rejections caused by a length field disagreeing with the frame size
    pub malformed_lengths: u64,
    /// Bytes dropped while resynchronising or on overflow
    pub bytes_discarded: u64,
    /// Reassembly buffers reset for exceeding their limit
    pub buffer_overflows: u64,
}

/// Validated frame counts per protocol.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[allow(missing_docs)]
pub struct AcceptedFrames {
    pub login: u64,
    pub status: u64,
    pub location: u64,
    pub alarm: u64,
    pub lbs_location: u64,
    pub wifi_information: u64,
    pub information: u64,
    pub time_calibration: u64,
    pub online_command_response: u64,
    pub online_command_long_response: u64,
    pub online_command: u64,
}

impl AcceptedFrames {
    /// Count for one protocol.
    #[must_use]
    pub const fn get(&self, kind: ProtocolKind) -> u64 {
        match kind {
            ProtocolKind::Login => self.login,
            ProtocolKind::Status => self.status,
            ProtocolKind::Location => self.location,
            ProtocolKind::Alarm => self.alarm,
            ProtocolKind::LbsLocation => self.lbs_location,
            ProtocolKind::WifiInformation => self.wifi_information,
            ProtocolKind::Information => self.information,
            ProtocolKind::TimeCalibration => self.time_calibration,
            ProtocolKind::OnlineCommandResponse => self.online_command_response,
            ProtocolKind::OnlineCommandLongResponse => self.online_command_long_response,
            ProtocolKind::OnlineCommand => self.online_command,
        }
    }

    /// Sum over every protocol.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.login
            + self.status
            + self.location
            + self.alarm
            + self.lbs_location
            + self.wifi_information
            + self.information
            + self.time_calibration
            + self.online_command_response
            + self.online_command_long_response
            + self.online_command
    }
}

impl MetricsSnapshot {
    /// Share of split candidates that were rejected, if any were seen.
    #[must_use]
    pub fn rejection_ratio(&self) -> Option<f64> {
        let seen = self.frames_split + self.frames_rejected;
        if seen == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.frames_rejected as f64 / seen as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are process-wide and other tests run in parallel, so only
    // lower bounds can be asserted.
    #[test]
    fn test_counters_accumulate() {
        let before = Metrics::totals();

        Metrics::record_split(3);
        Metrics::record_encoded();
        Metrics::record_discarded(7);
        Metrics::record_overflow();
        Metrics::record_rejected(&Error::ChecksumMismatch {
            expected: 1,
            found: 2,
        });
        Metrics::record_rejected(&Error::UnknownOpcode { opcode: 0xEE });
        Metrics::record_rejected(&Error::InvalidHex(String::new()));
        Metrics::record_accepted(ProtocolKind::Login);
        Metrics::record_accepted(ProtocolKind::Login);
        Metrics::record_accepted(ProtocolKind::Alarm);

        let after = Metrics::totals();
        assert!(after.frames_split >= before.frames_split + 3);
        assert!(after.frames_encoded > before.frames_encoded);
        assert!(after.bytes_discarded >= before.bytes_discarded + 7);
        assert!(after.buffer_overflows > before.buffer_overflows);
        assert!(after.checksum_mismatches > before.checksum_mismatches);
        assert!(after.unknown_opcodes > before.unknown_opcodes);
        assert!(after.frames_rejected >= before.frames_rejected + 3);
        assert!(after.accepted.get(ProtocolKind::Login) >= before.accepted.login + 2);
        assert!(after.accepted.alarm > before.accepted.alarm);
        assert!(after.accepted.total() >= before.accepted.total() + 3);
    }

    #[test]
    fn test_rejection_ratio() {
        assert_eq!(MetricsSnapshot::default().rejection_ratio(), None);

        let snapshot = MetricsSnapshot {
            frames_split: 3,
            frames_rejected: 1,
            ..MetricsSnapshot::default()
        };
        assert_eq!(snapshot.rejection_ratio(), Some(0.25));
    }
}
