//! Outbound frame serial numbers

use std::sync::atomic::{AtomicU16, Ordering};

/// Monotonic 16-bit serial counter for frames built by this side.
///
/// Never issues 0: after 65535 the counter wraps to 1. Increments are a
/// single atomic read-modify-write, so concurrent sessions sharing one
/// generator (e.g. through an `Arc`) always receive distinct values.
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    last: AtomicU16,
}

impl SequenceGenerator {
    /// Create a generator whose first value is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU16::new(0),
        }
    }

    /// Create a generator that continues after `last`.
    #[must_use]
    pub const fn starting_after(last: u16) -> Self {
        Self {
            last: AtomicU16::new(last),
        }
    }

    /// Next serial number.
    pub fn next_value(&self) -> u16 {
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(successor(current))
            })
            .unwrap_or_else(|current| current);
        successor(previous)
    }

    /// Next serial number as the big-endian byte pair written on the wire.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> [u8; 2] {
        self.next_value().to_be_bytes()
    }

    /// Last value handed out (0 before the first call).
    #[must_use]
    pub fn last(&self) -> u16 {
        self.last.load(Ordering::Acquire)
    }
}

const fn successor(current: u16) -> u16 {
    match current.checked_add(1) {
        Some(next) => next,
        None => 1,
    }
}
