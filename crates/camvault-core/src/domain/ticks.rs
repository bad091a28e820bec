//! Monotonic tick source for unique picture names
//!
//! Ticks count 100-nanosecond intervals since 0001-01-01T00:00:00 UTC, the
//! same scale earlier archives used, so names sort consistently with
//! pictures already in the remote folder. The source never hands out the
//! same value twice, even when the wall clock stalls or steps backwards.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Ticks between 0001-01-01 and the Unix epoch
pub const UNIX_EPOCH_TICKS: u64 = 621_355_968_000_000_000;

/// Converts a UTC instant into ticks
pub fn ticks_at(instant: DateTime<Utc>) -> u64 {
    let since_epoch = instant.timestamp() as i128 * 10_000_000
        + i128::from(instant.timestamp_subsec_nanos() / 100);
    (UNIX_EPOCH_TICKS as i128 + since_epoch).max(0) as u64
}

/// Hands out strictly increasing tick values
#[derive(Debug, Default)]
pub struct TickSource {
    last: AtomicU64,
}

impl TickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next tick for the current wall clock
    pub fn next(&self) -> u64 {
        self.next_at(Utc::now())
    }

    /// Next tick for the given instant, bumped past anything already issued
    pub fn next_at(&self, instant: DateTime<Utc>) -> u64 {
        let candidate = ticks_at(instant);
        let mut previous = self.last.load(Ordering::Acquire);
        loop {
            let next = candidate.max(previous.saturating_add(1));
            match self.last.compare_exchange_weak(
                previous,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => previous = actual,
            }
        }
    }
}
