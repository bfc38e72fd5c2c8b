//! Time source for session start, row timestamps and dataset file names.
//!
//! Elapsed time is measured on the monotonic clock so rows never go back in
//! time when the wall clock is adjusted; the local calendar time is only used
//! to name the dataset file.

use chrono::{DateTime, Local};
use std::cell::Cell;
use std::time::{Duration, Instant};

/// A point in time as seen by the recorder.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    pub instant: Instant,
    pub local: DateTime<Local>,
}

impl Timestamp {
    /// Seconds elapsed since `earlier`, clamped at zero.
    pub fn seconds_since(&self, earlier: &Timestamp) -> f64 {
        self.instant
            .saturating_duration_since(earlier.instant)
            .as_secs_f64()
    }
}

pub trait Clock {
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// The process clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp {
            instant: Instant::now(),
            local: Local::now(),
        }
    }
}

/// A clock that only moves when told to. Used by tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    origin: Timestamp,
    offset: Cell<Duration>,
}

impl ManualClock {
    pub fn new(local: DateTime<Local>) -> Self {
        Self {
            origin: Timestamp {
                instant: Instant::now(),
                local,
            },
            offset: Cell::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        let offset = self.offset.get();
        Timestamp {
            instant: self.origin.instant + offset,
            local: self.origin.local
                + chrono::TimeDelta::from_std(offset).unwrap_or(chrono::TimeDelta::zero()),
        }
    }
}
