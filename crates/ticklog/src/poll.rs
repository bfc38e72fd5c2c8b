//! The periodic tick: take at most one pending sample and store it.

use tracing::error;

use crate::clock::Clock;
use crate::error::SessionError;
use crate::session::RecordingSession;

/// Non-blocking access to the newest sample vector.
pub trait SampleSource {
    /// Take the newest pending sample, if any. Must not block.
    fn take_latest(&mut self) -> Option<Vec<f64>>;
}

/// Single-slot mailbox filled by the transport. A newer sample replaces an
/// unread older one.
#[derive(Debug, Default)]
pub struct LatestSample {
    slot: Option<Vec<f64>>,
    replaced: u64,
}

impl LatestSample {
    pub fn store(&mut self, values: Vec<f64>) {
        if self.slot.replace(values).is_some() {
            self.replaced += 1;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    /// Samples overwritten before a tick could take them, since the last call.
    pub fn take_replaced(&mut self) -> u64 {
        std::mem::take(&mut self.replaced)
    }
}

impl SampleSource for LatestSample {
    fn take_latest(&mut self) -> Option<Vec<f64>> {
        self.slot.take()
    }
}

/// What a successful tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Nothing was pending.
    Idle,
    /// One row was written, stamped with this many seconds since open.
    Stored { elapsed: f64 },
}

/// Run one tick. A failure only describes this tick; the sample is dropped.
pub fn tick<S, C>(
    session: &mut RecordingSession,
    source: &mut S,
    clock: &C,
) -> Result<Tick, SessionError>
where
    S: SampleSource + ?Sized,
    C: Clock + ?Sized,
{
    let Some(values) = source.take_latest() else {
        return Ok(Tick::Idle);
    };

    match session.append_row(&values, clock.now()) {
        Ok(elapsed) => Ok(Tick::Stored { elapsed }),
        Err(e) => {
            error!("[tick] {}", e);
            Err(e)
        }
    }
}
