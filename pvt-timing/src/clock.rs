use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pvt_core::Timestamp;

/// Source of monotonic nanosecond timestamps.
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> Timestamp;

    fn elapsed(&self, since: Timestamp) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(since))
    }
}

/// Nanoseconds since construction, backed by `Instant`.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Timestamp of an `Instant` captured elsewhere (e.g. by the input layer).
    /// Instants before the clock's origin map to zero.
    pub fn stamp(&self, at: Instant) -> Timestamp {
        at.saturating_duration_since(self.start).as_nanos() as Timestamp
    }

    /// The instant a timestamp refers to, for handing deadlines back to an event loop.
    pub fn instant_at(&self, ts: Timestamp) -> Instant {
        self.start + Duration::from_nanos(ts)
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.start.elapsed().as_nanos() as Timestamp
    }
}

/// Hand-driven clock; clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, ts: Timestamp) {
        self.now.store(ts, Ordering::SeqCst);
    }

    pub fn advance(&self, d: Duration) -> Timestamp {
        let step = d.as_nanos() as u64;
        self.now.fetch_add(step, Ordering::SeqCst) + step
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
