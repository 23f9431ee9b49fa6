pub mod geometry;
pub mod phase;
pub mod presenter;
pub mod response;
pub mod summary;

pub use geometry::{Point, SurfaceGeometry};
pub use phase::Phase;
pub use presenter::{Presenter, Target, View};
pub use response::{ResponseOutcome, ResponseRecord};
pub use summary::{EndReason, SessionEnd, StatsSnapshot, Verdict};

/// Timestamps are nanoseconds on the host's monotonic clock.
pub type Timestamp = u64;

pub const NANOS_PER_MILLI: u64 = 1_000_000;

pub fn ms_to_ns(ms: u64) -> Timestamp {
    ms.saturating_mul(NANOS_PER_MILLI)
}

pub fn ns_to_ms(ns: u64) -> f64 {
    ns as f64 / NANOS_PER_MILLI as f64
}
