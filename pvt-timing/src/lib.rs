pub mod clock;
pub mod frames;
pub mod queue;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use frames::{CadenceStats, FrameTimings};
pub use queue::{TimerQueue, TimerToken};
