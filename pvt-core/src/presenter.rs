use serde::{Deserialize, Serialize};

use crate::{
    Phase, Point, ResponseOutcome, SessionEnd, StatsSnapshot, SurfaceGeometry, Timestamp,
};

/// The armed stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub position: Point,
    pub radius: f32,
}

/// Everything the presentation layer needs to draw one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub at: Timestamp,
    pub phase: Phase,
    /// 1-based trial index, 0 while idle.
    pub trial: u32,
    pub total_trials: u32,
    pub practice_trials: u32,
    pub counted_target: u32,
    pub practice: bool,
    pub target: Option<Target>,
    pub last_latency_ms: Option<f64>,
    pub stats: StatsSnapshot,
    /// Remaining session time, timed sessions only.
    pub remaining_ms: Option<u64>,
    /// Set only on the render that immediately follows an activation.
    pub feedback: Option<ResponseOutcome>,
    pub end: Option<SessionEnd>,
    pub can_start: bool,
    pub can_reset: bool,
}

impl View {
    pub fn remaining_secs(&self) -> Option<u64> {
        self.remaining_ms.map(|ms| ms.div_ceil(1000))
    }

    /// All counted responses are in; only the current dwell is left.
    pub fn is_finishing(&self) -> bool {
        self.counted_target > 0 && self.stats.count as u32 >= self.counted_target
    }
}

/// The presentation adapter driven by the engine.
///
/// `render` must be idempotent per call. `geometry` is read whenever a new
/// target position is generated.
pub trait Presenter {
    fn render(&mut self, view: &View);
    fn geometry(&self) -> SurfaceGeometry;
}

impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn render(&mut self, view: &View) {
        (**self).render(view)
    }

    fn geometry(&self) -> SurfaceGeometry {
        (**self).geometry()
    }
}
