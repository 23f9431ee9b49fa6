use serde::{Deserialize, Serialize};

use crate::{Timestamp, ns_to_ms};

/// Classification of a scored activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseOutcome {
    Hit,
    /// A hit slower than the lapse threshold.
    LapseHit,
    /// Activation before the stimulus, or off target. Never recorded as a response.
    FalseStart,
}

impl ResponseOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, ResponseOutcome::Hit | ResponseOutcome::LapseHit)
    }
}

/// One measured response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub trial: u32,
    pub practice: bool,
    pub latency_ns: u64,
    pub armed_at: Timestamp,
    pub outcome: ResponseOutcome,
}

impl ResponseRecord {
    pub fn latency_ms(&self) -> f64 {
        ns_to_ms(self.latency_ns)
    }

    pub fn is_lapse(&self) -> bool {
        self.outcome == ResponseOutcome::LapseHit
    }
}
