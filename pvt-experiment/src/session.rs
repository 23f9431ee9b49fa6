use pvt_core::{EndReason, StatsSnapshot, Timestamp, Verdict, ms_to_ns};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;

/// Parameters fixed when a session starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Session {
    pub total_trials: u32,
    pub practice_trials: u32,
    pub counted_target: u32,
    pub max_duration_ms: Option<u64>,
    pub started_at: Timestamp,
}

impl Session {
    pub fn begin(config: &SessionConfig, started_at: Timestamp) -> Self {
        Self {
            total_trials: config.total_trials,
            practice_trials: config.practice_trials,
            counted_target: config.counted_target(),
            max_duration_ms: config.termination.duration_ms(),
            started_at,
        }
    }

    pub fn elapsed_ns(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.started_at)
    }

    pub fn remaining_ms(&self, now: Timestamp) -> Option<u64> {
        self.max_duration_ms.map(|limit| {
            let left = ms_to_ns(limit).saturating_sub(self.elapsed_ns(now));
            left.div_ceil(1_000_000)
        })
    }

    pub fn is_time_up(&self, now: Timestamp) -> bool {
        self.max_duration_ms
            .is_some_and(|limit| self.elapsed_ns(now) >= ms_to_ns(limit))
    }
}

/// Final report of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub reason: EndReason,
    pub verdict: Option<Verdict>,
    /// Trial index when the session ended.
    pub final_trial: u32,
    pub stats: StatsSnapshot,
    pub elapsed_ms: f64,
}
