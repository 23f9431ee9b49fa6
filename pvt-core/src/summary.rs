use serde::{Deserialize, Serialize};

/// Aggregates over the effective (non-practice) responses plus the
/// session counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub count: usize,
    pub all_count: usize,
    pub mean_ms: Option<f64>,
    pub best_ms: Option<f64>,
    pub worst_ms: Option<f64>,
    pub false_starts: u32,
    pub lapses: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Counted target or total trial count reached.
    Completed,
    /// Session duration exhausted.
    TimeUp,
}

impl EndReason {
    pub fn label(&self) -> &'static str {
        match self {
            EndReason::Completed => "Completed",
            EndReason::TimeUp => "Time is up",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Excellent,
    Normal,
    NeedsImprovement,
    InsufficientData,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Excellent => "Excellent",
            Verdict::Normal => "Normal",
            Verdict::NeedsImprovement => "Needs improvement",
            Verdict::InsufficientData => "Insufficient data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEnd {
    pub reason: EndReason,
    /// Only produced under timed termination.
    pub verdict: Option<Verdict>,
}
