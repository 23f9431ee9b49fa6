use serde::{Deserialize, Serialize};

/// Top-level state of the trial engine.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    Waiting,
    Target,
    Done,
}

impl Phase {
    /// A session is in flight and activations are scored.
    pub fn is_running(&self) -> bool {
        matches!(self, Phase::Waiting | Phase::Target)
    }

    pub fn allows_start(&self) -> bool {
        matches!(self, Phase::Idle | Phase::Done)
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Phase::Done)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Waiting => "waiting",
            Phase::Target => "target",
            Phase::Done => "done",
        }
    }
}
