use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("session needs at least one trial")]
    ZeroTrials,

    #[error("practice trials ({practice}) must leave at least one counted trial out of {total}")]
    PracticeExceedsTotal { practice: u32, total: u32 },

    #[error("delay range {min_ms}..={max_ms} ms is empty")]
    EmptyDelayRange { min_ms: u64, max_ms: u64 },

    #[error("padding must be a finite, non-negative length, got {padding}")]
    InvalidPadding { padding: f32 },

    #[error("timed session needs a non-zero duration")]
    ZeroDuration,

    #[error("countdown interval must be non-zero")]
    ZeroCountdownInterval,

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}
