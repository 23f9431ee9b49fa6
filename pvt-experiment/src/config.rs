use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// When a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum Termination {
    /// Ends after `total_trials` scored presentations; no clock.
    FixedTrials,
    /// Ends at the earliest of the duration limit, the total trial count, or
    /// the counted target. A countdown poll renders the remaining time and
    /// ends the session between stimulus events.
    Timed {
        duration_ms: u64,
        countdown_interval_ms: u64,
    },
}

impl Termination {
    pub fn duration_ms(&self) -> Option<u64> {
        match self {
            Termination::FixedTrials => None,
            Termination::Timed { duration_ms, .. } => Some(*duration_ms),
        }
    }
}

/// Upper bounds a session must stay within to earn a verdict tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    /// Exclusive.
    pub max_mean_ms: f64,
    pub max_false_starts: u32,
    pub max_lapses: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerdictThresholds {
    pub best: Tier,
    pub middle: Tier,
}

impl Default for VerdictThresholds {
    fn default() -> Self {
        Self {
            best: Tier {
                max_mean_ms: 280.0,
                max_false_starts: 1,
                max_lapses: 1,
            },
            middle: Tier {
                max_mean_ms: 380.0,
                max_false_starts: 3,
                max_lapses: 3,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub total_trials: u32,
    /// Leading trials excluded from scoring.
    pub practice_trials: u32,
    /// Inclusive random wait before each stimulus.
    pub delay_range_ms: (u64, u64),
    /// Responses strictly slower than this are lapses.
    pub lapse_threshold_ms: u64,
    /// Dwell after a hit before the next wait begins.
    pub feedback_hold_ms: u64,
    /// Gap kept between a target's edge and the surface edge.
    pub padding: f32,
    pub termination: Termination,
    pub verdict: VerdictThresholds,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_trials: 25,
            practice_trials: 5,
            delay_range_ms: (2000, 5000),
            lapse_threshold_ms: 500,
            feedback_hold_ms: 650,
            padding: 16.0,
            termination: Termination::Timed {
                duration_ms: 60_000,
                countdown_interval_ms: 200,
            },
            verdict: VerdictThresholds::default(),
        }
    }
}

impl SessionConfig {
    /// Fixed trial count, no practice, no clock.
    pub fn fixed_trials(total_trials: u32) -> Self {
        Self {
            total_trials,
            practice_trials: 0,
            termination: Termination::FixedTrials,
            ..Self::default()
        }
    }

    pub fn with_delay_ms(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.delay_range_ms = (min_ms, max_ms);
        self
    }

    pub fn with_practice(mut self, practice_trials: u32) -> Self {
        self.practice_trials = practice_trials;
        self
    }

    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    /// Scored responses needed to complete the session.
    pub fn counted_target(&self) -> u32 {
        self.total_trials.saturating_sub(self.practice_trials)
    }

    pub fn is_practice(&self, trial: u32) -> bool {
        trial <= self.practice_trials
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_trials == 0 {
            return Err(ConfigError::ZeroTrials);
        }
        if self.practice_trials >= self.total_trials {
            return Err(ConfigError::PracticeExceedsTotal {
                practice: self.practice_trials,
                total: self.total_trials,
            });
        }
        let (min_ms, max_ms) = self.delay_range_ms;
        if min_ms > max_ms {
            return Err(ConfigError::EmptyDelayRange { min_ms, max_ms });
        }
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return Err(ConfigError::InvalidPadding {
                padding: self.padding,
            });
        }
        if let Termination::Timed {
            duration_ms,
            countdown_interval_ms,
        } = self.termination
        {
            if duration_ms == 0 {
                return Err(ConfigError::ZeroDuration);
            }
            if countdown_interval_ms == 0 {
                return Err(ConfigError::ZeroCountdownInterval);
            }
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
