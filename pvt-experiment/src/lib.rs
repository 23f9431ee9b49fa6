pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod stats;
pub mod trial;
pub mod verdict;

pub use config::{SessionConfig, Termination, Tier, VerdictThresholds};
pub use error::ConfigError;
pub use session::{Session, SessionSummary};
pub use state::{EngineEvent, PvtEngine, TimerKind};
pub use stats::RunningStats;
pub use trial::Trial;
