use pvt_core::{StatsSnapshot, Verdict};

use crate::config::{Tier, VerdictThresholds};

fn within(tier: &Tier, mean_ms: f64, stats: &StatsSnapshot) -> bool {
    mean_ms < tier.max_mean_ms
        && stats.false_starts <= tier.max_false_starts
        && stats.lapses <= tier.max_lapses
}

/// Grade a finished session.
pub fn evaluate(thresholds: &VerdictThresholds, stats: &StatsSnapshot) -> Verdict {
    let Some(mean) = stats.mean_ms else {
        return Verdict::InsufficientData;
    };
    if within(&thresholds.best, mean, stats) {
        Verdict::Excellent
    } else if within(&thresholds.middle, mean, stats) {
        Verdict::Normal
    } else {
        Verdict::NeedsImprovement
    }
}
