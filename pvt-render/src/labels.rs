//! On-screen strings derived from a [`View`].

use pvt_core::{Phase, Verdict, View};

use crate::config::Rgba;

const DASH: &str = "—";

/// Large line above the centre disc.
pub fn headline(view: &View) -> String {
    match view.phase {
        Phase::Idle => "PVT ready".to_owned(),
        Phase::Waiting if view.practice => {
            format!("Practice {}/{}", view.trial, view.practice_trials)
        }
        Phase::Waiting => format!("Trial {}/{}", view.trial, view.total_trials),
        Phase::Target => "Tap NOW!".to_owned(),
        Phase::Done => "Done!".to_owned(),
    }
}

/// Smaller line below the centre disc.
pub fn hint(view: &View) -> String {
    match view.phase {
        Phase::Idle => "Press S or Enter to start.".to_owned(),
        Phase::Waiting => "WAIT… the circle will turn red soon.".to_owned(),
        Phase::Target if view.practice => "Practice tap, not scored.".to_owned(),
        Phase::Target => "Hit the red circle as fast as you can.".to_owned(),
        Phase::Done => match view.end.and_then(|e| e.verdict) {
            Some(verdict) => format!("Result: {}", verdict.label()),
            None => "Press S to run again.".to_owned(),
        },
    }
}

/// Status line at the top of the surface.
///
/// While a timed session runs it tracks the countdown, e.g.
/// `Trial 7/25 • 42s left`; once every counted response is in it reads
/// `Finishing… • 42s left`.
pub fn status_line(view: &View) -> String {
    match view.phase {
        Phase::Idle => "Ready.".to_owned(),
        Phase::Done => end_status(view),
        Phase::Waiting | Phase::Target => {
            let progress = if view.is_finishing() {
                "Finishing…".to_owned()
            } else if view.practice {
                format!("Practice {}/{}", view.trial, view.practice_trials)
            } else {
                format!("Trial {}/{}", view.trial, view.total_trials)
            };
            match view.remaining_secs() {
                Some(secs) => format!("{progress} • {secs}s left"),
                None => progress,
            }
        }
    }
}

/// `<reason> • mean: <ms|—> ms • false starts: n • lapses: n`
pub fn end_status(view: &View) -> String {
    let reason = view.end.map_or("Stopped", |e| e.reason.label());
    format!(
        "{reason} • mean: {} ms • false starts: {} • lapses: {}",
        whole_ms(view.stats.mean_ms),
        view.stats.false_starts,
        view.stats.lapses
    )
}

/// Running statistics shown along the bottom edge.
pub fn readout(view: &View) -> String {
    format!(
        "Trial {} • last {} • mean {} • best {} • worst {} • false starts {} • lapses {}",
        view.trial,
        whole_ms(view.last_latency_ms),
        whole_ms(view.stats.mean_ms),
        whole_ms(view.stats.best_ms),
        whole_ms(view.stats.worst_ms),
        view.stats.false_starts,
        view.stats.lapses
    )
}

pub fn verdict_colour(verdict: Verdict) -> Rgba {
    match verdict {
        Verdict::Excellent => [0x16, 0xa3, 0x4a, 0xff],
        Verdict::Normal => [0xfb, 0xbf, 0x24, 0xff],
        Verdict::NeedsImprovement => [0xef, 0x44, 0x44, 0xff],
        Verdict::InsufficientData => [0x9a, 0xa3, 0xaf, 0xff],
    }
}

fn whole_ms(ms: Option<f64>) -> String {
    ms.map_or_else(|| DASH.to_owned(), |v| format!("{}", v.round() as i64))
}
