use std::collections::VecDeque;
use std::time::Duration;

/// Display cadence summary over recorded frame intervals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CadenceStats {
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

/// Rolling window of frame durations.
#[derive(Debug, Clone)]
pub struct FrameTimings {
    frames: VecDeque<Duration>,
    max_samples: usize,
}

impl FrameTimings {
    pub fn new(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            frames: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    pub fn record(&mut self, d: Duration) {
        if self.frames.len() == self.max_samples {
            self.frames.pop_front();
        }
        self.frames.push_back(d);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn stats(&self) -> CadenceStats {
        if self.frames.is_empty() {
            return CadenceStats::default();
        }
        let times = self.frames.iter().map(|d| d.as_nanos() as f64);
        let n = self.frames.len() as f64;
        let avg = times.clone().sum::<f64>() / n;
        let var = times.clone().map(|x| (x - avg).powi(2)).sum::<f64>() / n;
        let min = times.clone().fold(f64::INFINITY, f64::min);
        let max = times.fold(f64::NEG_INFINITY, f64::max);
        CadenceStats {
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

impl Default for FrameTimings {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_reports_zeroes() {
        assert_eq!(FrameTimings::default().stats(), CadenceStats::default());
    }

    #[test]
    fn steady_cadence_has_no_jitter() {
        let mut f = FrameTimings::new(8);
        for _ in 0..8 {
            f.record(Duration::from_micros(16_000));
        }
        let s = f.stats();
        assert_eq!(s.average_frame_time_ns, 16_000_000.0);
        assert_eq!(s.jitter_ns, 0.0);
        assert_eq!(s.effective_fps, 62.5);
    }

    #[test]
    fn window_drops_oldest_samples() {
        let mut f = FrameTimings::new(2);
        f.record(Duration::from_millis(100));
        f.record(Duration::from_millis(10));
        f.record(Duration::from_millis(20));
        assert_eq!(f.len(), 2);
        let s = f.stats();
        assert_eq!(s.min_frame_time_ns, 10_000_000.0);
        assert_eq!(s.max_frame_time_ns, 20_000_000.0);
        assert_eq!(s.jitter_ns, 5_000_000.0);
    }
}
