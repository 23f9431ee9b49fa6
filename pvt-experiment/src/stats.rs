use pvt_core::{ResponseRecord, StatsSnapshot, ns_to_ms};

/// Response collections and counters for one session.
///
/// `all` keeps every measured response, practice included. `effective`
/// holds only scored latencies and is the sole input to the aggregates.
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    all: Vec<ResponseRecord>,
    effective: Vec<u64>,
    false_starts: u32,
    lapses: u32,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.all.clear();
        self.effective.clear();
        self.false_starts = 0;
        self.lapses = 0;
    }

    pub fn record(&mut self, response: ResponseRecord) {
        if !response.practice {
            self.effective.push(response.latency_ns);
            if response.is_lapse() {
                self.lapses += 1;
            }
        }
        self.all.push(response);
    }

    pub fn record_false_start(&mut self) {
        self.false_starts += 1;
    }

    pub fn all_responses(&self) -> &[ResponseRecord] {
        &self.all
    }

    pub fn effective_latencies_ns(&self) -> &[u64] {
        &self.effective
    }

    pub fn effective_count(&self) -> usize {
        self.effective.len()
    }

    pub fn false_starts(&self) -> u32 {
        self.false_starts
    }

    pub fn lapses(&self) -> u32 {
        self.lapses
    }

    pub fn mean_ms(&self) -> Option<f64> {
        if self.effective.is_empty() {
            return None;
        }
        let sum: f64 = self.effective.iter().map(|&ns| ns_to_ms(ns)).sum();
        Some(sum / self.effective.len() as f64)
    }

    pub fn best_ms(&self) -> Option<f64> {
        self.effective.iter().min().map(|&ns| ns_to_ms(ns))
    }

    pub fn worst_ms(&self) -> Option<f64> {
        self.effective.iter().max().map(|&ns| ns_to_ms(ns))
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            count: self.effective.len(),
            all_count: self.all.len(),
            mean_ms: self.mean_ms(),
            best_ms: self.best_ms(),
            worst_ms: self.worst_ms(),
            false_starts: self.false_starts,
            lapses: self.lapses,
        }
    }
}
