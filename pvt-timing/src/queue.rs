use pvt_core::Timestamp;
use tracing::trace;

/// Handle for a scheduled timer. Tokens are never reused within a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone)]
struct Pending<K> {
    token: TimerToken,
    deadline: Timestamp,
    kind: K,
}

/// Single-shot timers polled against caller-supplied time.
///
/// Nothing fires on its own: the owner calls [`TimerQueue::pop_due`] with the
/// current timestamp and receives expired timers in deadline order (ties in
/// scheduling order). A cancelled timer is gone for good.
#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    next_token: u64,
    pending: Vec<Pending<K>>,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> TimerQueue<K> {
    pub fn new() -> Self {
        Self {
            next_token: 0,
            pending: Vec::with_capacity(4),
        }
    }

    pub fn schedule(&mut self, deadline: Timestamp, kind: K) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        // Keep sorted by deadline; equal deadlines stay FIFO.
        let at = self.pending.partition_point(|p| p.deadline <= deadline);
        self.pending.insert(
            at,
            Pending {
                token,
                deadline,
                kind,
            },
        );
        trace!(token = token.0, deadline, "timer scheduled");
        token
    }

    /// Returns false when the token already fired or was cancelled.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        match self.pending.iter().position(|p| p.token == token) {
            Some(idx) => {
                self.pending.remove(idx);
                trace!(token = token.0, "timer cancelled");
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn pop_due(&mut self, now: Timestamp) -> Option<(TimerToken, K)> {
        match self.pending.first() {
            Some(first) if first.deadline <= now => {
                let p = self.pending.remove(0);
                Some((p.token, p.kind))
            }
            _ => None,
        }
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.pending.first().map(|p| p.deadline)
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.pending.iter().any(|p| p.token == token)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
