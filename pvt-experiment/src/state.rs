use pvt_core::geometry::within_radius;
use pvt_core::{
    EndReason, Phase, Point, Presenter, ResponseOutcome, ResponseRecord, SessionEnd,
    StatsSnapshot, SurfaceGeometry, Target, Timestamp, View, ms_to_ns, ns_to_ms,
};
use pvt_timing::{TimerQueue, TimerToken};
use rand::Rng;
use tracing::{debug, info, warn};

use super::config::{SessionConfig, Termination};
use super::error::ConfigError;
use super::session::{Session, SessionSummary};
use super::stats::RunningStats;
use super::trial::Trial;
use super::verdict;

/// Inputs forwarded by the presentation adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    Start { at: Timestamp },
    Reset { at: Timestamp },
    Activation { point: Point, at: Timestamp },
    Tick { now: Timestamp },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// End of the random wait; arms the stimulus.
    Stimulus,
    /// End of the post-hit dwell; starts the next wait.
    Resume,
    /// Recurring countdown poll of a timed session.
    Countdown,
}

/// The PVT trial engine.
///
/// Single-threaded and non-blocking: every transition is a reaction to
/// [`PvtEngine::handle_event`] or to a timer expiring inside
/// [`PvtEngine::update`]. At most one phase timer (stimulus or resume) and one
/// countdown timer are pending; both are cancelled on termination and reset.
pub struct PvtEngine<R: Rng> {
    config: SessionConfig,
    rng: R,
    phase: Phase,
    session: Option<Session>,
    trial: Option<Trial>,
    stats: RunningStats,
    timers: TimerQueue<TimerKind>,
    phase_timer: Option<TimerToken>,
    countdown_timer: Option<TimerToken>,
    last_latency_ns: Option<u64>,
    end: Option<SessionEnd>,
    summary: Option<SessionSummary>,
}

impl<R: Rng> PvtEngine<R> {
    pub fn new(config: SessionConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            rng,
            phase: Phase::Idle,
            session: None,
            trial: None,
            stats: RunningStats::new(),
            timers: TimerQueue::new(),
            phase_timer: None,
            countdown_timer: None,
            last_latency_ns: None,
            end: None,
            summary: None,
        })
    }

    /// Returns false when the event was ignored.
    pub fn handle_event<P: Presenter>(&mut self, event: EngineEvent, presenter: &mut P) -> bool {
        match event {
            EngineEvent::Start { at } => self.start(at, presenter),
            EngineEvent::Reset { at } => {
                self.reset(at, presenter);
                true
            }
            EngineEvent::Activation { point, at } => self.activate(point, at, presenter).is_some(),
            EngineEvent::Tick { now } => self.update(now, presenter) > 0,
        }
    }

    /// Begin a new session. Ignored while one is running.
    pub fn start<P: Presenter>(&mut self, at: Timestamp, presenter: &mut P) -> bool {
        if !self.phase.allows_start() {
            debug!(phase = self.phase.label(), "start ignored");
            return false;
        }

        self.clear_timers();
        self.stats.clear();
        self.last_latency_ns = None;
        self.end = None;
        self.summary = None;
        self.session = Some(Session::begin(&self.config, at));
        self.trial = Some(Trial::new(1, self.config.is_practice(1)));
        self.phase = Phase::Waiting;

        info!(
            total_trials = self.config.total_trials,
            practice_trials = self.config.practice_trials,
            termination = ?self.config.termination,
            "session started"
        );

        if let Termination::Timed {
            countdown_interval_ms,
            ..
        } = self.config.termination
        {
            self.countdown_timer = Some(self.timers.schedule(
                at.saturating_add(ms_to_ns(countdown_interval_ms)),
                TimerKind::Countdown,
            ));
        }

        self.begin_wait(at, None, presenter);
        true
    }

    /// Cancel everything and return to idle.
    pub fn reset<P: Presenter>(&mut self, at: Timestamp, presenter: &mut P) {
        self.clear_timers();
        self.stats.clear();
        self.phase = Phase::Idle;
        self.session = None;
        self.trial = None;
        self.last_latency_ns = None;
        self.end = None;
        self.summary = None;
        info!("session reset");
        self.render(at, None, presenter);
    }

    /// Score a tap or click at `point` (surface coordinates).
    ///
    /// Returns `None` when no session is running, in which case nothing changes.
    /// Off-target activations during the stimulus count as false starts.
    pub fn activate<P: Presenter>(
        &mut self,
        point: Point,
        at: Timestamp,
        presenter: &mut P,
    ) -> Option<ResponseOutcome> {
        match self.phase {
            Phase::Idle | Phase::Done => {
                debug!(phase = self.phase.label(), "activation ignored");
                None
            }
            // The host may forward input before polling the countdown.
            _ if self.time_up(at) => {
                debug!("activation after time limit");
                self.finish(at, EndReason::TimeUp, None, presenter);
                None
            }
            Phase::Waiting => {
                self.false_start(at, presenter);
                Some(ResponseOutcome::FalseStart)
            }
            Phase::Target => {
                let armed = self
                    .trial
                    .as_ref()
                    .filter(|t| t.is_armed())
                    .and_then(|t| Some((t.armed_at?, t.target?)));
                match armed {
                    Some((armed_at, target))
                        if within_radius(target.position, target.radius, point) =>
                    {
                        Some(self.record_hit(armed_at, at, presenter))
                    }
                    _ => {
                        self.false_start(at, presenter);
                        Some(ResponseOutcome::FalseStart)
                    }
                }
            }
        }
    }

    /// Fire every timer due at `now`, in deadline order. Returns how many fired.
    pub fn update<P: Presenter>(&mut self, now: Timestamp, presenter: &mut P) -> usize {
        let mut fired = 0;
        while let Some((token, kind)) = self.timers.pop_due(now) {
            let slot = match kind {
                TimerKind::Countdown => &mut self.countdown_timer,
                TimerKind::Stimulus | TimerKind::Resume => &mut self.phase_timer,
            };
            if *slot != Some(token) {
                continue;
            }
            *slot = None;
            fired += 1;

            match kind {
                TimerKind::Stimulus => self.arm_stimulus(now, presenter),
                TimerKind::Resume => {
                    if self.phase == Phase::Waiting {
                        self.begin_wait(now, None, presenter);
                    }
                }
                TimerKind::Countdown => self.countdown(now, presenter),
            }
        }
        fired
    }

    fn begin_wait<P: Presenter>(
        &mut self,
        now: Timestamp,
        feedback: Option<ResponseOutcome>,
        presenter: &mut P,
    ) {
        if self.time_up(now) {
            self.finish(now, EndReason::TimeUp, feedback, presenter);
            return;
        }

        self.phase = Phase::Waiting;
        if let Some(trial) = self.trial.as_mut() {
            trial.disarm();
        }

        let (min_ms, max_ms) = self.config.delay_range_ms;
        let delay_ms = self.rng.random_range(min_ms..=max_ms);
        self.replace_phase_timer(now.saturating_add(ms_to_ns(delay_ms)), TimerKind::Stimulus);
        debug!(trial = self.trial_index(), delay_ms, "waiting for stimulus");

        self.render(now, feedback, presenter);
    }

    fn arm_stimulus<P: Presenter>(&mut self, now: Timestamp, presenter: &mut P) {
        if self.phase != Phase::Waiting {
            return;
        }
        if self.time_up(now) {
            self.finish(now, EndReason::TimeUp, None, presenter);
            return;
        }

        let geometry = presenter.geometry();
        if geometry.is_degenerate(self.config.padding) {
            warn!(
                width = geometry.width,
                height = geometry.height,
                radius = geometry.target_radius,
                "surface too small for a padded target"
            );
        }
        let position = self.random_position(&geometry);

        let Some(trial) = self.trial.as_mut() else {
            return;
        };
        trial.arm(now, position, geometry.target_radius);
        self.phase = Phase::Target;
        debug!(
            trial = trial.index,
            x = position.x,
            y = position.y,
            "stimulus armed"
        );

        self.render(now, None, presenter);
    }

    fn random_position(&mut self, geometry: &SurfaceGeometry) -> Point {
        let (x, y) = geometry.placement(self.config.padding);
        Point::new(
            x.min + self.rng.random_range(0.0..x.span),
            y.min + self.rng.random_range(0.0..y.span),
        )
    }

    fn false_start<P: Presenter>(&mut self, at: Timestamp, presenter: &mut P) {
        self.stats.record_false_start();
        debug!(
            trial = self.trial_index(),
            false_starts = self.stats.false_starts(),
            "false start"
        );
        self.begin_wait(at, Some(ResponseOutcome::FalseStart), presenter);
    }

    fn record_hit<P: Presenter>(
        &mut self,
        armed_at: Timestamp,
        at: Timestamp,
        presenter: &mut P,
    ) -> ResponseOutcome {
        let index = self.trial_index();
        let practice = self.config.is_practice(index);
        let latency_ns = at.saturating_sub(armed_at);
        let outcome = if latency_ns > ms_to_ns(self.config.lapse_threshold_ms) {
            ResponseOutcome::LapseHit
        } else {
            ResponseOutcome::Hit
        };

        let record = ResponseRecord {
            trial: index,
            practice,
            latency_ns,
            armed_at,
            outcome,
        };
        debug!(
            trial = index,
            practice,
            latency_ms = record.latency_ms(),
            ?outcome,
            "response recorded"
        );
        self.stats.record(record);
        self.last_latency_ns = Some(latency_ns);

        if let Some(reason) = self.termination_after_hit(index, at) {
            self.finish(at, reason, Some(outcome), presenter);
            return outcome;
        }

        let next = index + 1;
        self.trial = Some(Trial::new(next, self.config.is_practice(next)));
        self.phase = Phase::Waiting;
        self.replace_phase_timer(
            at.saturating_add(ms_to_ns(self.config.feedback_hold_ms)),
            TimerKind::Resume,
        );
        self.render(at, Some(outcome), presenter);
        outcome
    }

    fn termination_after_hit(&self, index: u32, at: Timestamp) -> Option<EndReason> {
        let total_done = index >= self.config.total_trials;
        match self.config.termination {
            Termination::FixedTrials => total_done.then_some(EndReason::Completed),
            Termination::Timed { .. } => {
                let counted_done =
                    self.stats.effective_count() >= self.config.counted_target() as usize;
                if counted_done || total_done {
                    Some(EndReason::Completed)
                } else if self.time_up(at) {
                    Some(EndReason::TimeUp)
                } else {
                    None
                }
            }
        }
    }

    fn countdown<P: Presenter>(&mut self, now: Timestamp, presenter: &mut P) {
        if !self.phase.is_running() {
            return;
        }
        if self.time_up(now) {
            self.finish(now, EndReason::TimeUp, None, presenter);
            return;
        }
        if let Termination::Timed {
            countdown_interval_ms,
            ..
        } = self.config.termination
        {
            self.countdown_timer = Some(self.timers.schedule(
                now.saturating_add(ms_to_ns(countdown_interval_ms)),
                TimerKind::Countdown,
            ));
        }
        self.render(now, None, presenter);
    }

    fn finish<P: Presenter>(
        &mut self,
        at: Timestamp,
        reason: EndReason,
        feedback: Option<ResponseOutcome>,
        presenter: &mut P,
    ) {
        self.clear_timers();
        self.phase = Phase::Done;
        if let Some(trial) = self.trial.as_mut() {
            trial.disarm();
        }

        let stats = self.stats.snapshot();
        let verdict = match self.config.termination {
            Termination::Timed { .. } => Some(verdict::evaluate(&self.config.verdict, &stats)),
            Termination::FixedTrials => None,
        };
        self.end = Some(SessionEnd { reason, verdict });

        let elapsed_ms = self
            .session
            .map_or(0.0, |s| ns_to_ms(s.elapsed_ns(at)));
        info!(
            reason = reason.label(),
            verdict = verdict.map(|v| v.label()),
            responses = stats.count,
            mean_ms = stats.mean_ms,
            false_starts = stats.false_starts,
            lapses = stats.lapses,
            elapsed_ms,
            "session finished"
        );
        self.summary = Some(SessionSummary {
            reason,
            verdict,
            final_trial: self.trial_index(),
            stats,
            elapsed_ms,
        });

        self.render(at, feedback, presenter);
    }

    fn replace_phase_timer(&mut self, deadline: Timestamp, kind: TimerKind) {
        if let Some(token) = self.phase_timer.take() {
            self.timers.cancel(token);
        }
        self.phase_timer = Some(self.timers.schedule(deadline, kind));
    }

    fn clear_timers(&mut self) {
        self.timers.clear();
        self.phase_timer = None;
        self.countdown_timer = None;
    }

    fn time_up(&self, now: Timestamp) -> bool {
        self.session.is_some_and(|s| s.is_time_up(now))
    }

    fn render<P: Presenter>(
        &self,
        at: Timestamp,
        feedback: Option<ResponseOutcome>,
        presenter: &mut P,
    ) {
        presenter.render(&self.view_with(at, feedback));
    }

    fn view_with(&self, at: Timestamp, feedback: Option<ResponseOutcome>) -> View {
        View {
            at,
            phase: self.phase,
            trial: self.trial_index(),
            total_trials: self.config.total_trials,
            practice_trials: self.config.practice_trials,
            counted_target: self.config.counted_target(),
            practice: self.trial.as_ref().is_some_and(|t| t.practice),
            target: self.current_target(),
            last_latency_ms: self.last_latency_ns.map(ns_to_ms),
            stats: self.stats.snapshot(),
            remaining_ms: self.session.and_then(|s| s.remaining_ms(at)),
            feedback,
            end: self.end,
            can_start: self.phase.allows_start(),
            can_reset: self.session.is_some(),
        }
    }

    /// Snapshot for an out-of-band redraw (resize, expose).
    pub fn view(&self, at: Timestamp) -> View {
        self.view_with(at, None)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// 1-based index of the current trial, 0 while idle.
    pub fn trial_index(&self) -> u32 {
        self.trial.as_ref().map_or(0, |t| t.index)
    }

    pub fn current_target(&self) -> Option<Target> {
        if self.phase != Phase::Target {
            return None;
        }
        self.trial.as_ref().and_then(|t| t.target)
    }

    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn end(&self) -> Option<SessionEnd> {
        self.end
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Earliest pending timer, for hosts that sleep until the next event.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}
