//! End-to-end sessions driven with synthetic timestamps.

use std::time::Duration;

use pvt_core::{
    EndReason, Phase, Point, Presenter, ResponseOutcome, SurfaceGeometry, Timestamp, Verdict,
    View, ms_to_ns,
};
use pvt_experiment::{EngineEvent, PvtEngine, SessionConfig, Termination};
use pvt_timing::{Clock, ManualClock};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Default)]
struct Recorder {
    views: Vec<View>,
}

impl Presenter for Recorder {
    fn render(&mut self, view: &View) {
        self.views.push(view.clone());
    }

    fn geometry(&self) -> SurfaceGeometry {
        SurfaceGeometry::new(1024.0, 768.0, 60.0)
    }
}

fn engine(config: SessionConfig) -> PvtEngine<StdRng> {
    PvtEngine::new(config, StdRng::seed_from_u64(0x5eed)).unwrap()
}

/// Fire timers until the stimulus is up; returns the arming time.
fn until_target(e: &mut PvtEngine<StdRng>, r: &mut Recorder) -> Timestamp {
    loop {
        let t = e.next_deadline().expect("a timer should be pending");
        e.update(t, r);
        if e.phase() == Phase::Target {
            return t;
        }
        assert_ne!(e.phase(), Phase::Done, "session ended before a stimulus");
    }
}

/// Arm the next stimulus and hit its centre `latency_ms` later.
fn hit_after(e: &mut PvtEngine<StdRng>, r: &mut Recorder, latency_ms: u64) -> Timestamp {
    let armed = until_target(e, r);
    let target = e.current_target().unwrap();
    let at = armed + ms_to_ns(latency_ms);
    assert!(e.activate(target.position, at, r).unwrap().is_hit());
    at
}

#[test]
fn ten_hits_complete_a_fixed_session() {
    let mut e = engine(SessionConfig::fixed_trials(10).with_delay_ms(3000, 3000));
    let mut r = Recorder::default();
    e.start(0, &mut r);

    for i in 1..=10 {
        assert_eq!(e.trial_index(), i);
        hit_after(&mut e, &mut r, 300);
    }

    assert_eq!(e.phase(), Phase::Done);
    let s = e.snapshot();
    assert_eq!(s.count, 10);
    assert_eq!(s.mean_ms, Some(300.0));
    assert_eq!(s.lapses, 0);
    assert_eq!(s.false_starts, 0);
    assert_eq!(e.trial_index(), 10);
    assert_eq!(e.pending_timers(), 0);

    let end = e.end().unwrap();
    assert_eq!(end.reason, EndReason::Completed);
    assert_eq!(end.verdict, None);
}

#[test]
fn stimulus_arms_exactly_after_fixed_delay() {
    let mut e = engine(SessionConfig::fixed_trials(10).with_delay_ms(3000, 3000));
    let mut r = Recorder::default();
    e.start(ms_to_ns(1_000), &mut r);
    assert_eq!(e.next_deadline(), Some(ms_to_ns(4_000)));

    e.update(ms_to_ns(3_999), &mut r);
    assert_eq!(e.phase(), Phase::Waiting);
    e.update(ms_to_ns(4_000), &mut r);
    assert_eq!(e.phase(), Phase::Target);
}

#[test]
fn feedback_hold_delays_the_next_wait() {
    let mut e = engine(SessionConfig::fixed_trials(3).with_delay_ms(1000, 1000));
    let mut r = Recorder::default();
    e.start(0, &mut r);
    let hit_at = hit_after(&mut e, &mut r, 250);

    assert_eq!(e.phase(), Phase::Waiting);
    assert_eq!(e.trial_index(), 2);
    assert_eq!(e.next_deadline(), Some(hit_at + ms_to_ns(650)));

    e.update(hit_at + ms_to_ns(650), &mut r);
    assert_eq!(e.phase(), Phase::Waiting);
    assert_eq!(e.next_deadline(), Some(hit_at + ms_to_ns(1650)));
}

#[test]
fn activation_while_waiting_is_a_false_start() {
    let mut e = engine(SessionConfig::fixed_trials(10).with_delay_ms(3000, 3000));
    let mut r = Recorder::default();
    e.start(0, &mut r);

    let at = ms_to_ns(1_200);
    let outcome = e.activate(Point::new(500.0, 400.0), at, &mut r);

    assert_eq!(outcome, Some(ResponseOutcome::FalseStart));
    assert_eq!(e.stats().false_starts(), 1);
    assert_eq!(e.trial_index(), 1);
    assert!(e.stats().all_responses().is_empty());
    assert_eq!(e.phase(), Phase::Waiting);
    assert_eq!(e.pending_timers(), 1);
    assert_eq!(e.next_deadline(), Some(at + ms_to_ns(3_000)));
}

#[test]
fn off_target_activation_is_a_false_start() {
    let mut e = engine(SessionConfig::fixed_trials(10).with_delay_ms(500, 500));
    let mut r = Recorder::default();
    e.start(0, &mut r);
    let armed = until_target(&mut e, &mut r);
    let target = e.current_target().unwrap();

    let miss = Point::new(
        target.position.x + target.radius + 1.0,
        target.position.y,
    );
    let outcome = e.activate(miss, armed + ms_to_ns(200), &mut r);

    assert_eq!(outcome, Some(ResponseOutcome::FalseStart));
    assert_eq!(e.stats().false_starts(), 1);
    assert_eq!(e.trial_index(), 1);
    assert!(e.stats().all_responses().is_empty());
    assert_eq!(e.phase(), Phase::Waiting);
    assert!(e.current_target().is_none());
}

#[test]
fn activation_just_inside_the_edge_is_a_hit() {
    let mut e = engine(SessionConfig::fixed_trials(10).with_delay_ms(500, 500));
    let mut r = Recorder::default();
    e.start(0, &mut r);
    let armed = until_target(&mut e, &mut r);
    let target = e.current_target().unwrap();

    let edge = Point::new(
        target.position.x,
        target.position.y - (target.radius - 0.01),
    );
    let outcome = e.activate(edge, armed + ms_to_ns(200), &mut r);
    assert_eq!(outcome, Some(ResponseOutcome::Hit));
    assert_eq!(e.trial_index(), 2);
}

#[test]
fn malformed_coordinates_degrade_to_false_start() {
    let mut e = engine(SessionConfig::fixed_trials(10).with_delay_ms(500, 500));
    let mut r = Recorder::default();
    e.start(0, &mut r);
    let armed = until_target(&mut e, &mut r);
    let outcome = e.activate(Point::new(f32::NAN, f32::NAN), armed + 10, &mut r);
    assert_eq!(outcome, Some(ResponseOutcome::FalseStart));
    assert_eq!(e.stats().false_starts(), 1);
}

#[test]
fn latency_is_unrounded_and_lapse_is_strict() {
    let mut e = engine(SessionConfig::fixed_trials(10).with_delay_ms(1000, 1000));
    let mut r = Recorder::default();
    e.start(0, &mut r);

    let armed = until_target(&mut e, &mut r);
    let target = e.current_target().unwrap();
    let outcome = e.activate(target.position, armed + ms_to_ns(500), &mut r);
    assert_eq!(outcome, Some(ResponseOutcome::Hit));
    assert_eq!(e.stats().lapses(), 0);

    let armed = until_target(&mut e, &mut r);
    let target = e.current_target().unwrap();
    let outcome = e.activate(target.position, armed + ms_to_ns(500) + 1, &mut r);
    assert_eq!(outcome, Some(ResponseOutcome::LapseHit));
    assert_eq!(e.stats().lapses(), 1);

    let latencies = e.stats().effective_latencies_ns();
    assert_eq!(latencies, &[500_000_000, 500_000_001]);
    assert_eq!(r.views.last().unwrap().last_latency_ms, Some(500.000001));
}

#[test]
fn practice_trials_are_indexed_but_not_scored() {
    let config = SessionConfig::fixed_trials(5)
        .with_practice(2)
        .with_delay_ms(1000, 1000);
    let mut e = engine(config);
    let mut r = Recorder::default();
    e.start(0, &mut r);

    assert!(r.views.last().unwrap().practice);
    hit_after(&mut e, &mut r, 900);
    hit_after(&mut e, &mut r, 900);
    assert_eq!(e.trial_index(), 3);
    assert_eq!(e.snapshot().count, 0);
    assert_eq!(e.snapshot().lapses, 0);
    assert_eq!(e.stats().all_responses().len(), 2);

    for _ in 0..3 {
        hit_after(&mut e, &mut r, 200);
    }
    assert_eq!(e.phase(), Phase::Done);
    let s = e.snapshot();
    assert_eq!(s.count, 3);
    assert_eq!(s.all_count, 5);
    assert_eq!(s.mean_ms, Some(200.0));
    assert!(s.count as u32 <= e.config().counted_target());
}

#[test]
fn unanswered_timed_session_ends_when_time_runs_out() {
    let config = SessionConfig::default().with_termination(Termination::Timed {
        duration_ms: 60_000,
        countdown_interval_ms: 200,
    });
    let mut e = engine(config);
    let mut r = Recorder::default();
    e.start(0, &mut r);

    let mut now = 0;
    while e.phase() != Phase::Done {
        now = e.next_deadline().unwrap();
        e.update(now, &mut r);
    }

    assert_eq!(now, ms_to_ns(60_000));
    assert_eq!(e.trial_index(), 1);
    let end = e.end().unwrap();
    assert_eq!(end.reason, EndReason::TimeUp);
    assert_eq!(end.verdict, Some(Verdict::InsufficientData));
    assert_eq!(e.pending_timers(), 0);
    assert!(r.views.iter().any(|v| v.phase == Phase::Target));
    assert_eq!(e.summary().unwrap().elapsed_ms, 60_000.0);
}

#[test]
fn late_poll_still_ends_timed_session() {
    let mut e = engine(SessionConfig::default());
    let mut r = Recorder::default();
    e.start(0, &mut r);
    e.update(ms_to_ns(75_000), &mut r);
    assert_eq!(e.phase(), Phase::Done);
    assert_eq!(e.end().unwrap().reason, EndReason::TimeUp);
}

#[test]
fn countdown_renders_remaining_time() {
    let mut e = engine(SessionConfig::default());
    let mut r = Recorder::default();
    e.start(0, &mut r);
    assert_eq!(r.views.last().unwrap().remaining_ms, Some(60_000));

    e.update(ms_to_ns(200), &mut r);
    let v = r.views.last().unwrap();
    assert_eq!(v.remaining_ms, Some(59_800));
    assert_eq!(v.remaining_secs(), Some(60));
    assert_eq!(e.next_deadline(), Some(ms_to_ns(400)));
}

#[test]
fn timed_session_completes_on_counted_target() {
    let config = SessionConfig {
        total_trials: 6,
        practice_trials: 1,
        ..SessionConfig::default()
    }
    .with_delay_ms(2000, 2000);
    let mut e = engine(config);
    let mut r = Recorder::default();
    e.start(0, &mut r);

    for _ in 0..6 {
        hit_after(&mut e, &mut r, 250);
    }

    assert_eq!(e.phase(), Phase::Done);
    let end = e.end().unwrap();
    assert_eq!(end.reason, EndReason::Completed);
    assert_eq!(end.verdict, Some(Verdict::Excellent));
    assert_eq!(e.snapshot().count, 5);
    assert!(r.views.last().unwrap().end.is_some());
}

#[test]
fn false_starts_and_lapses_lower_the_verdict() {
    let config = SessionConfig {
        total_trials: 4,
        practice_trials: 0,
        ..SessionConfig::default()
    }
    .with_delay_ms(2000, 2000);
    let mut e = engine(config);
    let mut r = Recorder::default();
    e.start(0, &mut r);

    e.activate(Point::new(1.0, 1.0), ms_to_ns(100), &mut r);
    e.activate(Point::new(1.0, 1.0), ms_to_ns(200), &mut r);
    for _ in 0..4 {
        hit_after(&mut e, &mut r, 250);
    }
    assert_eq!(e.snapshot().false_starts, 2);
    assert_eq!(e.end().unwrap().verdict, Some(Verdict::Normal));
}

#[test]
fn activation_during_hold_restarts_the_wait() {
    let mut e = engine(SessionConfig::fixed_trials(3).with_delay_ms(1000, 1000));
    let mut r = Recorder::default();
    e.start(0, &mut r);
    let hit_at = hit_after(&mut e, &mut r, 300);

    let tap = hit_at + ms_to_ns(100);
    assert_eq!(
        e.activate(Point::new(0.0, 0.0), tap, &mut r),
        Some(ResponseOutcome::FalseStart)
    );
    assert_eq!(e.trial_index(), 2);
    assert_eq!(e.pending_timers(), 1);
    assert_eq!(e.next_deadline(), Some(tap + ms_to_ns(1000)));
}

#[test]
fn reset_mid_session_cancels_pending_timers() {
    let mut e = engine(SessionConfig::default());
    let mut r = Recorder::default();
    e.start(0, &mut r);
    until_target(&mut e, &mut r);
    e.activate(Point::new(-5.0, -5.0), ms_to_ns(6_000), &mut r);

    e.reset(ms_to_ns(6_100), &mut r);
    assert_eq!(e.phase(), Phase::Idle);
    assert_eq!(e.trial_index(), 0);
    assert_eq!(e.pending_timers(), 0);
    assert_eq!(e.snapshot().false_starts, 0);
    let renders = r.views.len();

    assert_eq!(e.update(ms_to_ns(600_000), &mut r), 0);
    assert_eq!(r.views.len(), renders);
    assert_eq!(e.phase(), Phase::Idle);
    assert!(r.views.last().unwrap().can_start);
    assert!(!r.views.last().unwrap().can_reset);
}

#[test]
fn activation_after_done_or_before_start_is_ignored() {
    let mut e = engine(SessionConfig::fixed_trials(1).with_delay_ms(100, 100));
    let mut r = Recorder::default();

    assert_eq!(e.activate(Point::new(1.0, 1.0), 5, &mut r), None);
    assert!(r.views.is_empty());

    e.start(0, &mut r);
    hit_after(&mut e, &mut r, 200);
    assert_eq!(e.phase(), Phase::Done);
    let before = e.snapshot();
    let renders = r.views.len();

    assert_eq!(e.activate(Point::new(1.0, 1.0), ms_to_ns(10_000), &mut r), None);
    assert_eq!(e.update(ms_to_ns(20_000), &mut r), 0);
    assert_eq!(e.snapshot(), before);
    assert_eq!(r.views.len(), renders);
}

#[test]
fn start_is_ignored_while_running_and_allowed_after_done() {
    let mut e = engine(SessionConfig::fixed_trials(1).with_delay_ms(100, 100));
    let mut r = Recorder::default();
    assert!(e.handle_event(EngineEvent::Start { at: 0 }, &mut r));
    assert!(!e.handle_event(EngineEvent::Start { at: 10 }, &mut r));

    hit_after(&mut e, &mut r, 200);
    assert_eq!(e.phase(), Phase::Done);

    assert!(e.handle_event(EngineEvent::Start { at: ms_to_ns(5_000) }, &mut r));
    assert_eq!(e.phase(), Phase::Waiting);
    assert_eq!(e.trial_index(), 1);
    assert_eq!(e.snapshot().count, 0);
    assert!(e.end().is_none());
}

#[test]
fn events_drive_the_same_transitions() {
    let mut e = engine(SessionConfig::fixed_trials(2).with_delay_ms(100, 100));
    let mut r = Recorder::default();
    e.handle_event(EngineEvent::Start { at: 0 }, &mut r);
    assert!(!e.handle_event(EngineEvent::Tick { now: ms_to_ns(50) }, &mut r));
    assert!(e.handle_event(EngineEvent::Tick { now: ms_to_ns(100) }, &mut r));
    let target = e.current_target().unwrap();
    assert!(e.handle_event(
        EngineEvent::Activation {
            point: target.position,
            at: ms_to_ns(350),
        },
        &mut r,
    ));
    assert_eq!(e.snapshot().mean_ms, Some(250.0));
    assert!(e.handle_event(EngineEvent::Reset { at: ms_to_ns(400) }, &mut r));
    assert_eq!(e.phase(), Phase::Idle);
}

#[test]
fn invariants_hold_across_random_sessions() {
    for seed in 0..20u64 {
        let config = SessionConfig {
            total_trials: 8,
            practice_trials: 2,
            ..SessionConfig::default()
        }
        .with_termination(Termination::Timed {
            duration_ms: 20_000,
            countdown_interval_ms: 200,
        });
        let mut e = PvtEngine::new(config, StdRng::seed_from_u64(seed)).unwrap();
        let mut r = Recorder::default();
        e.start(0, &mut r);

        let mut step = 0u64;
        while e.phase() != Phase::Done {
            let now = e.next_deadline().unwrap();
            e.update(now, &mut r);
            if let Some(target) = e.current_target() {
                step += 1;
                let point = if step % 3 == 0 {
                    Point::new(-10.0, -10.0)
                } else {
                    target.position
                };
                e.activate(point, now + ms_to_ns(150 + (step * 97) % 500), &mut r);
            }
            assert!(e.trial_index() <= e.config().total_trials);
            assert!(e.snapshot().count as u32 <= e.config().counted_target());
        }
        assert!(e.end().is_some());
        assert_eq!(e.pending_timers(), 0);
    }
}

fn short_timed(duration_ms: u64) -> SessionConfig {
    SessionConfig::fixed_trials(10)
        .with_delay_ms(2000, 2000)
        .with_termination(Termination::Timed {
            duration_ms,
            countdown_interval_ms: 200,
        })
}

#[test]
fn hit_stamped_past_the_limit_ends_without_scoring() {
    let mut e = engine(short_timed(10_000));
    let mut r = Recorder::default();
    e.start(0, &mut r);
    until_target(&mut e, &mut r);
    let target = e.current_target().unwrap();

    assert_eq!(e.activate(target.position, ms_to_ns(15_000), &mut r), None);

    assert_eq!(e.phase(), Phase::Done);
    assert_eq!(e.end().unwrap().reason, EndReason::TimeUp);
    let s = e.snapshot();
    assert_eq!(s.all_count, 0);
    assert_eq!(s.lapses, 0);
    assert_eq!(e.pending_timers(), 0);
    assert_eq!(e.summary().unwrap().elapsed_ms, 15_000.0);
}

#[test]
fn false_start_stamped_past_the_limit_is_not_counted() {
    let mut e = engine(short_timed(10_000));
    let mut r = Recorder::default();
    e.start(0, &mut r);

    assert_eq!(e.activate(Point::new(1.0, 1.0), ms_to_ns(10_000), &mut r), None);

    assert_eq!(e.phase(), Phase::Done);
    assert_eq!(e.end().unwrap().reason, EndReason::TimeUp);
    assert_eq!(e.snapshot().false_starts, 0);
    assert_eq!(r.views.last().unwrap().feedback, None);
}

#[test]
fn manual_clock_drives_a_session() {
    let clock = ManualClock::new(ms_to_ns(500));
    let mut e = engine(SessionConfig::fixed_trials(2).with_delay_ms(1000, 1000));
    let mut r = Recorder::default();
    let started = clock.now();
    e.start(started, &mut r);

    for _ in 0..2 {
        while e.phase() != Phase::Target {
            let deadline = e.next_deadline().unwrap();
            clock.set(deadline);
            e.update(clock.now(), &mut r);
        }
        let target = e.current_target().unwrap();
        let at = clock.advance(Duration::from_millis(320));
        assert_eq!(e.activate(target.position, at, &mut r), Some(ResponseOutcome::Hit));
    }

    assert_eq!(e.phase(), Phase::Done);
    let records = e.stats().all_responses();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|rec| rec.latency_ms() == 320.0));
    // 1000 wait + 320 + 650 hold + 1000 wait + 320
    assert_eq!(clock.elapsed(started), Duration::from_millis(3_290));
}
