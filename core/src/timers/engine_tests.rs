//! Tests for TimerEngine
//!
//! Time is driven by a VirtualClock and frames are delivered by hand through
//! the ManualScheduler, so every tick happens exactly where the test puts it.

use proptest::prelude::*;

use crate::clock::VirtualClock;
use crate::schedule::ManualScheduler;

use super::{BeepRequest, CueError, EngineConfig, Mode, Phase, RecordingSink, SinkEvent, TimerEngine};

type TestEngine = TimerEngine<VirtualClock, ManualScheduler, RecordingSink>;

struct Harness {
    clock: VirtualClock,
    sink: RecordingSink,
    engine: TestEngine,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    fn with_config(config: EngineConfig) -> Self {
        let clock = VirtualClock::new();
        let sink = RecordingSink::new();
        let engine =
            TimerEngine::with_config(clock.clone(), ManualScheduler::new(), sink.clone(), config);
        Self {
            clock,
            sink,
            engine,
        }
    }

    /// Move the clock to `ms` and deliver the pending frame, if any
    fn frame_at(&mut self, ms: u64) {
        self.clock.set_ms(ms);
        if let Some(handle) = self.engine.scheduler_mut().take_due() {
            self.engine.on_frame(handle);
        }
    }

    /// Deliver frames every `step` ms until the clock reaches `end`
    fn run_until(&mut self, end: u64, step: u64) {
        let mut t = self.clock.now_ms();
        while t < end {
            t = (t + step).min(end);
            self.frame_at(t);
        }
    }
}

#[test]
fn test_session_two_second_scenario() {
    let mut h = Harness::new();
    h.engine.start(Mode::Session, 2_000, 5);

    for t in [500, 1_000, 1_500, 1_999, 2_000] {
        h.frame_at(t);
    }

    assert_eq!(h.sink.rounds(), vec![1], "onRound(1) exactly once");

    let ticks = h.sink.ticks();
    assert_eq!(ticks, vec![2_000, 1_500, 1_000, 500, 1, 0]);
    assert!(ticks.windows(2).all(|w| w[0] > w[1]));

    assert_eq!(h.sink.buzz_count(), 1, "exactly one buzz");
    assert_eq!(h.sink.phases().last(), Some(&Phase::Idle));
    assert_eq!(h.engine.phase(), Phase::Idle);
    assert_eq!(h.engine.round(), 1);
    assert_eq!(h.engine.scheduler().outstanding(), 0);
}

#[test]
fn test_start_emits_round_before_running_phase() {
    let mut h = Harness::new();
    h.engine.start(Mode::Session, 5_000, 5);

    let events = h.sink.events();
    assert_eq!(events[0], SinkEvent::Phase(Phase::Idle));
    assert_eq!(events[1], SinkEvent::Round(1));
    assert_eq!(events[2], SinkEvent::Phase(Phase::RunningClimb));
    assert!(matches!(events.last(), Some(SinkEvent::Tick(5_000))));
}

#[test]
fn test_climb_duration_floor() {
    let mut h = Harness::new();
    h.engine.start(Mode::Session, 10, 5);
    assert_eq!(h.engine.climb_duration_ms(), 1_000);
    assert_eq!(h.engine.remaining_ms(), 1_000);
    assert_eq!(h.engine.transition_duration_ms(), 5_000);
}

#[test]
fn test_rotation_cycles_and_counts_rounds() {
    let mut h = Harness::new();
    h.engine.start(Mode::Rotation, 2_000, 5);

    h.run_until(2_000, 250);
    assert_eq!(h.engine.phase(), Phase::RunningTransition);
    assert_eq!(h.engine.round(), 1, "transition entry does not bump round");

    h.run_until(7_000, 250);
    assert_eq!(h.engine.phase(), Phase::RunningClimb);
    assert_eq!(h.engine.round(), 2);

    h.run_until(9_000, 250);
    assert_eq!(h.engine.phase(), Phase::RunningTransition);
    h.run_until(14_000, 250);
    assert_eq!(h.engine.round(), 3);

    assert_eq!(h.sink.rounds(), vec![1, 2, 3]);
    let running: Vec<Phase> = h
        .sink
        .phases()
        .into_iter()
        .filter(|p| p.is_running())
        .collect();
    assert_eq!(
        running,
        vec![
            Phase::RunningClimb,
            Phase::RunningTransition,
            Phase::RunningClimb,
            Phase::RunningTransition,
            Phase::RunningClimb,
        ]
    );
    // one buzz per completed phase
    assert_eq!(h.sink.buzz_count(), 4);
}

#[test]
fn test_rotation_with_zero_transition_goes_straight_to_next_climb() {
    let mut h = Harness::new();
    h.engine.start(Mode::Rotation, 1_000, 0);
    h.frame_at(1_000);

    assert_eq!(h.engine.phase(), Phase::RunningClimb);
    assert_eq!(h.engine.round(), 2);
    assert_eq!(h.engine.remaining_ms(), 1_000);
    assert_eq!(h.engine.scheduler().outstanding(), 1);
}

#[test]
fn test_pause_and_resume_preserve_remaining() {
    let mut h = Harness::new();
    h.engine.start(Mode::Session, 10_000, 5);
    h.run_until(4_000, 100);

    h.engine.pause();
    assert!(h.engine.is_paused());
    assert_eq!(h.engine.phase(), Phase::PausedClimb);
    assert_eq!(h.engine.scheduler().outstanding(), 0, "no frames while paused");

    h.clock.set_ms(60_000);
    assert_eq!(h.engine.remaining_ms(), 6_000);

    h.engine.resume();
    assert_eq!(h.engine.phase(), Phase::RunningClimb);
    assert_eq!(h.engine.remaining_ms(), 6_000);

    h.run_until(66_000, 100);
    assert_eq!(h.engine.phase(), Phase::Idle);
    assert_eq!(h.sink.buzz_count(), 1);
}

#[test]
fn test_pause_resume_noops() {
    let mut h = Harness::new();
    h.engine.pause();
    h.engine.resume();
    assert_eq!(h.engine.phase(), Phase::Idle);
    assert!(h.sink.events().is_empty());

    h.engine.start(Mode::Session, 5_000, 5);
    let before = h.sink.events().len();
    h.engine.resume();
    assert_eq!(h.sink.events().len(), before, "resume while running is ignored");

    h.engine.pause();
    let paused = h.sink.events().len();
    h.engine.pause();
    assert_eq!(h.sink.events().len(), paused, "pause while paused is ignored");
}

#[test]
fn test_stop_from_any_state() {
    let mut h = Harness::new();
    h.engine.stop();
    assert_eq!(h.engine.phase(), Phase::Idle);

    h.engine.start(Mode::Rotation, 3_000, 5);
    h.frame_at(500);
    h.engine.pause();
    h.engine.stop();

    assert_eq!(h.engine.phase(), Phase::Idle);
    assert_eq!(h.engine.remaining_ms(), 0);
    assert!(!h.engine.is_paused());
    assert_eq!(h.engine.scheduler().outstanding(), 0);
    assert_eq!(h.engine.round(), 1, "round survives stop");
}

#[test]
fn test_stop_cancels_pending_frame() {
    let mut h = Harness::new();
    h.engine.start(Mode::Session, 5_000, 5);
    let handle = h.engine.pending_frame().expect("frame requested");

    h.engine.stop();
    assert_eq!(h.engine.scheduler().cancelled_count(), 1);

    let before = h.sink.events().len();
    h.clock.set_ms(1_000);
    h.engine.on_frame(handle);
    assert_eq!(h.sink.events().len(), before, "stale frame ignored");
}

#[test]
fn test_restart_replaces_prior_loop() {
    let mut h = Harness::new();
    h.engine.start(Mode::Session, 10_000, 5);
    h.frame_at(1_000);
    let old = h.engine.pending_frame().expect("frame requested");

    h.engine.start(Mode::Session, 3_000, 5);
    assert_eq!(h.engine.scheduler().outstanding(), 1);
    assert_ne!(h.engine.pending_frame(), Some(old));

    h.sink.clear();
    h.engine.on_frame(old);
    assert!(h.sink.ticks().is_empty(), "old loop produces no ticks");

    h.run_until(4_000, 100);
    let ticks = h.sink.ticks();
    assert!(ticks.windows(2).all(|w| w[0] > w[1]), "single tick sequence");
    assert_eq!(ticks.last(), Some(&0));
    assert_eq!(h.sink.buzz_count(), 1);
}

#[test]
fn test_delivered_frame_cannot_be_replayed() {
    let mut h = Harness::new();
    h.engine.start(Mode::Session, 5_000, 5);
    let handle = h.engine.scheduler_mut().take_due().expect("frame");

    h.clock.set_ms(100);
    h.engine.on_frame(handle);
    let ticks = h.sink.ticks().len();

    h.clock.set_ms(200);
    h.engine.on_frame(handle);
    assert_eq!(h.sink.ticks().len(), ticks);
}

#[test]
fn test_skipped_ticks_still_fire_each_cue_once() {
    let mut h = Harness::new();
    h.engine.start(Mode::Session, 10_000, 5);

    // 5000 -> 2500 skips the lead windows of the 4s and 3s marks
    h.frame_at(5_000);
    assert_eq!(h.sink.beep_count(), 1);
    h.frame_at(7_500);
    assert_eq!(h.sink.beep_count(), 3);

    h.frame_at(10_000);
    assert_eq!(h.sink.beep_count(), 5);
    assert_eq!(h.sink.buzz_count(), 1);
}

#[test]
fn test_minute_mark_plays_end_style_beep() {
    let mut h = Harness::new();
    h.engine.start(Mode::Session, 120_000, 5);
    h.run_until(60_500, 50);

    let beeps: Vec<_> = h
        .sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            SinkEvent::Beep(b) => Some(b),
            _ => None,
        })
        .collect();
    assert_eq!(beeps, vec![BeepRequest::END_STYLE]);
    assert_eq!(h.sink.buzz_count(), 0);
}

#[test]
fn test_transition_uses_transition_beep() {
    let mut h = Harness::new();
    h.engine.start(Mode::Rotation, 1_000, 5);
    h.run_until(5_900, 100);

    let tones: Vec<u32> = h
        .sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            SinkEvent::Beep(b) => Some(b.resolve().frequency_hz),
            _ => None,
        })
        .collect();
    // climb 1s mark, then the five transition marks
    assert_eq!(tones, vec![1_000, 900, 900, 900, 900, 900]);
}

#[test]
fn test_failing_sink_does_not_halt_countdown() {
    let mut h = Harness::new();
    h.sink
        .fail_cues_with(CueError::Unavailable("device busy".to_string()));

    h.engine.start(Mode::Session, 3_000, 5);
    h.run_until(3_000, 200);

    assert_eq!(h.engine.phase(), Phase::Idle);
    assert_eq!(h.sink.ticks().last(), Some(&0));
    assert_eq!(h.sink.buzz_count(), 1);
}

#[test]
fn test_custom_lead_window() {
    let mut h = Harness::with_config(EngineConfig { lead_window_ms: 100 });
    h.engine.start(Mode::Session, 10_000, 5);

    // 5.5s left: outside a 100ms window
    h.frame_at(4_500);
    assert_eq!(h.sink.beep_count(), 0);
    // 5.05s left: inside it on the next tick
    h.frame_at(4_950);
    h.frame_at(4_960);
    assert_eq!(h.sink.beep_count(), 1);
}

#[test]
fn test_at_most_one_outstanding_frame() {
    let mut h = Harness::new();
    h.engine.start(Mode::Rotation, 1_500, 1);
    for t in (0..20_000).step_by(37) {
        h.frame_at(t);
        assert!(h.engine.scheduler().outstanding() <= 1);
    }
    h.engine.pause();
    h.engine.resume();
    h.engine.start(Mode::Session, 2_000, 5);
    assert_eq!(h.engine.scheduler().outstanding(), 1);
}

proptest! {
    #[test]
    fn session_ends_with_single_buzz(duration in 1_000u64..200_000, step in 1u64..5_000) {
        let mut h = Harness::new();
        h.engine.start(Mode::Session, duration, 5);
        h.run_until(duration, step);

        prop_assert_eq!(h.sink.buzz_count(), 1);
        prop_assert_eq!(h.engine.phase(), Phase::Idle);
        prop_assert_eq!(h.engine.round(), 1);
    }

    #[test]
    fn rotation_rounds_follow_climb_entries(
        climb_secs in 1u64..10,
        transition in 1u64..10,
        cycles in 1u32..5,
    ) {
        let climb = climb_secs * 1_000;
        let mut h = Harness::new();
        h.engine.start(Mode::Rotation, climb, transition);
        let period = climb + transition * 1_000;
        h.run_until(period * u64::from(cycles), 50);

        prop_assert_eq!(h.engine.round(), cycles + 1);
        prop_assert_eq!(h.engine.phase(), Phase::RunningClimb);
        let rounds = h.sink.rounds();
        prop_assert_eq!(rounds, (1..=cycles + 1).collect::<Vec<_>>());
    }

    #[test]
    fn pause_cycles_do_not_drift(
        duration in 2_000u64..100_000,
        runs in proptest::collection::vec((1u64..500, 0u64..10_000), 1..20),
    ) {
        let mut h = Harness::new();
        h.engine.start(Mode::Session, duration, 5);

        let mut elapsed = 0;
        let mut t = 0;
        for (run, idle) in runs {
            if elapsed + run >= duration {
                break;
            }
            t += run;
            elapsed += run;
            h.frame_at(t);
            h.engine.pause();
            t += idle;
            h.clock.set_ms(t);
            h.engine.resume();
        }

        prop_assert_eq!(h.engine.remaining_ms(), duration - elapsed);
    }
}
