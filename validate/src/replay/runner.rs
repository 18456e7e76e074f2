//! Drives a countdown engine through a simulated host
//!
//! The replay merges three kinds of step on one timeline: scripted pause or
//! resume presses, frame deliveries from the [`FramePlan`], and checkpoint
//! times. Steps at the same millisecond run in that order.

use belay_core::{
    EngineConfig, ManualScheduler, Mode, RecordingSink, SinkEvent, TimerEngine, VirtualClock,
};
use tracing::debug;

use super::clock::ReplayClock;
use super::frames::FramePlan;
use crate::verification::{
    CheckpointResult, CheckpointVerifier, InvariantChecker, Snapshot, VerificationResult,
    Violation,
};

type ReplayEngine = TimerEngine<VirtualClock, ManualScheduler, RecordingSink>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Pause,
    Resume,
}

/// A scripted button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    pub at_ms: u64,
    pub kind: ControlKind,
}

#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub mode: Mode,
    pub climb_ms: u64,
    pub transition_secs: u64,
    /// Replay stops after this much virtual time
    pub duration_ms: u64,
    pub lead_window_ms: u64,
    pub frames: FramePlan,
    pub controls: Vec<Control>,
    pub realtime: bool,
}

/// Receives replay progress as it happens
pub trait ReplayObserver {
    fn on_event(&mut self, _at_ms: u64, _event: &SinkEvent) {}
    fn on_control(&mut self, _at_ms: u64, _kind: ControlKind) {}
    fn on_violation(&mut self, _violation: &Violation) {}
    fn on_checkpoint(&mut self, _result: &CheckpointResult) {}
}

impl ReplayObserver for () {}

#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub violations: Vec<Violation>,
    pub checkpoints: Option<VerificationResult>,
    pub frames: u64,
    pub completed_phases: u32,
    pub end_ms: u64,
}

impl ReplayReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty() && self.checkpoints.as_ref().is_none_or(|c| c.passed())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Step {
    Control(usize),
    Frame,
    Checkpoint,
}

struct Replay<'a, O: ReplayObserver> {
    clock: ReplayClock,
    engine: ReplayEngine,
    sink: RecordingSink,
    checker: InvariantChecker,
    verifier: Option<CheckpointVerifier>,
    observer: &'a mut O,
    violations: Vec<Violation>,
}

impl<O: ReplayObserver> Replay<'_, O> {
    /// Forward recorded events to the checker and observer
    fn drain(&mut self) {
        let now = self.clock.now_ms();
        for event in self.sink.take() {
            self.observer.on_event(now, &event);
            for violation in self.checker.observe(now, &event) {
                self.observer.on_violation(&violation);
            }
        }
        let outstanding = self.engine.scheduler().outstanding();
        if outstanding > 1 {
            self.report(Violation {
                at_ms: now,
                message: format!("{outstanding} frames outstanding"),
            });
        }
    }

    fn report(&mut self, violation: Violation) {
        self.observer.on_violation(&violation);
        self.violations.push(violation);
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.engine.phase(),
            round: self.engine.round(),
            remaining_ms: self.engine.remaining_ms(),
        }
    }
}

/// Run one replay, optionally verifying checkpoints
pub fn run<O: ReplayObserver>(
    mut config: ReplayConfig,
    verifier: Option<CheckpointVerifier>,
    observer: &mut O,
) -> ReplayReport {
    let clock = ReplayClock::new(config.realtime);
    let sink = RecordingSink::new();
    let mut engine = TimerEngine::with_config(
        clock.engine_clock(),
        ManualScheduler::new(),
        sink.clone(),
        EngineConfig {
            lead_window_ms: config.lead_window_ms,
        },
    );
    config.controls.sort_by_key(|c| c.at_ms);

    engine.start(config.mode, config.climb_ms, config.transition_secs);
    let checker = InvariantChecker::new(
        config.mode,
        engine.climb_duration_ms(),
        engine.transition_duration_ms(),
    );

    let mut replay = Replay {
        clock,
        engine,
        sink,
        checker,
        verifier,
        observer,
        violations: Vec::new(),
    };
    replay.drain();

    let mut next_control = 0;
    let mut frames = 0;
    let mut frame_due = replay
        .engine
        .pending_frame()
        .map(|_| config.frames.next_frame_at(0));

    loop {
        let candidates = [
            config
                .controls
                .get(next_control)
                .map(|c| (c.at_ms, Step::Control(next_control))),
            frame_due.map(|at| (at, Step::Frame)),
            replay
                .verifier
                .as_ref()
                .and_then(CheckpointVerifier::next_at)
                .map(|at| (at, Step::Checkpoint)),
        ];
        let Some((at, step)) = candidates.into_iter().flatten().min() else {
            break;
        };
        if at > config.duration_ms {
            break;
        }

        replay.clock.advance_to(at);
        match step {
            Step::Control(index) => {
                let kind = config.controls[index].kind;
                debug!(at_ms = at, ?kind, "control");
                replay.observer.on_control(at, kind);
                match kind {
                    ControlKind::Pause => replay.engine.pause(),
                    ControlKind::Resume => replay.engine.resume(),
                }
                next_control += 1;
            }
            Step::Frame => {
                if let Some(handle) = replay.engine.scheduler_mut().take_due() {
                    frames += 1;
                    replay.engine.on_frame(handle);
                }
            }
            Step::Checkpoint => {
                let snapshot = replay.snapshot();
                let result = replay
                    .verifier
                    .as_mut()
                    .and_then(|v| v.check_time(at, &snapshot));
                if let Some(result) = result {
                    replay.observer.on_checkpoint(&result);
                }
            }
        }
        replay.drain();

        frame_due = match replay.engine.pending_frame() {
            None => None,
            Some(_) if frame_due.is_none() || step == Step::Frame => {
                Some(config.frames.next_frame_at(at))
            }
            Some(_) => frame_due,
        };
    }

    let end_ms = replay.clock.now_ms();
    let Replay {
        mut checker,
        verifier,
        mut violations,
        ..
    } = replay;
    violations.extend(checker.finish(end_ms));
    let completed_phases = checker.completed_phases();
    violations.sort_by_key(|v| v.at_ms);

    ReplayReport {
        violations,
        checkpoints: verifier.map(CheckpointVerifier::finalize),
        frames,
        completed_phases,
        end_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::LagSimulator;
    use crate::verification::Expectations;
    use crate::verification::checkpoint::{Checkpoint, ExpectationsMeta};

    fn config(mode: Mode, climb_ms: u64, transition_secs: u64, duration_ms: u64) -> ReplayConfig {
        ReplayConfig {
            mode,
            climb_ms,
            transition_secs,
            duration_ms,
            lead_window_ms: 1_000,
            frames: FramePlan::new(16, LagSimulator::disabled()),
            controls: Vec::new(),
            realtime: false,
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<(u64, SinkEvent)>,
    }

    impl ReplayObserver for Recorder {
        fn on_event(&mut self, at_ms: u64, event: &SinkEvent) {
            self.events.push((at_ms, event.clone()));
        }
    }

    impl Recorder {
        fn buzz_times(&self) -> Vec<u64> {
            self.events
                .iter()
                .filter(|(_, e)| *e == SinkEvent::Buzz)
                .map(|(at, _)| *at)
                .collect()
        }
    }

    #[test]
    fn test_session_replay_is_clean() {
        let mut recorder = Recorder::default();
        let report = run(config(Mode::Session, 10_000, 0, 12_000), None, &mut recorder);

        assert!(report.passed(), "violations: {:?}", report.violations);
        assert_eq!(report.completed_phases, 1);
        let buzzes = recorder.buzz_times();
        assert_eq!(buzzes.len(), 1);
        // the final mark fires inside its lead window
        assert!((9_000..=10_016).contains(&buzzes[0]));
    }

    #[test]
    fn test_rotation_replay_with_lag_and_gaps() {
        let mut cfg = config(Mode::Rotation, 8_000, 5, 60_000);
        let mut lag = LagSimulator::new();
        lag.seed(7);
        cfg.frames = FramePlan::new(16, lag).with_gaps(3_000, 2_500);

        let report = run(cfg, None, &mut ());
        assert!(report.passed(), "violations: {:?}", report.violations);
        assert!(report.completed_phases >= 5);
    }

    #[test]
    fn test_pause_extends_the_phase() {
        let mut cfg = config(Mode::Session, 5_000, 0, 10_000);
        cfg.controls = vec![
            Control {
                at_ms: 2_000,
                kind: ControlKind::Pause,
            },
            Control {
                at_ms: 4_000,
                kind: ControlKind::Resume,
            },
        ];
        let mut recorder = Recorder::default();
        let report = run(cfg, None, &mut recorder);

        assert!(report.passed(), "violations: {:?}", report.violations);
        let buzzes = recorder.buzz_times();
        assert_eq!(buzzes.len(), 1);
        assert!((6_000..=7_016).contains(&buzzes[0]));
    }

    #[test]
    fn test_checkpoints_pass_and_fail() {
        let expectations = Expectations {
            meta: ExpectationsMeta::default(),
            checkpoints: vec![
                Checkpoint {
                    at_ms: 1_000,
                    phase: Some("running-climb".to_string()),
                    round: Some(1),
                    remaining_ms: Some((2_000, 2_000)),
                    description: None,
                },
                Checkpoint {
                    at_ms: 4_000,
                    phase: Some("running-climb".to_string()),
                    round: None,
                    remaining_ms: None,
                    description: Some("already idle".to_string()),
                },
                Checkpoint {
                    at_ms: 9_000,
                    phase: Some("idle".to_string()),
                    round: None,
                    remaining_ms: None,
                    description: Some("past the end of the replay".to_string()),
                },
            ],
        };
        let verifier = CheckpointVerifier::new(expectations);
        let report = run(
            config(Mode::Session, 3_000, 0, 5_000),
            Some(verifier),
            &mut (),
        );

        let result = report.checkpoints.as_ref().unwrap();
        assert_eq!(result.checkpoints_total, 3);
        assert_eq!(result.checkpoints_passed, 1);
        assert!(result.results[0].passed);
        assert!(!result.results[1].passed);
        assert!(!result.results[2].passed);
        assert!(report.violations.is_empty());
        assert!(!report.passed());
    }

    #[test]
    fn test_replay_stops_at_duration() {
        let report = run(config(Mode::Rotation, 60_000, 15, 30_000), None, &mut ());
        assert!(report.end_ms <= 30_000);
        assert_eq!(report.completed_phases, 0);
        assert!(report.frames > 0);
    }
}
