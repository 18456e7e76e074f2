//! Cue and tick invariants checked against the recorded event stream

use std::fmt;

use belay_core::timers::{Cue, schedule_for};
use belay_core::{Mode, Phase, PhaseKind, SinkEvent};

/// An invariant broken at a replay time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub at_ms: u64,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}ms: {}", self.at_ms, self.message)
    }
}

/// Counters for one entered phase, which spans any pause/resume cycles
#[derive(Debug, Clone)]
struct PhaseInstance {
    kind: PhaseKind,
    reachable_beeps: usize,
    beeps: usize,
    buzzes: usize,
    last_tick: Option<u64>,
    finished: bool,
}

impl PhaseInstance {
    fn new(kind: PhaseKind, duration_ms: u64) -> Self {
        let reachable_beeps = schedule_for(kind)
            .iter()
            .filter(|m| matches!(m.cue, Cue::Beep(_)) && m.offset_ms <= duration_ms)
            .count();
        Self {
            kind,
            reachable_beeps,
            beeps: 0,
            buzzes: 0,
            last_tick: None,
            finished: false,
        }
    }
}

/// Watches sink events and records every broken invariant:
///
/// - each mark fires at most once per phase instance, and all reachable
///   marks have fired once the phase reaches zero
/// - exactly one buzz per completed phase
/// - remaining time never increases within a phase
/// - rounds count up by one from the start of a run
/// - session runs never enter a transition
#[derive(Debug)]
pub struct InvariantChecker {
    mode: Mode,
    climb_ms: u64,
    transition_ms: u64,
    phase: Phase,
    instance: Option<PhaseInstance>,
    round: u32,
    completed_phases: u32,
    violations: Vec<Violation>,
}

impl InvariantChecker {
    pub fn new(mode: Mode, climb_ms: u64, transition_ms: u64) -> Self {
        Self {
            mode,
            climb_ms,
            transition_ms,
            phase: Phase::Idle,
            instance: None,
            round: 0,
            completed_phases: 0,
            violations: Vec::new(),
        }
    }

    /// Feed one event; returns the violations it caused
    pub fn observe(&mut self, at_ms: u64, event: &SinkEvent) -> Vec<Violation> {
        let before = self.violations.len();
        match event {
            SinkEvent::Phase(phase) => self.on_phase(at_ms, *phase),
            SinkEvent::Round(round) => self.on_round(at_ms, *round),
            SinkEvent::Tick(remaining) => self.on_tick(at_ms, *remaining),
            SinkEvent::Beep(_) => self.on_beep(at_ms),
            SinkEvent::Buzz => self.on_buzz(at_ms),
        }
        self.violations[before..].to_vec()
    }

    /// Close the open phase instance and return everything found
    pub fn finish(&mut self, at_ms: u64) -> Vec<Violation> {
        self.close_instance(at_ms);
        std::mem::take(&mut self.violations)
    }

    pub fn completed_phases(&self) -> u32 {
        self.completed_phases
    }

    fn violate(&mut self, at_ms: u64, message: String) {
        self.violations.push(Violation { at_ms, message });
    }

    fn on_phase(&mut self, at_ms: u64, phase: Phase) {
        let previous = self.phase;
        self.phase = phase;

        // resume continues the paused instance
        if phase.is_running() && previous.as_running() == Some(phase) {
            return;
        }
        if phase.is_paused() {
            if previous.as_paused() != Some(phase) {
                self.violate(at_ms, format!("{phase} entered from {previous}"));
            }
            return;
        }

        self.close_instance(at_ms);
        let Some(kind) = phase.kind() else {
            return;
        };
        if kind == PhaseKind::Transition && self.mode == Mode::Session {
            self.violate(at_ms, "session run entered a transition".to_string());
        }
        let duration = match kind {
            PhaseKind::Climb => self.climb_ms,
            PhaseKind::Transition => self.transition_ms,
        };
        self.instance = Some(PhaseInstance::new(kind, duration));
    }

    fn on_round(&mut self, at_ms: u64, round: u32) {
        if round != 1 && round != self.round + 1 {
            self.violate(
                at_ms,
                format!("round jumped from {} to {}", self.round, round),
            );
        }
        self.round = round;
    }

    fn on_tick(&mut self, at_ms: u64, remaining: u64) {
        if !self.phase.is_running() {
            self.violate(at_ms, format!("tick {remaining}ms while {}", self.phase));
            return;
        }
        let Some(instance) = self.instance.as_mut() else {
            return;
        };
        let last = instance.last_tick.replace(remaining);
        if remaining == 0 {
            instance.finished = true;
        }
        if let Some(last) = last {
            if remaining > last {
                self.violate(
                    at_ms,
                    format!("remaining went up from {last}ms to {remaining}ms"),
                );
            }
        }
    }

    fn on_beep(&mut self, at_ms: u64) {
        let Some(instance) = self.instance.as_mut() else {
            self.violate(at_ms, "beep outside a phase".to_string());
            return;
        };
        instance.beeps += 1;
        if instance.beeps > instance.reachable_beeps {
            let (kind, beeps, reachable) =
                (instance.kind, instance.beeps, instance.reachable_beeps);
            self.violate(
                at_ms,
                format!(
                    "{} beep #{beeps} exceeds the {reachable} reachable marks",
                    kind.as_str()
                ),
            );
        }
    }

    fn on_buzz(&mut self, at_ms: u64) {
        let Some(instance) = self.instance.as_mut() else {
            self.violate(at_ms, "buzz outside a phase".to_string());
            return;
        };
        instance.buzzes += 1;
        if instance.buzzes > 1 {
            let kind = instance.kind;
            self.violate(at_ms, format!("second buzz in one {} phase", kind.as_str()));
        }
    }

    fn close_instance(&mut self, at_ms: u64) {
        let Some(instance) = self.instance.take() else {
            return;
        };
        let kind = instance.kind.as_str();
        if instance.finished {
            self.completed_phases += 1;
            if instance.beeps != instance.reachable_beeps {
                self.violate(
                    at_ms,
                    format!(
                        "{kind} finished with {} of {} beeps",
                        instance.beeps, instance.reachable_beeps
                    ),
                );
            }
            if instance.buzzes != 1 {
                self.violate(
                    at_ms,
                    format!("{kind} finished with {} buzzes", instance.buzzes),
                );
            }
        }
    }
}
