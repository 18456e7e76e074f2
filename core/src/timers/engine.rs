//! Countdown engine
//!
//! Owns the single authoritative countdown. All mutation goes through
//! [`start`](TimerEngine::start), [`pause`](TimerEngine::pause),
//! [`resume`](TimerEngine::resume), [`stop`](TimerEngine::stop) and the frame
//! callback [`on_frame`](TimerEngine::on_frame).
//!
//! # Lifecycle
//!
//! ```text
//!   Idle ──start──► RunningClimb ◄──resume── PausedClimb
//!                      │    └──────pause──────►
//!            reaches 0 │
//!        ┌─────────────┴──────────────┐
//!   Session: Idle            Rotation: RunningTransition ──reaches 0──► RunningClimb (round + 1)
//! ```
//!
//! At most one frame registration is outstanding at any time. Frames whose
//! handle is not the outstanding one are ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::clock::Clock;
use crate::schedule::{FrameHandle, FrameScheduler};

use super::cues::{self, Cue, CueMark, CueTracker, DEFAULT_LEAD_WINDOW_MS};
use super::deadline::Countdown;
use super::phase::{Mode, Phase, PhaseKind};
use super::sink::TimerSink;

/// Shortest climb the engine accepts; shorter requests are raised to this
pub const MIN_CLIMB_MS: u64 = 1_000;

/// Tunables that are fixed for the lifetime of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How far ahead of a cue mark a tick may trigger it
    #[serde(default = "default_lead_window_ms")]
    pub lead_window_ms: u64,
}

fn default_lead_window_ms() -> u64 {
    DEFAULT_LEAD_WINDOW_MS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lead_window_ms: DEFAULT_LEAD_WINDOW_MS,
        }
    }
}

impl From<&belay_types::TimerSettings> for EngineConfig {
    fn from(settings: &belay_types::TimerSettings) -> Self {
        Self {
            lead_window_ms: settings.lead_window_ms,
        }
    }
}

/// Single-owner countdown state machine
pub struct TimerEngine<C: Clock, S: FrameScheduler, K: TimerSink> {
    clock: C,
    scheduler: S,
    sink: K,
    config: EngineConfig,

    mode: Mode,
    phase: Phase,
    climb_ms: u64,
    transition_ms: u64,
    countdown: Countdown,
    round: u32,
    cues: CueTracker,
    last_remaining_ms: u64,

    /// The only frame registration this engine will act on
    pending_frame: Option<FrameHandle>,
}

impl<C: Clock, S: FrameScheduler, K: TimerSink> TimerEngine<C, S, K> {
    pub fn new(clock: C, scheduler: S, sink: K) -> Self {
        Self::with_config(clock, scheduler, sink, EngineConfig::default())
    }

    pub fn with_config(clock: C, scheduler: S, sink: K, config: EngineConfig) -> Self {
        Self {
            clock,
            scheduler,
            sink,
            config,
            mode: Mode::Session,
            phase: Phase::Idle,
            climb_ms: 20 * 60_000,
            transition_ms: 15_000,
            countdown: Countdown::Stopped,
            round: 0,
            cues: CueTracker::new(),
            last_remaining_ms: 0,
            pending_frame: None,
        }
    }

    // ─── Operations ─────────────────────────────────────────────────────────

    /// Begin a fresh countdown, replacing any run in progress.
    ///
    /// `climb_duration_ms` is raised to at least one second.
    pub fn start(&mut self, mode: Mode, climb_duration_ms: u64, transition_secs: u64) {
        self.stop();
        self.mode = mode;
        self.climb_ms = climb_duration_ms.max(MIN_CLIMB_MS);
        self.transition_ms = transition_secs.saturating_mul(1_000);
        self.round = 0;

        info!(
            mode = %mode,
            climb_ms = self.climb_ms,
            transition_ms = self.transition_ms,
            "countdown started"
        );

        self.enter_climb();
        self.run_tick();
    }

    /// Freeze the running phase. No-op unless running.
    pub fn pause(&mut self) {
        let Some(paused) = self.phase.as_paused() else {
            return;
        };
        let now = self.clock.now();
        if !self.countdown.pause(now) {
            return;
        }
        self.cancel_frame();
        debug!(
            remaining_ms = self.countdown.remaining_ms(now),
            phase = %paused,
            "countdown paused"
        );
        self.set_phase(paused);
    }

    /// Continue a paused phase. No-op unless paused.
    pub fn resume(&mut self) {
        let Some(running) = self.phase.as_running() else {
            return;
        };
        let now = self.clock.now();
        if !self.countdown.resume(now) {
            return;
        }
        debug!(
            remaining_ms = self.countdown.remaining_ms(now),
            phase = %running,
            "countdown resumed"
        );
        self.set_phase(running);
        self.run_tick();
    }

    /// Return to idle from any state. Always safe.
    pub fn stop(&mut self) {
        self.cancel_frame();
        if !self.phase.is_idle() {
            info!(phase = %self.phase, round = self.round, "countdown stopped");
        }
        self.countdown = Countdown::Stopped;
        self.set_phase(Phase::Idle);
        self.cues.reset();
        self.last_remaining_ms = 0;
    }

    pub fn is_paused(&self) -> bool {
        self.phase.is_paused()
    }

    /// Deliver a frame previously registered with the scheduler.
    ///
    /// Stale handles (cancelled, superseded, or already delivered) are ignored.
    pub fn on_frame(&mut self, handle: FrameHandle) {
        if self.pending_frame != Some(handle) {
            trace!(%handle, "ignoring stale frame");
            return;
        }
        self.pending_frame = None;
        self.run_tick();
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Climb phases entered since the last `start`
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Remaining time in the current phase, as of now
    pub fn remaining_ms(&self) -> u64 {
        self.countdown.remaining_ms(self.clock.now())
    }

    pub fn climb_duration_ms(&self) -> u64 {
        self.climb_ms
    }

    pub fn transition_duration_ms(&self) -> u64 {
        self.transition_ms
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Frame registration the engine is waiting for, if any
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending_frame
    }

    // ─── Phase entry ────────────────────────────────────────────────────────

    fn enter_climb(&mut self) {
        self.round += 1;
        debug!(round = self.round, climb_ms = self.climb_ms, "entering climb");
        self.sink.on_round(self.round);
        self.enter(PhaseKind::Climb, self.climb_ms);
    }

    fn enter_transition(&mut self) {
        debug!(transition_ms = self.transition_ms, "entering transition");
        self.enter(PhaseKind::Transition, self.transition_ms);
    }

    fn enter(&mut self, kind: PhaseKind, duration_ms: u64) {
        let now = self.clock.now();
        self.countdown = Countdown::running(now, Duration::from_millis(duration_ms));
        self.cues.reset();
        self.last_remaining_ms = duration_ms;
        self.set_phase(Phase::running(kind));
    }

    fn phase_duration_ms(&self, kind: PhaseKind) -> u64 {
        match kind {
            PhaseKind::Climb => self.climb_ms,
            PhaseKind::Transition => self.transition_ms,
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.sink.on_phase(phase);
    }

    // ─── Tick loop ──────────────────────────────────────────────────────────

    /// Evaluate the running phase, and any phase entered because it ended,
    /// then register the next frame if the countdown is still running.
    fn run_tick(&mut self) {
        loop {
            if !self.phase.is_running() {
                return;
            }
            let Some(kind) = self.phase.kind() else {
                return;
            };

            let remaining = self.countdown.remaining_ms(self.clock.now());
            let prev = self.last_remaining_ms;
            trace!(phase = %self.phase, prev, remaining, "tick");

            self.fire_due_cues(kind, prev, remaining);
            self.last_remaining_ms = remaining;
            self.sink.on_tick(remaining);

            if remaining > 0 {
                self.request_frame();
                return;
            }

            self.cancel_frame();
            if !self.end_phase(kind) {
                return;
            }
        }
    }

    /// Handle a phase reaching zero. Returns true if a new phase was entered.
    fn end_phase(&mut self, kind: PhaseKind) -> bool {
        let schedule = cues::schedule_for(kind);
        if let Some(mark) = cues::claim_final(schedule, &mut self.cues) {
            self.play(kind, mark);
        }

        match (self.mode, kind) {
            (Mode::Session, _) => {
                info!(round = self.round, "session complete");
                self.stop();
                false
            }
            (Mode::Rotation, PhaseKind::Climb) => {
                self.enter_transition();
                true
            }
            (Mode::Rotation, PhaseKind::Transition) => {
                self.enter_climb();
                true
            }
        }
    }

    fn fire_due_cues(&mut self, kind: PhaseKind, prev: u64, cur: u64) {
        let due = cues::due_cues(
            cues::schedule_for(kind),
            self.phase_duration_ms(kind),
            prev,
            cur,
            self.config.lead_window_ms,
            &mut self.cues,
        );
        for mark in due {
            self.play(kind, mark);
        }
    }

    fn play(&mut self, kind: PhaseKind, mark: &CueMark) {
        let result = match mark.cue {
            Cue::Beep(request) => self.sink.play_beep(request),
            Cue::Buzz => self.sink.play_buzz(),
        };
        match result {
            Ok(()) => trace!(phase = kind.as_str(), mark_ms = mark.offset_ms, "cue fired"),
            Err(err) => warn!(
                phase = kind.as_str(),
                mark_ms = mark.offset_ms,
                error = %err,
                "cue playback failed"
            ),
        }
    }

    // ─── Frame registration ─────────────────────────────────────────────────

    fn request_frame(&mut self) {
        if self.pending_frame.is_none() {
            self.pending_frame = Some(self.scheduler.schedule_next());
        }
    }

    fn cancel_frame(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel(handle);
        }
    }
}

impl<C: Clock, S: FrameScheduler, K: TimerSink> std::fmt::Debug for TimerEngine<C, S, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("mode", &self.mode)
            .field("phase", &self.phase)
            .field("round", &self.round)
            .field("climb_ms", &self.climb_ms)
            .field("transition_ms", &self.transition_ms)
            .field("countdown", &self.countdown)
            .field("pending_frame", &self.pending_frame)
            .finish_non_exhaustive()
    }
}
