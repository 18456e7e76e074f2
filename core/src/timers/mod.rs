//! Countdown timer
//!
//! This module provides:
//! - **Deadline**: monotonic countdown state for one phase instance
//! - **Phases**: the climb/transition state machine and its run modes
//! - **Cues**: per-phase marks and crossing detection
//! - **Engine**: the single-owner driver tying them to a clock, a frame
//!   scheduler and a sink
//!
//! # Modes
//!
//! - Session: one climb, then idle
//! - Rotation: climb and transition alternate until stopped

mod cues;
mod deadline;
mod engine;
mod error;
mod phase;
mod sink;

#[cfg(test)]
mod engine_tests;

pub use cues::{
    CLIMB_CUES, Cue, CueMark, CueTracker, DEFAULT_LEAD_WINDOW_MS, TRANSITION_CUES, due_cues,
    schedule_for, should_fire,
};
pub use deadline::{Countdown, round_ms};
pub use engine::{EngineConfig, MIN_CLIMB_MS, TimerEngine};
pub use error::CueError;
pub use phase::{Mode, Phase, PhaseKind};
pub use sink::{
    BUZZ_TONE, BeepRequest, DEFAULT_TONE, RecordingSink, SinkEvent, TimerSink, Tone, Waveform,
};
