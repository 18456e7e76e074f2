//! Countdown phases
//!
//! Exactly one phase is active at a time. Running and paused variants exist
//! for both interval kinds so that pause/resume can restore the same kind.

use std::fmt;

pub use belay_types::Mode;

/// Interval kind of a non-idle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    Climb,
    Transition,
}

impl PhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Climb => "climb",
            PhaseKind::Transition => "transition",
        }
    }
}

/// Current interval kind and run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    RunningClimb,
    PausedClimb,
    RunningTransition,
    PausedTransition,
}

impl Phase {
    /// The running phase of the given kind
    pub fn running(kind: PhaseKind) -> Self {
        match kind {
            PhaseKind::Climb => Phase::RunningClimb,
            PhaseKind::Transition => Phase::RunningTransition,
        }
    }

    /// The paused phase of the given kind
    pub fn paused(kind: PhaseKind) -> Self {
        match kind {
            PhaseKind::Climb => Phase::PausedClimb,
            PhaseKind::Transition => Phase::PausedTransition,
        }
    }

    /// Interval kind, `None` while idle
    pub fn kind(&self) -> Option<PhaseKind> {
        match self {
            Phase::Idle => None,
            Phase::RunningClimb | Phase::PausedClimb => Some(PhaseKind::Climb),
            Phase::RunningTransition | Phase::PausedTransition => Some(PhaseKind::Transition),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Phase::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Phase::RunningClimb | Phase::RunningTransition)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Phase::PausedClimb | Phase::PausedTransition)
    }

    /// Paused counterpart of a running phase
    pub fn as_paused(&self) -> Option<Self> {
        self.is_running()
            .then(|| self.kind().map(Phase::paused))
            .flatten()
    }

    /// Running counterpart of a paused phase
    pub fn as_running(&self) -> Option<Self> {
        self.is_paused()
            .then(|| self.kind().map(Phase::running))
            .flatten()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::RunningClimb => "running-climb",
            Phase::PausedClimb => "paused-climb",
            Phase::RunningTransition => "running-transition",
            Phase::PausedTransition => "paused-transition",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
