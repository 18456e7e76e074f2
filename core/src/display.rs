//! Presentation helpers
//!
//! Pure functions that turn engine state into what a front end shows.

use belay_types::TimerSettings;

use crate::timers::{Mode, Phase, PhaseKind};

/// Remaining time at or below which the display flashes
pub const FLASH_THRESHOLD_MS: u64 = 5_000;

/// Format milliseconds as `MM:SS`. Minutes are not wrapped at an hour.
pub fn format_mm_ss(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    format!("{minutes:02}:{seconds:02}")
}

pub fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "READY",
        Phase::RunningClimb => "CLIMB",
        Phase::PausedClimb => "PAUSED (CLIMB)",
        Phase::RunningTransition => "TRANSITION",
        Phase::PausedTransition => "PAUSED (TRANSITION)",
    }
}

/// What comes after the current phase in rotation mode. Empty in session mode.
pub fn next_hint(mode: Mode, phase: Phase, climb_ms: u64, transition_ms: u64) -> String {
    if !mode.is_rotation() {
        return String::new();
    }
    match phase.kind() {
        None | Some(PhaseKind::Climb) => {
            format!("Next: Transition {}", format_mm_ss(transition_ms))
        }
        Some(PhaseKind::Transition) => format!("Next: Climb {}", format_mm_ss(climb_ms)),
    }
}

pub fn is_flashing(flash_on: bool, phase: Phase, remaining_ms: u64) -> bool {
    flash_on && !phase.is_idle() && remaining_ms <= FLASH_THRESHOLD_MS
}

/// While idle the display shows the climb preset
pub fn idle_display_ms(settings: &TimerSettings) -> u64 {
    settings.climb_duration_ms()
}
