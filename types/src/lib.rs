//! Shared configuration types for BELAY
//!
//! This crate contains serializable types that are shared between the timer
//! engine (belay-core), the interactive terminal host and the replay validator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Mode
// ─────────────────────────────────────────────────────────────────────────────

/// Overall countdown behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One climb phase, then stop
    #[default]
    Session,
    /// Climb and transition alternate until stopped
    Rotation,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Session => "session",
            Mode::Rotation => "rotation",
        }
    }

    /// Returns true if the countdown repeats after the climb phase
    pub fn is_rotation(&self) -> bool {
        matches!(self, Mode::Rotation)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(Mode::Session),
            "rotation" => Ok(Mode::Rotation),
            other => Err(format!("unknown mode '{other}' (expected session or rotation)")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Input ranges
// ─────────────────────────────────────────────────────────────────────────────

pub const MIN_CLIMB_MINUTES: u32 = 1;
pub const MAX_CLIMB_MINUTES: u32 = 180;
pub const MIN_TRANSITION_SECS: u32 = 5;
pub const MAX_TRANSITION_SECS: u32 = 600;

/// Clamp a climb preset to the accepted range (1..=180 minutes)
pub fn clamp_climb_minutes(minutes: u32) -> u32 {
    minutes.clamp(MIN_CLIMB_MINUTES, MAX_CLIMB_MINUTES)
}

/// Clamp a transition preset to the accepted range (5..=600 seconds)
pub fn clamp_transition_secs(secs: u32) -> u32 {
    secs.clamp(MIN_TRANSITION_SECS, MAX_TRANSITION_SECS)
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_climb_minutes() -> u32 {
    20
}
fn default_transition_secs() -> u32 {
    15
}
fn default_lead_window_ms() -> u64 {
    1_000
}
fn default_frame_interval_ms() -> u64 {
    16
}
fn default_audio_volume() -> u8 {
    80
}

/// Audio output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Master enable for all cues
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Volume level (0-100)
    #[serde(default = "default_audio_volume")]
    pub volume: u8,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 80,
        }
    }
}

/// User preferences for the countdown.
///
/// Persistence methods (load/save) are provided by belay-core via the
/// `SettingsExt` trait. Every field has a serde default so that older or
/// hand-edited files still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default)]
    pub mode: Mode,

    /// Climb interval preset in minutes
    #[serde(default = "default_climb_minutes")]
    pub climb_minutes: u32,

    /// Transition interval preset in seconds (rotation only)
    #[serde(default = "default_transition_secs")]
    pub transition_secs: u32,

    /// Play audio cues
    #[serde(default = "default_true")]
    pub sound_on: bool,

    /// Flash the display during the last five seconds of a phase
    #[serde(default = "default_true")]
    pub flash_on: bool,

    /// How far ahead of a cue mark a tick may trigger it
    #[serde(default = "default_lead_window_ms")]
    pub lead_window_ms: u64,

    /// Host frame pacing interval
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    #[serde(default)]
    pub audio: AudioSettings,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Session,
            climb_minutes: default_climb_minutes(),
            transition_secs: default_transition_secs(),
            sound_on: true,
            flash_on: true,
            lead_window_ms: default_lead_window_ms(),
            frame_interval_ms: default_frame_interval_ms(),
            audio: AudioSettings::default(),
        }
    }
}

impl TimerSettings {
    /// Climb preset converted to milliseconds
    pub fn climb_duration_ms(&self) -> u64 {
        u64::from(self.climb_minutes) * 60_000
    }

    /// Transition preset converted to milliseconds
    pub fn transition_duration_ms(&self) -> u64 {
        u64::from(self.transition_secs) * 1_000
    }

    /// Whether cues should reach the speaker at all
    pub fn cues_audible(&self) -> bool {
        self.sound_on && self.audio.enabled && self.audio.volume > 0
    }

    /// Set the climb preset, clamping to the accepted range
    pub fn set_climb_minutes(&mut self, minutes: u32) {
        self.climb_minutes = clamp_climb_minutes(minutes);
    }

    /// Set the transition preset, clamping to the accepted range
    pub fn set_transition_secs(&mut self, secs: u32) {
        self.transition_secs = clamp_transition_secs(secs);
    }

    /// Return a copy with every preset pulled back into range
    pub fn sanitized(mut self) -> Self {
        self.climb_minutes = clamp_climb_minutes(self.climb_minutes);
        self.transition_secs = clamp_transition_secs(self.transition_secs);
        self.audio.volume = self.audio.volume.min(100);
        self.frame_interval_ms = self.frame_interval_ms.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Rotation".parse::<Mode>().unwrap(), Mode::Rotation);
        assert_eq!(" session ".parse::<Mode>().unwrap(), Mode::Session);
        assert!("sprint".parse::<Mode>().is_err());
    }

    #[test]
    fn presets_are_clamped() {
        assert_eq!(clamp_climb_minutes(0), 1);
        assert_eq!(clamp_climb_minutes(500), 180);
        assert_eq!(clamp_transition_secs(1), 5);
        assert_eq!(clamp_transition_secs(9_000), 600);
        assert_eq!(clamp_transition_secs(30), 30);
    }

    #[test]
    fn durations_convert_to_millis() {
        let settings = TimerSettings::default();
        assert_eq!(settings.climb_duration_ms(), 20 * 60_000);
        assert_eq!(settings.transition_duration_ms(), 15_000);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let settings: TimerSettings = toml::from_str("").unwrap();
        assert_eq!(settings, TimerSettings::default());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let settings: TimerSettings =
            toml::from_str("mode = \"rotation\"\nclimb_minutes = 4\nsound_on = false\n").unwrap();
        assert_eq!(settings.mode, Mode::Rotation);
        assert_eq!(settings.climb_minutes, 4);
        assert!(!settings.sound_on);
        assert_eq!(settings.transition_secs, 15);
        assert!(settings.flash_on);
    }

    #[test]
    fn sanitized_pulls_values_into_range() {
        let settings = TimerSettings {
            climb_minutes: 0,
            transition_secs: 1_000,
            frame_interval_ms: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(settings.climb_minutes, 1);
        assert_eq!(settings.transition_secs, 600);
        assert_eq!(settings.frame_interval_ms, 1);
    }

    #[test]
    fn muted_audio_silences_cues() {
        let mut settings = TimerSettings::default();
        assert!(settings.cues_audible());
        settings.audio.volume = 0;
        assert!(!settings.cues_audible());
    }
}
