//! Single-line terminal display and bell cues

use std::io::{self, Stdout, Write};

use belay_core::display::{format_mm_ss, idle_display_ms, is_flashing, next_hint, phase_label};
use belay_core::{BeepRequest, CueError, Mode, Phase, TimerSettings, TimerSink};
use tracing::debug;

const CLEAR_LINE: &str = "\r\x1b[2K";
const REVERSE: &str = "\x1b[7m";
const RESET: &str = "\x1b[0m";
const BELL: &[u8] = b"\x07";
const DOUBLE_BELL: &[u8] = b"\x07\x07";

/// What the display currently reflects
#[derive(Debug, Clone, PartialEq, Eq)]
struct View {
    phase: Phase,
    round: u32,
    remaining_ms: u64,
    mode: Mode,
    climb_ms: u64,
    transition_ms: u64,
}

/// Renders countdown state on one terminal line and rings the bell for cues
pub struct TerminalSink<W: Write = Stdout> {
    out: W,
    view: View,
    sound_on: bool,
    flash_on: bool,
    last_line: Option<String>,
}

impl TerminalSink<Stdout> {
    pub fn stdout(settings: &TimerSettings) -> Self {
        Self::new(io::stdout(), settings)
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, settings: &TimerSettings) -> Self {
        Self {
            out,
            view: View {
                phase: Phase::Idle,
                round: 0,
                remaining_ms: idle_display_ms(settings),
                mode: settings.mode,
                climb_ms: settings.climb_duration_ms(),
                transition_ms: settings.transition_duration_ms(),
            },
            sound_on: settings.cues_audible(),
            flash_on: settings.flash_on,
            last_line: None,
        }
    }

    /// Pick up changed presets and toggles. Idle display follows the presets.
    pub fn apply_settings(&mut self, settings: &TimerSettings) {
        self.sound_on = settings.cues_audible();
        self.flash_on = settings.flash_on;
        if self.view.phase.is_idle() {
            self.view.mode = settings.mode;
            self.view.climb_ms = settings.climb_duration_ms();
            self.view.transition_ms = settings.transition_duration_ms();
            self.view.remaining_ms = idle_display_ms(settings);
            self.view.round = 0;
        }
        self.refresh();
    }

    /// The plan of the run that is about to start
    pub fn set_plan(&mut self, mode: Mode, climb_ms: u64, transition_ms: u64) {
        self.view.mode = mode;
        self.view.climb_ms = climb_ms;
        self.view.transition_ms = transition_ms;
    }

    /// The line as it would be drawn now, without escape codes
    pub fn line(&self) -> String {
        let v = &self.view;
        let mut line = format!("{} {}", phase_label(v.phase), format_mm_ss(v.remaining_ms));
        if !v.phase.is_idle() && v.round > 0 {
            line.push_str(&format!(" [Round {}]", v.round));
        }
        let hint = next_hint(v.mode, v.phase, v.climb_ms, v.transition_ms);
        if !hint.is_empty() {
            line.push_str(&format!(" [{hint}]"));
        }
        line
    }

    pub fn is_flashing(&self) -> bool {
        is_flashing(self.flash_on, self.view.phase, self.view.remaining_ms)
    }

    /// Force the next draw even if nothing changed
    pub fn invalidate(&mut self) {
        self.last_line = None;
    }

    /// Draw the line if it differs from what is on screen
    pub fn draw(&mut self) -> io::Result<()> {
        let mut line = self.line();
        if self.is_flashing() {
            line = format!("{REVERSE}{line}{RESET}");
        }
        if self.last_line.as_deref() == Some(line.as_str()) {
            return Ok(());
        }
        write!(self.out, "{CLEAR_LINE}{line}")?;
        self.out.flush()?;
        self.last_line = Some(line);
        Ok(())
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    fn refresh(&mut self) {
        if let Err(err) = self.draw() {
            debug!(error = %err, "display write failed");
        }
    }

    fn ring(&mut self, bell: &[u8]) -> Result<(), CueError> {
        if !self.sound_on {
            return Ok(());
        }
        self.out
            .write_all(bell)
            .and_then(|_| self.out.flush())
            .map_err(|e| CueError::Unavailable(e.to_string()))
    }
}

impl<W: Write> TimerSink for TerminalSink<W> {
    fn on_tick(&mut self, remaining_ms: u64) {
        self.view.remaining_ms = remaining_ms;
        self.refresh();
    }

    fn on_phase(&mut self, phase: Phase) {
        self.view.phase = phase;
        if phase.is_idle() {
            self.view.remaining_ms = self.view.climb_ms;
            self.view.round = 0;
        }
        self.refresh();
    }

    fn on_round(&mut self, round: u32) {
        self.view.round = round;
    }

    fn play_beep(&mut self, _beep: BeepRequest) -> Result<(), CueError> {
        self.ring(BELL)
    }

    fn play_buzz(&mut self) -> Result<(), CueError> {
        self.ring(DOUBLE_BELL)
    }
}
