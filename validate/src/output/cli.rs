//! Colored CLI output for replay events
//!
//! Formats phase changes, rounds, cues, and verification results with
//! colored output for easy visual parsing.

use std::io::{self, Write};

use belay_core::{Phase, SinkEvent, format_mm_ss};

use crate::replay::clock::format_replay_time;
use crate::replay::{ControlKind, ReplayObserver, ReplayReport};
use crate::verification::{CheckpointResult, Violation};

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum OutputLevel {
    /// Only show summary at end
    Quiet,
    /// Show phases, rounds, cues and failures (default)
    #[default]
    Normal,
    /// Also show every tick
    Verbose,
}

/// CLI output formatter with color support
#[derive(Debug)]
pub struct CliOutput {
    level: OutputLevel,
    use_colors: bool,
    phase: Phase,
    beeps: u32,
    buzzes: u32,
    phase_changes: u32,
    rounds: u32,
    ticks: u64,
}

impl Default for CliOutput {
    fn default() -> Self {
        Self::new(OutputLevel::Normal)
    }
}

impl CliOutput {
    pub fn new(level: OutputLevel) -> Self {
        Self {
            level,
            use_colors: atty::is(atty::Stream::Stdout),
            phase: Phase::Idle,
            beeps: 0,
            buzzes: 0,
            phase_changes: 0,
            rounds: 0,
            ticks: 0,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ANSI Color Codes
    // ═══════════════════════════════════════════════════════════════════════════

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.paint("32", text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint("33", text)
    }

    fn red(&self, text: &str) -> String {
        self.paint("31", text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint("36", text)
    }

    fn magenta(&self, text: &str) -> String {
        self.paint("35", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Event Output
    // ═══════════════════════════════════════════════════════════════════════════

    fn phase_change(&mut self, at_ms: u64, phase: Phase) {
        let old = std::mem::replace(&mut self.phase, phase);
        self.phase_changes += 1;
        if self.level < OutputLevel::Normal || old == phase {
            return;
        }

        let marker = self.cyan("~~~");
        let label = self.cyan("PHASE:");
        println!(
            "[{}] {} {} {} → {}",
            format_replay_time(at_ms),
            marker,
            label,
            old,
            self.bold(phase.as_str())
        );
    }

    fn round(&mut self, at_ms: u64, round: u32) {
        self.rounds += 1;
        if self.level < OutputLevel::Normal {
            return;
        }

        let label = self.bold(&self.green(&format!("═══ ROUND {} ═══", round)));
        println!("\n[{}] {}", format_replay_time(at_ms), label);
    }

    fn beep(&mut self, at_ms: u64, frequency_hz: u32, duration_ms: u32) {
        self.beeps += 1;
        if self.level < OutputLevel::Normal {
            return;
        }

        let marker = self.yellow("-->");
        let label = self.yellow("BEEP:");
        let detail = self.dim(&format!("[{}Hz {}ms]", frequency_hz, duration_ms));
        println!(
            "[{}] {} {} {}",
            format_replay_time(at_ms),
            marker,
            label,
            detail
        );
    }

    fn buzz(&mut self, at_ms: u64) {
        self.buzzes += 1;
        if self.level < OutputLevel::Normal {
            return;
        }

        let marker = self.magenta("!!!");
        let label = self.magenta("BUZZ");
        println!("[{}] {} {}", format_replay_time(at_ms), marker, label);
    }

    fn tick(&mut self, at_ms: u64, remaining_ms: u64) {
        self.ticks += 1;
        if self.level < OutputLevel::Verbose {
            return;
        }

        let label = self.dim("TICK:");
        println!(
            "[{}] {} {} {}",
            format_replay_time(at_ms),
            label,
            format_mm_ss(remaining_ms),
            self.dim(&format!("({}ms)", remaining_ms))
        );
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Summary Report
    // ═══════════════════════════════════════════════════════════════════════════

    /// Print final summary
    pub fn print_summary(&self, report: &ReplayReport) {
        let line = "═".repeat(51);
        println!();
        println!("{}", line);
        println!("  COUNTDOWN VALIDATION SUMMARY");
        println!("{}", line);
        println!("Replayed:        {}", format_replay_time(report.end_ms));
        println!("Frames:          {}", report.frames);
        println!("Rounds:          {}", self.rounds);
        println!(
            "Phase Changes:   {}",
            if self.phase_changes > 0 {
                self.cyan(&self.phase_changes.to_string())
            } else {
                "0".to_string()
            }
        );
        println!("Completed:       {}", report.completed_phases);
        println!("Beeps:           {}", self.beeps);
        println!("Buzzes:          {}", self.buzzes);

        let status = if report.violations.is_empty() {
            self.green("none")
        } else {
            self.red(&report.violations.len().to_string())
        };
        println!("Violations:      {}", status);

        if let Some(result) = &report.checkpoints {
            let (passed, total) = (result.checkpoints_passed, result.checkpoints_total);
            let status = if result.passed() {
                self.green(&format!("PASSED ({}/{})", passed, total))
            } else {
                self.red(&format!("FAILED ({}/{})", passed, total))
            };
            println!("Verification:    {}", status);
        }
        println!("{}", line);
    }

    /// Flush stdout
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

impl ReplayObserver for CliOutput {
    fn on_event(&mut self, at_ms: u64, event: &SinkEvent) {
        match event {
            SinkEvent::Tick(remaining) => self.tick(at_ms, *remaining),
            SinkEvent::Phase(phase) => self.phase_change(at_ms, *phase),
            SinkEvent::Round(round) => self.round(at_ms, *round),
            SinkEvent::Beep(request) => {
                let tone = request.resolve();
                self.beep(at_ms, tone.frequency_hz, tone.duration_ms)
            }
            SinkEvent::Buzz => self.buzz(at_ms),
        }
    }

    fn on_control(&mut self, at_ms: u64, kind: ControlKind) {
        if self.level < OutputLevel::Normal {
            return;
        }
        let label = match kind {
            ControlKind::Pause => "PAUSE PRESSED",
            ControlKind::Resume => "RESUME PRESSED",
        };
        println!("[{}] {}", format_replay_time(at_ms), self.bold(label));
    }

    fn on_violation(&mut self, violation: &Violation) {
        // always shown, even in quiet mode
        let marker = self.red("XXX");
        let label = self.red("VIOLATION:");
        println!(
            "[{}] {} {} {}",
            format_replay_time(violation.at_ms),
            marker,
            label,
            violation.message
        );
    }

    fn on_checkpoint(&mut self, result: &CheckpointResult) {
        if result.passed {
            if self.level >= OutputLevel::Normal {
                let label = self.green(&format!("CHECKPOINT #{} OK", result.checkpoint_idx + 1));
                println!("[{}] {}", format_replay_time(result.at_ms), label);
            }
            return;
        }
        let label = self.red(&format!("CHECKPOINT #{} FAILED:", result.checkpoint_idx + 1));
        println!(
            "[{}] {} {}",
            format_replay_time(result.at_ms),
            label,
            result.failures.join("; ")
        );
    }
}
