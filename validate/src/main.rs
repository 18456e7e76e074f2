//! Countdown validation CLI
//!
//! Replays a climbing countdown on virtual time and checks cue behavior:
//! - Accelerated mode (default): fast CI validation with checkpoints
//! - Realtime mode (--realtime): watch the countdown at 1x
//! - Irregular hosts: frame lag, spikes, and periodic suspensions

mod output;
mod replay;
mod verification;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use belay_core::Mode;
use belay_core::timers::{DEFAULT_LEAD_WINDOW_MS, MIN_CLIMB_MS};

use crate::output::{CliOutput, OutputLevel};
use crate::replay::{Control, ControlKind, FramePlan, LagSimulator, ReplayConfig};
use crate::verification::{CheckpointVerifier, Expectations};

// ═══════════════════════════════════════════════════════════════════════════════
// CLI Arguments
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Parser, Debug)]
#[command(name = "belay-validate")]
#[command(about = "Validate countdown cues against a simulated host")]
#[command(version)]
struct Args {
    /// session or rotation
    #[arg(long, default_value_t = Mode::Session)]
    mode: Mode,

    /// Climb length in milliseconds
    #[arg(long, default_value_t = 60_000)]
    climb_ms: u64,

    /// Transition length in seconds (rotation only)
    #[arg(long, default_value_t = 15)]
    transition_secs: u64,

    /// Virtual time to replay (defaults to one full round)
    #[arg(long)]
    duration_ms: Option<u64>,

    // ─────────────────────────────────────────────────────────────────────────
    // Host Simulation
    // ─────────────────────────────────────────────────────────────────────────
    /// Nominal frame interval in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Add jitter and occasional spikes to frame delivery
    #[arg(long)]
    simulate_lag: bool,

    /// Seed for the lag generator
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Suspend the host once every N milliseconds
    #[arg(long, requires = "gap_ms")]
    gap_every_ms: Option<u64>,

    /// Length of each suspension in milliseconds
    #[arg(long, requires = "gap_every_ms")]
    gap_ms: Option<u64>,

    /// Cue lead window in milliseconds
    #[arg(long, default_value_t = DEFAULT_LEAD_WINDOW_MS)]
    lead_window_ms: u64,

    /// Press pause at these replay times (ms), repeatable
    #[arg(long)]
    pause_at: Vec<u64>,

    /// Press resume at these replay times (ms), repeatable
    #[arg(long)]
    resume_at: Vec<u64>,

    /// Replay at 1x with real sleeps
    #[arg(long)]
    realtime: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Output Mode
    // ─────────────────────────────────────────────────────────────────────────
    /// Quiet mode: summary and failures only
    #[arg(short, long)]
    quiet: bool,

    /// Verbose mode: show every tick
    #[arg(short, long)]
    verbose: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────
    /// Path to expectations TOML file for checkpoint verification
    #[arg(long)]
    expect: Option<PathBuf>,
}

impl Args {
    fn output_level(&self) -> OutputLevel {
        if self.quiet {
            OutputLevel::Quiet
        } else if self.verbose {
            OutputLevel::Verbose
        } else {
            OutputLevel::Normal
        }
    }

    /// One climb for a session, three full rounds for a rotation
    fn default_duration_ms(&self) -> u64 {
        let climb = self.climb_ms.max(MIN_CLIMB_MS);
        match self.mode {
            Mode::Session => climb + 1_000,
            Mode::Rotation => 3 * (climb + self.transition_secs * 1_000) + 1_000,
        }
    }

    fn frame_plan(&self) -> FramePlan {
        let lag = if self.simulate_lag {
            let mut lag = LagSimulator::new();
            lag.seed(self.seed);
            lag
        } else {
            LagSimulator::disabled()
        };
        let plan = FramePlan::new(self.frame_ms, lag);
        match (self.gap_every_ms, self.gap_ms) {
            (Some(every), Some(gap)) => plan.with_gaps(every, gap),
            _ => plan,
        }
    }

    fn controls(&self) -> Vec<Control> {
        let pauses = self.pause_at.iter().map(|&at_ms| Control {
            at_ms,
            kind: ControlKind::Pause,
        });
        let resumes = self.resume_at.iter().map(|&at_ms| Control {
            at_ms,
            kind: ControlKind::Resume,
        });
        pauses.chain(resumes).collect()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("warn,belay_core=debug,belay_validate=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let verifier = match &args.expect {
        Some(path) => {
            let expectations = Expectations::load(path)?;
            if let Some(description) = &expectations.meta.description {
                println!("Expectations: {}", description);
            }
            Some(CheckpointVerifier::new(expectations))
        }
        None => None,
    };

    let config = ReplayConfig {
        mode: args.mode,
        climb_ms: args.climb_ms,
        transition_secs: args.transition_secs,
        duration_ms: args.duration_ms.unwrap_or_else(|| args.default_duration_ms()),
        lead_window_ms: args.lead_window_ms,
        frames: args.frame_plan(),
        controls: args.controls(),
        realtime: args.realtime,
    };

    println!(
        "Replaying {} countdown: climb {}ms, transition {}s, {}ms of virtual time{}",
        config.mode,
        config.climb_ms,
        config.transition_secs,
        config.duration_ms,
        if config.realtime { " (realtime)" } else { "" }
    );

    let mut output = CliOutput::new(args.output_level());
    let report = replay::run(config, verifier, &mut output);
    output.print_summary(&report);
    output.flush();

    if !report.passed() {
        std::process::exit(1);
    }
    Ok(())
}
