//! Interactive host
//!
//! One task owns the engine for its whole life. REPL commands arrive over a
//! channel and are answered through a oneshot; frames are paced by
//! [`FramePacer`] and delivered when their due time passes.

use std::io::{Stdout, Write};
use std::time::{Duration, Instant};

use belay_core::{EngineConfig, Mode, SettingsExt, SystemClock, TimerEngine, TimerSettings};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::commands;
use crate::keys::KeyAction;
use crate::pacer::FramePacer;
use crate::terminal::TerminalSink;

pub type HostEngine<W> = TimerEngine<SystemClock, FramePacer, TerminalSink<W>>;

/// Outcome of a command, shown to the user either way
pub type Reply = Result<String, String>;

/// A single preset or toggle change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Mode(Mode),
    ClimbMinutes(u32),
    TransitionSecs(u32),
    Sound(bool),
    Flash(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Start {
        mode: Option<Mode>,
        climb_minutes: Option<u32>,
        transition_secs: Option<u32>,
    },
    Pause,
    Resume,
    Toggle,
    Stop,
    Status,
    Set(Setting),
    Config,
    TestBeep,
    Key(KeyAction),
    Shutdown,
}

#[derive(Debug)]
pub struct HostRequest {
    pub command: HostCommand,
    pub reply: oneshot::Sender<Reply>,
}

impl HostRequest {
    pub fn new(command: HostCommand) -> (Self, oneshot::Receiver<Reply>) {
        let (reply, rx) = oneshot::channel();
        (Self { command, reply }, rx)
    }
}

/// Owns the engine and the user's settings
pub struct Host<W: Write = Stdout> {
    engine: HostEngine<W>,
    settings: TimerSettings,
    persist: bool,
}

impl Host<Stdout> {
    /// Host drawing to stdout and saving settings changes to the config file
    pub fn new(settings: TimerSettings) -> Self {
        let sink = TerminalSink::stdout(&settings);
        Self::with_sink(settings, sink, true)
    }
}

impl<W: Write> Host<W> {
    pub fn with_sink(settings: TimerSettings, sink: TerminalSink<W>, persist: bool) -> Self {
        let pacer = FramePacer::new(Duration::from_millis(settings.frame_interval_ms));
        let engine = TimerEngine::with_config(
            SystemClock::new(),
            pacer,
            sink,
            EngineConfig::from(&settings),
        );
        Self {
            engine,
            settings,
            persist,
        }
    }

    pub fn engine(&self) -> &HostEngine<W> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut HostEngine<W> {
        &mut self.engine
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// Change settings, refresh the display and persist
    pub fn update_settings(&mut self, change: impl FnOnce(&mut TimerSettings)) {
        change(&mut self.settings);
        self.engine.sink_mut().apply_settings(&self.settings);
        if !self.persist {
            return;
        }
        if let Err(err) = self.settings.save() {
            warn!(error = %err, "could not save settings");
        }
    }

    /// Start a fresh run from the current presets
    pub fn start_run(&mut self) {
        let mode = self.settings.mode;
        let climb_ms = self.settings.climb_duration_ms();
        let transition_ms = self.settings.transition_duration_ms();
        self.engine
            .sink_mut()
            .set_plan(mode, climb_ms, transition_ms);
        self.engine
            .start(mode, climb_ms, u64::from(self.settings.transition_secs));
    }

    /// Deliver the pending frame if its time has come
    pub fn deliver_frame(&mut self) {
        if let Some(handle) = self.engine.scheduler_mut().take_due(Instant::now()) {
            self.engine.on_frame(handle);
        }
    }

    pub async fn run(mut self, mut requests: mpsc::Receiver<HostRequest>) {
        info!("host loop started");
        loop {
            let due = self
                .engine
                .scheduler()
                .due_at()
                .map(tokio::time::Instant::from_std);

            tokio::select! {
                request = requests.recv() => {
                    let Some(HostRequest { command, reply }) = request else {
                        debug!("command channel closed");
                        break;
                    };
                    let shutdown = command == HostCommand::Shutdown;
                    let result = commands::dispatch(&mut self, command);
                    if reply.send(result).is_err() {
                        debug!("reply receiver dropped");
                    }
                    if shutdown {
                        break;
                    }
                }
                _ = wait_until(due) => self.deliver_frame(),
            }
        }
        self.engine.stop();
        info!("host loop finished");
    }
}

async fn wait_until(due: Option<tokio::time::Instant>) {
    match due {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
