pub mod clock;
pub mod context;
pub mod display;
pub mod schedule;
pub mod timers;

// Re-exports for convenience
pub use clock::{Clock, SystemClock, VirtualClock};
pub use context::{ConfigError, SettingsExt, TimerSettings};
pub use display::{format_mm_ss, idle_display_ms, is_flashing, next_hint, phase_label};
pub use schedule::{FrameHandle, FrameScheduler, ManualScheduler};
pub use timers::{
    BeepRequest, CueError, EngineConfig, Mode, Phase, PhaseKind, RecordingSink, SinkEvent,
    TimerEngine, TimerSink, Tone, Waveform,
};
