mod config;
mod error;

pub use config::{AudioSettings, Mode, SettingsExt, TimerSettings};
pub use error::ConfigError;
