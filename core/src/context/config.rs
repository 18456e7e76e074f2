//! Settings persistence
//!
//! Re-exports the shared settings types from belay-types and adds confy-backed
//! load/save for TimerSettings.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

pub use belay_types::{AudioSettings, Mode, TimerSettings};

use super::error::ConfigError;

const APP_NAME: &str = "belay";
const CONFIG_NAME: &str = "config";

/// Extension trait for TimerSettings persistence
pub trait SettingsExt: Sized {
    /// Load from the platform config location, falling back to defaults
    fn load() -> Self;
    fn load_from(path: &Path) -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn save_to(&self, path: &Path) -> Result<(), ConfigError>;
    /// Where `load`/`save` read and write
    fn config_path() -> Option<PathBuf>;
}

impl SettingsExt for TimerSettings {
    fn load() -> Self {
        match confy::load::<TimerSettings>(APP_NAME, CONFIG_NAME) {
            Ok(settings) => settings.sanitized(),
            Err(err) => {
                warn!(error = %err, "could not load settings, using defaults");
                TimerSettings::default()
            }
        }
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings: TimerSettings = confy::load_path(path)?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings.sanitized())
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self.clone()).map_err(ConfigError::Save)
    }

    fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        confy::store_path(path, self.clone()).map_err(ConfigError::Save)?;
        debug!(path = %path.display(), "saved settings");
        Ok(())
    }

    fn config_path() -> Option<PathBuf> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME).ok()
    }
}
