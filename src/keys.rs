//! Keyboard shortcuts

use std::fmt;
use std::str::FromStr;

/// Action bound to a shortcut key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Start when idle, otherwise pause or resume
    StartOrToggle,
    Stop,
    Fullscreen,
}

impl FromStr for KeyAction {
    type Err = String;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key.to_ascii_lowercase().as_str() {
            "space" | " " => Ok(KeyAction::StartOrToggle),
            "s" => Ok(KeyAction::Stop),
            "f" => Ok(KeyAction::Fullscreen),
            other => Err(format!("no action bound to key '{other}'")),
        }
    }
}

impl fmt::Display for KeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyAction::StartOrToggle => "start/pause/resume",
            KeyAction::Stop => "stop",
            KeyAction::Fullscreen => "fullscreen",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings() {
        assert_eq!("space".parse(), Ok(KeyAction::StartOrToggle));
        assert_eq!("S".parse(), Ok(KeyAction::Stop));
        assert_eq!("f".parse(), Ok(KeyAction::Fullscreen));
        assert!("q".parse::<KeyAction>().is_err());
    }
}
