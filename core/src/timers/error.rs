//! Error types for timer operations

use thiserror::Error;

/// Failure reported by a sink while playing a cue.
///
/// The engine logs these and keeps ticking; a broken audio backend never
/// stops the countdown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CueError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),

    #[error("cue playback failed: {0}")]
    Playback(String),
}
