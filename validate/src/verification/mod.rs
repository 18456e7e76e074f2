//! Verification of replayed countdowns
//!
//! Invariants are checked on every event; checkpoints compare engine state
//! against an expectations file at fixed replay times.

pub mod checkpoint;
pub mod invariants;

pub use checkpoint::{CheckpointResult, CheckpointVerifier, Expectations, Snapshot, VerificationResult};
pub use invariants::{InvariantChecker, Violation};
