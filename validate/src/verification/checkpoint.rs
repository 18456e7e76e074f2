//! Checkpoint-based timer verification
//!
//! Allows defining the expected countdown state at specific replay times and
//! verifying that the engine matches.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use belay_core::Phase;

const PHASE_NAMES: [Phase; 5] = [
    Phase::Idle,
    Phase::RunningClimb,
    Phase::PausedClimb,
    Phase::RunningTransition,
    Phase::PausedTransition,
];

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("failed to read expectations {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse expectations {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("checkpoint {index}: unknown phase '{name}'")]
    UnknownPhase { index: usize, name: String },
}

/// Expected countdown state at one replay time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Replay time in milliseconds when to check
    pub at_ms: u64,

    /// Expected phase, e.g. "running-climb"
    #[serde(default)]
    pub phase: Option<String>,

    /// Expected round
    #[serde(default)]
    pub round: Option<u32>,

    /// Expected remaining time range [min, max] in milliseconds
    #[serde(default)]
    pub remaining_ms: Option<(u64, u64)>,

    /// Optional description for debugging
    #[serde(default)]
    pub description: Option<String>,
}

/// Full expectations file for a replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expectations {
    #[serde(default)]
    pub meta: ExpectationsMeta,

    #[serde(rename = "checkpoint", default)]
    pub checkpoints: Vec<Checkpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectationsMeta {
    #[serde(default)]
    pub description: Option<String>,

    /// Tolerance in milliseconds for remaining-time comparisons
    #[serde(default = "default_tolerance")]
    pub tolerance_ms: u64,
}

impl Default for ExpectationsMeta {
    fn default() -> Self {
        Self {
            description: None,
            tolerance_ms: default_tolerance(),
        }
    }
}

fn default_tolerance() -> u64 {
    50
}

impl Expectations {
    /// Load expectations from a TOML file
    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        let content = std::fs::read_to_string(path).map_err(|source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut expectations: Expectations =
            toml::from_str(&content).map_err(|source| CheckpointError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        expectations.validate()?;
        expectations.checkpoints.sort_by_key(|c| c.at_ms);
        Ok(expectations)
    }

    fn validate(&self) -> Result<(), CheckpointError> {
        for (index, checkpoint) in self.checkpoints.iter().enumerate() {
            let Some(name) = &checkpoint.phase else {
                continue;
            };
            if parse_phase(name).is_none() {
                return Err(CheckpointError::UnknownPhase {
                    index,
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }
}

fn parse_phase(name: &str) -> Option<Phase> {
    let name = name.trim();
    PHASE_NAMES
        .into_iter()
        .find(|p| p.as_str().eq_ignore_ascii_case(name))
}

/// Engine state as seen at a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub phase: Phase,
    pub round: u32,
    pub remaining_ms: u64,
}

/// Result of verifying a single checkpoint
#[derive(Debug, Clone)]
pub struct CheckpointResult {
    pub checkpoint_idx: usize,
    pub at_ms: u64,
    pub passed: bool,
    pub failures: Vec<String>,
}

/// Overall verification result
#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub checkpoints_passed: u32,
    pub checkpoints_total: u32,
    pub results: Vec<CheckpointResult>,
}

impl VerificationResult {
    pub fn passed(&self) -> bool {
        self.checkpoints_passed == self.checkpoints_total
    }
}

/// Verifies engine state against expected checkpoints
#[derive(Debug)]
pub struct CheckpointVerifier {
    expectations: Expectations,
    current_checkpoint_idx: usize,
    results: Vec<CheckpointResult>,
}

impl CheckpointVerifier {
    pub fn new(mut expectations: Expectations) -> Self {
        expectations.checkpoints.sort_by_key(|c| c.at_ms);
        Self {
            expectations,
            current_checkpoint_idx: 0,
            results: Vec::new(),
        }
    }

    /// Replay time of the next unverified checkpoint
    pub fn next_at(&self) -> Option<u64> {
        self.expectations
            .checkpoints
            .get(self.current_checkpoint_idx)
            .map(|c| c.at_ms)
    }

    /// Verify the next checkpoint if the replay has reached it
    pub fn check_time(&mut self, now_ms: u64, snapshot: &Snapshot) -> Option<CheckpointResult> {
        let checkpoint = self.expectations.checkpoints.get(self.current_checkpoint_idx)?;
        if now_ms < checkpoint.at_ms {
            return None;
        }

        let tolerance = self.expectations.meta.tolerance_ms;
        let mut failures = Vec::new();

        if let Some(expected) = checkpoint.phase.as_deref().and_then(parse_phase) {
            if expected != snapshot.phase {
                failures.push(format!(
                    "phase is {} but expected {}",
                    snapshot.phase, expected
                ));
            }
        }

        if let Some(round) = checkpoint.round {
            if round != snapshot.round {
                failures.push(format!(
                    "round is {} but expected {}",
                    snapshot.round, round
                ));
            }
        }

        if let Some((min, max)) = checkpoint.remaining_ms {
            let remaining = snapshot.remaining_ms;
            if remaining + tolerance < min || remaining > max + tolerance {
                failures.push(format!(
                    "remaining {}ms not in expected range [{}, {}]",
                    remaining, min, max
                ));
            }
        }

        let result = CheckpointResult {
            checkpoint_idx: self.current_checkpoint_idx,
            at_ms: checkpoint.at_ms,
            passed: failures.is_empty(),
            failures,
        };

        self.results.push(result.clone());
        self.current_checkpoint_idx += 1;

        Some(result)
    }

    /// Get final verification result. Checkpoints the replay never reached fail.
    pub fn finalize(mut self) -> VerificationResult {
        let unreached = self.expectations.checkpoints[self.current_checkpoint_idx..]
            .iter()
            .enumerate()
            .map(|(offset, c)| CheckpointResult {
                checkpoint_idx: self.current_checkpoint_idx + offset,
                at_ms: c.at_ms,
                passed: false,
                failures: vec!["replay ended before this checkpoint".to_string()],
            })
            .collect::<Vec<_>>();
        self.results.extend(unreached);

        let passed = self.results.iter().filter(|r| r.passed).count() as u32;
        let total = self.results.len() as u32;

        VerificationResult {
            checkpoints_passed: passed,
            checkpoints_total: total,
            results: self.results,
        }
    }

    /// Check if all checkpoints have been processed
    pub fn is_complete(&self) -> bool {
        self.current_checkpoint_idx >= self.expectations.checkpoints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_expectations() -> Expectations {
        Expectations {
            meta: ExpectationsMeta::default(),
            checkpoints: vec![Checkpoint {
                at_ms: 1_500,
                phase: Some("running-climb".to_string()),
                round: Some(1),
                remaining_ms: Some((400, 600)),
                description: Some("First checkpoint".to_string()),
            }],
        }
    }

    fn snapshot(phase: Phase, remaining_ms: u64) -> Snapshot {
        Snapshot {
            phase,
            round: 1,
            remaining_ms,
        }
    }

    #[test]
    fn test_checkpoint_pass() {
        let mut verifier = CheckpointVerifier::new(sample_expectations());

        assert!(verifier.check_time(1_000, &snapshot(Phase::RunningClimb, 1_000)).is_none());
        let r = verifier
            .check_time(1_500, &snapshot(Phase::RunningClimb, 500))
            .unwrap();
        assert!(r.passed, "Failures: {:?}", r.failures);
        assert!(verifier.is_complete());
    }

    #[test]
    fn test_checkpoint_fail_wrong_phase() {
        let mut verifier = CheckpointVerifier::new(sample_expectations());
        let r = verifier
            .check_time(1_500, &snapshot(Phase::Idle, 500))
            .unwrap();
        assert!(!r.passed);
        assert!(r.failures.iter().any(|f| f.contains("phase is idle")));
    }

    #[test]
    fn test_checkpoint_fail_wrong_remaining() {
        let mut verifier = CheckpointVerifier::new(sample_expectations());
        let r = verifier
            .check_time(1_500, &snapshot(Phase::RunningClimb, 900))
            .unwrap();
        assert!(!r.passed);
        assert!(
            r.failures
                .iter()
                .any(|f| f.contains("not in expected range"))
        );
    }

    #[test]
    fn test_tolerance_widens_range() {
        let mut verifier = CheckpointVerifier::new(sample_expectations());
        let r = verifier
            .check_time(1_500, &snapshot(Phase::RunningClimb, 640))
            .unwrap();
        assert!(r.passed);
    }

    #[test]
    fn test_unreached_checkpoint_fails() {
        let verifier = CheckpointVerifier::new(sample_expectations());
        let result = verifier.finalize();
        assert_eq!(result.checkpoints_total, 1);
        assert!(!result.passed());
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expect.toml");
        std::fs::write(
            &path,
            r#"
[meta]
description = "two second session"
tolerance_ms = 20

[[checkpoint]]
at_ms = 2500
phase = "idle"

[[checkpoint]]
at_ms = 1000
phase = "Running-Climb"
round = 1
remaining_ms = [990, 1010]
"#,
        )
        .unwrap();

        let expectations = Expectations::load(&path).unwrap();
        assert_eq!(expectations.meta.tolerance_ms, 20);
        assert_eq!(expectations.checkpoints[0].at_ms, 1_000);
        assert_eq!(expectations.checkpoints[0].remaining_ms, Some((990, 1_010)));
    }

    #[test]
    fn test_load_rejects_unknown_phase() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expect.toml");
        std::fs::write(&path, "[[checkpoint]]\nat_ms = 10\nphase = \"bouldering\"\n").unwrap();

        assert!(matches!(
            Expectations::load(&path),
            Err(CheckpointError::UnknownPhase { index: 0, .. })
        ));
    }
}
