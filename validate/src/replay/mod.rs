//! Replay engine for timer validation
//!
//! Drives a countdown on virtual time with irregular frame delivery,
//! host suspensions and scripted pause/resume.

pub mod clock;
pub mod frames;
pub mod lag;
pub mod runner;

pub use frames::FramePlan;
pub use lag::LagSimulator;
pub use runner::{Control, ControlKind, ReplayConfig, ReplayObserver, ReplayReport, run};
