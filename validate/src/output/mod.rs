//! Output formatting for replay results

pub mod cli;

pub use cli::{CliOutput, OutputLevel};
