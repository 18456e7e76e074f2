pub mod commands;
pub mod host;
pub mod keys;
pub mod logging;
pub mod pacer;
pub mod repl;
pub mod terminal;

pub use host::{Host, HostCommand, HostRequest, Reply, Setting};
pub use repl::readline;
