//! Logging configuration with file-based output and size-based rotation.
//!
//! Writes logs to `~/.config/belay/belay.log` (or platform equivalent) with
//! 10 MB size-based rotation. The terminal is busy with the countdown line, so
//! nothing is logged to the console unless the log file cannot be opened. Set
//! `DEBUG_LOGGING=1` to enable debug output for belay crates.

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initialize file logging.
///
/// Returns a `WorkerGuard` that must be held for the application lifetime so
/// buffered logs are flushed on shutdown.
///
/// # Fallback
/// If the log directory or file cannot be created, returns `None` and logs
/// warnings and errors to stderr instead.
pub fn init() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    let log_dir = match dirs::config_dir() {
        Some(config) => config.join("belay"),
        None => {
            init_stderr_only();
            return None;
        }
    };

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        // subscriber not initialized yet
        eprintln!("Failed to create log directory {log_dir:?}: {e}, using stderr only");
        init_stderr_only();
        return None;
    }

    // 10 MB, keep belay.log and belay.log.1
    let log_path = log_dir.join("belay.log");
    let file_appender = match BasicRollingFileAppender::new(
        &log_path,
        RollingConditionBasic::new().max_size(10 * 1024 * 1024),
        1,
    ) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Failed to create log file at {log_path:?}: {e}");
            init_stderr_only();
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let filter_directive = if debug_logging {
        "info,belay=debug,belay_core=debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(EnvFilter::new(filter_directive))
        .init();

    tracing::info!(log_file = ?log_path, debug_logging, "BELAY logging initialized");

    Some(guard)
}

/// Fallback when file logging is unavailable: problems only, on stderr
fn init_stderr_only() {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(EnvFilter::new("warn"))
        .init();
}
