//! Logging Infrastructure
//!
//! Structured logging setup for development (pretty) and production (JSON).

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger with defaults (info, plain text, stdout)
pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// Initialize the logger with optional JSON formatting and file output
///
/// `RUST_LOG` wins over `log_level` when set. File output is a daily
/// rolling file under `log_dir`, only used when the directory exists.
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let json = json.unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    let file_appender = log_dir
        .map(Path::new)
        .filter(|p| p.exists())
        .and_then(|p| p.to_str())
        .map(|dir| tracing_appender::rolling::daily(dir, "cafe-server"));

    // try_init: tests may initialise more than once
    let result = match (file_appender, json) {
        (Some(appender), true) => builder.json().with_writer(appender).try_init(),
        (Some(appender), false) => builder.with_ansi(false).with_writer(appender).try_init(),
        (None, true) => builder.json().try_init(),
        (None, false) => builder.try_init(),
    };

    if let Err(e) = result {
        eprintln!("Logger already initialised: {e}");
    }
}
