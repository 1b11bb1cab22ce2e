use std::io;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Initialise tracing with a non-blocking hourly file appender and a console layer.
///
/// The console layer writes to stderr: stdout is reserved for records printed
/// while indexing is disabled.
pub fn init_with_console(app_name: &str, log_dir: &str, default_level: Level) -> WorkerGuard {
    let _ = std::fs::create_dir_all(log_dir);

    // File appender (non-blocking)
    let file_appender = tracing_appender::rolling::hourly(log_dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Respects RUST_LOG env var, falls back to default_level
    let env_filter = EnvFilter::builder().with_default_directive(default_level.into()).from_env_lossy();

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .compact();

    let console_layer =
        fmt::layer().with_writer(io::stderr).with_target(true).with_thread_names(true).with_file(true).with_line_number(true).with_ansi(true).compact();

    tracing_subscriber::registry().with(env_filter).with(file_layer).with(console_layer).init();

    guard
}

/// Initialise console-only tracing for short-lived command line tools
pub fn init_console(default_level: Level) {
    let env_filter = EnvFilter::builder().with_default_directive(default_level.into()).from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(io::stderr).with_target(false).compact().init();
}
