//! Logging utilities for the Consulta application.
//!
//! Every crate logs through `tracing` macros; this module installs the
//! subscriber once at process start.

use consulta_config::LoggingConfig;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber at INFO.
///
/// # Examples
///
/// ```
/// use consulta_common::logging;
///
/// logging::init();
/// ```
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific log level.
///
/// `RUST_LOG` is honoured; `level` is added as a directive for the
/// `consulta` targets. Calling this twice is harmless.
pub fn init_with_level(level: Level) {
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .with(build_filter(&level.to_string()))
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Initialize logging from the optional `logging` config section.
///
/// With a `directory` configured, a daily rolling file layer is installed
/// next to stdout. The returned guard flushes that writer and must be kept
/// alive for the lifetime of the process.
pub fn init_from_config(config: Option<&LoggingConfig>) -> Option<WorkerGuard> {
    let Some(config) = config else {
        init();
        return None;
    };

    let Some(directory) = config.directory.as_deref() else {
        init_with_level(parse_level(&config.level));
        return None;
    };

    let file_appender = tracing_appender::rolling::daily(directory, "consulta.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(build_filter(&config.level))
        .try_init();

    if result.is_ok() {
        info!(
            "Logging initialized at level: {} (files in {})",
            config.level, directory
        );
    }
    Some(guard)
}

fn build_filter(level: &str) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match format!("consulta={}", level).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter.add_directive(Level::INFO.into()),
    }
}

fn parse_level(level: &str) -> Level {
    level.parse().unwrap_or(Level::INFO)
}
