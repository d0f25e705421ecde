//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and
//! production environments: console output (JSON in production) plus
//! an optional daily-rotating application log file.

use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the logging system.
///
/// # Arguments
/// * `level` - Default log level (e.g., "info", "debug"), overridable
///   via `RUST_LOG`
/// * `json_format` - Whether to use JSON format (true for production)
/// * `log_dir` - Optional directory for daily-rotating file logging
///
/// Returns the file writer's guard; hold it for the process lifetime
/// or buffered log lines are lost on exit.
pub fn init_logger(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "app.log");
            let (file_writer, guard) = tracing_appender::non_blocking(appender);

            if json_format {
                let file_layer = fmt::layer().with_ansi(false).with_writer(file_writer.clone());
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json().with_target(true))
                    .with(file_layer)
                    .init();
            } else {
                let file_layer = fmt::layer().with_ansi(false).with_writer(file_writer.clone());
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer())
                    .with(file_layer)
                    .init();
            }
            Ok(Some(guard))
        }
        None => {
            if json_format {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json().with_target(true))
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer())
                    .init();
            }
            Ok(None)
        }
    }
}
