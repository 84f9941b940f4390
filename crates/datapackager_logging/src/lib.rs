//! Shared logging utilities for Data Packager binaries.
//!
//! Logs go to stderr and to a daily file under `~/.datapackager/logs`.
//! When the log directory cannot be created the file layer is skipped and a
//! warning is printed; logging to stderr still works.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str =
    "datapackager=info,datapackager_schema=info,datapackager_inference=info";

/// Logging configuration shared by Data Packager binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Mirror the file filter on stderr instead of warnings only.
    pub verbose: bool,
    /// Skip the file writer (stderr only).
    pub no_file: bool,
}

/// Keeps the background file writer alive. Dropping it flushes pending lines.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    file: Option<WorkerGuard>,
}

impl LogGuard {
    pub fn writes_file(&self) -> bool {
        self.file.is_some()
    }
}

/// Initialize tracing with a daily file writer and stderr output.
///
/// Fails only if a global subscriber is already installed.
pub fn init_logging(config: LogConfig<'_>) -> Result<LogGuard> {
    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let console_filter = if config.verbose {
        file_filter.clone()
    } else {
        EnvFilter::new("warn")
    };

    let mut guard = None;
    let file_layer = if config.no_file {
        None
    } else {
        match ensure_logs_dir() {
            Ok(log_dir) => {
                let appender = tracing_appender::rolling::daily(log_dir, log_file_name(config.app_name));
                let (writer, worker) = tracing_appender::non_blocking(appender);
                guard = Some(worker);
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_filter(file_filter),
                )
            }
            Err(err) => {
                eprintln!("Warning: file logging disabled: {:#}", err);
                None
            }
        }
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LogGuard { file: guard })
}

/// `<app>.log`, with anything unsafe in a file name replaced by `_`.
fn log_file_name(app_name: &str) -> String {
    let stem: String = app_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') { c } else { '_' })
        .collect();
    format!("{}.log", stem)
}

/// Get the Data Packager home directory: ~/.datapackager
pub fn datapackager_home() -> Result<PathBuf> {
    if let Ok(override_path) = std::env::var("DATAPACKAGER_HOME") {
        return Ok(PathBuf::from(override_path));
    }
    dirs::home_dir()
        .map(|home| home.join(".datapackager"))
        .context("Could not determine home directory")
}

/// Get the logs directory: ~/.datapackager/logs
pub fn logs_dir() -> Result<PathBuf> {
    Ok(datapackager_home()?.join("logs"))
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir()?;
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name() {
        assert_eq!(log_file_name("datapackager"), "datapackager.log");
        assert_eq!(log_file_name("data packager/cli"), "data_packager_cli.log");
    }

    #[test]
    fn test_home_override_and_init() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("DATAPACKAGER_HOME", dir.path());

        assert_eq!(datapackager_home().unwrap(), dir.path());
        let logs = ensure_logs_dir().unwrap();
        assert!(logs.ends_with("logs"));
        assert!(logs.is_dir());

        let guard = init_logging(LogConfig {
            app_name: "datapackager-test",
            verbose: false,
            no_file: false,
        })
        .unwrap();
        assert!(guard.writes_file());

        // A second global subscriber is refused
        assert!(init_logging(LogConfig {
            app_name: "datapackager-test",
            verbose: false,
            no_file: true,
        })
        .is_err());

        std::env::remove_var("DATAPACKAGER_HOME");
    }
}
