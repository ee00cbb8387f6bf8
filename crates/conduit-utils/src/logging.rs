//! # Logging Utilities
//!
//! Logging infrastructure for Conduit using `tracing`.
//!
//! Every console layer writes to **stderr**. Standard output belongs to the
//! command interpreter, and its redirected output must never interleave with
//! diagnostics.
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=conduit_core=trace`)
//! - `CONDUIT_LOG_FORMAT`: Set output format (`json` or `pretty`, default: `pretty`)
//! - `CONDUIT_LOG_FILE`: Optional path to log file (if not set, logs only to the console).
//!   A directory receives `YYYY-MM-DD-conduit.log`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use conduit_utils::{LogFormat, LogLevel, init_logging_with_level};
//!
//! init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
//!     .expect("Failed to initialize logging");
//! tracing::debug!("file handle opened");
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    Pretty,
    /// JSON format
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(format!("{s}. Use 'pretty' or 'json'"))),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level (default for the CLI)
    Warn,
    /// Info level
    Info,
    /// Debug level
    Debug,
    /// Trace level (logs every read and write)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(format!(
                "{s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            ))),
        }
    }
}

/// Initialize logging with default settings
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log level filter (e.g., `debug`, `conduit_core=trace`)
/// - `CONDUIT_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
/// - `CONDUIT_LOG_FILE`: Optional path to log file
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed or the
/// `CONDUIT_LOG_FORMAT` value is not recognised.
pub fn init_logging() -> Result<(), LoggingError>
{
    let format = match env::var("CONDUIT_LOG_FORMAT") {
        Ok(value) => LogFormat::from_str(&value)?,
        Err(_) => LogFormat::Pretty,
    };

    let default_level = env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<LogLevel>().ok())
        .map_or(Level::WARN, Into::into);

    init_logging_internal(format, default_level, true)
}

/// Initialize logging with explicit level and format
///
/// An explicit level wins over `RUST_LOG`.
///
/// ## Errors
///
/// Returns an error if logging is already initialized.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<(), LoggingError>
{
    init_logging_internal(format, level.into(), false)
}

fn init_logging_internal(format: LogFormat, default_level: Level, honor_env: bool) -> Result<(), LoggingError>
{
    // RUST_LOG can override the default level with more specific filters
    let env_filter = if honor_env {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.to_string()))
    } else {
        EnvFilter::new(default_level.to_string())
    };

    let log_file = env::var("CONDUIT_LOG_FILE").ok().map(PathBuf::from);
    let file_writer = log_file.as_deref().map(file_appender).transpose()?;

    match format {
        LogFormat::Pretty => {
            let console_layer = fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(true)
                .with_writer(io::stderr)
                .with_filter(env_filter.clone());

            if let Some((non_blocking, guard)) = file_writer {
                let file_layer = fmt::layer()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false) // No ANSI in files
                    .with_filter(env_filter);

                Registry::default()
                    .with(console_layer)
                    .with(file_layer)
                    .try_init()
                    .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;
                keep_guard(guard);
            } else {
                Registry::default()
                    .with(console_layer)
                    .try_init()
                    .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;
            }
        }
        LogFormat::Json => {
            let console_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(io::stderr)
                .with_filter(env_filter.clone());

            if let Some((non_blocking, guard)) = file_writer {
                let file_layer = fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_filter(env_filter);

                Registry::default()
                    .with(console_layer)
                    .with(file_layer)
                    .try_init()
                    .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;
                keep_guard(guard);
            } else {
                Registry::default()
                    .with(console_layer)
                    .try_init()
                    .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;
            }
        }
    }

    Ok(())
}

/// Open the log file at `path`, creating missing parent directories.
///
/// A directory gets one dated file per day.
fn file_appender(path: &Path) -> Result<(NonBlocking, WorkerGuard), LoggingError>
{
    let (directory, file_name) = if path.is_dir() {
        (path.to_path_buf(), format!("{}-conduit.log", Utc::now().format("%Y-%m-%d")))
    } else {
        let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let file_name = path.file_name().ok_or_else(|| {
            LoggingError::FileError(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a file path: {}", path.display()),
            ))
        })?;
        (directory.to_path_buf(), file_name.to_string_lossy().into_owned())
    };

    std::fs::create_dir_all(&directory).map_err(LoggingError::FileError)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(&directory)
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;
    Ok(tracing_appender::non_blocking(appender))
}

// The worker flushes on drop; the subscriber lives for the whole process.
fn keep_guard(guard: WorkerGuard)
{
    std::mem::forget(guard);
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("dev").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("PROD").unwrap(), LogFormat::Json);
        assert!(matches!(LogFormat::from_str("xml"), Err(LoggingError::InvalidFormat(_))));
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("dbg").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(LogLevel::from_str("loud").is_err());
    }

    #[test]
    fn test_log_level_to_tracing_level()
    {
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_file_appender_creates_missing_directories()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("nested").join("conduit.log");

        let (_writer, _guard) = file_appender(&path).unwrap();
        assert!(dir.path().join("logs").join("nested").is_dir());
    }

    #[test]
    fn test_file_appender_reports_unusable_directory()
    {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let result = file_appender(&blocker.join("conduit.log"));
        assert!(matches!(result, Err(LoggingError::FileError(_))));
    }

    #[test]
    fn test_file_appender_accepts_directory()
    {
        let dir = tempfile::tempdir().unwrap();
        assert!(file_appender(dir.path()).is_ok());
    }

    #[test]
    fn test_invalid_level_message_lists_choices()
    {
        let err = LogLevel::from_str("loud").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("loud"));
        assert!(message.contains("'trace'"));
    }
}
