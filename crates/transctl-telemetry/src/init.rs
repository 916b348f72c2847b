//! Logging initialisation.
//!
//! # Design
//! - One entry point installs an `EnvFilter` plus a `fmt` layer writing to
//!   standard error; standard output carries rendered results only.
//! - `RUST_LOG` wins over the level derived from `--verbose`.
//! - Installation happens at most once per process.

use std::io;
use std::str::FromStr;

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Level used when `--verbose` is absent and `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Configure and install the global tracing subscriber.
///
/// Later calls are no-ops once a subscriber has been installed here.
///
/// # Errors
///
/// Returns an error if another subscriber has already been set globally.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INSTALLED.get_or_try_init(|| install_fmt_subscriber(config).map(|()| config.format))?;
    Ok(())
}

/// Format of the installed subscriber, if any.
#[must_use]
pub fn installed_format() -> Option<LogFormat> {
    INSTALLED.get().copied()
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Log level or filter directive (e.g., `warn`, `transctl=debug`).
    pub level: &'a str,
    /// Output format selection for the tracing subscriber.
    pub format: LogFormat,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
        }
    }
}

impl LoggingConfig<'_> {
    /// Configuration for a `--verbose` count.
    #[must_use]
    pub fn from_verbosity(count: u8) -> Self {
        Self {
            level: level_for_verbosity(count),
            ..Self::default()
        }
    }
}

/// Map a `-v` count to a level: 0 `warn`, 1 `info`, 2 `debug`, 3+ `trace`.
#[must_use]
pub const fn level_for_verbosity(count: u8) -> &'static str {
    match count {
        0 => DEFAULT_LOG_LEVEL,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable logs.
    Pretty,
}

impl LogFormat {
    /// The CLI defaults to human-readable logs.
    #[must_use]
    pub const fn infer() -> Self {
        Self::Pretty
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            _ => Err(TelemetryError::UnknownFormat {
                name: value.to_string(),
            }),
        }
    }
}

fn install_fmt_subscriber(config: &LoggingConfig) -> Result<()> {
    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(build_env_filter(config.level))
            .with(
                fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(build_env_filter(config.level))
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init(),
    };
    installed.map_err(|source| TelemetryError::SubscriberInstall { source })
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for_verbosity(0), "warn");
        assert_eq!(level_for_verbosity(1), "info");
        assert_eq!(level_for_verbosity(2), "debug");
        assert_eq!(level_for_verbosity(7), "trace");
        assert_eq!(LoggingConfig::from_verbosity(2).level, "debug");
    }

    #[test]
    fn formats_parse_by_name() {
        assert_eq!("JSON".parse::<LogFormat>().ok(), Some(LogFormat::Json));
        assert_eq!("pretty".parse::<LogFormat>().ok(), Some(LogFormat::Pretty));
        let err = "xml".parse::<LogFormat>().expect_err("unknown format");
        assert_eq!(err.to_string(), "unknown log format \"xml\"");
    }

    #[test]
    fn init_logging_installs_subscriber_once() {
        let config = LoggingConfig::from_verbosity(1);
        let _ = init_logging(&config);
        if installed_format().is_some() {
            assert!(init_logging(&LoggingConfig {
                level: "trace",
                format: LogFormat::Json,
            })
            .is_ok());
            assert_eq!(installed_format(), Some(LogFormat::Pretty));
        }
    }
}
