//! Error types for local configuration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, resolving, or writing local configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing a file failed.
    #[error("failed to access {}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The INI text is malformed.
    #[error("syntax error on line {line}: {message}")]
    Syntax {
        /// One-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// A dotted key has no section or no name.
    #[error("invalid key {key:?}: expected section.name or section.subsection.name")]
    InvalidKey {
        /// Offending key.
        key: String,
    },
    /// The key has no value to remove or print.
    #[error("{key} is not set")]
    NotSet {
        /// Key that was requested.
        key: String,
    },
    /// The active context has no section in the file.
    #[error("unknown context {name:?}")]
    UnknownContext {
        /// Context name.
        name: String,
    },
    /// A setting could not be interpreted.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Setting name.
        key: String,
        /// Raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The netrc file is malformed.
    #[error("malformed netrc on line {line}: {message}")]
    Netrc {
        /// One-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// The platform exposes no configuration directory.
    #[error("no configuration directory is available; pass --config")]
    NoConfigDir,
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(key: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
