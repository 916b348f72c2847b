//! Error types for provider operations.

use std::error::Error;

use thiserror::Error;

/// Primary error type for daemon operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The daemon rejected the credentials, even after fallback.
    #[error("unauthorised")]
    Unauthorized,
    /// Transmission answered with a `result` other than `success`.
    #[error("request failed: {result}")]
    RequestFailed {
        /// Result string reported by the daemon.
        result: String,
    },
    /// The daemon answered with an HTTP status the client does not handle.
    #[error("unexpected HTTP status {status}")]
    UnexpectedStatus {
        /// Numeric HTTP status code.
        status: u16,
    },
    /// The token/credential handshake did not converge.
    #[error("request abandoned after {attempts} attempts")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
    },
    /// The daemon does not know the addressed torrent.
    #[error("torrent not found")]
    TorrentNotFound,
    /// The uploaded torrent file was rejected.
    #[error("torrent file is not valid")]
    TorrentFileInvalid,
    /// The addressed tracker does not exist on the torrent.
    #[error("tracker {id} not found")]
    TrackerNotFound {
        /// Provider-assigned tracker identifier.
        id: i64,
    },
    /// Sending the request or reading the response failed.
    #[error("{operation} request failed")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The response body could not be decoded.
    #[error("failed to decode {operation} response")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying serde failure.
        #[source]
        source: serde_json::Error,
    },
    /// The operation has no counterpart on this daemon.
    #[error("{operation} is not supported by this provider")]
    Unsupported {
        /// Operation identifier.
        operation: &'static str,
    },
    /// A value could not be coerced into the destination type.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Key being written.
        key: String,
        /// Offending raw value.
        value: String,
        /// Human-readable reason.
        reason: String,
    },
    /// The key does not exist in the daemon configuration.
    #[error("unknown key {key}")]
    UnknownKey {
        /// Key that was requested.
        key: String,
    },
}

impl ProviderError {
    /// Wrap a transport-level failure.
    pub fn transport(
        operation: &'static str,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::Transport {
            operation,
            source: source.into(),
        }
    }

    /// Wrap a decoding failure.
    #[must_use]
    pub const fn decode(operation: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { operation, source }
    }
}

/// Convenience alias for provider results.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn transport_error_exposes_source() {
        let err = ProviderError::transport("torrent-get", io::Error::other("reset"));
        assert_eq!(err.to_string(), "torrent-get request failed");
        assert!(err.source().is_some());
    }

    #[test]
    fn request_failed_carries_result() {
        let err = ProviderError::RequestFailed {
            result: "duplicate torrent".to_string(),
        };
        assert_eq!(err.to_string(), "request failed: duplicate torrent");
    }
}
