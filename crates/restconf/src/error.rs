//! Error types for RESTCONF sessions.
//!
//! Errors are categorized so the retry loop can tell a momentarily locked
//! configuration datastore apart from an unreachable device.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::types::{BUSY_STATUS, Method};

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of session errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The device's configuration datastore is locked by another session.
    Busy,
    /// The device could not be reached, or stayed busy for the whole budget.
    Transport,
    /// The device answered with a non-busy error status.
    Http,
    /// The request or client configuration is invalid.
    Configuration,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is worth retrying.
    ///
    /// Only the busy signal is: an unreachable device must fail fast.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Busy => "Configuration database is locked",
            Self::Transport => "Device unreachable",
            Self::Http => "Device rejected the request",
            Self::Configuration => "Invalid request or client configuration",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Busy => "Another session holds the datastore lock, wait and try again",
            Self::Transport => {
                "Check reachability, TLS trust and proxy settings, or raise the retry budget"
            }
            Self::Http => "Inspect the path and payload; the device's YANG model may differ",
            Self::Configuration => "Check credentials, CA file and proxy URL",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to a device.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The device reported its configuration database as locked (HTTP 409).
    #[error("{host}: configuration database busy ({path})")]
    Busy {
        /// Target host.
        host: String,
        /// Resource path.
        path: String,
    },

    /// The device stayed busy for every attempt in the retry budget.
    #[error("{host}: configuration database still busy after {attempts} attempts ({path})")]
    RetriesExhausted {
        /// Target host.
        host: String,
        /// Resource path.
        path: String,
        /// Attempts made.
        attempts: u32,
    },

    /// The device answered with a terminal error status.
    #[error("{host}: {method} {path} returned HTTP {status}")]
    Http {
        /// Target host.
        host: String,
        /// Request method.
        method: Method,
        /// Resource path.
        path: String,
        /// HTTP status code.
        status: u16,
    },

    /// Connection, TLS, DNS or timeout failure.
    #[error("{host}: {method} {path} failed: {message}")]
    Transport {
        /// Target host.
        host: String,
        /// Request method.
        method: Method,
        /// Resource path.
        path: String,
        /// Underlying error message.
        message: String,
    },

    /// The request violates the payload invariant for its method.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// IO error while reading client material (CA bundle).
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify a ureq failure for one request.
    pub fn from_ureq(host: &str, method: Method, path: &str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(BUSY_STATUS) => Self::Busy {
                host: host.to_string(),
                path: path.to_string(),
            },
            ureq::Error::StatusCode(status) => Self::Http {
                host: host.to_string(),
                method,
                path: path.to_string(),
                status,
            },
            other => Self::Transport {
                host: host.to_string(),
                method,
                path: path.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Escalate a busy error once the retry budget is spent.
    ///
    /// Any other error is returned unchanged.
    #[must_use]
    pub fn exhausted(self, attempts: u32) -> Self {
        match self {
            Self::Busy { host, path } => Self::RetriesExhausted {
                host,
                path,
                attempts,
            },
            other => other,
        }
    }

    /// Get the error category for retry logic.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Busy { .. } => ErrorCategory::Busy,
            Error::RetriesExhausted { .. } => ErrorCategory::Transport,
            Error::Http { .. } => ErrorCategory::Http,
            Error::Transport { .. } => ErrorCategory::Transport,
            Error::InvalidRequest(_) => ErrorCategory::Configuration,
            Error::Client(_) => ErrorCategory::Configuration,
            Error::Io { .. } => ErrorCategory::Configuration,
        }
    }

    /// Whether this error is worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// The host the failed request targeted, if any.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        match self {
            Error::Busy { host, .. }
            | Error::RetriesExhausted { host, .. }
            | Error::Http { host, .. }
            | Error::Transport { host, .. } => Some(host),
            _ => None,
        }
    }

    /// The HTTP status code, when the device answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Busy { .. } => Some(BUSY_STATUS),
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
