//! Error types for intent compilation and reconciliation.

use std::fmt;

use crate::schema::SchemaError;

/// Result type alias for fabric operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of fabric errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or missing intent, unknown choice, empty required role.
    Configuration,
    /// Device unreachable, rejected the request, or stayed busy.
    Transport,
    /// Device state did not contain what compilation needs.
    Device,
    /// A condition upstream validation guarantees did not hold.
    Invariant,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Invalid fabric configuration",
            Self::Transport => "Device communication failed",
            Self::Device => "Unexpected device state",
            Self::Invariant => "Internal invariant violated",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Configuration => "Fix the intent or fleet definition and run again",
            Self::Transport => "Earlier hosts were already updated; rerun once fixed",
            Self::Device => "Configure the referenced interface on the device first",
            Self::Invariant => "This is a bug; please report it with the intent that triggered it",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while compiling or reconciling intents.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The intent names a role the fleet does not declare.
    #[error("unknown role '{0}'")]
    UnknownRole(String),

    /// A required role resolved to no hosts.
    #[error("role '{0}' has no hosts configured")]
    EmptyRole(String),

    /// An enumerated attribute has a value outside its allowed set.
    #[error("{field}: unsupported value '{value}' (expected one of: {})", .allowed.join(", "))]
    InvalidChoice {
        /// Attribute name.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Accepted values.
        allowed: &'static [&'static str],
    },

    /// The intent is structurally invalid.
    #[error("invalid {resource} intent: {message}")]
    InvalidIntent {
        /// Resource kind.
        resource: &'static str,
        /// What is wrong.
        message: String,
    },

    /// Compilation produced an empty document.
    #[error("no data produced for {0}")]
    NoData(String),

    /// A should-never-happen condition; returned instead of aborting.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// The document builder rejected a record.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Fetched device state lacks what compilation needs.
    #[error("{host}: unexpected device state at {path}: {message}")]
    DeviceState {
        /// Host the state was fetched from.
        host: String,
        /// Path that was fetched.
        path: String,
        /// What is missing or malformed.
        message: String,
    },

    /// Request failed at the transport layer.
    #[error(transparent)]
    Transport(#[from] restconf::Error),

    /// Document serialization failed.
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid-intent error.
    pub fn intent(resource: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidIntent {
            resource,
            message: message.into(),
        }
    }

    /// Create an invariant violation, logging it loudly.
    pub fn invariant(message: impl Into<String>) -> Self {
        let message = message.into();
        log::error!("invariant violated: {message}");
        Self::Invariant(message)
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnknownRole(_)
            | Error::EmptyRole(_)
            | Error::InvalidChoice { .. }
            | Error::InvalidIntent { .. }
            | Error::NoData(_) => ErrorCategory::Configuration,
            Error::Invariant(_) | Error::Schema(_) | Error::Serialize(_) => {
                ErrorCategory::Invariant
            }
            Error::DeviceState { .. } => ErrorCategory::Device,
            Error::Transport(e) => match e.category() {
                restconf::ErrorCategory::Configuration => ErrorCategory::Configuration,
                _ => ErrorCategory::Transport,
            },
        }
    }
}

/// Check `value` against an allowed set.
pub fn check_choice(
    field: &'static str,
    value: &str,
    allowed: &'static [&'static str],
) -> Result<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidChoice {
            field,
            value: value.to_string(),
            allowed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_choice_display() {
        let err = check_choice("replication_type", "mp2mp", &["static", "ingress"]).unwrap_err();
        let display = err.to_string();
        assert!(display.contains("replication_type"));
        assert!(display.contains("mp2mp"));
        assert!(display.contains("static, ingress"));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_check_choice_accepts_allowed() {
        assert!(check_choice("rt_type", "both", &["both"]).is_ok());
    }

    #[test]
    fn test_invariant_category() {
        let err = Error::invariant("no digits in ''");
        assert_eq!(err.category(), ErrorCategory::Invariant);
        assert!(err.to_string().contains("no digits"));
    }

    #[test]
    fn test_transport_category_passthrough() {
        let err: Error = restconf::Error::Busy {
            host: "h".to_string(),
            path: "/p".to_string(),
        }
        .exhausted(20)
        .into();
        assert_eq!(err.category(), ErrorCategory::Transport);
        assert!(err.to_string().contains("20 attempts"));

        let err: Error = restconf::Error::InvalidRequest("x".to_string()).into();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_category_text() {
        assert!(!ErrorCategory::Device.advice().is_empty());
        assert!(format!("{}", ErrorCategory::Invariant).contains("invariant"));
    }
}
