//! Error types and exit codes for blabber
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure
//! - 2: Usage error (bad flags/args)
//! - 3: Data/store error (store unreachable, bad config value)

mod macros;

use thiserror::Error;

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Data/store error (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<rusqlite::Error> for BlabberError {
    fn from(err: rusqlite::Error) -> Self {
        BlabberError::StoreUnavailable {
            operation: "query store".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Errors that can occur during blabber operations
#[derive(Error, Debug)]
pub enum BlabberError {
    // Usage errors (exit code 2)
    #[error("{0}")]
    UsageError(String),

    #[error("invalid {context}: {value}")]
    InvalidValue { context: String, value: String },

    // Data/store errors (exit code 3)
    /// A backing store could not be reached or rejected the operation.
    #[error("store unavailable: failed to {operation}: {reason}")]
    StoreUnavailable { operation: String, reason: String },

    /// An aggregation cycle failed partway and was abandoned.
    ///
    /// Never leaves the aggregator; it is logged and the next cycle starts fresh.
    #[error("aggregation cycle aborted during {phase}: {reason}")]
    CycleAborted { phase: String, reason: String },

    // Generic failures (exit code 1)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl BlabberError {
    /// Create an error for a failed store operation
    pub fn store_operation(operation: &str, error: impl std::fmt::Display) -> Self {
        BlabberError::StoreUnavailable {
            operation: operation.to_string(),
            reason: error.to_string(),
        }
    }

    /// Create an error for an aggregation cycle abandoned in `phase`
    pub fn cycle_aborted(phase: impl std::fmt::Display, error: impl std::fmt::Display) -> Self {
        BlabberError::CycleAborted {
            phase: phase.to_string(),
            reason: error.to_string(),
        }
    }

    /// Create an error for an invalid value or configuration
    pub fn invalid_value(context: &str, value: impl std::fmt::Display) -> Self {
        BlabberError::InvalidValue {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Whether the error came from a store that could not be reached
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, BlabberError::StoreUnavailable { .. })
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            BlabberError::UsageError(_) | BlabberError::InvalidValue { .. } => ExitCode::Usage,

            BlabberError::StoreUnavailable { .. } | BlabberError::CycleAborted { .. } => {
                ExitCode::Data
            }

            BlabberError::Io(_)
            | BlabberError::Json(_)
            | BlabberError::Toml(_)
            | BlabberError::Other(_) => ExitCode::Failure,
        }
    }

    /// Get the error type identifier
    fn error_type(&self) -> &'static str {
        match self {
            BlabberError::UsageError(_) => "usage_error",
            BlabberError::InvalidValue { .. } => "invalid_value",
            BlabberError::StoreUnavailable { .. } => "store_unavailable",
            BlabberError::CycleAborted { .. } => "cycle_aborted",
            BlabberError::Io(_) => "io_error",
            BlabberError::Json(_) => "json_error",
            BlabberError::Toml(_) => "toml_error",
            BlabberError::Other(_) => "other",
        }
    }

    /// Convert error to JSON representation for structured error output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for blabber operations
pub type Result<T> = std::result::Result<T, BlabberError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rusqlite_error_maps_to_store_unavailable() {
        let err: BlabberError = rusqlite::Error::InvalidQuery.into();
        assert!(err.is_store_unavailable());
        assert_eq!(err.exit_code(), ExitCode::Data);
    }

    #[test]
    fn test_usage_errors_exit_code_2() {
        assert_eq!(
            BlabberError::UsageError("bad".into()).exit_code(),
            ExitCode::Usage
        );
        assert_eq!(
            BlabberError::invalid_value("interval", 0).exit_code(),
            ExitCode::Usage
        );
    }

    #[test]
    fn test_to_json_envelope() {
        let err = BlabberError::store_operation("append post", "disk I/O error");
        let json = err.to_json();
        assert_eq!(json["error"]["code"], 3);
        assert_eq!(json["error"]["type"], "store_unavailable");
        assert_eq!(
            json["error"]["message"],
            "store unavailable: failed to append post: disk I/O error"
        );
    }

    #[test]
    fn test_cycle_aborted_message() {
        let err = BlabberError::cycle_aborted("scan", "locked");
        assert_eq!(
            err.to_string(),
            "aggregation cycle aborted during scan: locked"
        );
    }
}
