//! Error types for SkySeeAll.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//!
//! Errors never escape the master controller's public entry points as
//! panics or raw `Err` values; they are converted to error-tagged
//! `OperationResult` records at the dispatch boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for SkySeeAll operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file or environment errors.
    Config,
    /// Capability detection and availability errors.
    Capability,
    /// Real-path or synthetic-path execution errors.
    Execution,
    /// Module/action dispatch errors.
    Dispatch,
    /// Remote proxy client errors.
    Proxy,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Capability => write!(f, "capability"),
            ErrorCategory::Execution => write!(f, "execution"),
            ErrorCategory::Dispatch => write!(f, "dispatch"),
            ErrorCategory::Proxy => write!(f, "proxy"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for SkySeeAll.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid settings file: {0}")]
    InvalidSettings(String),

    // Capability errors (20-29)
    #[error("capability not available: {0}")]
    CapabilityMissing(String),

    // Execution errors (30-39)
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("no fallback available for operation '{operation}'")]
    NoFallback { operation: String },

    #[error("operation '{operation}' is busy: another exclusive operation is in flight")]
    Busy { operation: String },

    // Dispatch errors (40-49)
    #[error("unknown module: {module}")]
    UnknownModule {
        module: String,
        valid: Vec<&'static str>,
    },

    #[error("action '{action}' not found in module '{module}'")]
    UnknownAction {
        module: String,
        action: String,
        available: Vec<&'static str>,
    },

    #[error("{module} is disabled")]
    ModuleDisabled { module: String },

    // Proxy errors (50-59)
    #[error("proxy '{service}' is not configured: missing API credential")]
    ProxyNotConfigured { service: String },

    #[error("proxy '{service}' call failed: {reason}")]
    ProxyCallFailed { service: String, reason: String },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the stable error code for this error type.
    ///
    /// Error codes are grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Capability errors
    /// - 30-39: Execution errors
    /// - 40-49: Dispatch errors
    /// - 50-59: Proxy errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidSettings(_) => 11,
            Error::CapabilityMissing(_) => 20,
            Error::ExecutionFailed(_) => 30,
            Error::NoFallback { .. } => 31,
            Error::Busy { .. } => 32,
            Error::UnknownModule { .. } => 40,
            Error::UnknownAction { .. } => 41,
            Error::ModuleDisabled { .. } => 42,
            Error::ProxyNotConfigured { .. } => 50,
            Error::ProxyCallFailed { .. } => 51,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidSettings(_) => ErrorCategory::Config,

            Error::CapabilityMissing(_) => ErrorCategory::Capability,

            Error::ExecutionFailed(_) | Error::NoFallback { .. } | Error::Busy { .. } => {
                ErrorCategory::Execution
            }

            Error::UnknownModule { .. }
            | Error::UnknownAction { .. }
            | Error::ModuleDisabled { .. } => ErrorCategory::Dispatch,

            Error::ProxyNotConfigured { .. } | Error::ProxyCallFailed { .. } => {
                ErrorCategory::Proxy
            }

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Config: recoverable by fixing settings
            Error::Config(_) => true,
            Error::InvalidSettings(_) => true,

            // Capability: recoverable by attaching/enabling hardware
            Error::CapabilityMissing(_) => true,

            // Execution: busy is transient, missing fallback is not
            Error::ExecutionFailed(_) => true,
            Error::NoFallback { .. } => false,
            Error::Busy { .. } => true,

            // Dispatch: caller bugs, fixed by using the catalog
            Error::UnknownModule { .. } => false,
            Error::UnknownAction { .. } => false,
            Error::ModuleDisabled { .. } => true,

            // Proxy: missing credential is a deployment concern,
            // call failure may be transient
            Error::ProxyNotConfigured { .. } => false,
            Error::ProxyCallFailed { .. } => true,

            // I/O: often transient
            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_grouped_by_category() {
        let cases: Vec<(Error, u32, ErrorCategory)> = vec![
            (Error::Config("x".into()), 10, ErrorCategory::Config),
            (
                Error::CapabilityMissing("sdr".into()),
                20,
                ErrorCategory::Capability,
            ),
            (
                Error::NoFallback {
                    operation: "x".into(),
                },
                31,
                ErrorCategory::Execution,
            ),
            (
                Error::UnknownModule {
                    module: "bogus".into(),
                    valid: vec!["tactical"],
                },
                40,
                ErrorCategory::Dispatch,
            ),
            (
                Error::ProxyNotConfigured {
                    service: "wigle".into(),
                },
                50,
                ErrorCategory::Proxy,
            ),
        ];

        for (err, code, category) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.category(), category);
        }
    }

    #[test]
    fn test_busy_is_recoverable() {
        let err = Error::Busy {
            operation: "nmap_scan".into(),
        };
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_not_configured_is_not_recoverable() {
        let err = Error::ProxyNotConfigured {
            service: "shodan".into(),
        };
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("missing API credential"));
    }

    #[test]
    fn test_unknown_action_display() {
        let err = Error::UnknownAction {
            module: "tactical".into(),
            action: "bogus".into(),
            available: vec!["wifi_scan", "nmap_scan"],
        };
        assert!(err.to_string().contains("tactical"));
        assert!(err.to_string().contains("bogus"));
    }
}
