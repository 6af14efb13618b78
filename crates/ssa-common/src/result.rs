//! The tagged result union every operation returns.
//!
//! Every call that flows through the master controller resolves to an
//! `OperationResult`: real hardware output, a synthetic substitute, a
//! remote-proxy relay, or a structured error. Exactly one tag is set by
//! construction, and payload shape per operation is identical across the
//! hardware/emulated/proxy tags so callers never special-case the source
//! beyond reading the tag itself.

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Provenance tag for an operation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Real local hardware or tool output.
    Hardware,
    /// Synthetic substitute payload.
    Emulated,
    /// Relayed from a third-party service client.
    Proxy,
    /// Structured failure.
    Error,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Hardware => write!(f, "hardware"),
            Source::Emulated => write!(f, "emulated"),
            Source::Proxy => write!(f, "proxy"),
            Source::Error => write!(f, "error"),
        }
    }
}

/// Result of a single operation, tagged with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum OperationResult {
    /// The real executor ran and produced this payload.
    Hardware {
        payload: Value,
        timestamp: DateTime<Utc>,
    },

    /// The synthetic generator produced this payload.
    Emulated {
        payload: Value,
        timestamp: DateTime<Utc>,
    },

    /// A remote proxy client produced this payload.
    Proxy {
        payload: Value,
        timestamp: DateTime<Utc>,
    },

    /// The operation failed; `details` may carry recovery hints such as
    /// the valid module or action catalog.
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
        timestamp: DateTime<Utc>,
    },
}

impl OperationResult {
    /// Wrap real hardware output.
    pub fn hardware(payload: Value) -> Self {
        OperationResult::Hardware {
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Wrap a synthetic payload.
    pub fn emulated(payload: Value) -> Self {
        OperationResult::Emulated {
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Wrap a proxy relay payload.
    pub fn proxy(payload: Value) -> Self {
        OperationResult::Proxy {
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Build an error result with just a message.
    pub fn error(message: impl Into<String>) -> Self {
        OperationResult::Error {
            message: message.into(),
            details: None,
            timestamp: Utc::now(),
        }
    }

    /// Build an error result with structured details.
    pub fn error_with(message: impl Into<String>, details: Value) -> Self {
        OperationResult::Error {
            message: message.into(),
            details: Some(details),
            timestamp: Utc::now(),
        }
    }

    /// Convert a structured [`Error`] into an error result, attaching
    /// discoverability hints for dispatch errors.
    pub fn from_error(err: &Error) -> Self {
        let details = match err {
            Error::UnknownModule { valid, .. } => Some(json!({
                "code": err.code(),
                "category": err.category(),
                "valid_modules": valid,
            })),
            Error::UnknownAction { available, .. } => Some(json!({
                "code": err.code(),
                "category": err.category(),
                "available_actions": available,
            })),
            _ => Some(json!({
                "code": err.code(),
                "category": err.category(),
                "recoverable": err.is_recoverable(),
            })),
        };

        OperationResult::Error {
            message: err.to_string(),
            details,
            timestamp: Utc::now(),
        }
    }

    /// The provenance tag of this result.
    pub fn source(&self) -> Source {
        match self {
            OperationResult::Hardware { .. } => Source::Hardware,
            OperationResult::Emulated { .. } => Source::Emulated,
            OperationResult::Proxy { .. } => Source::Proxy,
            OperationResult::Error { .. } => Source::Error,
        }
    }

    /// Whether this result is error-tagged.
    pub fn is_error(&self) -> bool {
        matches!(self, OperationResult::Error { .. })
    }

    /// The domain payload, if this is a non-error result.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            OperationResult::Hardware { payload, .. }
            | OperationResult::Emulated { payload, .. }
            | OperationResult::Proxy { payload, .. } => Some(payload),
            OperationResult::Error { .. } => None,
        }
    }

    /// The error message, if this is an error result.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            OperationResult::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// The error details, if this is an error result carrying any.
    pub fn error_details(&self) -> Option<&Value> {
        match self {
            OperationResult::Error { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}
