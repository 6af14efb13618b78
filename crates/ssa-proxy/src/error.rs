//! Proxy error taxonomy.

use thiserror::Error;

/// Errors from remote proxy calls.
///
/// `NotConfigured` means the credential was absent at startup and no call
/// was attempted; everything else means a call was attempted and failed.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{service} is not configured: missing API credential")]
    NotConfigured { service: &'static str },

    #[error("{service} returned HTTP {code}")]
    Status { service: &'static str, code: u16 },

    #[error("{service} call failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    #[error("{service} returned an unreadable payload: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl ProxyError {
    /// The service this error belongs to.
    pub fn service(&self) -> &'static str {
        match self {
            ProxyError::NotConfigured { service }
            | ProxyError::Status { service, .. }
            | ProxyError::Transport { service, .. }
            | ProxyError::Decode { service, .. } => service,
        }
    }

    /// Whether this is a deployment/configuration gap rather than a
    /// (possibly transient) call failure.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ProxyError::NotConfigured { .. })
    }

    /// Classify a `ureq` error for the given service.
    pub fn from_ureq(service: &'static str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => ProxyError::Status { service, code },
            ureq::Error::Transport(t) => ProxyError::Transport {
                service,
                message: t.to_string(),
            },
        }
    }
}

impl From<ProxyError> for ssa_common::Error {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::NotConfigured { service } => ssa_common::Error::ProxyNotConfigured {
                service: service.to_string(),
            },
            other => ssa_common::Error::ProxyCallFailed {
                service: other.service().to_string(),
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_is_configuration() {
        let err = ProxyError::NotConfigured { service: "shodan" };
        assert!(err.is_configuration());
        assert_eq!(err.service(), "shodan");
    }

    #[test]
    fn test_status_is_not_configuration() {
        let err = ProxyError::Status {
            service: "wigle",
            code: 429,
        };
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn test_conversion_preserves_distinction() {
        let not_configured: ssa_common::Error =
            ProxyError::NotConfigured { service: "windy" }.into();
        assert!(matches!(
            not_configured,
            ssa_common::Error::ProxyNotConfigured { .. }
        ));

        let failed: ssa_common::Error = ProxyError::Transport {
            service: "windy",
            message: "timed out".into(),
        }
        .into();
        assert!(matches!(failed, ssa_common::Error::ProxyCallFailed { .. }));
    }
}
