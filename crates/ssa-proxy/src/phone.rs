//! Phone number lookup via NumVerify.

use crate::error::ProxyError;
use serde_json::{json, Value};

const SERVICE: &str = "numverify";
const VALIDATE_URL: &str = "https://apilayer.net/api/validate";

/// Validate and look up a phone number.
pub fn lookup(agent: &ureq::Agent, key: &str, number: &str) -> Result<Value, ProxyError> {
    let response = agent
        .get(VALIDATE_URL)
        .query("access_key", key)
        .query("number", number)
        .query("format", "1")
        .call()
        .map_err(|e| ProxyError::from_ureq(SERVICE, e))?;

    let body: Value = response.into_json().map_err(|e| ProxyError::Decode {
        service: SERVICE,
        message: e.to_string(),
    })?;

    check_in_band_error(&body)?;

    Ok(json!({ "phone_info": body, "method": "numverify_proxy" }))
}

/// NumVerify reports failures in-band with HTTP 200; surface them as
/// call failures rather than passing an error document downstream.
fn check_in_band_error(body: &Value) -> Result<(), ProxyError> {
    match body.get("error") {
        Some(error) => Err(ProxyError::Transport {
            service: SERVICE,
            message: error
                .get("info")
                .and_then(Value::as_str)
                .unwrap_or("unspecified API error")
                .to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_band_error_is_a_call_failure() {
        let body = json!({"error": {"info": "invalid access key"}});
        let err = check_in_band_error(&body).unwrap_err();
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("invalid access key"));
    }

    #[test]
    fn test_clean_body_passes() {
        let body = json!({"valid": true, "number": "14155552671"});
        assert!(check_in_band_error(&body).is_ok());
    }
}
