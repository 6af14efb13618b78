//! IP geolocation and reverse geocoding clients.
//!
//! Both services use a keyed primary with a keyless community fallback
//! that is consulted only after the primary call fails. Missing the
//! primary credential is reported as "not configured" before any call
//! is attempted.

use crate::error::ProxyError;
use serde_json::{json, Value};
use tracing::{debug, warn};

const GEOLOCATE_SERVICE: &str = "ipgeolocation";
const GEOCODE_SERVICE: &str = "opencage";

const IPGEO_URL: &str = "https://api.ipgeolocation.io/ipgeo";
const IPAPI_URL: &str = "http://ip-api.com/json";
const OPENCAGE_URL: &str = "https://api.opencagedata.com/geocode/v1/json";
const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Geolocate an IP via ipgeolocation.io, falling back to ip-api.com.
pub fn geolocate_ip(agent: &ureq::Agent, key: &str, ip: &str) -> Result<Value, ProxyError> {
    match geolocate_primary(agent, key, ip) {
        Ok(payload) => Ok(payload),
        Err(primary_err) => {
            warn!(error = %primary_err, "keyed geolocation failed, trying community fallback");
            geolocate_fallback(agent, ip).map_err(|_| primary_err)
        }
    }
}

fn geolocate_primary(agent: &ureq::Agent, key: &str, ip: &str) -> Result<Value, ProxyError> {
    let response = agent
        .get(IPGEO_URL)
        .query("apiKey", key)
        .query("ip", ip)
        .call()
        .map_err(|e| ProxyError::from_ureq(GEOLOCATE_SERVICE, e))?;

    let body: Value = response.into_json().map_err(|e| ProxyError::Decode {
        service: GEOLOCATE_SERVICE,
        message: e.to_string(),
    })?;

    Ok(json!({ "location": body, "method": "ipgeolocation_proxy" }))
}

fn geolocate_fallback(agent: &ureq::Agent, ip: &str) -> Result<Value, ProxyError> {
    let url = format!("{}/{}", IPAPI_URL, ip);
    let response = agent
        .get(&url)
        .call()
        .map_err(|e| ProxyError::from_ureq(GEOLOCATE_SERVICE, e))?;

    let body: Value = response.into_json().map_err(|e| ProxyError::Decode {
        service: GEOLOCATE_SERVICE,
        message: e.to_string(),
    })?;

    let payload = map_ipapi(&body);
    debug!(ip, "community geolocation fallback used");
    Ok(payload)
}

/// Map the ip-api.com response into the fixed location payload shape.
pub(crate) fn map_ipapi(body: &Value) -> Value {
    json!({
        "location": {
            "ip": body.get("query").cloned().unwrap_or(Value::Null),
            "city": body.get("city").cloned().unwrap_or(Value::Null),
            "region": body.get("regionName").cloned().unwrap_or(Value::Null),
            "country": body.get("country").cloned().unwrap_or(Value::Null),
            "lat": body.get("lat").cloned().unwrap_or(Value::Null),
            "lon": body.get("lon").cloned().unwrap_or(Value::Null),
            "isp": body.get("isp").cloned().unwrap_or(Value::Null),
            "org": body.get("org").cloned().unwrap_or(Value::Null),
            "timezone": body.get("timezone").cloned().unwrap_or(Value::Null),
        },
        "method": "ipapi_fallback",
    })
}

/// Reverse geocode via OpenCage, falling back to Nominatim.
pub fn reverse_geocode(
    agent: &ureq::Agent,
    key: &str,
    lat: f64,
    lon: f64,
) -> Result<Value, ProxyError> {
    match geocode_primary(agent, key, lat, lon) {
        Ok(payload) => Ok(payload),
        Err(primary_err) => {
            warn!(error = %primary_err, "keyed geocoding failed, trying community fallback");
            geocode_fallback(agent, lat, lon).map_err(|_| primary_err)
        }
    }
}

fn geocode_primary(
    agent: &ureq::Agent,
    key: &str,
    lat: f64,
    lon: f64,
) -> Result<Value, ProxyError> {
    let response = agent
        .get(OPENCAGE_URL)
        .query("q", &format!("{},{}", lat, lon))
        .query("key", key)
        .call()
        .map_err(|e| ProxyError::from_ureq(GEOCODE_SERVICE, e))?;

    let body: Value = response.into_json().map_err(|e| ProxyError::Decode {
        service: GEOCODE_SERVICE,
        message: e.to_string(),
    })?;

    let address = body["results"]
        .as_array()
        .and_then(|r| r.first())
        .cloned()
        .ok_or(ProxyError::Decode {
            service: GEOCODE_SERVICE,
            message: "no results in geocode response".to_string(),
        })?;

    Ok(json!({ "address": address, "method": "opencage_proxy" }))
}

fn geocode_fallback(agent: &ureq::Agent, lat: f64, lon: f64) -> Result<Value, ProxyError> {
    let response = agent
        .get(NOMINATIM_URL)
        .query("lat", &lat.to_string())
        .query("lon", &lon.to_string())
        .query("format", "json")
        .call()
        .map_err(|e| ProxyError::from_ureq(GEOCODE_SERVICE, e))?;

    let body: Value = response.into_json().map_err(|e| ProxyError::Decode {
        service: GEOCODE_SERVICE,
        message: e.to_string(),
    })?;

    Ok(json!({ "address": body, "method": "nominatim_fallback" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_ipapi_shape() {
        let body = json!({
            "query": "8.8.8.8",
            "city": "Mountain View",
            "regionName": "California",
            "country": "United States",
            "lat": 37.386,
            "lon": -122.0838,
            "isp": "Google LLC",
            "org": "Google Public DNS",
            "timezone": "America/Los_Angeles",
        });

        let payload = map_ipapi(&body);
        assert_eq!(payload["location"]["ip"], "8.8.8.8");
        assert_eq!(payload["location"]["city"], "Mountain View");
        assert_eq!(payload["method"], "ipapi_fallback");
    }

    #[test]
    fn test_map_ipapi_missing_fields_are_null() {
        let payload = map_ipapi(&json!({}));
        assert!(payload["location"]["city"].is_null());
        assert!(payload["location"]["lat"].is_null());
    }
}
