//! WiGLE network search client.
//!
//! <https://api.wigle.net/api/v2/network/search> with basic auth from the
//! `name:token` credential pair.

use crate::error::ProxyError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use tracing::debug;

const SERVICE: &str = "wigle";
const SEARCH_URL: &str = "https://api.wigle.net/api/v2/network/search";

/// Search observed networks in a bounding box around (lat, lon).
pub fn search(
    agent: &ureq::Agent,
    key: &str,
    lat: f64,
    lon: f64,
    radius_deg: f64,
) -> Result<Value, ProxyError> {
    let auth = format!("Basic {}", STANDARD.encode(key));

    let response = agent
        .get(SEARCH_URL)
        .set("Authorization", &auth)
        .query("latrange1", &(lat - radius_deg).to_string())
        .query("latrange2", &(lat + radius_deg).to_string())
        .query("longrange1", &(lon - radius_deg).to_string())
        .query("longrange2", &(lon + radius_deg).to_string())
        .call()
        .map_err(|e| ProxyError::from_ureq(SERVICE, e))?;

    let body: Value = response.into_json().map_err(|e| ProxyError::Decode {
        service: SERVICE,
        message: e.to_string(),
    })?;

    let payload = map_networks(&body);
    debug!(count = payload["count"].as_u64(), "wigle search complete");
    Ok(payload)
}

/// Map the WiGLE response into the fixed wifi-scan payload shape.
pub(crate) fn map_networks(body: &Value) -> Value {
    let networks: Vec<Value> = body["results"]
        .as_array()
        .map(|results| {
            results
                .iter()
                .map(|r| {
                    json!({
                        "ssid": r.get("ssid").cloned().unwrap_or(Value::Null),
                        "bssid": r.get("netid").cloned().unwrap_or(Value::Null),
                        "signal": r.get("signal").cloned().unwrap_or(json!(-70)),
                        "channel": r.get("channel").cloned().unwrap_or(Value::Null),
                        "security": r.get("encryption").cloned().unwrap_or(Value::Null),
                        "lat": r.get("trilat").cloned().unwrap_or(Value::Null),
                        "lon": r.get("trilong").cloned().unwrap_or(Value::Null),
                        "source": SERVICE,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        "networks": networks,
        "count": networks.len(),
        "method": "wigle_proxy",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_networks_shape() {
        let body = json!({
            "results": [
                {
                    "ssid": "CoffeeShop_WiFi",
                    "netid": "aa:bb:cc:dd:ee:ff",
                    "signal": -61,
                    "channel": 6,
                    "encryption": "wpa2",
                    "trilat": 37.77,
                    "trilong": -122.41,
                }
            ]
        });

        let payload = map_networks(&body);
        assert_eq!(payload["count"], 1);
        let network = &payload["networks"][0];
        assert_eq!(network["ssid"], "CoffeeShop_WiFi");
        assert_eq!(network["bssid"], "aa:bb:cc:dd:ee:ff");
        assert_eq!(network["signal"], -61);
        assert_eq!(network["source"], "wigle");
    }

    #[test]
    fn test_map_networks_empty_results() {
        let payload = map_networks(&json!({}));
        assert_eq!(payload["count"], 0);
        assert!(payload["networks"].as_array().unwrap().is_empty());
    }
}
