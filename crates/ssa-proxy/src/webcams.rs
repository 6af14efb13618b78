//! Public webcam discovery via the Windy webcams API.

use crate::error::ProxyError;
use serde_json::{json, Value};
use tracing::debug;

const SERVICE: &str = "windy";
const NEARBY_URL: &str = "https://api.windy.com/webcams/api/v3/webcams";

/// Find public webcams within `radius_km` of a point.
pub fn nearby(
    agent: &ureq::Agent,
    key: &str,
    lat: f64,
    lon: f64,
    radius_km: u32,
) -> Result<Value, ProxyError> {
    let response = agent
        .get(NEARBY_URL)
        .set("x-windy-api-key", key)
        .query("nearby", &format!("{},{},{}", lat, lon, radius_km))
        .query("include", "location,images,player")
        .call()
        .map_err(|e| ProxyError::from_ureq(SERVICE, e))?;

    let body: Value = response.into_json().map_err(|e| ProxyError::Decode {
        service: SERVICE,
        message: e.to_string(),
    })?;

    let payload = map_webcams(&body);
    debug!(count = payload["count"].as_u64(), "windy fetch complete");
    Ok(payload)
}

/// Map the Windy response into the fixed webcam payload shape.
pub(crate) fn map_webcams(body: &Value) -> Value {
    let webcams: Vec<Value> = body["webcams"]
        .as_array()
        .map(|cams| {
            cams.iter()
                .map(|cam| {
                    json!({
                        "id": cam.get("webcamId").cloned().unwrap_or(Value::Null),
                        "title": cam.get("title").cloned().unwrap_or(Value::Null),
                        "lat": cam.pointer("/location/latitude").cloned().unwrap_or(Value::Null),
                        "lon": cam.pointer("/location/longitude").cloned().unwrap_or(Value::Null),
                        "image": cam.pointer("/images/current/preview").cloned().unwrap_or(Value::Null),
                        "player": cam.pointer("/player/live").cloned().unwrap_or(Value::Null),
                        "source": SERVICE,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        "webcams": webcams,
        "count": webcams.len(),
        "method": "windy_proxy",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_webcams_shape() {
        let body = json!({
            "webcams": [
                {
                    "webcamId": 1234,
                    "title": "Golden Gate",
                    "location": {"latitude": 37.81, "longitude": -122.48},
                    "images": {"current": {"preview": "https://example.com/p.jpg"}},
                    "player": {"live": "https://example.com/live"},
                }
            ]
        });

        let payload = map_webcams(&body);
        assert_eq!(payload["count"], 1);
        let cam = &payload["webcams"][0];
        assert_eq!(cam["id"], 1234);
        assert_eq!(cam["lat"], 37.81);
        assert_eq!(cam["image"], "https://example.com/p.jpg");
    }

    #[test]
    fn test_map_webcams_empty() {
        let payload = map_webcams(&json!({}));
        assert_eq!(payload["count"], 0);
    }
}
