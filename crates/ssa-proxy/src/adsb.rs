//! Live aircraft positions from a public ADS-B aggregation feed.
//!
//! The feed is authoritative for aircraft tracking, so this path is used
//! unconditionally (never gated on SDR hardware). No credential required.

use crate::error::ProxyError;
use serde_json::{json, Value};
use tracing::debug;

const SERVICE: &str = "adsb";
const BASE_URL: &str = "https://api.adsb.lol/v2/point";

/// Kilometres per nautical mile, for the feed's radius parameter.
const KM_PER_NM: f64 = 1.852;

/// Fetch aircraft within `radius_km` of a point.
pub fn near(agent: &ureq::Agent, lat: f64, lon: f64, radius_km: f64) -> Result<Value, ProxyError> {
    let radius_nm = (radius_km / KM_PER_NM).ceil().max(1.0) as u32;
    let url = format!("{}/{:.4}/{:.4}/{}", BASE_URL, lat, lon, radius_nm);

    let response = agent
        .get(&url)
        .call()
        .map_err(|e| ProxyError::from_ureq(SERVICE, e))?;

    let body: Value = response.into_json().map_err(|e| ProxyError::Decode {
        service: SERVICE,
        message: e.to_string(),
    })?;

    let payload = map_aircraft(&body, lat, lon);
    debug!(count = payload["count"].as_u64(), "adsb fetch complete");
    Ok(payload)
}

/// Map the feed response into the fixed aircraft payload shape.
pub(crate) fn map_aircraft(body: &Value, origin_lat: f64, origin_lon: f64) -> Value {
    let aircraft: Vec<Value> = body["ac"]
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|ac| {
                    let lat = ac.get("lat")?.as_f64()?;
                    let lon = ac.get("lon")?.as_f64()?;
                    let distance_km = rough_distance_km(origin_lat, origin_lon, lat, lon);
                    Some(json!({
                        "callsign": ac.get("flight")
                            .and_then(Value::as_str)
                            .map(str::trim)
                            .unwrap_or(""),
                        "icao": ac.get("hex").cloned().unwrap_or(Value::Null),
                        "altitude": ac.get("alt_baro").cloned().unwrap_or(json!(0)),
                        "speed": ac.get("gs").cloned().unwrap_or(json!(0)),
                        "heading": ac.get("track").cloned().unwrap_or(json!(0)),
                        "lat": lat,
                        "lon": lon,
                        "squawk": ac.get("squawk").cloned().unwrap_or(Value::Null),
                        "registration": ac.get("r").cloned().unwrap_or(Value::Null),
                        "type": ac.get("t").cloned().unwrap_or(Value::Null),
                        "distance_km": (distance_km * 100.0).round() / 100.0,
                        "source": SERVICE,
                    }))
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        "aircraft": aircraft,
        "count": aircraft.len(),
        "method": "adsb_proxy",
    })
}

/// Equirectangular approximation; fine at tracking radii.
fn rough_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = lat2 - lat1;
    let dlon = (lon2 - lon1) * lat1.to_radians().cos();
    (dlat * dlat + dlon * dlon).sqrt() * 111.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_aircraft_shape() {
        let body = json!({
            "ac": [
                {
                    "flight": "UAL123  ",
                    "hex": "a1b2c3",
                    "alt_baro": 36000,
                    "gs": 460,
                    "track": 270,
                    "lat": 37.8,
                    "lon": -122.5,
                    "squawk": "2000",
                    "r": "N12345",
                    "t": "B738",
                }
            ]
        });

        let payload = map_aircraft(&body, 37.7749, -122.4194);
        assert_eq!(payload["count"], 1);
        let ac = &payload["aircraft"][0];
        assert_eq!(ac["callsign"], "UAL123");
        assert_eq!(ac["icao"], "a1b2c3");
        assert_eq!(ac["altitude"], 36000);
        assert!(ac["distance_km"].as_f64().unwrap() < 20.0);
    }

    #[test]
    fn test_positionless_aircraft_are_dropped() {
        let body = json!({"ac": [{"hex": "ffffff"}]});
        let payload = map_aircraft(&body, 0.0, 0.0);
        assert_eq!(payload["count"], 0);
    }

    #[test]
    fn test_rough_distance_sane() {
        // One degree of latitude is ~111 km
        let d = rough_distance_km(37.0, -122.0, 38.0, -122.0);
        assert!((d - 111.0).abs() < 1.0);
    }
}
