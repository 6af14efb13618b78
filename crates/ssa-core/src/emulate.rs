//! Synthetic data generation for degraded execution.
//!
//! When hardware is absent or a real executor fails, operations degrade
//! to these generators. Payloads are structurally identical to the real
//! ones, carry an unmistakable `"emulated": true` tag, use bounded
//! randomness so values stay physically plausible, and never fail:
//! generation is pure computation over the params value.

use rand::Rng;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A synthetic payload generator. Infallible by contract.
pub type Generator = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Operation-name-keyed catalog of generators.
pub struct SyntheticRegistry {
    generators: HashMap<&'static str, Generator>,
}

impl Default for SyntheticRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("wifi_scan", Arc::new(|p| wifi_scan(p)));
        registry.register("bluetooth_scan", Arc::new(|p| bluetooth_scan(p)));
        registry.register("handshake_capture", Arc::new(|p| handshake_capture(p)));
        registry.register("deauth_attack", Arc::new(|p| deauth_attack(p)));
        registry.register("nmap_scan", Arc::new(|p| nmap_scan(p)));
        registry.register("start_sdr", Arc::new(|p| sdr_start(p)));
        registry.register("tune_frequency", Arc::new(|p| sdr_start(p)));
        registry.register("spectrum_scan", Arc::new(|p| spectrum(p)));
        registry.register("track_aircraft", Arc::new(|p| aircraft(p)));
        registry.register("discover_cameras", Arc::new(|p| cameras(p)));
        registry.register("capture_frame", Arc::new(|p| camera_frame(p)));
        registry.register("audio_analysis", Arc::new(|p| audio_analysis(p)));
        registry.register("gps_position", Arc::new(|p| gps_position(p)));
        registry
    }
}

impl SyntheticRegistry {
    /// A registry with no generators. Tests build on this to observe
    /// exactly which generators run.
    pub fn empty() -> Self {
        Self {
            generators: HashMap::new(),
        }
    }

    pub fn register(&mut self, operation: &'static str, generator: Generator) {
        self.generators.insert(operation, generator);
    }

    /// Generate a synthetic payload, or `None` when the operation has
    /// no registered generator.
    pub fn generate(&self, operation: &str, params: &Value) -> Option<Value> {
        self.generators.get(operation).map(|g| g(params))
    }

    pub fn has_generator(&self, operation: &str) -> bool {
        self.generators.contains_key(operation)
    }

    pub fn operations(&self) -> Vec<&'static str> {
        let mut ops: Vec<&'static str> = self.generators.keys().copied().collect();
        ops.sort_unstable();
        ops
    }
}

const SSID_POOL: &[&str] = &[
    "HomeNet", "xfinitywifi", "NETGEAR47", "Linksys", "TP-Link_5G", "CoffeeShop_Guest",
    "FBI-Surveillance-Van", "PrettyFlyForAWifi", "ATT-2.4", "Verizon_Home",
];

const SECURITY_POOL: &[&str] = &["WPA2", "WPA2", "WPA3", "WPA", "Open", "WEP"];

const BT_NAME_POOL: &[&str] = &[
    "JBL Flip 5", "Galaxy Buds", "Tile Tracker", "Fitbit Charge", "Unknown Device",
    "MX Master 3", "AirPods Pro",
];

fn pick<'a>(rng: &mut impl Rng, pool: &'a [&'a str]) -> &'a str {
    pool[rng.random_range(0..pool.len())]
}

fn random_mac(rng: &mut impl Rng) -> String {
    format!(
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        rng.random_range(0..=255u32),
        rng.random_range(0..=255u32),
        rng.random_range(0..=255u32),
        rng.random_range(0..=255u32),
        rng.random_range(0..=255u32),
        rng.random_range(0..=255u32)
    )
}

/// 5-15 plausible access points, signals in the -90..-30 dBm band.
fn wifi_scan(params: &Value) -> Value {
    let mut rng = rand::rng();
    let count = rng.random_range(5..=15);
    let networks: Vec<Value> = (0..count)
        .map(|_| {
            let channel: u32 = if rng.random_bool(0.6) {
                rng.random_range(1..=11)
            } else {
                [36, 40, 44, 48, 149, 153, 157, 161][rng.random_range(0..8)]
            };
            json!({
                "ssid": format!("{}_{}", pick(&mut rng, SSID_POOL), rng.random_range(10..100)),
                "bssid": random_mac(&mut rng),
                "channel": channel,
                "signal": rng.random_range(-90..=-30),
                "security": pick(&mut rng, SECURITY_POOL),
            })
        })
        .collect();

    json!({
        "count": networks.len(),
        "networks": networks,
        "interface": params.get("interface").cloned().unwrap_or(json!("wlan0")),
        "method": "emulated_scan",
        "emulated": true,
    })
}

fn bluetooth_scan(_params: &Value) -> Value {
    let mut rng = rand::rng();
    let count = rng.random_range(2..=8);
    let devices: Vec<Value> = (0..count)
        .map(|_| {
            json!({
                "mac": random_mac(&mut rng),
                "name": pick(&mut rng, BT_NAME_POOL),
            })
        })
        .collect();

    json!({
        "count": devices.len(),
        "devices": devices,
        "method": "emulated_scan",
        "emulated": true,
    })
}

fn handshake_capture(params: &Value) -> Value {
    let mut rng = rand::rng();
    json!({
        "bssid": params.get("bssid").cloned().unwrap_or_else(|| json!(random_mac(&mut rng))),
        "eapol_frames": rng.random_range(2..=4),
        "complete": rng.random_bool(0.7),
        "method": "emulated_capture",
        "emulated": true,
    })
}

fn deauth_attack(params: &Value) -> Value {
    let mut rng = rand::rng();
    json!({
        "target": params.get("target").cloned().unwrap_or(Value::Null),
        "frames_sent": rng.random_range(10..=64),
        "method": "emulated_deauth",
        "emulated": true,
    })
}

const COMMON_PORTS: &[(u16, &str)] = &[
    (21, "ftp"),
    (22, "ssh"),
    (23, "telnet"),
    (25, "smtp"),
    (53, "dns"),
    (80, "http"),
    (110, "pop3"),
    (139, "netbios"),
    (143, "imap"),
    (443, "https"),
    (445, "smb"),
    (3306, "mysql"),
    (3389, "rdp"),
    (8080, "http-proxy"),
];

/// A plausible host scan: a random subset of well-known ports open.
fn nmap_scan(params: &Value) -> Value {
    let mut rng = rand::rng();
    let ports: Vec<Value> = COMMON_PORTS
        .iter()
        .filter(|_| rng.random_bool(0.3))
        .map(|(port, service)| {
            json!({ "port": port, "state": "open", "service": service })
        })
        .collect();

    json!({
        "target": params.get("target").cloned().unwrap_or(json!("192.168.1.1")),
        "hosts": [{
            "address": params.get("target").cloned().unwrap_or(json!("192.168.1.1")),
            "status": "up",
            "ports": ports,
        }],
        "method": "emulated_scan",
        "emulated": true,
    })
}

const SPECTRUM_BINS: usize = 1024;

fn frequency_from(params: &Value) -> f64 {
    params
        .get("frequency")
        .and_then(Value::as_f64)
        .unwrap_or(100.0)
}

/// Mirrors the tune confirmation the real dongle path reports.
fn sdr_start(params: &Value) -> Value {
    json!({
        "frequency": frequency_from(params),
        "device": "0:  Emulated, RTL2838UHIDIR, SN: 00000000",
        "started": true,
        "method": "emulated_sdr",
        "emulated": true,
    })
}

/// Noise floor around -90 dB with a few gaussian carrier peaks, raw
/// dB per bin like a real power sweep.
fn spectrum(params: &Value) -> Value {
    let mut rng = rand::rng();
    let frequency = frequency_from(params);

    let mut power_db: Vec<f64> = (0..SPECTRUM_BINS)
        .map(|_| -90.0 + rng.random_range(0.0..6.0))
        .collect();

    for _ in 0..rng.random_range(2..=5) {
        let center = rng.random_range(0..SPECTRUM_BINS) as f64;
        let height = rng.random_range(20.0..50.0);
        let width = rng.random_range(2.0..12.0);
        for (i, bin) in power_db.iter_mut().enumerate() {
            let d = i as f64 - center;
            *bin += height * (-d * d / (2.0 * width * width)).exp();
        }
    }

    // Overlapping carriers saturate like a real front end
    for bin in &mut power_db {
        *bin = bin.min(-5.0);
    }

    json!({
        "frequency": frequency,
        "bins": SPECTRUM_BINS,
        "power_db": power_db,
        "method": "emulated_sweep",
        "emulated": true,
    })
}

const CALLSIGN_PREFIXES: &[&str] = &["UAL", "DAL", "SWA", "AAL", "SKW", "ASA", "JBU"];

/// Aircraft with altitude and speed inside realistic envelopes.
fn aircraft(params: &Value) -> Value {
    let mut rng = rand::rng();
    let lat = params.get("lat").and_then(Value::as_f64).unwrap_or(37.7749);
    let lon = params.get("lon").and_then(Value::as_f64).unwrap_or(-122.4194);

    let count = rng.random_range(1..=8);
    let aircraft: Vec<Value> = (0..count)
        .map(|_| {
            json!({
                "callsign": format!("{}{}", pick(&mut rng, CALLSIGN_PREFIXES), rng.random_range(100..9999)),
                "icao": format!("{:06x}", rng.random_range(0..0xFFFFFFu32)),
                "altitude": rng.random_range(5_000..=40_000),
                "speed": rng.random_range(200..=600),
                "heading": rng.random_range(0..360),
                "lat": lat + rng.random_range(-0.5..0.5),
                "lon": lon + rng.random_range(-0.5..0.5),
            })
        })
        .collect();

    json!({
        "count": aircraft.len(),
        "aircraft": aircraft,
        "method": "emulated_adsb",
        "emulated": true,
    })
}

fn cameras(_params: &Value) -> Value {
    json!({
        "devices": [
            { "device": "/dev/video0", "name": "Emulated Capture Device" }
        ],
        "count": 1,
        "method": "emulated_discovery",
        "emulated": true,
    })
}

fn camera_frame(params: &Value) -> Value {
    json!({
        "device": params.get("device").cloned().unwrap_or(json!("/dev/video0")),
        "width": 640,
        "height": 480,
        "format": "YUYV",
        "method": "emulated_frame",
        "emulated": true,
    })
}

/// Mirrors the ALSA capture-device enumeration shape.
fn audio_analysis(_params: &Value) -> Value {
    json!({
        "devices": [
            { "card": 0, "name": "Emulated Capture Device" }
        ],
        "count": 1,
        "method": "emulated_enumeration",
        "emulated": true,
    })
}

fn gps_position(params: &Value) -> Value {
    let mut rng = rand::rng();
    let lat = params.get("lat").and_then(Value::as_f64).unwrap_or(37.7749);
    let lon = params.get("lon").and_then(Value::as_f64).unwrap_or(-122.4194);
    json!({
        "lat": lat + rng.random_range(-0.001..0.001),
        "lon": lon + rng.random_range(-0.001..0.001),
        "altitude_m": rng.random_range(0.0..120.0),
        "satellites": rng.random_range(4..=12),
        "fix": "3d",
        "method": "emulated_fix",
        "emulated": true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_generator_tags_emulated() {
        let registry = SyntheticRegistry::default();
        for op in registry.operations() {
            let payload = registry.generate(op, &json!({})).unwrap();
            assert_eq!(payload["emulated"], true, "operation {} missing tag", op);
        }
    }

    #[test]
    fn test_unknown_operation_has_no_generator() {
        let registry = SyntheticRegistry::default();
        assert!(registry.generate("kill_internet", &json!({})).is_none());
        assert!(!registry.has_generator("geolocate_ip"));
        // Host telemetry is never faked
        assert!(!registry.has_generator("monitor_resources"));
    }

    #[test]
    fn test_wifi_signal_bounds() {
        for _ in 0..10 {
            let payload = wifi_scan(&json!({}));
            let networks = payload["networks"].as_array().unwrap();
            assert!((5..=15).contains(&networks.len()));
            for n in networks {
                let signal = n["signal"].as_i64().unwrap();
                assert!((-90..=-30).contains(&signal));
            }
        }
    }

    #[test]
    fn test_sdr_start_matches_tune_confirmation_shape() {
        let payload = sdr_start(&json!({"frequency": 433.92}));
        assert_eq!(payload["frequency"], 433.92);
        assert_eq!(payload["started"], true);
        assert!(payload["device"].as_str().is_some());
        assert!(payload.get("power_db").is_none());
    }

    #[test]
    fn test_spectrum_matches_sweep_shape() {
        let payload = spectrum(&json!({"frequency": 433.92}));
        assert_eq!(payload["frequency"], 433.92);
        assert_eq!(payload["bins"], SPECTRUM_BINS);
        let power_db = payload["power_db"].as_array().unwrap();
        assert_eq!(power_db.len(), SPECTRUM_BINS);
        // Raw dB values: noise floor near -90, carriers saturate below 0
        for v in power_db {
            let v = v.as_f64().unwrap();
            assert!((-95.0..=-5.0).contains(&v));
        }
    }

    #[test]
    fn test_spectrum_defaults_frequency() {
        let payload = spectrum(&json!({}));
        assert_eq!(payload["frequency"], 100.0);
    }

    #[test]
    fn test_audio_matches_enumeration_shape() {
        let payload = audio_analysis(&json!({}));
        assert_eq!(payload["count"], 1);
        let devices = payload["devices"].as_array().unwrap();
        assert!(devices[0]["card"].is_u64());
        assert!(devices[0]["name"].as_str().is_some());
        assert!(payload.get("level_db").is_none());
    }

    #[test]
    fn test_aircraft_envelopes() {
        for _ in 0..10 {
            let payload = aircraft(&json!({"lat": 40.0, "lon": -74.0}));
            for ac in payload["aircraft"].as_array().unwrap() {
                let alt = ac["altitude"].as_i64().unwrap();
                let speed = ac["speed"].as_i64().unwrap();
                assert!((5_000..=40_000).contains(&alt));
                assert!((200..=600).contains(&speed));
                assert!((ac["lat"].as_f64().unwrap() - 40.0).abs() <= 0.5);
            }
        }
    }

    #[test]
    fn test_nmap_echoes_target() {
        let payload = nmap_scan(&json!({"target": "10.0.0.5"}));
        assert_eq!(payload["target"], "10.0.0.5");
        assert_eq!(payload["hosts"][0]["status"], "up");
    }

    #[test]
    fn test_custom_generator_registration() {
        let mut registry = SyntheticRegistry::empty();
        registry.register("probe", Arc::new(|_| json!({"ok": true, "emulated": true})));
        assert_eq!(registry.generate("probe", &json!({})).unwrap()["ok"], true);
    }
}
