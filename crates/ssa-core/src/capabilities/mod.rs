//! Hardware capability model: what this host can actually do.

mod detect;

pub use detect::{detect, PROBE_TIMEOUT};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One detectable hardware capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    WifiManaged,
    WifiMonitor,
    Bluetooth,
    Sdr,
    Camera,
    Microphone,
    Gps,
    Internet,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Capability::WifiManaged,
        Capability::WifiMonitor,
        Capability::Bluetooth,
        Capability::Sdr,
        Capability::Camera,
        Capability::Microphone,
        Capability::Gps,
        Capability::Internet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::WifiManaged => "wifi_managed",
            Capability::WifiMonitor => "wifi_monitor",
            Capability::Bluetooth => "bluetooth",
            Capability::Sdr => "sdr",
            Capability::Camera => "camera",
            Capability::Microphone => "microphone",
            Capability::Gps => "gps",
            Capability::Internet => "internet",
        }
    }

    /// The capability an operation needs before its real path is
    /// attempted. Operations without specific hardware needs require
    /// basic connectivity.
    pub fn required_for(operation: &str) -> Capability {
        match operation {
            "wifi_scan" => Capability::WifiManaged,
            "handshake_capture" | "deauth_attack" => Capability::WifiMonitor,
            "bluetooth_scan" => Capability::Bluetooth,
            "start_sdr" | "stop_sdr" | "tune_frequency" | "spectrum_scan" => Capability::Sdr,
            "discover_cameras" | "capture_frame" => Capability::Camera,
            "audio_analysis" => Capability::Microphone,
            "gps_position" => Capability::Gps,
            _ => Capability::Internet,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable point-in-time snapshot of detected hardware.
///
/// Taken once at startup and shared read-only for the process lifetime;
/// re-detection means restarting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitySnapshot {
    pub wifi_managed: bool,
    pub wifi_monitor: bool,
    pub bluetooth: bool,
    pub sdr: bool,
    pub camera: bool,
    pub microphone: bool,
    pub gps: bool,
    pub internet: bool,

    /// When detection ran, RFC 3339.
    pub detected_at: String,
}

impl CapabilitySnapshot {
    /// A snapshot with nothing detected. Used when detection is skipped
    /// entirely (forced emulation) and in tests.
    pub fn offline() -> Self {
        Self {
            wifi_managed: false,
            wifi_monitor: false,
            bluetooth: false,
            sdr: false,
            camera: false,
            microphone: false,
            gps: false,
            internet: false,
            detected_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_present(&self, capability: Capability) -> bool {
        match capability {
            Capability::WifiManaged => self.wifi_managed,
            Capability::WifiMonitor => self.wifi_monitor,
            Capability::Bluetooth => self.bluetooth,
            Capability::Sdr => self.sdr,
            Capability::Camera => self.camera,
            Capability::Microphone => self.microphone,
            Capability::Gps => self.gps,
            Capability::Internet => self.internet,
        }
    }

    /// Fixed-key map: always all eight capabilities, regardless of what
    /// was detected.
    pub fn as_map(&self) -> BTreeMap<&'static str, bool> {
        Capability::ALL
            .iter()
            .map(|c| (c.as_str(), self.is_present(*c)))
            .collect()
    }

    /// One-line summary for startup logs.
    pub fn summary(&self) -> String {
        let present: Vec<&str> = Capability::ALL
            .iter()
            .filter(|c| self.is_present(**c))
            .map(|c| c.as_str())
            .collect();
        format!(
            "{}/{} capabilities: [{}]",
            present.len(),
            Capability::ALL.len(),
            present.join(", ")
        )
    }
}
