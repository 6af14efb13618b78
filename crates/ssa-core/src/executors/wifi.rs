//! Wi-Fi scanning via `iw`.

use super::ExecError;
use crate::tools::ToolRunner;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const SCAN_TIMEOUT: Duration = Duration::from_secs(15);

/// A parsed access point.
#[derive(Debug, Clone, Serialize)]
pub struct WifiNetwork {
    pub ssid: String,
    pub bssid: String,
    pub channel: u32,
    pub signal: i32,
    pub security: String,
}

/// Validate an interface name: kernel netdev names are short and
/// contain no separators a shell would care about.
fn validate_interface(interface: &str) -> Result<(), ExecError> {
    let ok = !interface.is_empty()
        && interface.len() <= 15
        && interface
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ExecError::InvalidParam(format!(
            "bad interface name: {:?}",
            interface
        )))
    }
}

/// Scan for access points on the given interface.
pub fn scan(runner: &ToolRunner, interface: &str) -> Result<Value, ExecError> {
    validate_interface(interface)?;

    let output = runner.run("iw", &["dev", interface, "scan"], Some(SCAN_TIMEOUT))?;
    if !output.success() {
        return Err(ExecError::from_output("iw", &output));
    }

    let networks = parse_iw_scan(&output.stdout_str());
    debug!(interface, count = networks.len(), "wifi scan complete");
    Ok(json!({
        "networks": networks,
        "count": networks.len(),
        "interface": interface,
        "method": "iw_scan",
    }))
}

/// Parse `iw dev <if> scan` output into access points.
fn parse_iw_scan(text: &str) -> Vec<WifiNetwork> {
    let mut networks = Vec::new();
    let mut current: Option<WifiNetwork> = None;

    for line in text.lines() {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("BSS ") {
            if let Some(done) = current.take() {
                networks.push(done);
            }
            let bssid = rest
                .split(|c: char| c == '(' || c.is_whitespace())
                .next()
                .unwrap_or("")
                .to_string();
            current = Some(WifiNetwork {
                ssid: String::new(),
                bssid,
                channel: 0,
                signal: 0,
                security: "Open".to_string(),
            });
            continue;
        }

        let Some(net) = current.as_mut() else {
            continue;
        };

        if let Some(rest) = trimmed.strip_prefix("SSID: ") {
            net.ssid = rest.to_string();
        } else if let Some(rest) = trimmed.strip_prefix("signal: ") {
            // "signal: -55.00 dBm"
            if let Some(db) = rest.split_whitespace().next() {
                net.signal = db.parse::<f64>().map(|v| v.round() as i32).unwrap_or(0);
            }
        } else if let Some(rest) = trimmed.strip_prefix("freq: ") {
            if let Ok(freq) = rest.split('.').next().unwrap_or(rest).parse::<u32>() {
                net.channel = channel_from_freq(freq);
            }
        } else if trimmed.starts_with("RSN:") {
            net.security = "WPA2".to_string();
        } else if trimmed.starts_with("WPA:") && net.security != "WPA2" {
            // A WPA IE upgrades the bare-Privacy (WEP) inference
            net.security = "WPA".to_string();
        } else if trimmed.starts_with("capability:")
            && trimmed.contains("Privacy")
            && net.security == "Open"
        {
            net.security = "WEP".to_string();
        }
    }

    if let Some(done) = current {
        networks.push(done);
    }
    networks
}

/// IEEE 802.11 frequency to channel number.
fn channel_from_freq(freq_mhz: u32) -> u32 {
    match freq_mhz {
        2412..=2472 => (freq_mhz - 2407) / 5,
        2484 => 14,
        5160..=5885 => (freq_mhz - 5000) / 5,
        5955..=7115 => (freq_mhz - 5950) / 5,
        _ => 0,
    }
}
