//! Bluetooth discovery via BlueZ `hcitool`.

use super::ExecError;
use crate::tools::ToolRunner;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// `hcitool scan` blocks for its inquiry window (~10s).
const SCAN_TIMEOUT: Duration = Duration::from_secs(20);

/// Inquiry scan for nearby discoverable devices.
pub fn scan(runner: &ToolRunner) -> Result<Value, ExecError> {
    let output = runner.run("hcitool", &["scan"], Some(SCAN_TIMEOUT))?;
    if !output.success() {
        return Err(ExecError::from_output("hcitool", &output));
    }

    let devices = parse_hcitool_scan(&output.stdout_str());
    debug!(count = devices.len(), "bluetooth scan complete");
    Ok(json!({
        "devices": devices,
        "count": devices.len(),
        "method": "hcitool_scan",
    }))
}

/// Parse `hcitool scan` output.
///
/// Format after the "Scanning ..." header is one device per line:
/// `\t<MAC>\t<name>`.
fn parse_hcitool_scan(text: &str) -> Vec<Value> {
    text.lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            let (mac, name) = trimmed.split_once(char::is_whitespace)?;
            if !looks_like_mac(mac) {
                return None;
            }
            Some(json!({
                "mac": mac,
                "name": name.trim(),
            }))
        })
        .collect()
}

fn looks_like_mac(s: &str) -> bool {
    let parts: Vec<&str> = s.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}
