//! RTL-SDR control and spectrum sweeps via `rtl_test` / `rtl_power`.

use super::ExecError;
use crate::tools::ToolRunner;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const SWEEP_TIMEOUT: Duration = Duration::from_secs(30);

/// Tuner range of the common R820T/R860 dongles, in MHz.
const TUNER_MIN_MHZ: f64 = 24.0;
const TUNER_MAX_MHZ: f64 = 1766.0;

fn validate_frequency(freq_mhz: f64) -> Result<(), ExecError> {
    if freq_mhz.is_finite() && (TUNER_MIN_MHZ..=TUNER_MAX_MHZ).contains(&freq_mhz) {
        Ok(())
    } else {
        Err(ExecError::InvalidParam(format!(
            "frequency {} MHz outside tuner range {}-{} MHz",
            freq_mhz, TUNER_MIN_MHZ, TUNER_MAX_MHZ
        )))
    }
}

/// Confirm a dongle is attached and report it tuned.
pub fn start(runner: &ToolRunner, freq_mhz: f64) -> Result<Value, ExecError> {
    validate_frequency(freq_mhz)?;

    let output = runner.run("rtl_test", &["-t"], Some(PROBE_TIMEOUT))?;
    // rtl_test reports the device on stderr and may exit non-zero even
    // when a dongle is present
    let report = format!("{}{}", output.stdout_str(), output.stderr_str());
    if !report.contains("Found") {
        return Err(ExecError::Unavailable("no RTL-SDR device found".into()));
    }

    debug!(freq_mhz, "sdr started");
    Ok(json!({
        "frequency": freq_mhz,
        "device": parse_device_name(&report),
        "started": true,
        "method": "rtl_sdr",
    }))
}

/// One-shot power sweep around a center frequency (2 MHz span).
pub fn sweep(runner: &ToolRunner, freq_mhz: f64) -> Result<Value, ExecError> {
    validate_frequency(freq_mhz)?;

    let low = ((freq_mhz - 1.0) * 1e6) as u64;
    let high = ((freq_mhz + 1.0) * 1e6) as u64;
    let range = format!("{}:{}:8k", low, high);

    let output = runner.run(
        "rtl_power",
        &["-f", &range, "-i", "1", "-1", "-"],
        Some(SWEEP_TIMEOUT),
    )?;
    if !output.success() {
        return Err(ExecError::from_output("rtl_power", &output));
    }

    let bins = parse_rtl_power(&output.stdout_str());
    if bins.is_empty() {
        return Err(ExecError::Parse {
            tool: "rtl_power",
            message: "no sweep rows in output".into(),
        });
    }

    debug!(freq_mhz, bins = bins.len(), "spectrum sweep complete");
    Ok(json!({
        "frequency": freq_mhz,
        "bins": bins.len(),
        "power_db": bins,
        "method": "rtl_power_sweep",
    }))
}

/// First "Found N device(s)" / device description line.
fn parse_device_name(report: &str) -> String {
    report
        .lines()
        .find(|l| l.trim_start().starts_with(|c: char| c.is_ascii_digit()) && l.contains(':'))
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| "rtl-sdr".to_string())
}

/// Parse rtl_power CSV rows into a flat dB-per-bin vector.
///
/// Row shape: `date, time, hz_low, hz_high, hz_step, samples, db, db, ...`
fn parse_rtl_power(text: &str) -> Vec<f64> {
    let mut bins = Vec::new();
    for line in text.lines() {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() <= 6 {
            continue;
        }
        for raw in &fields[6..] {
            if let Ok(db) = raw.parse::<f64>() {
                bins.push(db);
            }
        }
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;

    const RTL_POWER_SAMPLE: &str = "\
2026-08-25, 10:15:00, 99000000, 100000000, 8000, 64, -72.10, -71.85, -45.20, -70.99
2026-08-25, 10:15:00, 100000000, 101000000, 8000, 64, -69.44, -68.02
";

    #[test]
    fn test_parse_rtl_power_rows() {
        let bins = parse_rtl_power(RTL_POWER_SAMPLE);
        assert_eq!(bins.len(), 6);
        assert!((bins[2] - (-45.20)).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rtl_power_ignores_junk() {
        assert!(parse_rtl_power("short,row\n").is_empty());
        assert!(parse_rtl_power("").is_empty());
    }

    #[test]
    fn test_frequency_bounds() {
        assert!(validate_frequency(100.0).is_ok());
        assert!(validate_frequency(1090.0).is_ok());
        assert!(validate_frequency(10.0).is_err());
        assert!(validate_frequency(3000.0).is_err());
        assert!(validate_frequency(f64::NAN).is_err());
    }

    #[test]
    fn test_device_name_extraction() {
        let report = "Found 1 device(s):\n  0:  Realtek, RTL2838UHIDIR, SN: 00000001\n";
        assert!(parse_device_name(report).contains("Realtek"));
        assert_eq!(parse_device_name("nothing here"), "rtl-sdr");
    }
}
