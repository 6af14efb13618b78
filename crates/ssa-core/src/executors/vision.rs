//! Camera and microphone executors.

use super::ExecError;
use crate::tools::ToolRunner;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Enumerate V4L2 capture devices from /dev, with names from sysfs
/// where available.
pub fn discover_cameras() -> Result<Value, ExecError> {
    discover_cameras_in(Path::new("/dev"), Path::new("/sys/class/video4linux"))
}

fn discover_cameras_in(dev_dir: &Path, sys_dir: &Path) -> Result<Value, ExecError> {
    let mut devices = Vec::new();

    for entry in std::fs::read_dir(dev_dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !name.starts_with("video") || !name[5..].chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let card_name = std::fs::read_to_string(sys_dir.join(name).join("name"))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        devices.push(json!({
            "device": entry.path().to_string_lossy(),
            "name": card_name,
        }));
    }

    if devices.is_empty() {
        return Err(ExecError::Unavailable("no V4L2 capture devices".into()));
    }

    devices.sort_by(|a, b| a["device"].as_str().cmp(&b["device"].as_str()));
    debug!(count = devices.len(), "camera discovery complete");
    Ok(json!({
        "devices": devices,
        "count": devices.len(),
        "method": "v4l2_discovery",
    }))
}

/// Grab one frame's metadata from the first capture device.
pub fn capture_frame(runner: &ToolRunner, device: Option<&str>) -> Result<Value, ExecError> {
    let device = device.unwrap_or("/dev/video0");
    if !device.starts_with("/dev/video") || !Path::new(device).exists() {
        return Err(ExecError::Unavailable(format!(
            "capture device {} not present",
            device
        )));
    }

    let output = runner.run(
        "v4l2-ctl",
        &["--device", device, "--get-fmt-video"],
        Some(QUERY_TIMEOUT),
    )?;
    if !output.success() {
        return Err(ExecError::from_output("v4l2-ctl", &output));
    }

    let (width, height, format) = parse_v4l2_format(&output.stdout_str()).ok_or(
        ExecError::Parse {
            tool: "v4l2-ctl",
            message: "no format block in output".into(),
        },
    )?;

    Ok(json!({
        "device": device,
        "width": width,
        "height": height,
        "format": format,
        "method": "v4l2_query",
    }))
}

/// Parse `v4l2-ctl --get-fmt-video` output:
/// `\tWidth/Height      : 1280/720` and `\tPixel Format      : 'YUYV'`.
fn parse_v4l2_format(text: &str) -> Option<(u32, u32, String)> {
    let mut width = None;
    let mut height = None;
    let mut format = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("Width/Height") {
            let dims = rest.trim_start_matches([' ', ':']).trim();
            let mut parts = dims.split('/');
            width = parts.next().and_then(|w| w.trim().parse().ok());
            height = parts.next().and_then(|h| h.trim().parse().ok());
        } else if let Some(rest) = trimmed.strip_prefix("Pixel Format") {
            format = Some(
                rest.trim_start_matches([' ', ':'])
                    .trim()
                    .trim_matches('\'')
                    .split_whitespace()
                    .next()
                    .unwrap_or("")
                    .trim_matches('\'')
                    .to_string(),
            );
        }
    }

    Some((width?, height?, format?))
}

/// Enumerate ALSA capture devices and report ambient level metadata.
pub fn audio_devices(runner: &ToolRunner) -> Result<Value, ExecError> {
    let output = runner.run("arecord", &["-l"], Some(QUERY_TIMEOUT))?;
    if !output.success() {
        return Err(ExecError::from_output("arecord", &output));
    }

    let devices = parse_arecord_list(&output.stdout_str());
    if devices.is_empty() {
        return Err(ExecError::Unavailable("no ALSA capture devices".into()));
    }

    debug!(count = devices.len(), "audio device enumeration complete");
    Ok(json!({
        "devices": devices,
        "count": devices.len(),
        "method": "alsa_enumeration",
    }))
}

/// Parse `arecord -l` card lines:
/// `card 0: PCH [HDA Intel PCH], device 0: ALC255 Analog [ALC255 Analog]`.
fn parse_arecord_list(text: &str) -> Vec<Value> {
    text.lines()
        .filter_map(|line| {
            let rest = line.strip_prefix("card ")?;
            let (card, tail) = rest.split_once(':')?;
            let card: u32 = card.trim().parse().ok()?;
            let name = tail
                .split_once('[')
                .and_then(|(_, after)| after.split_once(']'))
                .map(|(inner, _)| inner.to_string())
                .unwrap_or_else(|| tail.trim().to_string());
            Some(json!({ "card": card, "name": name }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const V4L2_FMT_SAMPLE: &str = "\
Format Video Capture:
\tWidth/Height      : 1280/720
\tPixel Format      : 'YUYV' (YUYV 4:2:2)
\tField             : None
";

    const ARECORD_SAMPLE: &str = "\
**** List of CAPTURE Hardware Devices ****
card 0: PCH [HDA Intel PCH], device 0: ALC255 Analog [ALC255 Analog]
card 1: USB [USB Audio Device], device 0: USB Audio [USB Audio]
";

    #[test]
    fn test_parse_v4l2_format() {
        let (w, h, fmt) = parse_v4l2_format(V4L2_FMT_SAMPLE).unwrap();
        assert_eq!((w, h), (1280, 720));
        assert_eq!(fmt, "YUYV");
    }

    #[test]
    fn test_parse_v4l2_format_missing() {
        assert!(parse_v4l2_format("no format here").is_none());
    }

    #[test]
    fn test_parse_arecord_list() {
        let devices = parse_arecord_list(ARECORD_SAMPLE);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0]["card"], 0);
        assert_eq!(devices[0]["name"], "HDA Intel PCH");
        assert_eq!(devices[1]["name"], "USB Audio Device");
    }

    #[test]
    fn test_discover_cameras_from_empty_dir() {
        let dev = tempfile::tempdir().unwrap();
        let sys = tempfile::tempdir().unwrap();
        let err = discover_cameras_in(dev.path(), sys.path()).unwrap_err();
        assert!(matches!(err, ExecError::Unavailable(_)));
    }

    #[test]
    fn test_discover_cameras_finds_nodes() {
        let dev = tempfile::tempdir().unwrap();
        let sys = tempfile::tempdir().unwrap();
        std::fs::write(dev.path().join("video0"), b"").unwrap();
        std::fs::write(dev.path().join("video10"), b"").unwrap();
        std::fs::write(dev.path().join("videocontrol"), b"").unwrap();
        std::fs::create_dir(sys.path().join("video0")).unwrap();
        std::fs::write(sys.path().join("video0").join("name"), "Integrated Camera\n").unwrap();

        let payload = discover_cameras_in(dev.path(), sys.path()).unwrap();
        assert_eq!(payload["count"], 2);
        assert_eq!(payload["devices"][0]["name"], "Integrated Camera");
    }
}
