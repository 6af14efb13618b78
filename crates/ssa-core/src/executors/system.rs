//! Host telemetry from procfs, sysfs, and statvfs.

use super::ExecError;
use serde_json::{json, Value};
use std::ffi::CString;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Delay between the two /proc/stat samples used for the CPU figure.
const CPU_SAMPLE_INTERVAL: Duration = Duration::from_millis(200);

/// Aggregate CPU jiffies from the first line of /proc/stat.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CpuTimes {
    total: u64,
    idle: u64,
}

/// Full resource snapshot. Individual sensors that are absent on this
/// host (battery, thermal zone) read as null rather than failing the
/// whole snapshot.
pub fn stats() -> Result<Value, ExecError> {
    let first = read_cpu_times()?;
    thread::sleep(CPU_SAMPLE_INTERVAL);
    let second = read_cpu_times()?;
    let cpu_percent = cpu_percent_between(first, second);

    let meminfo = std::fs::read_to_string("/proc/meminfo")?;
    let (mem_total_kb, mem_available_kb) = parse_meminfo(&meminfo).ok_or(ExecError::Parse {
        tool: "procfs",
        message: "MemTotal/MemAvailable missing from /proc/meminfo".into(),
    })?;
    let memory_percent = if mem_total_kb > 0 {
        100.0 * (mem_total_kb.saturating_sub(mem_available_kb)) as f64 / mem_total_kb as f64
    } else {
        0.0
    };

    let disk = disk_usage("/")?;
    let uptime_secs = std::fs::read_to_string("/proc/uptime")
        .ok()
        .and_then(|t| parse_uptime(&t));
    let load = std::fs::read_to_string("/proc/loadavg")
        .ok()
        .and_then(|t| parse_loadavg(&t));
    let temperature_c = read_thermal_zone();
    let battery_percent = read_battery();

    debug!(cpu_percent, memory_percent, "system stats sampled");
    Ok(json!({
        "cpu_percent": round1(cpu_percent),
        "memory_percent": round1(memory_percent),
        "memory_total_mb": mem_total_kb / 1024,
        "memory_available_mb": mem_available_kb / 1024,
        "disk_percent": round1(disk.0),
        "disk_total_gb": round1(disk.1),
        "load_average": load,
        "uptime_secs": uptime_secs,
        "temperature_c": temperature_c,
        "battery_percent": battery_percent,
        "method": "procfs",
    }))
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn read_cpu_times() -> Result<CpuTimes, ExecError> {
    let stat = std::fs::read_to_string("/proc/stat")?;
    parse_proc_stat(&stat).ok_or(ExecError::Parse {
        tool: "procfs",
        message: "no cpu line in /proc/stat".into(),
    })
}

/// Parse the aggregate `cpu` line: user nice system idle iowait ...
fn parse_proc_stat(text: &str) -> Option<CpuTimes> {
    let line = text.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|f| f.parse().ok())
        .collect();
    if fields.len() < 4 {
        return None;
    }
    // idle + iowait both count as idle time
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Some(CpuTimes {
        total: fields.iter().sum(),
        idle,
    })
}

/// Busy share of elapsed jiffies between two samples.
fn cpu_percent_between(first: CpuTimes, second: CpuTimes) -> f64 {
    let total = second.total.saturating_sub(first.total);
    let idle = second.idle.saturating_sub(first.idle);
    if total == 0 {
        return 0.0;
    }
    100.0 * (total - idle.min(total)) as f64 / total as f64
}

/// (MemTotal, MemAvailable) in kB.
fn parse_meminfo(text: &str) -> Option<(u64, u64)> {
    let field = |name: &str| {
        text.lines()
            .find(|l| l.starts_with(name))?
            .split_whitespace()
            .nth(1)?
            .parse::<u64>()
            .ok()
    };
    Some((field("MemTotal:")?, field("MemAvailable:")?))
}

fn parse_uptime(text: &str) -> Option<u64> {
    text.split_whitespace()
        .next()?
        .parse::<f64>()
        .ok()
        .map(|s| s as u64)
}

/// 1/5/15 minute load averages.
fn parse_loadavg(text: &str) -> Option<Vec<f64>> {
    let values: Vec<f64> = text
        .split_whitespace()
        .take(3)
        .filter_map(|f| f.parse().ok())
        .collect();
    (values.len() == 3).then_some(values)
}

/// (used percent, total GB) for the filesystem holding `path`.
fn disk_usage(path: &str) -> Result<(f64, f64), ExecError> {
    let c_path = CString::new(path)
        .map_err(|_| ExecError::InvalidParam(format!("bad mount path: {:?}", path)))?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(ExecError::Io(std::io::Error::last_os_error()));
    }

    let block = stat.f_frsize as f64;
    let total = stat.f_blocks as f64 * block;
    let available = stat.f_bavail as f64 * block;
    if total <= 0.0 {
        return Ok((0.0, 0.0));
    }
    let used_percent = 100.0 * (total - available) / total;
    Ok((used_percent, total / 1e9))
}

/// First thermal zone, millidegrees to degrees.
fn read_thermal_zone() -> Option<f64> {
    let raw = std::fs::read_to_string("/sys/class/thermal/thermal_zone0/temp").ok()?;
    raw.trim().parse::<f64>().ok().map(|milli| milli / 1000.0)
}

/// First power supply advertising a capacity, if any.
fn read_battery() -> Option<u32> {
    let entries = std::fs::read_dir("/sys/class/power_supply").ok()?;
    for entry in entries.flatten() {
        if let Ok(raw) = std::fs::read_to_string(entry.path().join("capacity")) {
            if let Ok(pct) = raw.trim().parse() {
                return Some(pct);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROC_STAT_A: &str = "cpu  100 0 50 800 50 0 0 0 0 0\ncpu0 50 0 25 400 25 0 0 0 0 0\n";
    const PROC_STAT_B: &str = "cpu  160 0 90 850 50 0 0 0 0 0\ncpu0 80 0 45 425 25 0 0 0 0 0\n";

    #[test]
    fn test_parse_proc_stat() {
        let times = parse_proc_stat(PROC_STAT_A).unwrap();
        assert_eq!(times.total, 1000);
        assert_eq!(times.idle, 850);
    }

    #[test]
    fn test_cpu_percent_between_samples() {
        let a = parse_proc_stat(PROC_STAT_A).unwrap();
        let b = parse_proc_stat(PROC_STAT_B).unwrap();
        // 150 elapsed jiffies, 50 idle: 66.7% busy
        let pct = cpu_percent_between(a, b);
        assert!((pct - 66.666).abs() < 0.1);
    }

    #[test]
    fn test_cpu_percent_no_elapsed_time() {
        let a = parse_proc_stat(PROC_STAT_A).unwrap();
        assert_eq!(cpu_percent_between(a, a), 0.0);
    }

    #[test]
    fn test_parse_meminfo() {
        let text = "MemTotal:       16315480 kB\nMemFree:         99112 kB\nMemAvailable:    8123456 kB\n";
        let (total, available) = parse_meminfo(text).unwrap();
        assert_eq!(total, 16315480);
        assert_eq!(available, 8123456);
        assert!(parse_meminfo("MemTotal: 1 kB\n").is_none());
    }

    #[test]
    fn test_parse_uptime_and_loadavg() {
        assert_eq!(parse_uptime("35250.12 131000.50\n"), Some(35250));
        assert_eq!(
            parse_loadavg("0.52 0.58 0.59 1/977 12345\n"),
            Some(vec![0.52, 0.58, 0.59])
        );
        assert!(parse_loadavg("0.52\n").is_none());
    }

    #[test]
    fn test_stats_on_live_host() {
        // Smoke test against the real procfs of the test host
        let payload = stats().unwrap();
        let cpu = payload["cpu_percent"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&cpu));
        assert!(payload["memory_total_mb"].as_u64().unwrap() > 0);
        assert_eq!(payload["method"], "procfs");
    }
}
