//! Structured logging setup.
//!
//! Human-readable output for terminals, JSON lines for collectors, both
//! on stderr so stdout stays clean for result payloads. `SSA_LOG` takes
//! an env-filter directive; `SSA_LOG_FORMAT` picks the format.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::str::FromStr;
use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG: &str = "SSA_LOG";
pub const ENV_LOG_FORMAT: &str = "SSA_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "text" | "pretty" => Ok(LogFormat::Human),
            "json" | "jsonl" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// env-filter directive, e.g. "info" or "ssa_core=debug".
    pub filter: String,
    pub format: LogFormat,
}

impl LogConfig {
    /// Resolve from the environment plus CLI verbosity flags. The
    /// environment wins over flags so a deployed unit can be tuned
    /// without changing its invocation.
    pub fn from_env(verbose: u8, quiet: bool) -> Self {
        let fallback = if quiet {
            "error"
        } else {
            match verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        };
        let filter = std::env::var(ENV_LOG).unwrap_or_else(|_| fallback.to_string());

        let format = std::env::var(ENV_LOG_FORMAT)
            .ok()
            .and_then(|raw| LogFormat::from_str(&raw).ok())
            .unwrap_or_default();

        Self { filter, format }
    }

    /// Install the global subscriber. Safe to call once per process;
    /// later calls are ignored (tests initialize repeatedly).
    pub fn init(&self) {
        let filter = EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new("info"));

        let result = match self.format {
            LogFormat::Human => fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init(),
            LogFormat::Json => fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .try_init(),
        };
        let _ = result;
    }
}

/// Short unique id for one process run, carried in status payloads and
/// log lines for correlation.
pub fn generate_run_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &id[..12])
}

/// Stable short id for this host, for correlating log lines across
/// runs: the leading hex of /etc/machine-id, or a hostname hash when
/// the machine id is unavailable.
pub fn host_id() -> String {
    host_id_from(Path::new("/etc/machine-id"))
}

fn host_id_from(machine_id: &Path) -> String {
    if let Ok(raw) = std::fs::read_to_string(machine_id) {
        let id: String = raw
            .trim()
            .chars()
            .filter(char::is_ascii_hexdigit)
            .take(8)
            .collect();
        if id.len() == 8 {
            return format!("host-{}", id);
        }
    }

    let hostname = std::fs::read_to_string("/proc/sys/kernel/hostname")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let mut hasher = DefaultHasher::new();
    hostname.hash(&mut hasher);
    format!("host-{:08x}", hasher.finish() as u32)
}
