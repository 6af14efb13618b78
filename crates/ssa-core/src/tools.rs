//! Bounded execution of external hardware tools.
//!
//! Every capability probe and every real executor goes through
//! [`ToolRunner`]: per-command timeout with SIGTERM then SIGKILL
//! escalation, output size caps, a cumulative time budget shared across
//! calls, and an allowlist so only known hardware tools can ever be
//! spawned. Nothing in this crate invokes `Command` directly.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, instrument, trace, warn};

/// Default timeout per command.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default maximum captured output per stream (4MB; nmap -sV on a /24
/// stays well under this).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 4 * 1024 * 1024;

/// Default cumulative budget in milliseconds.
pub const DEFAULT_BUDGET_MS: u64 = 120_000;

/// Grace period between SIGTERM and SIGKILL in milliseconds.
const SIGTERM_GRACE_MS: u64 = 500;

/// Hardware and scan tools this build is allowed to spawn.
pub fn default_allowlist() -> HashSet<String> {
    [
        "iw", "iwconfig", "ip", "hcitool", "rtl_test", "rtl_power", "arecord", "gpsd", "ping",
        "nmap", "v4l2-ctl",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Errors from tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("command rejected: {0}")]
    Rejected(String),

    #[error("command failed to spawn: {0}")]
    SpawnFailed(String),

    #[error("budget exhausted: used {used_ms}ms of {budget_ms}ms")]
    BudgetExhausted { used_ms: u64, budget_ms: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured output from one tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Standard output, possibly truncated at the cap.
    pub stdout: Vec<u8>,

    /// Standard error, possibly truncated at the cap.
    pub stderr: Vec<u8>,

    /// Exit code when the process exited normally.
    pub exit_code: Option<i32>,

    /// Whether either stream hit the output cap.
    pub truncated: bool,

    /// Wall-clock duration of the execution.
    pub duration: Duration,

    /// Whether the command hit its deadline and was killed.
    pub timed_out: bool,
}

impl ToolOutput {
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Exit code 0 and no timeout.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Timeout applied when the caller does not pass one.
    pub default_timeout: Duration,

    /// Maximum captured bytes per stream.
    pub max_output_bytes: usize,

    /// Cumulative time budget across all calls, in milliseconds.
    pub budget_ms: u64,

    /// Commands that may be spawned. Empty means unrestricted; the
    /// production runner always carries [`default_allowlist`].
    pub allowed_commands: HashSet<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            budget_ms: DEFAULT_BUDGET_MS,
            allowed_commands: default_allowlist(),
        }
    }
}

/// Tool runner with shared budget tracking.
///
/// Shared by `Arc` across controllers; interior state is a single
/// atomic counter, so `&self` calls are safe from any thread.
#[derive(Debug)]
pub struct ToolRunner {
    config: ToolConfig,
    used_ms: AtomicU64,
}

impl ToolRunner {
    pub fn new(config: ToolConfig) -> Self {
        Self {
            config,
            used_ms: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ToolConfig::default())
    }

    /// Cumulative time used in milliseconds.
    pub fn used_budget_ms(&self) -> u64 {
        self.used_ms.load(Ordering::SeqCst)
    }

    pub fn remaining_budget_ms(&self) -> u64 {
        self.config
            .budget_ms
            .saturating_sub(self.used_ms.load(Ordering::SeqCst))
    }

    pub fn reset_budget(&self) {
        self.used_ms.store(0, Ordering::SeqCst);
    }

    /// Run a single tool, capturing output until it exits or the
    /// deadline passes.
    #[instrument(skip(self, args), fields(cmd = %cmd))]
    pub fn run(
        &self,
        cmd: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<ToolOutput, ToolError> {
        self.validate_command(cmd)?;

        let requested = timeout.unwrap_or(self.config.default_timeout);
        let allocated_ms = self.reserve_budget(requested)?;
        let deadline = Duration::from_millis(allocated_ms);

        debug!(?args, timeout_ms = allocated_ms, "running tool");
        let start = Instant::now();

        let mut child = match self
            .build_command(cmd, args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                self.used_ms.fetch_sub(allocated_ms, Ordering::SeqCst);
                error!(error = %e, "failed to spawn");
                return if e.kind() == std::io::ErrorKind::NotFound {
                    Err(ToolError::CommandNotFound(cmd.to_string()))
                } else {
                    Err(ToolError::SpawnFailed(e.to_string()))
                };
            }
        };

        let result = self.capture_until_exit(&mut child, deadline);
        let duration = start.elapsed();
        self.settle_budget(allocated_ms, duration.as_millis() as u64);

        let (stdout, stderr, exit_code, truncated, timed_out) = result?;
        trace!(exit_code = ?exit_code, timed_out, duration_ms = duration.as_millis() as u64, "tool finished");

        Ok(ToolOutput {
            stdout,
            stderr,
            exit_code,
            truncated,
            duration,
            timed_out,
        })
    }

    /// Reserve up to the requested timeout from the budget, returning
    /// the allocation in milliseconds. Lock-free so concurrent callers
    /// cannot overcommit.
    fn reserve_budget(&self, requested: Duration) -> Result<u64, ToolError> {
        let requested_ms = requested.as_millis() as u64;
        let mut current = self.used_ms.load(Ordering::SeqCst);

        loop {
            if current >= self.config.budget_ms {
                warn!(used_ms = current, budget_ms = self.config.budget_ms, "budget exhausted");
                return Err(ToolError::BudgetExhausted {
                    used_ms: current,
                    budget_ms: self.config.budget_ms,
                });
            }

            let allocated = requested_ms.min(self.config.budget_ms - current);
            match self.used_ms.compare_exchange_weak(
                current,
                current + allocated,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Ok(allocated),
                Err(updated) => current = updated,
            }
        }
    }

    /// Replace the reservation with actual elapsed time.
    fn settle_budget(&self, allocated_ms: u64, used_ms: u64) {
        if used_ms < allocated_ms {
            self.used_ms.fetch_sub(allocated_ms - used_ms, Ordering::SeqCst);
        } else {
            self.used_ms.fetch_add(used_ms - allocated_ms, Ordering::SeqCst);
        }
    }

    /// Allowlist and injection checks before anything is spawned.
    fn validate_command(&self, cmd: &str) -> Result<(), ToolError> {
        if cmd.contains(['|', '&', ';', '$', '`', ' ', '\n', '\r']) {
            return Err(ToolError::Rejected(format!(
                "shell metacharacters in command: {}",
                cmd
            )));
        }

        if !self.config.allowed_commands.is_empty() {
            let basename = Path::new(cmd)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(cmd);
            if !self.config.allowed_commands.contains(basename) {
                return Err(ToolError::Rejected(format!("not in allowlist: {}", cmd)));
            }
        }

        if cmd.starts_with('/') && !Path::new(cmd).exists() {
            return Err(ToolError::CommandNotFound(cmd.to_string()));
        }

        Ok(())
    }

    /// Minimal, reproducible environment: tools parse the same in every
    /// locale and inherit nothing from the caller but PATH.
    fn build_command(&self, cmd: &str, args: &[&str]) -> Command {
        let mut command = Command::new(cmd);
        command.args(args);
        command.env_clear();
        if let Ok(path) = std::env::var("PATH") {
            command.env("PATH", path);
        }
        command.env("LC_ALL", "C");
        command.env("LANG", "C");
        command
    }

    /// Poll the child, draining both pipes without blocking, until it
    /// exits or the deadline passes.
    #[allow(clippy::type_complexity)]
    fn capture_until_exit(
        &self,
        child: &mut Child,
        timeout: Duration,
    ) -> Result<(Vec<u8>, Vec<u8>, Option<i32>, bool, bool), ToolError> {
        let deadline = Instant::now() + timeout;
        let max = self.config.max_output_bytes;
        let mut stdout_buf = Vec::with_capacity(max.min(65536));
        let mut stderr_buf = Vec::with_capacity(max.min(65536));
        let mut truncated = false;
        let mut timed_out = false;

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let mut chunk = vec![0u8; 8192];

        loop {
            if Instant::now() >= deadline {
                timed_out = true;
                warn!("command deadline reached, killing");
                self.kill_with_grace(child);
                break;
            }

            let mut did_read = false;
            if let Some(ref mut out) = stdout {
                did_read |= read_into_capped(out, &mut chunk, &mut stdout_buf, max, &mut truncated)?;
            }
            if let Some(ref mut err) = stderr {
                did_read |= read_into_capped(err, &mut chunk, &mut stderr_buf, max, &mut truncated)?;
            }

            match child.try_wait() {
                Ok(Some(status)) => {
                    // Drain whatever is immediately available; a
                    // grandchild may still hold the pipe open, so only
                    // non-blocking reads are safe here.
                    if let Some(ref mut out) = stdout {
                        while read_into_capped(out, &mut chunk, &mut stdout_buf, max, &mut truncated)? {}
                    }
                    if let Some(ref mut err) = stderr {
                        while read_into_capped(err, &mut chunk, &mut stderr_buf, max, &mut truncated)? {}
                    }
                    return Ok((stdout_buf, stderr_buf, status.code(), truncated, timed_out));
                }
                Ok(None) => {
                    if !did_read {
                        thread::sleep(Duration::from_millis(10));
                    }
                }
                Err(e) => {
                    error!(error = %e, "failed to wait for child");
                    return Err(ToolError::Io(e));
                }
            }
        }

        let exit_code = child.wait().ok().and_then(|s| s.code());
        Ok((stdout_buf, stderr_buf, exit_code, truncated, timed_out))
    }

    /// SIGTERM, half-second grace, then SIGKILL.
    fn kill_with_grace(&self, child: &mut Child) {
        let pid = child.id() as i32;
        unsafe {
            libc::kill(pid, libc::SIGTERM);
        }
        debug!(pid, "sent SIGTERM");
        thread::sleep(Duration::from_millis(SIGTERM_GRACE_MS));

        match child.try_wait() {
            Ok(Some(_)) => trace!(pid, "exited after SIGTERM"),
            Ok(None) => {
                warn!(pid, "did not exit after SIGTERM, sending SIGKILL");
                unsafe {
                    libc::kill(pid, libc::SIGKILL);
                }
                let _ = child.wait();
            }
            Err(e) => error!(pid, error = %e, "failed to check process status"),
        }
    }
}

/// One non-blocking read into a capped buffer. Returns whether any
/// bytes arrived; sets `truncated` once the cap is hit.
fn read_into_capped<R: Read + std::os::unix::io::AsRawFd>(
    stream: &mut R,
    chunk: &mut [u8],
    buf: &mut Vec<u8>,
    max: usize,
    truncated: &mut bool,
) -> Result<bool, ToolError> {
    let n = try_read_nonblocking(stream, chunk)?;
    if n == 0 {
        return Ok(false);
    }
    let space = max.saturating_sub(buf.len());
    if space > 0 {
        buf.extend_from_slice(&chunk[..n.min(space)]);
    }
    if n > space {
        *truncated = true;
    }
    Ok(true)
}

/// Read without blocking by toggling O_NONBLOCK around the call.
/// EAGAIN is reported as zero bytes.
fn try_read_nonblocking<R: Read + std::os::unix::io::AsRawFd>(
    stream: &mut R,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    let fd = stream.as_raw_fd();

    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(std::io::Error::last_os_error());
    }

    let was_nonblocking = (flags & libc::O_NONBLOCK) != 0;
    if !was_nonblocking {
        let result = unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };
        if result < 0 {
            return Err(std::io::Error::last_os_error());
        }
    }

    let result = stream.read(buf);

    if !was_nonblocking {
        unsafe {
            libc::fcntl(fd, libc::F_SETFL, flags);
        }
    }

    match result {
        Ok(n) => Ok(n),
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_runner() -> ToolRunner {
        // No allowlist so tests can use shell utilities
        ToolRunner::new(ToolConfig {
            allowed_commands: HashSet::new(),
            ..ToolConfig::default()
        })
    }

    #[test]
    fn test_run_captures_stdout() {
        let output = open_runner().run("echo", &["hello", "world"], None).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout_str().trim(), "hello world");
        assert!(!output.truncated);
        assert!(!output.timed_out);
    }

    #[test]
    fn test_stderr_and_nonzero_exit() {
        let output = open_runner()
            .run("sh", &["-c", "echo oops >&2; exit 3"], None)
            .unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(3));
        assert!(output.stderr_str().contains("oops"));
    }

    #[test]
    fn test_timeout_kills_process() {
        let output = open_runner()
            .run("sleep", &["10"], Some(Duration::from_millis(100)))
            .unwrap();
        assert!(output.timed_out);
        assert!(!output.success());
        assert!(output.duration < Duration::from_secs(2));
    }

    #[test]
    fn test_output_cap() {
        let runner = ToolRunner::new(ToolConfig {
            max_output_bytes: 100,
            allowed_commands: HashSet::new(),
            ..ToolConfig::default()
        });
        let output = runner
            .run("sh", &["-c", "yes | head -n 1000"], None)
            .unwrap();
        assert!(output.truncated);
        assert!(output.stdout.len() <= 100);
    }

    #[test]
    fn test_metacharacters_rejected() {
        let err = open_runner().run("echo;rm", &[], None).unwrap_err();
        assert!(matches!(err, ToolError::Rejected(_)));
    }

    #[test]
    fn test_allowlist_enforced() {
        let runner = ToolRunner::with_defaults();
        let err = runner.run("cat", &["/etc/passwd"], None).unwrap_err();
        assert!(matches!(err, ToolError::Rejected(_)));
        // ping is in the production allowlist, so it passes validation
        // even if the binary is missing on the test host
        let result = runner.run("ping", &["-c", "1", "127.0.0.1"], Some(Duration::from_secs(2)));
        assert!(!matches!(result, Err(ToolError::Rejected(_))));
    }

    #[test]
    fn test_command_not_found() {
        let err = open_runner()
            .run("/nonexistent/tool", &[], None)
            .unwrap_err();
        assert!(matches!(err, ToolError::CommandNotFound(_)));
    }

    #[test]
    fn test_budget_tracking_and_exhaustion() {
        let runner = ToolRunner::new(ToolConfig {
            budget_ms: 1,
            allowed_commands: HashSet::new(),
            ..ToolConfig::default()
        });
        let _ = runner.run("echo", &["x"], None);
        match runner.run("echo", &["y"], None) {
            Err(ToolError::BudgetExhausted { .. }) => {}
            other => panic!("expected BudgetExhausted, got {:?}", other),
        }
        runner.reset_budget();
        assert_eq!(runner.used_budget_ms(), 0);
        assert!(runner.run("echo", &["z"], None).is_ok());
    }
}
