//! Real hardware executors.
//!
//! Each executor drives an external tool or kernel interface through
//! [`crate::tools::ToolRunner`] and maps the raw output into the fixed
//! payload shape for its operation. Executors are opaque behind the
//! fallback boundary: their errors never reach callers directly, they
//! only trigger degradation.

pub mod bluetooth;
pub mod netscan;
pub mod sdr;
pub mod system;
pub mod vision;
pub mod wifi;

use crate::tools::ToolError;
use thiserror::Error;

/// Failure of a real execution path.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("tool execution failed: {0}")]
    Tool(#[from] ToolError),

    #[error("tool '{tool}' exited with {code:?}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    #[error("could not parse {tool} output: {message}")]
    Parse {
        tool: &'static str,
        message: String,
    },

    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecError {
    /// Build a failure from a completed-but-unsuccessful tool run.
    pub(crate) fn from_output(tool: &'static str, output: &crate::tools::ToolOutput) -> Self {
        if output.timed_out {
            ExecError::Unavailable(format!("{} timed out", tool))
        } else {
            ExecError::ToolFailed {
                tool,
                code: output.exit_code,
                stderr: output.stderr_str().chars().take(200).collect(),
            }
        }
    }
}
