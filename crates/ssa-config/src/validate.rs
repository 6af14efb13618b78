//! Settings validation for the `check` command.

use crate::settings::{EmulationMode, Settings};
use serde::Serialize;

/// Outcome of validating loaded settings against the environment.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Hard errors; the process should not continue.
    pub errors: Vec<String>,

    /// Soft warnings; degraded but functional.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

/// Validate settings and produce a report.
///
/// Settings that parse are never hard errors here; parse failures are
/// surfaced earlier by [`Settings::load`]. This pass flags deployment
/// gaps that will degrade behavior at runtime.
pub fn validate(settings: &Settings) -> ValidationReport {
    let mut report = ValidationReport::default();

    if settings.keys.configured_count() == 0 {
        report.warn(
            "no proxy API credentials configured: all proxy-only actions \
             (intel, webcam discovery, WiGLE scans) will return 'not configured' errors",
        );
    }

    if let Some(wigle) = settings.keys.wigle.as_deref() {
        if !wigle.contains(':') {
            report.warn("WIGLE_API_KEY should be in 'name:token' form for basic auth");
        }
    }

    match settings.emulation_mode {
        EmulationMode::ForceEmulated => {
            report.warn("emulation mode forced: hardware will never be touched");
        }
        EmulationMode::ForceReal => {
            report.warn(
                "force_real mode: real paths are attempted even for absent capabilities; \
                 expect degraded results on hosts without the hardware",
            );
        }
        EmulationMode::Auto => {}
    }

    report
}
