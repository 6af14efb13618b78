//! Capability-aware execution with graceful degradation.
//!
//! One decision procedure for every hardware-bound operation: attempt
//! the real path when the mode and snapshot allow it, degrade to the
//! synthetic generator otherwise or on real-path failure, and produce
//! an error-tagged result only when no generator exists either.

use crate::capabilities::{Capability, CapabilitySnapshot};
use crate::emulate::SyntheticRegistry;
use crate::executors::ExecError;
use serde_json::Value;
use ssa_common::{Error, OperationResult};
use ssa_config::EmulationMode;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct FallbackExecutor {
    snapshot: Arc<CapabilitySnapshot>,
    mode: EmulationMode,
    registry: SyntheticRegistry,
}

impl FallbackExecutor {
    pub fn new(snapshot: Arc<CapabilitySnapshot>, mode: EmulationMode) -> Self {
        Self::with_registry(snapshot, mode, SyntheticRegistry::default())
    }

    /// Build with an explicit generator catalog. Tests use this to
    /// observe generator invocations.
    pub fn with_registry(
        snapshot: Arc<CapabilitySnapshot>,
        mode: EmulationMode,
        registry: SyntheticRegistry,
    ) -> Self {
        Self {
            snapshot,
            mode,
            registry,
        }
    }

    pub fn snapshot(&self) -> &CapabilitySnapshot {
        &self.snapshot
    }

    pub fn mode(&self) -> EmulationMode {
        self.mode
    }

    /// Whether the real path would be attempted for this operation.
    pub fn real_path_enabled(&self, operation: &str) -> bool {
        match self.mode {
            EmulationMode::ForceEmulated => false,
            EmulationMode::ForceReal => true,
            EmulationMode::Auto => self.snapshot.is_present(Capability::required_for(operation)),
        }
    }

    /// Execute an operation with fallback.
    ///
    /// The real closure runs at most once. Its failure is logged and
    /// absorbed, never surfaced to the caller: the result is either a
    /// hardware payload, a synthetic payload, or a no-fallback error.
    pub fn execute<F>(&self, operation: &str, params: &Value, real: F) -> OperationResult
    where
        F: FnOnce(&Value) -> Result<Value, ExecError>,
    {
        if self.real_path_enabled(operation) {
            match real(params) {
                Ok(payload) => {
                    debug!(operation, "real path succeeded");
                    return OperationResult::hardware(payload);
                }
                Err(e) => {
                    warn!(operation, error = %e, "real path failed, degrading to synthetic");
                }
            }
        } else {
            debug!(
                operation,
                mode = %self.mode,
                "real path skipped"
            );
        }

        match self.registry.generate(operation, params) {
            Some(payload) => OperationResult::emulated(payload),
            None => OperationResult::from_error(&Error::NoFallback {
                operation: operation.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulate::SyntheticRegistry;
    use serde_json::json;
    use ssa_common::Source;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn offline(mode: EmulationMode) -> FallbackExecutor {
        FallbackExecutor::new(Arc::new(CapabilitySnapshot::offline()), mode)
    }

    #[test]
    fn test_absent_capability_degrades_without_real_call() {
        let executor = offline(EmulationMode::Auto);
        let calls = AtomicUsize::new(0);

        let result = executor.execute("wifi_scan", &json!({}), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({}))
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.source(), Source::Emulated);
        assert_eq!(result.payload().unwrap()["emulated"], true);
    }

    #[test]
    fn test_present_capability_uses_real_payload() {
        let mut snapshot = CapabilitySnapshot::offline();
        snapshot.wifi_managed = true;
        let executor = FallbackExecutor::new(Arc::new(snapshot), EmulationMode::Auto);

        let result = executor.execute("wifi_scan", &json!({}), |_| {
            Ok(json!({"networks": [], "count": 0}))
        });

        assert_eq!(result.source(), Source::Hardware);
        assert!(result.payload().unwrap().get("emulated").is_none());
    }

    #[test]
    fn test_real_failure_degrades_to_synthetic() {
        let mut snapshot = CapabilitySnapshot::offline();
        snapshot.wifi_managed = true;
        let executor = FallbackExecutor::new(Arc::new(snapshot), EmulationMode::Auto);

        let result = executor.execute("wifi_scan", &json!({}), |_| {
            Err(ExecError::Unavailable("interface down".into()))
        });

        assert_eq!(result.source(), Source::Emulated);
    }

    #[test]
    fn test_force_real_attempts_despite_absent_capability() {
        let executor = offline(EmulationMode::ForceReal);
        let calls = AtomicUsize::new(0);

        let result = executor.execute("wifi_scan", &json!({}), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ExecError::Unavailable("no interface".into()))
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.source(), Source::Emulated);
    }

    #[test]
    fn test_force_emulated_never_calls_real() {
        let mut snapshot = CapabilitySnapshot::offline();
        snapshot.wifi_managed = true;
        let executor = FallbackExecutor::new(Arc::new(snapshot), EmulationMode::ForceEmulated);
        let calls = AtomicUsize::new(0);

        let result = executor.execute("wifi_scan", &json!({}), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({}))
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.source(), Source::Emulated);
    }

    #[test]
    fn test_no_generator_and_no_hardware_is_an_error() {
        let executor = FallbackExecutor::with_registry(
            Arc::new(CapabilitySnapshot::offline()),
            EmulationMode::Auto,
            SyntheticRegistry::empty(),
        );

        let result = executor.execute("wifi_scan", &json!({}), |_| Ok(json!({})));

        assert!(result.is_error());
        assert!(result.error_message().unwrap().contains("no fallback"));
    }

    #[test]
    fn test_params_reach_the_generator() {
        let executor = offline(EmulationMode::ForceEmulated);
        let result = executor.execute("start_sdr", &json!({"frequency": 100.0}), |_| {
            Ok(json!({}))
        });
        assert_eq!(result.payload().unwrap()["frequency"], 100.0);
    }
}
