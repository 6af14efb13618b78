//! System controller: host telemetry and global safety switches.

use super::master::GlobalConfig;
use super::{ControllerCore, FeatureController};
use crate::capabilities::CapabilitySnapshot;
use crate::exclusive::ExclusiveGate;
use crate::executors::system;
use crate::fallback::FallbackExecutor;
use serde_json::{json, Value};
use ssa_common::OperationResult;
use std::sync::{Arc, RwLock};
use tracing::info;

pub const ACTIONS: &[&str] = &[
    "monitor_resources",
    "check_hardware",
    "kill_internet",
    "restore_internet",
    "set_night_mode",
];

pub struct SystemController {
    core: ControllerCore,
    fallback: Arc<FallbackExecutor>,
    snapshot: Arc<CapabilitySnapshot>,
    gate: Arc<ExclusiveGate>,
    global: Arc<RwLock<GlobalConfig>>,
}

impl SystemController {
    pub fn new(
        fallback: Arc<FallbackExecutor>,
        snapshot: Arc<CapabilitySnapshot>,
        gate: Arc<ExclusiveGate>,
        global: Arc<RwLock<GlobalConfig>>,
    ) -> Self {
        Self {
            core: ControllerCore::new("system"),
            fallback,
            snapshot,
            gate,
            global,
        }
    }

    fn read_global(&self) -> GlobalConfig {
        self.global.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn write_global(&self, mutate: impl FnOnce(&mut GlobalConfig)) -> GlobalConfig {
        let mut config = self.global.write().unwrap_or_else(|e| e.into_inner());
        mutate(&mut config);
        config.clone()
    }

    /// Host telemetry is read directly from procfs with no capability
    /// gate and no synthetic stand-in. A read failure is a real answer
    /// and surfaces as an error.
    fn monitor_resources(&self) -> OperationResult {
        match system::stats() {
            Ok(payload) => OperationResult::hardware(payload),
            Err(e) => OperationResult::error(format!("telemetry read failed: {}", e)),
        }
    }

    fn check_hardware(&self) -> OperationResult {
        OperationResult::hardware(json!({
            "capabilities": self.snapshot.as_map(),
            "detected_at": self.snapshot.detected_at.clone(),
            "emulation_mode": self.fallback.mode().as_str(),
        }))
    }

    /// Flip the process-wide connectivity kill switch. Exclusive: the
    /// flag must not change while a scan is mid-flight.
    fn kill_internet(&self) -> OperationResult {
        self.gate.run_exclusive("kill_internet", || {
            let config = self.write_global(|c| c.internet_killed = true);
            info!("internet kill switch engaged");
            OperationResult::hardware(json!({
                "internet_killed": true,
                "global_config": config,
            }))
        })
    }

    fn restore_internet(&self) -> OperationResult {
        let config = self.write_global(|c| c.internet_killed = false);
        info!("internet kill switch released");
        OperationResult::hardware(json!({
            "internet_killed": false,
            "global_config": config,
        }))
    }

    fn set_night_mode(&self, params: &Value) -> OperationResult {
        let enabled = match params.get("enabled").and_then(Value::as_bool) {
            Some(v) => v,
            None => {
                return OperationResult::error("missing required boolean parameter 'enabled'")
            }
        };
        let config = self.write_global(|c| c.night_mode = enabled);
        OperationResult::hardware(json!({
            "night_mode": enabled,
            "global_config": config,
        }))
    }

    pub fn global_config(&self) -> GlobalConfig {
        self.read_global()
    }
}

impl FeatureController for SystemController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }

    fn actions(&self) -> &'static [&'static str] {
        ACTIONS
    }

    fn action_available(&self, action: &str) -> bool {
        match action {
            // Telemetry and local state switches never depend on hardware
            "monitor_resources" | "check_hardware" | "kill_internet" | "restore_internet"
            | "set_night_mode" => true,
            _ => false,
        }
    }

    fn dispatch(&self, action: &str, params: &Value) -> OperationResult {
        match action {
            "monitor_resources" => self.monitor_resources(),
            "check_hardware" => self.check_hardware(),
            "kill_internet" => self.kill_internet(),
            "restore_internet" => self.restore_internet(),
            "set_night_mode" => self.set_night_mode(params),
            _ => unreachable!("execute() checks the catalog"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ssa_common::Source;
    use ssa_config::EmulationMode;

    fn controller() -> SystemController {
        let snapshot = Arc::new(CapabilitySnapshot::offline());
        let fallback = Arc::new(FallbackExecutor::new(
            Arc::clone(&snapshot),
            EmulationMode::ForceEmulated,
        ));
        SystemController::new(
            fallback,
            snapshot,
            Arc::new(ExclusiveGate::new()),
            Arc::new(RwLock::new(GlobalConfig::default())),
        )
    }

    #[test]
    fn test_monitor_resources_reads_host_even_offline_and_forced() {
        // Offline snapshot, forced emulation: telemetry must still come
        // from the real procfs, never a generator.
        let c = controller();
        assert!(c.action_available("monitor_resources"));
        let result = c.execute("monitor_resources", &json!({}));
        assert_eq!(result.source(), Source::Hardware);
        assert!(result.payload().unwrap().get("cpu_percent").is_some());
        assert!(result.payload().unwrap().get("emulated").is_none());
    }

    #[test]
    fn test_check_hardware_reports_full_key_set() {
        let c = controller();
        let result = c.execute("check_hardware", &json!({}));
        let payload = result.payload().unwrap();
        assert_eq!(payload["capabilities"].as_object().unwrap().len(), 8);
        assert_eq!(payload["emulation_mode"], "force_emulated");
    }

    #[test]
    fn test_kill_and_restore_internet() {
        let c = controller();
        assert!(!c.global_config().internet_killed);

        let result = c.execute("kill_internet", &json!({}));
        assert_eq!(result.source(), Source::Hardware);
        assert!(c.global_config().internet_killed);

        let result = c.execute("restore_internet", &json!({}));
        assert!(!result.is_error());
        assert!(!c.global_config().internet_killed);
    }

    #[test]
    fn test_night_mode_requires_flag() {
        let c = controller();
        assert!(c.execute("set_night_mode", &json!({})).is_error());

        let result = c.execute("set_night_mode", &json!({"enabled": true}));
        assert!(!result.is_error());
        assert!(c.global_config().night_mode);
    }
}
