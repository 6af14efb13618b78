//! The master controller: single entry point for module commands.
//!
//! Routes `(module, action, params)` to the owning feature controller,
//! converts every failure into an error-tagged result with
//! discoverability hints, and aggregates status across the system.
//! Nothing below this layer is reachable from the outside.

use super::intel::IntelController;
use super::spectrum::SpectrumController;
use super::system::SystemController;
use super::tactical::TacticalController;
use super::vision::VisionController;
use super::FeatureController;
use crate::capabilities::{self, CapabilitySnapshot};
use crate::exclusive::ExclusiveGate;
use crate::fallback::FallbackExecutor;
use crate::tools::ToolRunner;
use serde::Serialize;
use serde_json::{json, Value};
use ssa_common::{Error, OperationResult};
use ssa_config::{EmulationMode, Settings};
use ssa_proxy::ProxyManager;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::{error, info};

/// Valid module names, in catalog order.
pub const MODULES: &[&str] = &["tactical", "spectrum", "intel", "vision", "system"];

/// Process-wide switches shared by all controllers.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalConfig {
    pub internet_killed: bool,
    pub night_mode: bool,
    pub auto_logging: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            internet_killed: false,
            night_mode: false,
            auto_logging: true,
        }
    }
}

pub struct MasterController {
    tactical: TacticalController,
    spectrum: SpectrumController,
    intel: IntelController,
    vision: VisionController,
    system: SystemController,
    snapshot: Arc<CapabilitySnapshot>,
    proxies: Arc<ProxyManager>,
    global: Arc<RwLock<GlobalConfig>>,
    mode: EmulationMode,
}

impl MasterController {
    /// Boot the control layer: detect capabilities (unless emulation is
    /// forced) and wire up the five controllers.
    pub fn new(settings: &Settings) -> Self {
        let runner = Arc::new(ToolRunner::with_defaults());
        let snapshot = match settings.emulation_mode {
            EmulationMode::ForceEmulated => {
                info!("emulation forced, skipping capability detection");
                CapabilitySnapshot::offline()
            }
            _ => capabilities::detect(&runner),
        };
        Self::with_snapshot(settings, snapshot, runner)
    }

    /// Wire the controllers around a pre-built snapshot. Tests use this
    /// to pin the hardware picture.
    pub fn with_snapshot(
        settings: &Settings,
        snapshot: CapabilitySnapshot,
        runner: Arc<ToolRunner>,
    ) -> Self {
        let snapshot = Arc::new(snapshot);
        let mode = settings.emulation_mode;
        let fallback = Arc::new(FallbackExecutor::new(Arc::clone(&snapshot), mode));
        let proxies = Arc::new(ProxyManager::new(settings.keys.clone()));
        let gate = Arc::new(ExclusiveGate::new());
        let global = Arc::new(RwLock::new(GlobalConfig::default()));

        Self {
            tactical: TacticalController::new(
                Arc::clone(&fallback),
                Arc::clone(&proxies),
                Arc::clone(&gate),
                Arc::clone(&runner),
            ),
            spectrum: SpectrumController::new(
                Arc::clone(&fallback),
                Arc::clone(&proxies),
                Arc::clone(&gate),
                Arc::clone(&runner),
            ),
            intel: IntelController::new(Arc::clone(&proxies)),
            vision: VisionController::new(
                Arc::clone(&fallback),
                Arc::clone(&proxies),
                Arc::clone(&runner),
            ),
            system: SystemController::new(
                fallback,
                Arc::clone(&snapshot),
                gate,
                Arc::clone(&global),
            ),
            snapshot,
            proxies,
            global,
            mode,
        }
    }

    fn controller(&self, module: &str) -> Option<&dyn FeatureController> {
        match module {
            "tactical" => Some(&self.tactical),
            "spectrum" => Some(&self.spectrum),
            "intel" => Some(&self.intel),
            "vision" => Some(&self.vision),
            "system" => Some(&self.system),
            _ => None,
        }
    }

    fn controllers(&self) -> [&dyn FeatureController; 5] {
        [
            &self.tactical,
            &self.spectrum,
            &self.intel,
            &self.vision,
            &self.system,
        ]
    }

    fn unknown_module(&self, module: &str) -> OperationResult {
        OperationResult::from_error(&Error::UnknownModule {
            module: module.to_string(),
            valid: MODULES.to_vec(),
        })
    }

    /// Execute a module action. Total: every outcome, including a
    /// panicking dispatch path, becomes an `OperationResult`.
    pub fn execute(&self, module: &str, action: &str, params: Value) -> OperationResult {
        let Some(controller) = self.controller(module) else {
            return self.unknown_module(module);
        };

        match catch_unwind(AssertUnwindSafe(|| controller.execute(action, &params))) {
            Ok(result) => result,
            Err(_) => {
                error!(module, action, "dispatch panicked");
                OperationResult::from_error(&Error::ExecutionFailed(format!(
                    "internal failure executing {}.{}",
                    module, action
                )))
            }
        }
    }

    /// Idempotent module enable.
    pub fn enable_module(&self, module: &str) -> OperationResult {
        let Some(controller) = self.controller(module) else {
            return self.unknown_module(module);
        };
        controller.core().enable();
        OperationResult::hardware(json!({ "module": module, "enabled": true }))
    }

    /// Idempotent module disable.
    pub fn disable_module(&self, module: &str) -> OperationResult {
        let Some(controller) = self.controller(module) else {
            return self.unknown_module(module);
        };
        controller.core().disable();
        OperationResult::hardware(json!({ "module": module, "enabled": false }))
    }

    /// Action catalog and per-action availability for one module.
    pub fn module_capabilities(&self, module: &str) -> OperationResult {
        let Some(controller) = self.controller(module) else {
            return self.unknown_module(module);
        };
        OperationResult::hardware(json!({
            "module": module,
            "actions": controller.actions(),
            "available": controller.capability_map(),
        }))
    }

    /// Aggregate status: all controllers, the capability snapshot,
    /// proxy configuration, and global switches.
    pub fn get_all_status(&self) -> Value {
        let mut controllers = serde_json::Map::new();
        for controller in self.controllers() {
            let mut report = json!(controller.core().status_report());
            report["actions"] = json!(controller.actions());
            controllers.insert(controller.name().to_string(), report);
        }
        // SDR tuning state rides along with the spectrum entry
        controllers
            .entry("spectrum")
            .and_modify(|entry| entry["sdr"] = self.spectrum.sdr_status());

        json!({
            "controllers": controllers,
            "capabilities": self.snapshot.as_map(),
            "detected_at": self.snapshot.detected_at.clone(),
            "proxies": self.proxies.status(),
            "global_config": self.global.read().unwrap_or_else(|e| e.into_inner()).clone(),
            "emulation_mode": self.mode.as_str(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })
    }

    pub fn snapshot(&self) -> &CapabilitySnapshot {
        &self.snapshot
    }

    pub fn emulation_mode(&self) -> EmulationMode {
        self.mode
    }
}
