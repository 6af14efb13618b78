//! Spectrum controller: SDR lifecycle, sweeps, and aircraft tracking.

use super::{proxy_result, require_f64, ControllerCore, FeatureController};
use crate::exclusive::ExclusiveGate;
use crate::executors::sdr;
use crate::fallback::FallbackExecutor;
use crate::tools::ToolRunner;
use serde_json::{json, Value};
use ssa_common::OperationResult;
use ssa_proxy::ProxyManager;
use std::sync::{Arc, Mutex};
use tracing::debug;

const DEFAULT_FREQUENCY_MHZ: f64 = 100.0;
const DEFAULT_TRACK_RADIUS_KM: f64 = 50.0;

pub const ACTIONS: &[&str] = &[
    "start_sdr",
    "stop_sdr",
    "tune_frequency",
    "spectrum_scan",
    "track_aircraft",
];

#[derive(Debug, Default)]
struct SdrState {
    active: bool,
    frequency_mhz: Option<f64>,
}

pub struct SpectrumController {
    core: ControllerCore,
    fallback: Arc<FallbackExecutor>,
    proxies: Arc<ProxyManager>,
    gate: Arc<ExclusiveGate>,
    runner: Arc<ToolRunner>,
    sdr: Mutex<SdrState>,
}

impl SpectrumController {
    pub fn new(
        fallback: Arc<FallbackExecutor>,
        proxies: Arc<ProxyManager>,
        gate: Arc<ExclusiveGate>,
        runner: Arc<ToolRunner>,
    ) -> Self {
        Self {
            core: ControllerCore::new("spectrum"),
            fallback,
            proxies,
            gate,
            runner,
            sdr: Mutex::new(SdrState::default()),
        }
    }

    fn sdr_state(&self) -> std::sync::MutexGuard<'_, SdrState> {
        self.sdr.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn frequency_from(&self, params: &Value) -> f64 {
        params
            .get("frequency")
            .and_then(Value::as_f64)
            .or_else(|| self.sdr_state().frequency_mhz)
            .unwrap_or(DEFAULT_FREQUENCY_MHZ)
    }

    fn record_tuned(&self, frequency: f64) {
        let mut state = self.sdr_state();
        state.active = true;
        state.frequency_mhz = Some(frequency);
        debug!(frequency, "sdr tuned");
    }

    fn start_sdr(&self, params: &Value) -> OperationResult {
        let frequency = self.frequency_from(params);
        let result = self.gate.run_exclusive("start_sdr", || {
            self.fallback.execute("start_sdr", params, |_| {
                sdr::start(&self.runner, frequency)
            })
        });
        if !result.is_error() {
            self.record_tuned(frequency);
        }
        result
    }

    fn stop_sdr(&self) -> OperationResult {
        let mut state = self.sdr_state();
        let was_active = state.active;
        state.active = false;
        debug!(was_active, "sdr stopped");
        OperationResult::hardware(json!({
            "stopped": true,
            "was_active": was_active,
        }))
    }

    fn tune_frequency(&self, params: &Value) -> OperationResult {
        let frequency = match require_f64(params, "frequency") {
            Ok(v) => v,
            Err(result) => return result,
        };
        let result = self.fallback.execute("tune_frequency", params, |_| {
            sdr::start(&self.runner, frequency)
        });
        if !result.is_error() {
            self.record_tuned(frequency);
        }
        result
    }

    fn spectrum_scan(&self, params: &Value) -> OperationResult {
        let frequency = self.frequency_from(params);
        self.gate.run_exclusive("spectrum_scan", || {
            self.fallback.execute("spectrum_scan", params, |_| {
                sdr::sweep(&self.runner, frequency)
            })
        })
    }

    /// Aircraft positions come from the public ADS-B feed regardless of
    /// local SDR hardware; the feed is strictly better than a dongle.
    fn track_aircraft(&self, params: &Value) -> OperationResult {
        let lat = match require_f64(params, "lat") {
            Ok(v) => v,
            Err(result) => return result,
        };
        let lon = match require_f64(params, "lon") {
            Ok(v) => v,
            Err(result) => return result,
        };
        let radius = params
            .get("radius_km")
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_TRACK_RADIUS_KM);
        proxy_result(self.proxies.live_aircraft(lat, lon, radius))
    }

    /// Current SDR tuning state, reported alongside controller status.
    pub fn sdr_status(&self) -> Value {
        let state = self.sdr_state();
        json!({
            "active": state.active,
            "frequency_mhz": state.frequency_mhz,
        })
    }
}

impl FeatureController for SpectrumController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }

    fn actions(&self) -> &'static [&'static str] {
        ACTIONS
    }

    fn action_available(&self, action: &str) -> bool {
        match action {
            "start_sdr" | "stop_sdr" | "tune_frequency" | "spectrum_scan" => {
                self.fallback.real_path_enabled(action)
            }
            // Public feed, always reachable in principle
            "track_aircraft" => true,
            _ => false,
        }
    }

    fn dispatch(&self, action: &str, params: &Value) -> OperationResult {
        match action {
            "start_sdr" => self.start_sdr(params),
            "stop_sdr" => self.stop_sdr(),
            "tune_frequency" => self.tune_frequency(params),
            "spectrum_scan" => self.spectrum_scan(params),
            "track_aircraft" => self.track_aircraft(params),
            _ => unreachable!("execute() checks the catalog"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::CapabilitySnapshot;
    use ssa_common::Source;
    use ssa_config::{EmulationMode, ProxyKeys};

    fn emulated_controller() -> SpectrumController {
        let fallback = Arc::new(FallbackExecutor::new(
            Arc::new(CapabilitySnapshot::offline()),
            EmulationMode::ForceEmulated,
        ));
        SpectrumController::new(
            fallback,
            Arc::new(ProxyManager::new(ProxyKeys::default())),
            Arc::new(ExclusiveGate::new()),
            Arc::new(ToolRunner::with_defaults()),
        )
    }

    #[test]
    fn test_start_sdr_without_hardware_emulates_and_echoes_frequency() {
        let controller = emulated_controller();
        let result = controller.execute("start_sdr", &json!({"frequency": 100.0}));
        assert_eq!(result.source(), Source::Emulated);
        let payload = result.payload().unwrap();
        assert_eq!(payload["frequency"], 100.0);
        assert_eq!(payload["emulated"], true);
        // Same shape as the real tune confirmation
        assert_eq!(payload["started"], true);
        assert!(payload["device"].as_str().is_some());
        assert_eq!(controller.sdr_status()["active"], true);
        assert_eq!(controller.sdr_status()["frequency_mhz"], 100.0);
    }

    #[test]
    fn test_stop_sdr_clears_state() {
        let controller = emulated_controller();
        controller.execute("start_sdr", &json!({"frequency": 433.92}));
        let result = controller.execute("stop_sdr", &json!({}));
        assert_eq!(result.source(), Source::Hardware);
        assert_eq!(result.payload().unwrap()["was_active"], true);
        assert_eq!(controller.sdr_status()["active"], false);
    }

    #[test]
    fn test_tune_requires_frequency() {
        let controller = emulated_controller();
        let result = controller.execute("tune_frequency", &json!({}));
        assert!(result.is_error());
        assert!(result.error_message().unwrap().contains("frequency"));
    }

    #[test]
    fn test_spectrum_scan_reuses_tuned_frequency() {
        let controller = emulated_controller();
        controller.execute("start_sdr", &json!({"frequency": 915.0}));
        let result = controller.execute("spectrum_scan", &json!({}));
        assert_eq!(result.source(), Source::Emulated);
        // The generator only sees the (empty) params; the controller
        // state keeps 915.0 for the real path.
        assert_eq!(controller.sdr_status()["frequency_mhz"], 915.0);
        assert!(!result.is_error());
    }

    #[test]
    fn test_spectrum_scan_payload_matches_sweep_shape() {
        let controller = emulated_controller();
        let result = controller.execute("spectrum_scan", &json!({"frequency": 433.92}));
        let payload = result.payload().unwrap();
        assert!(payload["power_db"].is_array());
        assert_eq!(payload["bins"], payload["power_db"].as_array().unwrap().len());
        assert!(payload.get("fft").is_none());
    }

    #[test]
    fn test_track_aircraft_requires_location() {
        let controller = emulated_controller();
        let result = controller.execute("track_aircraft", &json!({"lat": 37.0}));
        assert!(result.is_error());
        assert!(result.error_message().unwrap().contains("lon"));
    }
}
