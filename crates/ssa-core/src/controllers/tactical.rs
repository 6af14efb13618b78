//! Tactical controller: Wi-Fi, Bluetooth, and network scanning.

use super::{proxy_result, require_str, ControllerCore, FeatureController};
use crate::exclusive::ExclusiveGate;
use crate::executors::{bluetooth, netscan, wifi, ExecError};
use crate::fallback::FallbackExecutor;
use crate::tools::ToolRunner;
use serde_json::Value;
use ssa_common::OperationResult;
use ssa_proxy::ProxyManager;
use std::sync::Arc;

const DEFAULT_INTERFACE: &str = "wlan0";

/// Default WiGLE search box half-width in degrees (~1 km).
const DEFAULT_RADIUS_DEG: f64 = 0.01;

pub const ACTIONS: &[&str] = &[
    "wifi_scan",
    "wifi_scan_wigle",
    "bluetooth_scan",
    "nmap_scan",
    "handshake_capture",
    "deauth_attack",
];

pub struct TacticalController {
    core: ControllerCore,
    fallback: Arc<FallbackExecutor>,
    proxies: Arc<ProxyManager>,
    gate: Arc<ExclusiveGate>,
    runner: Arc<ToolRunner>,
}

impl TacticalController {
    pub fn new(
        fallback: Arc<FallbackExecutor>,
        proxies: Arc<ProxyManager>,
        gate: Arc<ExclusiveGate>,
        runner: Arc<ToolRunner>,
    ) -> Self {
        Self {
            core: ControllerCore::new("tactical"),
            fallback,
            proxies,
            gate,
            runner,
        }
    }

    fn wifi_scan(&self, params: &Value) -> OperationResult {
        // A caller-supplied location routes through WiGLE when it is
        // configured; otherwise scan locally with fallback.
        let location = params.get("lat").and_then(Value::as_f64).zip(
            params.get("lon").and_then(Value::as_f64),
        );
        if let Some((lat, lon)) = location {
            if self.proxies.wigle_configured() {
                let radius = params
                    .get("radius_deg")
                    .and_then(Value::as_f64)
                    .unwrap_or(DEFAULT_RADIUS_DEG);
                return proxy_result(self.proxies.wifi_networks_near(lat, lon, radius));
            }
        }

        let interface = params
            .get("interface")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_INTERFACE)
            .to_string();
        self.fallback.execute("wifi_scan", params, |_| {
            wifi::scan(&self.runner, &interface)
        })
    }

    fn wifi_scan_wigle(&self, params: &Value) -> OperationResult {
        let lat = match params.get("lat").and_then(Value::as_f64) {
            Some(v) => v,
            None => return OperationResult::error("missing required numeric parameter 'lat'"),
        };
        let lon = match params.get("lon").and_then(Value::as_f64) {
            Some(v) => v,
            None => return OperationResult::error("missing required numeric parameter 'lon'"),
        };
        let radius = params
            .get("radius_deg")
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_RADIUS_DEG);
        proxy_result(self.proxies.wifi_networks_near(lat, lon, radius))
    }

    fn bluetooth_scan(&self, params: &Value) -> OperationResult {
        self.fallback
            .execute("bluetooth_scan", params, |_| bluetooth::scan(&self.runner))
    }

    fn nmap_scan(&self, params: &Value) -> OperationResult {
        let target = match require_str(params, "target") {
            Ok(t) => t.to_string(),
            Err(result) => return result,
        };
        let profile = params
            .get("profile")
            .and_then(Value::as_str)
            .map(str::to_string);
        self.gate.run_exclusive("nmap_scan", || {
            self.fallback.execute("nmap_scan", params, |_| {
                netscan::scan(&self.runner, &target, profile.as_deref())
            })
        })
    }

    /// Monitor-mode captures have no real implementation in this build;
    /// they always degrade to the synthetic path.
    fn monitor_mode_op(&self, operation: &'static str, params: &Value) -> OperationResult {
        self.gate.run_exclusive(operation, || {
            self.fallback.execute(operation, params, |_| {
                Err::<Value, _>(ExecError::Unavailable(
                    "monitor-mode operations are not implemented in this build".into(),
                ))
            })
        })
    }
}

impl FeatureController for TacticalController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }

    fn actions(&self) -> &'static [&'static str] {
        ACTIONS
    }

    fn action_available(&self, action: &str) -> bool {
        match action {
            "wifi_scan" | "nmap_scan" | "bluetooth_scan" => self.fallback.real_path_enabled(action),
            "wifi_scan_wigle" => self.proxies.wigle_configured(),
            // No real monitor-mode path in this build
            "handshake_capture" | "deauth_attack" => false,
            _ => false,
        }
    }

    fn dispatch(&self, action: &str, params: &Value) -> OperationResult {
        match action {
            "wifi_scan" => self.wifi_scan(params),
            "wifi_scan_wigle" => self.wifi_scan_wigle(params),
            "bluetooth_scan" => self.bluetooth_scan(params),
            "nmap_scan" => self.nmap_scan(params),
            "handshake_capture" => self.monitor_mode_op("handshake_capture", params),
            "deauth_attack" => self.monitor_mode_op("deauth_attack", params),
            _ => unreachable!("execute() checks the catalog"),
        }
    }
}
