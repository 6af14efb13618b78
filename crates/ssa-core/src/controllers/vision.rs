//! Vision controller: cameras, public webcams, and audio capture.

use super::{proxy_result, require_f64, ControllerCore, FeatureController};
use crate::executors::vision;
use crate::fallback::FallbackExecutor;
use crate::tools::ToolRunner;
use serde_json::Value;
use ssa_common::OperationResult;
use ssa_proxy::ProxyManager;
use std::sync::Arc;

const DEFAULT_WEBCAM_RADIUS_KM: u32 = 25;

pub const ACTIONS: &[&str] = &[
    "discover_cameras",
    "find_public_webcams",
    "capture_frame",
    "audio_analysis",
];

pub struct VisionController {
    core: ControllerCore,
    fallback: Arc<FallbackExecutor>,
    proxies: Arc<ProxyManager>,
    runner: Arc<ToolRunner>,
}

impl VisionController {
    pub fn new(
        fallback: Arc<FallbackExecutor>,
        proxies: Arc<ProxyManager>,
        runner: Arc<ToolRunner>,
    ) -> Self {
        Self {
            core: ControllerCore::new("vision"),
            fallback,
            proxies,
            runner,
        }
    }

    fn discover_cameras(&self, params: &Value) -> OperationResult {
        self.fallback
            .execute("discover_cameras", params, |_| vision::discover_cameras())
    }

    fn find_public_webcams(&self, params: &Value) -> OperationResult {
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
            .and_then(Value::as_u64)
            .map(|v| v.min(250) as u32)
            .unwrap_or(DEFAULT_WEBCAM_RADIUS_KM);
        proxy_result(self.proxies.public_webcams(lat, lon, radius))
    }

    fn capture_frame(&self, params: &Value) -> OperationResult {
        let device = params
            .get("device")
            .and_then(Value::as_str)
            .map(str::to_string);
        self.fallback.execute("capture_frame", params, |_| {
            vision::capture_frame(&self.runner, device.as_deref())
        })
    }

    fn audio_analysis(&self, params: &Value) -> OperationResult {
        self.fallback.execute("audio_analysis", params, |_| {
            vision::audio_devices(&self.runner)
        })
    }
}

impl FeatureController for VisionController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }

    fn actions(&self) -> &'static [&'static str] {
        ACTIONS
    }

    fn action_available(&self, action: &str) -> bool {
        match action {
            "discover_cameras" | "capture_frame" | "audio_analysis" => {
                self.fallback.real_path_enabled(action)
            }
            "find_public_webcams" => self.proxies.windy_configured(),
            _ => false,
        }
    }

    fn dispatch(&self, action: &str, params: &Value) -> OperationResult {
        match action {
            "discover_cameras" => self.discover_cameras(params),
            "find_public_webcams" => self.find_public_webcams(params),
            "capture_frame" => self.capture_frame(params),
            "audio_analysis" => self.audio_analysis(params),
            _ => unreachable!("execute() checks the catalog"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::CapabilitySnapshot;
    use serde_json::json;
    use ssa_common::Source;
    use ssa_config::{EmulationMode, ProxyKeys};

    fn emulated_controller() -> VisionController {
        let fallback = Arc::new(FallbackExecutor::new(
            Arc::new(CapabilitySnapshot::offline()),
            EmulationMode::ForceEmulated,
        ));
        VisionController::new(
            fallback,
            Arc::new(ProxyManager::new(ProxyKeys::default())),
            Arc::new(ToolRunner::with_defaults()),
        )
    }

    #[test]
    fn test_camera_discovery_degrades() {
        let controller = emulated_controller();
        let result = controller.execute("discover_cameras", &json!({}));
        assert_eq!(result.source(), Source::Emulated);
        assert_eq!(result.payload().unwrap()["emulated"], true);
    }

    #[test]
    fn test_webcams_without_credential() {
        let controller = emulated_controller();
        let result =
            controller.execute("find_public_webcams", &json!({"lat": 48.8, "lon": 2.35}));
        assert!(result.is_error());
        assert!(result.error_message().unwrap().contains("not configured"));
    }

    #[test]
    fn test_audio_analysis_degrades_to_enumeration_shape() {
        let controller = emulated_controller();
        let result = controller.execute("audio_analysis", &json!({}));
        assert_eq!(result.source(), Source::Emulated);
        let payload = result.payload().unwrap();
        assert!(payload["devices"].is_array());
        assert!(payload.get("count").is_some());
    }
}
