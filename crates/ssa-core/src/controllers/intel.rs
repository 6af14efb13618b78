//! Intel controller: OSINT lookups relayed through proxy services.
//!
//! Every action here is proxy-backed; there is no hardware path and no
//! synthetic fallback. Missing credentials surface as configuration
//! errors, never as fabricated intelligence.

use super::{proxy_result, require_f64, require_str, ControllerCore, FeatureController};
use serde_json::Value;
use ssa_common::OperationResult;
use ssa_proxy::ProxyManager;
use std::sync::Arc;

const DEFAULT_SEARCH_LIMIT: u32 = 10;

pub const ACTIONS: &[&str] = &[
    "geolocate_ip",
    "shodan_search",
    "shodan_host",
    "phone_lookup",
    "reverse_geocode",
];

pub struct IntelController {
    core: ControllerCore,
    proxies: Arc<ProxyManager>,
}

impl IntelController {
    pub fn new(proxies: Arc<ProxyManager>) -> Self {
        Self {
            core: ControllerCore::new("intel"),
            proxies,
        }
    }

    fn geolocate_ip(&self, params: &Value) -> OperationResult {
        let ip = match require_str(params, "ip") {
            Ok(v) => v,
            Err(result) => return result,
        };
        proxy_result(self.proxies.geolocate_ip(ip))
    }

    fn shodan_search(&self, params: &Value) -> OperationResult {
        let query = match require_str(params, "query") {
            Ok(v) => v,
            Err(result) => return result,
        };
        let limit = params
            .get("limit")
            .and_then(Value::as_u64)
            .map(|v| v.min(100) as u32)
            .unwrap_or(DEFAULT_SEARCH_LIMIT);
        proxy_result(self.proxies.shodan_search(query, limit))
    }

    fn shodan_host(&self, params: &Value) -> OperationResult {
        let ip = match require_str(params, "ip") {
            Ok(v) => v,
            Err(result) => return result,
        };
        proxy_result(self.proxies.shodan_host(ip))
    }

    fn phone_lookup(&self, params: &Value) -> OperationResult {
        let number = match require_str(params, "number") {
            Ok(v) => v,
            Err(result) => return result,
        };
        proxy_result(self.proxies.lookup_phone(number))
    }

    fn reverse_geocode(&self, params: &Value) -> OperationResult {
        let lat = match require_f64(params, "lat") {
            Ok(v) => v,
            Err(result) => return result,
        };
        let lon = match require_f64(params, "lon") {
            Ok(v) => v,
            Err(result) => return result,
        };
        proxy_result(self.proxies.reverse_geocode(lat, lon))
    }
}

impl FeatureController for IntelController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }

    fn actions(&self) -> &'static [&'static str] {
        ACTIONS
    }

    fn action_available(&self, action: &str) -> bool {
        let status = self.proxies.status();
        let configured = |service: &str| status.get(service).copied().unwrap_or(false);
        match action {
            "geolocate_ip" => configured("ipgeolocation"),
            "shodan_search" | "shodan_host" => configured("shodan"),
            "phone_lookup" => configured("numverify"),
            "reverse_geocode" => configured("opencage"),
            _ => false,
        }
    }

    fn dispatch(&self, action: &str, params: &Value) -> OperationResult {
        match action {
            "geolocate_ip" => self.geolocate_ip(params),
            "shodan_search" => self.shodan_search(params),
            "shodan_host" => self.shodan_host(params),
            "phone_lookup" => self.phone_lookup(params),
            "reverse_geocode" => self.reverse_geocode(params),
            _ => unreachable!("execute() checks the catalog"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ssa_config::ProxyKeys;

    fn keyless_controller() -> IntelController {
        IntelController::new(Arc::new(ProxyManager::new(ProxyKeys::default())))
    }

    #[test]
    fn test_geolocate_without_credentials_is_not_configured() {
        let controller = keyless_controller();
        let result = controller.execute("geolocate_ip", &json!({"ip": "8.8.8.8"}));
        assert!(result.is_error());
        assert!(result.error_message().unwrap().contains("not configured"));
    }

    #[test]
    fn test_missing_params_reported_before_any_call() {
        let controller = keyless_controller();

        let result = controller.execute("geolocate_ip", &json!({}));
        assert!(result.error_message().unwrap().contains("ip"));

        let result = controller.execute("shodan_search", &json!({}));
        assert!(result.error_message().unwrap().contains("query"));

        let result = controller.execute("reverse_geocode", &json!({"lat": 1.0}));
        assert!(result.error_message().unwrap().contains("lon"));
    }

    #[test]
    fn test_no_action_available_without_keys() {
        let controller = keyless_controller();
        assert!(controller.capability_map().values().all(|&v| !v));
    }
}
