//! The proxy manager: shared HTTP agent, credentials, and service status.

use crate::error::ProxyError;
use crate::{adsb, geo, phone, shodan, webcams, wigle, PROXY_TIMEOUT_SECS, USER_AGENT};
use serde_json::Value;
use ssa_config::ProxyKeys;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::instrument;

/// Owns the HTTP agent and credentials for all proxy services.
///
/// Constructed once at startup and shared by `Arc`; every call is
/// synchronous and bounded by the agent-level timeout.
pub struct ProxyManager {
    agent: ureq::Agent,
    keys: ProxyKeys,
}

impl ProxyManager {
    /// Build a manager with the standard 10s timeout and product UA.
    pub fn new(keys: ProxyKeys) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(PROXY_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build();
        Self { agent, keys }
    }

    /// Per-service availability flags.
    ///
    /// Keyed services report credential presence; the ADS-B feed is
    /// public and always reports `true`.
    pub fn status(&self) -> BTreeMap<&'static str, bool> {
        let mut map: BTreeMap<&'static str, bool> = self.keys.configured().into_iter().collect();
        map.insert("adsb", true);
        map
    }

    /// Whether any geographic Wi-Fi proxy lookup is possible.
    pub fn wigle_configured(&self) -> bool {
        self.keys.wigle.is_some()
    }

    /// Whether webcam discovery is possible.
    pub fn windy_configured(&self) -> bool {
        self.keys.windy.is_some()
    }

    /// Observed Wi-Fi networks near a location, via WiGLE.
    #[instrument(skip(self))]
    pub fn wifi_networks_near(
        &self,
        lat: f64,
        lon: f64,
        radius_deg: f64,
    ) -> Result<Value, ProxyError> {
        let key = self
            .keys
            .wigle
            .as_deref()
            .ok_or(ProxyError::NotConfigured { service: "wigle" })?;
        wigle::search(&self.agent, key, lat, lon, radius_deg)
    }

    /// Shodan host search.
    #[instrument(skip(self))]
    pub fn shodan_search(&self, query: &str, limit: u32) -> Result<Value, ProxyError> {
        let key = self
            .keys
            .shodan
            .as_deref()
            .ok_or(ProxyError::NotConfigured { service: "shodan" })?;
        shodan::search(&self.agent, key, query, limit)
    }

    /// Shodan single-host detail.
    #[instrument(skip(self))]
    pub fn shodan_host(&self, ip: &str) -> Result<Value, ProxyError> {
        let key = self
            .keys
            .shodan
            .as_deref()
            .ok_or(ProxyError::NotConfigured { service: "shodan" })?;
        shodan::host(&self.agent, key, ip)
    }

    /// Live aircraft near a location from the public ADS-B feed.
    #[instrument(skip(self))]
    pub fn live_aircraft(&self, lat: f64, lon: f64, radius_km: f64) -> Result<Value, ProxyError> {
        adsb::near(&self.agent, lat, lon, radius_km)
    }

    /// Geolocate an IP address.
    #[instrument(skip(self))]
    pub fn geolocate_ip(&self, ip: &str) -> Result<Value, ProxyError> {
        let key = self.keys.ipgeolocation.as_deref().ok_or(
            ProxyError::NotConfigured {
                service: "ipgeolocation",
            },
        )?;
        geo::geolocate_ip(&self.agent, key, ip)
    }

    /// Convert coordinates to a street address.
    #[instrument(skip(self))]
    pub fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Value, ProxyError> {
        let key = self
            .keys
            .opencage
            .as_deref()
            .ok_or(ProxyError::NotConfigured { service: "opencage" })?;
        geo::reverse_geocode(&self.agent, key, lat, lon)
    }

    /// Public webcams near a location, via Windy.
    #[instrument(skip(self))]
    pub fn public_webcams(&self, lat: f64, lon: f64, radius_km: u32) -> Result<Value, ProxyError> {
        let key = self
            .keys
            .windy
            .as_deref()
            .ok_or(ProxyError::NotConfigured { service: "windy" })?;
        webcams::nearby(&self.agent, key, lat, lon, radius_km)
    }

    /// Phone number lookup, via NumVerify.
    #[instrument(skip(self))]
    pub fn lookup_phone(&self, number: &str) -> Result<Value, ProxyError> {
        let key = self
            .keys
            .numverify
            .as_deref()
            .ok_or(ProxyError::NotConfigured { service: "numverify" })?;
        phone::lookup(&self.agent, key, number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_covers_all_services() {
        let manager = ProxyManager::new(ProxyKeys::default());
        let status = manager.status();
        assert_eq!(status.len(), 7);
        // Public feed reports available even with zero credentials
        assert_eq!(status["adsb"], true);
        assert_eq!(status["wigle"], false);
        assert_eq!(status["shodan"], false);
    }

    #[test]
    fn test_unconfigured_calls_fail_without_network() {
        let manager = ProxyManager::new(ProxyKeys::default());

        let err = manager.wifi_networks_near(37.0, -122.0, 0.01).unwrap_err();
        assert!(err.is_configuration());

        let err = manager.shodan_search("webcam", 10).unwrap_err();
        assert!(err.is_configuration());

        let err = manager.geolocate_ip("8.8.8.8").unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.service(), "ipgeolocation");

        let err = manager.lookup_phone("+14155552671").unwrap_err();
        assert!(err.is_configuration());
    }
}
