//! Startup settings: emulation mode and proxy credentials.
//!
//! Environment variables override the settings file; both are read once
//! during [`Settings::load`] and never re-read for the process lifetime.

use crate::resolve::{resolve_settings_path, ConfigSource};
use serde::{Deserialize, Serialize};
use ssa_common::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Emulation-mode override flag.
///
/// Controls whether the fallback executor consults the capability snapshot
/// (`Auto`), attempts the real path unconditionally (`ForceReal`), or
/// always takes the synthetic path (`ForceEmulated`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmulationMode {
    /// Decide per operation from the detected capability snapshot.
    #[default]
    Auto,

    /// Attempt the real path even when the capability was not detected.
    /// Real-path failure still degrades to the synthetic path.
    ForceReal,

    /// Always take the synthetic path; hardware is never touched.
    ForceEmulated,
}

impl EmulationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmulationMode::Auto => "auto",
            EmulationMode::ForceReal => "force_real",
            EmulationMode::ForceEmulated => "force_emulated",
        }
    }
}

impl std::fmt::Display for EmulationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EmulationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "detect" => Ok(EmulationMode::Auto),
            "real" | "force_real" | "force-real" => Ok(EmulationMode::ForceReal),
            "emulated" | "force_emulated" | "force-emulated" | "emulation" => {
                Ok(EmulationMode::ForceEmulated)
            }
            other => Err(format!(
                "unknown emulation mode '{}' (expected auto, force_real, or force_emulated)",
                other
            )),
        }
    }
}

/// Environment variable for the emulation-mode override.
pub const ENV_EMULATION_MODE: &str = "SSA_EMULATION_MODE";

/// Per-proxy API credentials, each read from its conventional variable.
///
/// Deliberately not `Serialize`: credentials must never flow into status
/// payloads or logs. Configuration state is exposed as booleans via
/// [`ProxyKeys::configured`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyKeys {
    /// WiGLE basic-auth token (`name:token`).
    pub wigle: Option<String>,

    /// Shodan API key.
    pub shodan: Option<String>,

    /// ipgeolocation.io API key.
    pub ipgeolocation: Option<String>,

    /// OpenCage geocoding API key.
    pub opencage: Option<String>,

    /// Windy webcams API key.
    pub windy: Option<String>,

    /// NumVerify phone-lookup API key.
    pub numverify: Option<String>,
}

impl ProxyKeys {
    /// Read all credentials from the environment.
    pub fn from_env() -> Self {
        Self {
            wigle: read_key("WIGLE_API_KEY"),
            shodan: read_key("SHODAN_API_KEY"),
            ipgeolocation: read_key("IPGEO_API_KEY"),
            opencage: read_key("OPENCAGE_API_KEY"),
            windy: read_key("WINDY_API_KEY"),
            numverify: read_key("NUMVERIFY_API_KEY"),
        }
    }

    /// Overlay: any credential missing from the environment falls back to
    /// the settings file value.
    fn merge_file(mut self, file: ProxyKeys) -> Self {
        self.wigle = self.wigle.or(file.wigle);
        self.shodan = self.shodan.or(file.shodan);
        self.ipgeolocation = self.ipgeolocation.or(file.ipgeolocation);
        self.opencage = self.opencage.or(file.opencage);
        self.windy = self.windy.or(file.windy);
        self.numverify = self.numverify.or(file.numverify);
        self
    }

    /// Configuration flags per keyed service.
    pub fn configured(&self) -> BTreeMap<&'static str, bool> {
        BTreeMap::from([
            ("wigle", self.wigle.is_some()),
            ("shodan", self.shodan.is_some()),
            ("ipgeolocation", self.ipgeolocation.is_some()),
            ("opencage", self.opencage.is_some()),
            ("windy", self.windy.is_some()),
            ("numverify", self.numverify.is_some()),
        ])
    }

    /// Number of configured credentials.
    pub fn configured_count(&self) -> usize {
        self.configured().values().filter(|&&v| v).count()
    }
}

fn read_key(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// On-disk settings file shape (`settings.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
struct SettingsFile {
    emulation_mode: Option<String>,

    #[serde(default)]
    api_keys: ProxyKeys,
}

/// Immutable process-wide settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Emulation-mode override.
    pub emulation_mode: EmulationMode,

    /// Proxy credentials.
    pub keys: ProxyKeys,

    /// Where the settings file (if any) came from.
    pub source: ConfigSource,
}

impl Settings {
    /// Load settings: resolve the optional file, parse it, then apply
    /// environment overrides on top.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let (path, source) = resolve_settings_path(cli_path);

        let file = match &path {
            Some(p) => {
                debug!(path = %p.display(), source = %source, "loading settings file");
                let text = std::fs::read_to_string(p)?;
                toml::from_str::<SettingsFile>(&text)
                    .map_err(|e| Error::InvalidSettings(e.to_string()))?
            }
            None => SettingsFile::default(),
        };

        let emulation_mode = match std::env::var(ENV_EMULATION_MODE) {
            Ok(raw) => EmulationMode::from_str(&raw).map_err(Error::Config)?,
            Err(_) => match &file.emulation_mode {
                Some(raw) => EmulationMode::from_str(raw).map_err(Error::InvalidSettings)?,
                None => EmulationMode::Auto,
            },
        };

        let keys = ProxyKeys::from_env().merge_file(file.api_keys);

        info!(
            mode = %emulation_mode,
            keys = keys.configured_count(),
            source = %source,
            "settings loaded"
        );

        Ok(Self {
            emulation_mode,
            keys,
            source,
        })
    }

    /// Settings for tests: no credentials, forced emulation.
    pub fn emulated() -> Self {
        Self {
            emulation_mode: EmulationMode::ForceEmulated,
            keys: ProxyKeys::default(),
            source: ConfigSource::BuiltinDefault,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emulation_mode_parse() {
        assert_eq!(
            EmulationMode::from_str("auto").unwrap(),
            EmulationMode::Auto
        );
        assert_eq!(
            EmulationMode::from_str("force-real").unwrap(),
            EmulationMode::ForceReal
        );
        assert_eq!(
            EmulationMode::from_str("EMULATED").unwrap(),
            EmulationMode::ForceEmulated
        );
        assert!(EmulationMode::from_str("bogus").is_err());
    }

    #[test]
    fn test_emulation_mode_roundtrip() {
        for mode in [
            EmulationMode::Auto,
            EmulationMode::ForceReal,
            EmulationMode::ForceEmulated,
        ] {
            assert_eq!(EmulationMode::from_str(mode.as_str()).unwrap(), mode);
        }
    }

    #[test]
    fn test_proxy_keys_configured_map_is_complete() {
        let keys = ProxyKeys::default();
        let map = keys.configured();
        assert_eq!(map.len(), 6);
        assert!(map.values().all(|&v| !v));
        assert_eq!(keys.configured_count(), 0);
    }

    #[test]
    fn test_merge_file_prefers_env_value() {
        let env = ProxyKeys {
            shodan: Some("from-env".into()),
            ..Default::default()
        };
        let file = ProxyKeys {
            shodan: Some("from-file".into()),
            wigle: Some("file-wigle".into()),
            ..Default::default()
        };
        let merged = env.merge_file(file);
        assert_eq!(merged.shodan.as_deref(), Some("from-env"));
        assert_eq!(merged.wigle.as_deref(), Some("file-wigle"));
    }

    #[test]
    fn test_settings_file_parse() {
        let text = r#"
emulation_mode = "force_emulated"

[api_keys]
shodan = "abc123"
"#;
        let file: SettingsFile = toml::from_str(text).unwrap();
        assert_eq!(file.emulation_mode.as_deref(), Some("force_emulated"));
        assert_eq!(file.api_keys.shodan.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_emulated_settings_for_tests() {
        let s = Settings::emulated();
        assert_eq!(s.emulation_mode, EmulationMode::ForceEmulated);
        assert_eq!(s.keys.configured_count(), 0);
    }
}
