//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI arguments → environment variables → XDG paths → defaults.

use std::path::{Path, PathBuf};

/// Where the settings file was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/skyseeall/.
    SystemConfig,

    /// Using built-in defaults (environment variables only).
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
const ENV_SETTINGS_PATH: &str = "SSA_SETTINGS";
const ENV_CONFIG_DIR: &str = "SSA_CONFIG_DIR";

/// Standard settings file name.
const SETTINGS_FILENAME: &str = "settings.toml";

/// Application name for XDG directories.
const APP_NAME: &str = "skyseeall";

/// Resolve the settings file path using the standard resolution order.
///
/// 1. Explicit CLI path (if provided)
/// 2. SSA_SETTINGS environment variable (direct path)
/// 3. SSA_CONFIG_DIR environment variable + filename
/// 4. XDG config directory (~/.config/skyseeall/)
/// 5. System config (/etc/skyseeall/)
/// 6. Built-in defaults (None; environment variables only)
pub fn resolve_settings_path(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    // 1. CLI argument
    if let Some(path) = cli_path {
        if path.exists() {
            return (Some(path.to_path_buf()), ConfigSource::CliArgument);
        }
    }

    // 2. Environment variable (direct path)
    if let Ok(env_path) = std::env::var(ENV_SETTINGS_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    // 3. Environment variable (config dir)
    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(SETTINGS_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    // 4. XDG config directory
    if let Some(xdg_config) = dirs::config_dir() {
        let path = xdg_config.join(APP_NAME).join(SETTINGS_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::XdgConfig);
        }
    }

    // 5. System config
    let system_path = PathBuf::from("/etc").join(APP_NAME).join(SETTINGS_FILENAME);
    if system_path.exists() {
        return (Some(system_path), ConfigSource::SystemConfig);
    }

    // 6. Built-in default
    (None, ConfigSource::BuiltinDefault)
}

/// Get the XDG config directory for skyseeall.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(
            format!("{}", ConfigSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn test_cli_path_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "emulation_mode = \"auto\"").unwrap();

        let (path, source) = resolve_settings_path(Some(file.path()));
        assert_eq!(path.as_deref(), Some(file.path()));
        assert_eq!(source, ConfigSource::CliArgument);
    }

    #[test]
    fn test_missing_cli_path_is_skipped() {
        let (path, source) = resolve_settings_path(Some(Path::new("/nonexistent/settings.toml")));
        // Falls through to later resolution steps; in a clean environment
        // that ends at the builtin default.
        if path.is_none() {
            assert_eq!(source, ConfigSource::BuiltinDefault);
        }
    }

    #[test]
    fn test_system_config_dir() {
        assert_eq!(system_config_dir(), PathBuf::from("/etc/skyseeall"));
    }
}
