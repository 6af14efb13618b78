//! SkySeeAll configuration.
//!
//! Configuration is read exactly once at process start into an immutable
//! [`Settings`] value that the rest of the system shares by `Arc`:
//! - Emulation-mode override (auto-detect / force-real / force-emulated)
//! - Per-proxy API credentials
//! - Optional `settings.toml` discovered via the standard resolution order

pub mod resolve;
pub mod settings;
pub mod validate;

pub use resolve::{resolve_settings_path, ConfigSource};
pub use settings::{EmulationMode, ProxyKeys, Settings};
pub use validate::{validate, ValidationReport};
