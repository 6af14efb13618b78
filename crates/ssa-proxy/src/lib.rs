//! Remote proxy clients for SkySeeAll.
//!
//! Each module wraps one third-party web API behind a synchronous call
//! with a bounded timeout. The [`ProxyManager`] owns the shared HTTP
//! agent and the credentials, and every call resolves to either a
//! JSON payload or a [`ProxyError`] that keeps "not configured" (a
//! deployment gap) distinguishable from "call failed" (possibly
//! transient).
//!
//! Services:
//! - WiGLE: observed Wi-Fi networks near a location
//! - Shodan: internet-exposed host search and host detail
//! - ADS-B aggregation feed: live aircraft near a location (keyless)
//! - ipgeolocation.io (with ip-api.com fallback): IP geolocation
//! - OpenCage (with Nominatim fallback): reverse geocoding
//! - Windy: public webcam discovery
//! - NumVerify: phone number lookup

pub mod adsb;
pub mod error;
pub mod geo;
pub mod manager;
pub mod phone;
pub mod shodan;
pub mod webcams;
pub mod wigle;

pub use error::ProxyError;
pub use manager::ProxyManager;

/// Bounded timeout for every proxy call, in seconds.
pub const PROXY_TIMEOUT_SECS: u64 = 10;

/// User-Agent sent on every proxy call.
pub const USER_AGENT: &str = concat!("skyseeall/", env!("CARGO_PKG_VERSION"));
