//! SkySeeAll core: hardware capability detection, fallback execution,
//! and module command routing.
//!
//! The layering, bottom up:
//!
//! - [`tools`]: bounded execution of external hardware tools
//! - [`capabilities`]: one-shot detection of the eight capability flags
//! - [`emulate`]: synthetic payload generators for degraded execution
//! - [`executors`]: real hardware paths behind the fallback boundary
//! - [`fallback`]: the real-or-synthetic decision procedure
//! - [`exclusive`]: serialization of hardware-claiming operations
//! - [`controllers`]: the five feature controllers and the master
//!   dispatch layer, the only public entry point for operations

pub mod capabilities;
pub mod controllers;
pub mod emulate;
pub mod exclusive;
pub mod executors;
pub mod fallback;
pub mod logging;
pub mod tools;

pub use controllers::{MasterController, MODULES};
