//! SkySeeAll common types and errors.
//!
//! This crate provides foundational types shared across ssa crates:
//! - The tagged `OperationResult` union every operation returns
//! - Common error types with stable codes and categories
//! - Output format specifications for the CLI

pub mod error;
pub mod output;
pub mod result;

pub use error::{Error, ErrorCategory, Result};
pub use output::OutputFormat;
pub use result::{OperationResult, Source};
