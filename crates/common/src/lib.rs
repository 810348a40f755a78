//! DocChat Common Library
//!
//! Shared code for the DocChat crates:
//! - Configuration management
//! - Error types and HTTP mapping
//! - Metrics helpers

pub mod config;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default generation model
pub const DEFAULT_MODEL: &str = "mistral:latest";

/// Default generation backend base URL
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:11434";
