//! Shared library for the openbd-sync project.
//!
//! This crate provides common functionality used by the sync engine and
//! its binary:
//! - Configuration management
//! - Cache directory layout
//! - Logging infrastructure
//! - Normalized book models

pub mod config;
pub mod logging;
pub mod models;
pub mod paths;

// Re-export commonly used types
pub use config::Config;
pub use logging::LogConfig;
pub use models::*;
pub use paths::DataPaths;
