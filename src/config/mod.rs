//! # Configuration Management
//!
//! Environment-driven configuration for the sealbox service.

mod settings;

pub use settings::{AppConfig, CacheConfig, CryptoConfig, DatabaseConfig, ServerConfig};
