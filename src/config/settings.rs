//! # Configuration Settings
//!
//! Defines the configuration structure for the sealbox service. All values are
//! resolved once at startup from `SEALBOX_*` environment variables with
//! sensible development defaults.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// HTTP server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Database configuration
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Encryption key configuration
    pub crypto: CryptoConfig,

    /// Read-through cache configuration
    #[validate(nested)]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env(),
            crypto: CryptoConfig::from_env(),
            cache: CacheConfig::from_env()?,
        };

        config.validate_all()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate_all(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;

        if !self.database.url.starts_with("sqlite:") {
            return Err(Error::validation("Database URL must start with 'sqlite:'"));
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let host = std::env::var("SEALBOX_HOST").unwrap_or(defaults.host);
        let port = match std::env::var("SEALBOX_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| Error::config(format!("Invalid SEALBOX_PORT: {}", e)))?,
            Err(_) => defaults.port,
        };

        Ok(Self { host, port })
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(min = 1, message = "max_connections must be greater than 0"))]
    pub max_connections: u32,

    /// Minimum number of idle connections to keep in the pool
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    #[validate(range(min = 1, message = "connect_timeout must be at least 1 second"))]
    pub connect_timeout_seconds: u64,

    /// Run embedded migrations on startup
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://sealbox.db".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_seconds: 5,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// Create configuration from environment variables, falling back to the
    /// local development defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            url: std::env::var("SEALBOX_DATABASE_URL").unwrap_or(defaults.url),
            max_connections: env_parse("SEALBOX_DATABASE_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: env_parse("SEALBOX_DATABASE_MIN_CONNECTIONS", defaults.min_connections),
            connect_timeout_seconds: env_parse(
                "SEALBOX_DATABASE_CONNECT_TIMEOUT_SECONDS",
                defaults.connect_timeout_seconds,
            ),
            auto_migrate: env_parse("SEALBOX_DATABASE_AUTO_MIGRATE", defaults.auto_migrate),
        }
    }

    /// Get the connection acquire timeout as a Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Encryption key configuration
///
/// The master key is a base64-encoded 32-byte value. When absent, a fresh key
/// is generated at startup; secrets encrypted under a generated key do not
/// survive a process restart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// Base64-encoded 256-bit master key, if supplied
    pub master_key_base64: Option<String>,
}

impl CryptoConfig {
    fn from_env() -> Self {
        Self { master_key_base64: std::env::var("SEALBOX_MASTER_KEY").ok() }
    }
}

/// Read-through cache configuration
///
/// Cache TTL is a performance knob only; the durable store stays authoritative
/// for whether a secret is still live.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CacheConfig {
    /// Maximum number of cached secrets
    #[validate(range(min = 1, message = "Cache capacity must be greater than 0"))]
    pub capacity: usize,

    /// Per-entry time-to-live in seconds
    #[validate(range(min = 1, message = "Cache TTL must be at least 1 second"))]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 1000, ttl_seconds: 300 }
    }
}

impl CacheConfig {
    fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let capacity = match std::env::var("SEALBOX_CACHE_CAPACITY") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| Error::config(format!("Invalid SEALBOX_CACHE_CAPACITY: {}", e)))?,
            Err(_) => defaults.capacity,
        };
        let ttl_seconds = match std::env::var("SEALBOX_CACHE_TTL_SECONDS") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| Error::config(format!("Invalid SEALBOX_CACHE_TTL_SECONDS: {}", e)))?,
            Err(_) => defaults.ttl_seconds,
        };

        Ok(Self { capacity, ttl_seconds })
    }

    /// Get the per-entry TTL as a Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|raw| raw.parse().ok()).unwrap_or(default)
}
