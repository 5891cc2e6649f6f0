//! # Sealbox
//!
//! Sealbox is a one-time secret sharing service: a client submits a plaintext
//! secret and receives an opaque retrieval token; the first successful read
//! returns the secret and permanently destroys it.
//!
//! ## Architecture
//!
//! The system follows a layered architecture pattern:
//!
//! ```text
//! REST API Layer → Lifecycle Engine → Secret Store (cache + SQLite)
//!      ↓                 ↓                  ↓
//! Error Mapping     Cipher / Audit    Persistence Layer
//! ```
//!
//! ## Core Components
//!
//! - **API surface**: Axum-based HTTP server translating verbs to lifecycle
//!   calls and error kinds to status codes
//! - **Lifecycle engine**: [`services::SecretService`] enforcing
//!   single-consumption, expiry, and passphrase-gated deletion
//! - **Secret store**: [`storage::SecretStore`], a bounded TTL cache in front
//!   of an authoritative SQLite store
//! - **Cipher**: [`services::SecretCipher`], AES-256-GCM encryption at rest
//! - **Audit log**: [`audit::AuditLog`], best-effort append-only event trail
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sealbox::{
//!     api::{start_api_server, ApiState},
//!     audit::AuditLog,
//!     config::AppConfig,
//!     services::{SecretCipher, SecretService},
//!     storage::{create_pool, SecretStore},
//!     Result,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let pool = create_pool(&config.database).await?;
//!     let service = SecretService::new(
//!         SecretStore::new(pool.clone(), &config.cache),
//!         SecretCipher::from_config(&config.crypto)?,
//!         AuditLog::new(pool),
//!     );
//!     start_api_server(&config.server, ApiState { secret_service: service }).await
//! }
//! ```

pub mod api;
pub mod audit;
pub mod config;
pub mod errors;
pub mod observability;
pub mod services;
pub mod storage;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{Error, Result};
pub use observability::init_tracing;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
