//! # Storage and Persistence
//!
//! Database connectivity and the secret store: a SQLite-backed repository with
//! a bounded, time-expiring read-through cache in front of it. The durable
//! store is always authoritative; the cache is a performance layer only.

pub mod cache;
pub mod pool;
pub mod repository;
pub mod store;

pub use crate::config::DatabaseConfig;

pub use cache::SecretCache;
pub use pool::{create_pool, DbPool};
pub use repository::{NewSecret, SecretRepository, SecretRow};
pub use store::SecretStore;

use crate::errors::{Error, Result};

/// Run embedded database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| Error::internal(format!("Failed to run database migrations: {}", e)))?;

    tracing::info!("Database migrations applied");
    Ok(())
}

/// Check database connectivity
pub async fn check_connection(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| Error::Database {
        source: e,
        context: "Database connectivity check failed".to_string(),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_sqlite_pool_and_connect() {
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            max_connections: 5,
            auto_migrate: false,
            ..Default::default()
        };

        let pool = create_pool(&config).await.unwrap();
        check_connection(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_migrations() {
        // A pooled ':memory:' database is per-connection; pin the pool to one
        // connection so the migrated schema is visible to later queries.
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            auto_migrate: false,
            ..Default::default()
        };

        let pool = create_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();

        // Both tables exist after migration
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('secrets', 'logs')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_invalid_database_url() {
        let config = DatabaseConfig { url: "invalid://url".to_string(), ..Default::default() };

        let result = create_pool(&config).await;
        assert!(result.is_err());
    }
}
