//! Common test utilities for all integration tests.
//!
//! Provides a fully wired service over a file-based SQLite database in a
//! temporary directory, so pooled connections all see the same schema.

#![allow(dead_code)]

use sealbox::audit::AuditLog;
use sealbox::config::{CacheConfig, DatabaseConfig};
use sealbox::services::{SecretCipher, SecretService};
use sealbox::storage::{create_pool, run_migrations, DbPool, SecretStore};
use tempfile::TempDir;

/// A wired sealbox instance over a throwaway database.
///
/// Holds the temp directory so the database file outlives the test body.
pub struct TestApp {
    pub service: SecretService,
    pub store: SecretStore,
    pub audit: AuditLog,
    pub pool: DbPool,
    _db_dir: TempDir,
}

pub async fn test_app() -> TestApp {
    test_app_with_cache(CacheConfig::default()).await
}

pub async fn test_app_with_cache(cache: CacheConfig) -> TestApp {
    let db_dir = tempfile::tempdir().expect("create temp dir");
    let db_path = db_dir.path().join("sealbox_test.db");
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", db_path.display()),
        auto_migrate: false,
        ..Default::default()
    };

    let pool = create_pool(&config).await.expect("create test database pool");
    run_migrations(&pool).await.expect("run migrations");

    let store = SecretStore::new(pool.clone(), &cache);
    let audit = AuditLog::new(pool.clone());
    let service =
        SecretService::new(store.clone(), SecretCipher::from_key([0x42u8; 32]), audit.clone());

    TestApp { service, store, audit, pool, _db_dir: db_dir }
}
