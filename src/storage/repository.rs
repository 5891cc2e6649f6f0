//! Secret repository: durable CRUD over the `secrets` table.
//!
//! The conditional delete here is the linearization point for single
//! consumption: `delete` reports whether this caller removed the row, and the
//! lifecycle engine gates plaintext return on that signal.

use crate::errors::{Error, Result};
use crate::storage::DbPool;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::debug;

/// Durable secret row
#[derive(Debug, Clone, FromRow)]
pub struct SecretRow {
    /// Internal row id, used only as the audit-log reference
    pub id: i64,
    /// Opaque retrieval token
    pub secret_key: String,
    /// Nonce-prefixed AES-256-GCM blob
    pub ciphertext: Vec<u8>,
    /// Argon2id hash of the deletion passphrase, when one was set
    pub passphrase: Option<String>,
    /// Absolute expiry, when a TTL was requested
    pub expires_at: Option<DateTime<Utc>>,
}

impl SecretRow {
    /// Whether the secret's own expiry has passed at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Fields of a secret to be persisted
#[derive(Debug, Clone)]
pub struct NewSecret {
    pub ciphertext: Vec<u8>,
    pub passphrase: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Repository for durable secret rows
#[derive(Debug, Clone)]
pub struct SecretRepository {
    pool: DbPool,
}

impl SecretRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new secret under the given token and return the stored row
    pub async fn insert(&self, secret_key: &str, secret: &NewSecret) -> Result<SecretRow> {
        let result = sqlx::query(
            "INSERT INTO secrets (secret_key, ciphertext, passphrase, expires_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(secret_key)
        .bind(&secret.ciphertext)
        .bind(secret.passphrase.as_deref())
        .bind(secret.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database {
            source: e,
            context: "Failed to persist secret".to_string(),
        })?;

        debug!(secret_id = result.last_insert_rowid(), "Persisted secret");

        Ok(SecretRow {
            id: result.last_insert_rowid(),
            secret_key: secret_key.to_string(),
            ciphertext: secret.ciphertext.clone(),
            passphrase: secret.passphrase.clone(),
            expires_at: secret.expires_at,
        })
    }

    /// Fetch a secret by token
    pub async fn fetch(&self, secret_key: &str) -> Result<Option<SecretRow>> {
        sqlx::query_as::<_, SecretRow>(
            "SELECT id, secret_key, ciphertext, passphrase, expires_at \
             FROM secrets WHERE secret_key = $1",
        )
        .bind(secret_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database { source: e, context: "Failed to fetch secret".to_string() })
    }

    /// Delete a secret by token, reporting whether a row was removed
    ///
    /// Idempotent: deleting an absent token yields `Ok(false)`. The boolean is
    /// the single-consumption signal; under concurrent deletes of one token at
    /// most one caller observes `true`.
    pub async fn delete(&self, secret_key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM secrets WHERE secret_key = $1")
            .bind(secret_key)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database {
                source: e,
                context: "Failed to delete secret".to_string(),
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all secret rows. Used by tests to inspect durable state directly.
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM secrets")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database {
                source: e,
                context: "Failed to count secrets".to_string(),
            })
    }
}
