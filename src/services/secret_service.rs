//! Business logic for the secret lifecycle: create, single-consumption read,
//! and passphrase-gated delete.
//!
//! A secret is `Active` until exactly one terminal transition: consumed by a
//! successful read, expired (detected during a read attempt), or explicitly
//! deleted. Terminal states are indistinguishable to callers; every operation
//! on a dead token reports not-found.
//!
//! Single consumption is enforced through the store's conditional delete: the
//! durable `DELETE` is the linearization point, and plaintext is returned only
//! by the caller whose delete removed the row. Concurrent readers of one token
//! may all fetch and decrypt, but at most one observes the deletion.

use std::sync::Arc;

use argon2::{
    password_hash::SaltString, Algorithm, Argon2, Params, PasswordHash, PasswordHasher,
    PasswordVerifier, Version,
};
use chrono::Utc;
use rand::rngs::OsRng;
use serde_json::json;
use tracing::{error, info};

use crate::audit::{AuditAction, AuditLog};
use crate::errors::{Error, Result};
use crate::services::SecretCipher;
use crate::storage::{NewSecret, SecretStore};

/// Parameters for creating a secret
#[derive(Debug, Clone)]
pub struct CreateSecretRequest {
    pub secret: String,
    pub passphrase: Option<String>,
    pub ttl_seconds: Option<i64>,
}

/// Argon2id tuned for interactive API calls: moderate memory and a single
/// iteration keep verification fast while retaining side-channel protections.
fn passphrase_hasher() -> Argon2<'static> {
    const MEMORY_COST_KIB: u32 = 768;
    const ITERATIONS: u32 = 1;
    const PARALLELISM: u32 = 1;
    let params = Params::new(MEMORY_COST_KIB, ITERATIONS, PARALLELISM, Some(32))
        .expect("valid Argon2 parameters");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

/// Secret lifecycle engine
///
/// Owns the create/read/delete orchestration over injected collaborators: the
/// cipher, the unified store, and the fail-silent audit log.
#[derive(Clone)]
pub struct SecretService {
    store: SecretStore,
    cipher: SecretCipher,
    audit: AuditLog,
    argon2: Arc<Argon2<'static>>,
}

impl SecretService {
    pub fn new(store: SecretStore, cipher: SecretCipher, audit: AuditLog) -> Self {
        Self { store, cipher, audit, argon2: Arc::new(passphrase_hasher()) }
    }

    /// Encrypt and persist a new secret, returning its retrieval token
    pub async fn create(&self, request: CreateSecretRequest, ip: Option<&str>) -> Result<String> {
        let ciphertext = self.cipher.encrypt(request.secret.as_bytes())?;
        let expires_at =
            request.ttl_seconds.map(|ttl| Utc::now() + chrono::Duration::seconds(ttl));
        let passphrase = match &request.passphrase {
            Some(candidate) => Some(self.hash_passphrase(candidate)?),
            None => None,
        };

        let row =
            self.store.put(NewSecret { ciphertext, passphrase, expires_at }).await?;

        self.audit
            .record(AuditAction::Create, Some(row.id), ip, json!({ "ttl": request.ttl_seconds }))
            .await;
        info!(secret_id = row.id, ttl_seconds = ?request.ttl_seconds, "Created secret");

        Ok(row.secret_key)
    }

    /// Retrieve and destroy a secret
    ///
    /// At most one concurrent caller for a given token receives the plaintext;
    /// every other outcome reports not-found. Expired secrets are destroyed on
    /// detection and reported identically to absent ones.
    pub async fn read(&self, secret_key: &str, ip: Option<&str>) -> Result<String> {
        let row = match self.store.get(secret_key).await? {
            Some(row) => row,
            None => {
                self.audit
                    .record(
                        AuditAction::ReadAttemptFailed,
                        None,
                        ip,
                        json!({ "reason": "not_found" }),
                    )
                    .await;
                return Err(Error::not_found("Secret not found"));
            }
        };

        if row.is_expired(Utc::now()) {
            self.audit
                .record(
                    AuditAction::ReadAttemptFailed,
                    Some(row.id),
                    ip,
                    json!({ "reason": "expired" }),
                )
                .await;
            self.destroy_dead_row(secret_key, "expired").await;
            return Err(Error::not_found("Secret not found"));
        }

        let plaintext = match self.cipher.decrypt(&row.ciphertext) {
            Ok(plaintext) => plaintext,
            Err(err) => {
                self.audit
                    .record(
                        AuditAction::ReadDecryptError,
                        Some(row.id),
                        ip,
                        json!({ "error": err.to_string() }),
                    )
                    .await;
                // An undecryptable secret must not stay retrievable
                self.destroy_dead_row(secret_key, "undecryptable").await;
                return Err(err);
            }
        };

        // Single-consumption point: only the caller whose delete removed the
        // durable row may return plaintext.
        match self.store.delete(secret_key).await {
            Ok(true) => {
                self.audit
                    .record(AuditAction::ReadSuccess, Some(row.id), ip, serde_json::Value::Null)
                    .await;
                info!(secret_id = row.id, "Secret consumed");
                String::from_utf8(plaintext)
                    .map_err(|e| Error::internal(format!("Invalid UTF-8 in decrypted secret: {}", e)))
            }
            Ok(false) => {
                // A concurrent reader consumed it first
                self.audit
                    .record(
                        AuditAction::ReadAttemptFailed,
                        Some(row.id),
                        ip,
                        json!({ "reason": "already_consumed" }),
                    )
                    .await;
                Err(Error::not_found("Secret not found"))
            }
            Err(err) => Err(Error::internal(format!(
                "Secret destruction could not be confirmed: {}",
                err
            ))),
        }
    }

    /// Delete a secret without reading it, honoring its passphrase guard
    pub async fn delete(
        &self,
        secret_key: &str,
        passphrase: Option<&str>,
        ip: Option<&str>,
    ) -> Result<()> {
        let row = match self.store.get(secret_key).await? {
            Some(row) => row,
            None => {
                self.audit
                    .record(
                        AuditAction::DeleteAttemptFailed,
                        None,
                        ip,
                        json!({ "reason": "not_found" }),
                    )
                    .await;
                return Err(Error::not_found("Secret not found"));
            }
        };

        if let Some(stored_hash) = &row.passphrase {
            let authorized = match passphrase {
                Some(candidate) => self.verify_passphrase(stored_hash, candidate)?,
                None => false,
            };

            if !authorized {
                self.audit
                    .record(
                        AuditAction::DeleteAttemptFailed,
                        Some(row.id),
                        ip,
                        json!({ "reason": "invalid_passphrase" }),
                    )
                    .await;
                return Err(Error::forbidden("Invalid passphrase"));
            }
        }

        match self.store.delete(secret_key).await? {
            true => {
                self.audit
                    .record(
                        AuditAction::DeleteSuccess,
                        Some(row.id),
                        ip,
                        json!({ "passphrase_used": passphrase.is_some() }),
                    )
                    .await;
                info!(secret_id = row.id, "Secret deleted");
                Ok(())
            }
            false => {
                // Consumed or deleted between the fetch and the delete
                self.audit
                    .record(
                        AuditAction::DeleteAttemptFailed,
                        Some(row.id),
                        ip,
                        json!({ "reason": "not_found" }),
                    )
                    .await;
                Err(Error::not_found("Secret not found"))
            }
        }
    }

    /// Remove a row that can no longer be served (expired or undecryptable).
    /// The caller's outcome is already decided; a failed cleanup leaves the
    /// row for the next read attempt, so the error is only logged.
    async fn destroy_dead_row(&self, secret_key: &str, cause: &str) {
        if let Err(err) = self.store.delete(secret_key).await {
            error!(error = %err, cause = cause, "Failed to destroy dead secret");
        }
    }

    fn hash_passphrase(&self, passphrase: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(passphrase.as_bytes(), &salt)
            .map_err(|err| Error::internal(format!("Failed to hash passphrase: {}", err)))?;
        Ok(hash.to_string())
    }

    fn verify_passphrase(&self, stored: &str, candidate: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored)
            .map_err(|err| Error::internal(format!("Invalid passphrase hash: {}", err)))?;
        Ok(self.argon2.verify_password(candidate.as_bytes(), &parsed).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, DatabaseConfig};
    use crate::storage::{create_pool, run_migrations};

    async fn test_service() -> SecretService {
        // Single connection: a pooled ':memory:' database is per-connection
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            auto_migrate: false,
            ..Default::default()
        };
        let pool = create_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();

        SecretService::new(
            SecretStore::new(pool.clone(), &CacheConfig::default()),
            SecretCipher::from_key([0x42u8; 32]),
            AuditLog::new(pool),
        )
    }

    fn request(secret: &str) -> CreateSecretRequest {
        CreateSecretRequest { secret: secret.to_string(), passphrase: None, ttl_seconds: None }
    }

    #[tokio::test]
    async fn test_passphrase_hash_and_verify() {
        let service = test_service().await;

        let hash = service.hash_passphrase("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify_passphrase(&hash, "hunter2").unwrap());
        assert!(!service.verify_passphrase(&hash, "hunter3").unwrap());
    }

    #[tokio::test]
    async fn test_create_read_consumes() {
        let service = test_service().await;

        let token = service.create(request("payload"), None).await.unwrap();
        assert_eq!(service.read(&token, None).await.unwrap(), "payload");

        let second = service.read(&token, None).await;
        assert!(matches!(second, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_expired_secret_reads_as_not_found() {
        let service = test_service().await;

        let token = service
            .create(
                CreateSecretRequest {
                    secret: "gone".to_string(),
                    passphrase: None,
                    ttl_seconds: Some(-1),
                },
                None,
            )
            .await
            .unwrap();

        let result = service.read(&token, None).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_requires_matching_passphrase() {
        let service = test_service().await;

        let token = service
            .create(
                CreateSecretRequest {
                    secret: "guarded".to_string(),
                    passphrase: Some("open sesame".to_string()),
                    ttl_seconds: None,
                },
                None,
            )
            .await
            .unwrap();

        let wrong = service.delete(&token, Some("wrong"), None).await;
        assert!(matches!(wrong, Err(Error::Forbidden(_))));

        let missing = service.delete(&token, None, None).await;
        assert!(matches!(missing, Err(Error::Forbidden(_))));

        service.delete(&token, Some("open sesame"), None).await.unwrap();
        assert!(matches!(service.read(&token, None).await, Err(Error::NotFound(_))));
    }
}
