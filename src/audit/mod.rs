//! Best-effort audit trail for secret lifecycle events.
//!
//! Events are appended to the `logs` table and never mutated. The recorder is
//! deliberately fail-silent: an audit write failure is reported through
//! `tracing::error!` and otherwise ignored, so trail loss can never abort or
//! retry a lifecycle operation. Events reference secrets by internal row id,
//! never by token.

use crate::errors::{Error, Result};
use crate::storage::DbPool;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;

/// Lifecycle event kinds recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    ReadSuccess,
    ReadAttemptFailed,
    ReadDecryptError,
    DeleteSuccess,
    DeleteAttemptFailed,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::ReadSuccess => "read_success",
            AuditAction::ReadAttemptFailed => "read_attempt_failed",
            AuditAction::ReadDecryptError => "read_decrypt_error",
            AuditAction::DeleteSuccess => "delete_success",
            AuditAction::DeleteAttemptFailed => "delete_attempt_failed",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored audit event row
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogRow {
    pub id: i64,
    pub action: String,
    pub secret_id: Option<i64>,
    pub ip_address: Option<String>,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Repository for append-only audit log rows
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: DbPool,
}

impl AuditLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append one audit event
    pub async fn insert(
        &self,
        action: AuditAction,
        secret_id: Option<i64>,
        ip_address: Option<&str>,
        metadata: serde_json::Value,
    ) -> Result<()> {
        let metadata_json = if metadata.is_null() {
            None
        } else {
            Some(serde_json::to_string(&metadata).map_err(|err| {
                Error::validation(format!("Invalid audit metadata JSON: {}", err))
            })?)
        };

        sqlx::query(
            "INSERT INTO logs (action, secret_id, ip_address, metadata, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(action.as_str())
        .bind(secret_id)
        .bind(ip_address)
        .bind(metadata_json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to write audit event".to_string(),
        })?;

        Ok(())
    }

    /// Most recent events, newest first. Used by tests to verify the trail.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<AuditLogRow>> {
        sqlx::query_as::<_, AuditLogRow>(
            "SELECT id, action, secret_id, ip_address, metadata, created_at \
             FROM logs ORDER BY id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to list audit events".to_string(),
        })
    }
}

/// Fail-silent recorder over [`AuditLogRepository`]
#[derive(Debug, Clone)]
pub struct AuditLog {
    repository: Arc<AuditLogRepository>,
}

impl AuditLog {
    pub fn new(pool: DbPool) -> Self {
        Self { repository: Arc::new(AuditLogRepository::new(pool)) }
    }

    /// Record a lifecycle event, swallowing any storage failure
    pub async fn record(
        &self,
        action: AuditAction,
        secret_id: Option<i64>,
        ip_address: Option<&str>,
        metadata: serde_json::Value,
    ) {
        if let Err(err) = self.repository.insert(action, secret_id, ip_address, metadata).await {
            tracing::error!(
                error = %err,
                action = %action,
                secret_id = ?secret_id,
                "Failed to record audit event"
            );
        }
    }

    /// Access to the underlying repository for test inspection
    pub fn repository(&self) -> &AuditLogRepository {
        &self.repository
    }
}
