use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use crate::errors::Error;
use crate::services::secret_service::CreateSecretRequest;

use super::error::ApiError;
use super::routes::ApiState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSecretBody {
    #[validate(length(min = 1, message = "secret cannot be empty"))]
    pub secret: String,

    #[serde(default)]
    pub passphrase: Option<String>,

    #[serde(default)]
    #[validate(range(min = 1, message = "ttl_seconds must be greater than 0"))]
    pub ttl_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreateSecretResponse {
    pub secret_key: String,
}

#[derive(Debug, Serialize)]
pub struct ReadSecretResponse {
    pub secret: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteSecretQuery {
    #[serde(default)]
    pub passphrase: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteSecretResponse {
    pub status: &'static str,
}

/// Best-effort client address for the audit trail. The service is expected to
/// run behind a reverse proxy, so the forwarding headers are the source.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

pub async fn create_secret_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(payload): Json<CreateSecretBody>,
) -> Result<(StatusCode, Json<CreateSecretResponse>), ApiError> {
    payload.validate().map_err(|err| ApiError::from(Error::from(err)))?;

    let ip = client_ip(&headers);
    let secret_key = state
        .secret_service
        .create(
            CreateSecretRequest {
                secret: payload.secret,
                passphrase: payload.passphrase,
                ttl_seconds: payload.ttl_seconds,
            },
            ip.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CreateSecretResponse { secret_key })))
}

pub async fn read_secret_handler(
    State(state): State<ApiState>,
    Path(secret_key): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ReadSecretResponse>, ApiError> {
    let ip = client_ip(&headers);
    let secret = state.secret_service.read(&secret_key, ip.as_deref()).await?;

    Ok(Json(ReadSecretResponse { secret }))
}

pub async fn delete_secret_handler(
    State(state): State<ApiState>,
    Path(secret_key): Path<String>,
    Query(query): Query<DeleteSecretQuery>,
    headers: HeaderMap,
) -> Result<Json<DeleteSecretResponse>, ApiError> {
    let ip = client_ip(&headers);
    state
        .secret_service
        .delete(&secret_key, query.passphrase.as_deref(), ip.as_deref())
        .await?;

    Ok(Json(DeleteSecretResponse { status: "secret_deleted" }))
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));

        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));

        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn test_client_ip_absent() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_create_body_validation() {
        let body = CreateSecretBody {
            secret: "s".to_string(),
            passphrase: None,
            ttl_seconds: Some(0),
        };
        assert!(body.validate().is_err());

        let body = CreateSecretBody {
            secret: String::new(),
            passphrase: None,
            ttl_seconds: None,
        };
        assert!(body.validate().is_err());

        let body = CreateSecretBody {
            secret: "s".to_string(),
            passphrase: Some("p".to_string()),
            ttl_seconds: Some(60),
        };
        assert!(body.validate().is_ok());
    }
}
