use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::services::SecretService;

use super::handlers::{
    create_secret_handler, delete_secret_handler, health_handler, read_secret_handler,
};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct ApiState {
    pub secret_service: SecretService,
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/secret", post(create_secret_handler))
        .route(
            "/secret/{secret_key}",
            get(read_secret_handler).delete(delete_secret_handler),
        )
        .route("/health", get(health_handler))
        .layer(middleware::from_fn(disable_response_caching))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Stamp every response with headers disabling HTTP caching. Any intermediary
/// cache could otherwise replay a one-time secret.
async fn disable_response_caching(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));

    response
}
