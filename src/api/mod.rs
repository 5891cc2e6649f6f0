//! HTTP API surface: translates verbs to lifecycle operations and error kinds
//! to status codes.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use routes::{build_router, ApiState};
pub use server::start_api_server;
