//! API route handlers
//!
//! - `query`: the recommendation endpoint
//! - `health`: liveness, readiness and metrics

pub mod health;
pub mod query;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// ```json
/// {
///   "name": "journalrec",
///   "version": "0.1.0",
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "journalrec",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/doi/{doi}",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
