use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use journalrec::{QueryError, StartupError};
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("startup failed: {0}")]
    Startup(#[from] StartupError),

    #[error("metrics are disabled")]
    MetricsDisabled,

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Query(err) => match err.kind() {
                "invalid_identifier" => StatusCode::BAD_REQUEST,
                "not_found" => StatusCode::NOT_FOUND,
                "fetch_failure" => StatusCode::BAD_GATEWAY,
                "parse_failure" | "no_vectorizable_content" => StatusCode::UNPROCESSABLE_ENTITY,
                "projection_unavailable" | "cancelled" => StatusCode::SERVICE_UNAVAILABLE,
                "timeout" => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::MetricsDisabled | ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Startup(_) | ServerError::Internal(_) | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> String {
        match self {
            ServerError::Query(err) => err.kind().to_ascii_uppercase(),
            ServerError::Startup(_) => "STARTUP_ERROR".to_string(),
            ServerError::MetricsDisabled => "METRICS_DISABLED".to_string(),
            ServerError::Internal(_) => "INTERNAL_ERROR".to_string(),
            ServerError::Config(_) => "CONFIG_ERROR".to_string(),
            ServerError::NotFound => "NOT_FOUND".to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = %self.error_code(), error = %self, "request.failed");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: self.error_code(),
                message: self.to_string(),
            },
        });

        (status, body).into_response()
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use journalrec::FetchError;
    use std::time::Duration;

    #[test]
    fn query_errors_map_to_statuses() {
        let cases: Vec<(QueryError, StatusCode)> = vec![
            (
                FetchError::InvalidIdentifier("x".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (FetchError::NotFound("10.1/x".into()).into(), StatusCode::NOT_FOUND),
            (
                FetchError::Status {
                    url: "https://api.biorxiv.org".into(),
                    status: 503,
                }
                .into(),
                StatusCode::BAD_GATEWAY,
            ),
            (QueryError::NoVectorizableContent, StatusCode::UNPROCESSABLE_ENTITY),
            (
                QueryError::Timeout(Duration::from_secs(240)),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                QueryError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status_code(), status);
        }
    }

    #[test]
    fn codes_are_upper_snake_case() {
        let err = ServerError::from(QueryError::NoVectorizableContent);
        assert_eq!(err.error_code(), "NO_VECTORIZABLE_CONTENT");
        assert_eq!(ServerError::NotFound.error_code(), "NOT_FOUND");
    }
}
