use std::time::Duration;

use corpus::CorpusError;
use extract::ExtractError;
use index::SearchError;
use projection::ProjectionError;
use thiserror::Error;
use vectorize::VectorizeError;

use crate::config::ConfigLoadError;
use crate::fetch::FetchError;

/// Per-query failure. Never fatal to the process.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("fetch failed: {0}")]
    FetchFailure(#[from] FetchError),
    #[error(transparent)]
    ParseFailure(#[from] ExtractError),
    #[error("no vectorizable content: the document has no words in the embedding vocabulary")]
    NoVectorizableContent,
    #[error("{0}")]
    ProjectionUnavailable(ProjectionError),
    #[error("query exceeded its {}s deadline", .0.as_secs())]
    Timeout(Duration),
    #[error("query cancelled")]
    Cancelled,
    #[error("neighbor search failed: {0}")]
    Search(#[from] SearchError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl QueryError {
    /// Stable machine-readable code.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FetchFailure(FetchError::InvalidIdentifier(_)) => "invalid_identifier",
            Self::FetchFailure(FetchError::NotFound(_)) => "not_found",
            Self::FetchFailure(_) => "fetch_failure",
            Self::ParseFailure(_) => "parse_failure",
            Self::NoVectorizableContent => "no_vectorizable_content",
            Self::ProjectionUnavailable(_) => "projection_unavailable",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
            Self::Search(_) => "search_failure",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<VectorizeError> for QueryError {
    fn from(err: VectorizeError) -> Self {
        match err {
            VectorizeError::NoVectorizableContent => Self::NoVectorizableContent,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for QueryError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("pipeline task failed: {err}"))
    }
}

/// Failure while loading the shared query context. Fatal at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigLoadError),
    #[error("reference corpora: {0}")]
    Corpus(#[from] CorpusError),
    #[error("embedding vocabulary: {0}")]
    Vocabulary(#[from] VectorizeError),
    #[error("neighbor index: {0}")]
    Index(#[from] SearchError),
    #[error("projection model: {0}")]
    Projection(#[from] ProjectionError),
    #[error("{0}")]
    Mismatch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        let cases: Vec<(QueryError, &str)> = vec![
            (
                FetchError::InvalidIdentifier("x".into()).into(),
                "invalid_identifier",
            ),
            (FetchError::NotFound("10.1/x".into()).into(), "not_found"),
            (FetchError::Transport("reset".into()).into(), "fetch_failure"),
            (VectorizeError::NoVectorizableContent.into(), "no_vectorizable_content"),
            (QueryError::Timeout(Duration::from_secs(240)), "timeout"),
            (QueryError::Cancelled, "cancelled"),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn non_content_vectorize_errors_are_internal() {
        let err: QueryError = VectorizeError::NonFinite.into();
        assert_eq!(err.kind(), "internal");
    }

    #[test]
    fn timeout_message_names_deadline() {
        assert!(
            QueryError::Timeout(Duration::from_secs(240))
                .to_string()
                .contains("240s")
        );
    }
}
