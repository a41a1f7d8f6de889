use std::path::PathBuf;

use corpus::CorpusError;
use thiserror::Error;

/// Errors surfaced by vocabulary loading and document vectorization.
#[derive(Debug, Error)]
pub enum VectorizeError {
    /// No token of the document survived stop-word and vocabulary filtering,
    /// so the mean embedding is undefined.
    #[error("no vectorizable content: no token matched the embedding vocabulary")]
    NoVectorizableContent,
    /// The vocabulary or stop-word artifact could not be opened.
    #[error("artifact error: {0}")]
    Artifact(#[from] CorpusError),
    #[error("io error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: line {line}: {message}", path.display())]
    MalformedVocabulary {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("vector has {found} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("vector contains non-finite values")]
    NonFinite,
    #[error("vocabulary {} contains no entries", .0.display())]
    EmptyVocabulary(PathBuf),
    #[error("invalid vectorize config: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_content_message_is_distinct() {
        let msg = VectorizeError::NoVectorizableContent.to_string();
        assert!(msg.contains("no vectorizable content"));
    }

    #[test]
    fn corpus_errors_convert() {
        let err: VectorizeError = CorpusError::NotFound("v.txt".into()).into();
        assert!(matches!(err, VectorizeError::Artifact(CorpusError::NotFound(_))));
    }
}
