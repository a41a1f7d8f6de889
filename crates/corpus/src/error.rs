use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the reference corpora.
///
/// Every variant is fatal at startup: a process that cannot load its corpora
/// must not start serving queries.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("io error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed tsv in {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
    #[error("{}: missing required column `{column}`", path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("{}: expected {expected} feature columns, found {found}", path.display())]
    DimensionMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
    #[error("{}: line {line} has {found} fields, header has {expected}", path.display())]
    RowWidth {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("{}: line {line}, column `{column}`: `{value}` is not a finite number", path.display())]
    InvalidValue {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
    #[error("{}: duplicate key `{key}`", path.display())]
    DuplicateKey { path: PathBuf, key: String },
    #[error("{}: corpus contains no records", .0.display())]
    Empty(PathBuf),
    #[error("invalid corpus config: {0}")]
    InvalidConfig(String),
}

impl CorpusError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            CorpusError::NotFound(path)
        } else {
            CorpusError::Io { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_io_errors_are_promoted() {
        let err = CorpusError::io(
            "data/missing.tsv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, CorpusError::NotFound(_)));
        assert!(err.to_string().contains("data/missing.tsv"));
    }

    #[test]
    fn dimension_mismatch_message_names_counts() {
        let err = CorpusError::DimensionMismatch {
            path: "c.tsv".into(),
            expected: 300,
            found: 299,
        };
        let msg = err.to_string();
        assert!(msg.contains("300"));
        assert!(msg.contains("299"));
    }
}
