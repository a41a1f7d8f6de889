use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("query has {found} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("cannot index an empty corpus")]
    EmptyCorpus,
    #[error("invalid index config: {0}")]
    InvalidConfig(String),
}
