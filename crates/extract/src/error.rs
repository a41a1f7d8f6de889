use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The payload could not be read in the format it was fetched as.
    #[error("failed to parse {format} document: {reason}")]
    ParseFailure {
        format: &'static str,
        reason: String,
    },
    #[error("invalid extract config: {0}")]
    InvalidConfig(String),
}

impl ExtractError {
    pub(crate) fn pdf(reason: impl Into<String>) -> Self {
        Self::ParseFailure {
            format: "pdf",
            reason: reason.into(),
        }
    }
}
