use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;

/// Default dimensionality of every feature vector in the corpora.
pub const DEFAULT_DIMENSION: usize = 300;

/// Locations and schema of the two reference datasets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorpusConfig {
    /// Per-paper feature matrix. Compressed by extension (`.xz`, `.zst`).
    #[serde(default = "default_paper_path")]
    pub paper_path: PathBuf,
    /// Per-journal centroid matrix.
    #[serde(default = "default_centroid_path")]
    pub centroid_path: PathBuf,
    /// Expected number of feature columns in both files.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Header of the document identifier column in the paper dataset.
    #[serde(default = "default_document_column")]
    pub document_column: String,
    /// Header of the journal column in both datasets.
    #[serde(default = "default_journal_column")]
    pub journal_column: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            paper_path: default_paper_path(),
            centroid_path: default_centroid_path(),
            dimension: default_dimension(),
            document_column: default_document_column(),
            journal_column: default_journal_column(),
        }
    }
}

impl CorpusConfig {
    pub fn validate(&self) -> Result<(), CorpusError> {
        if self.dimension == 0 {
            return Err(CorpusError::InvalidConfig("dimension must be > 0".into()));
        }
        if self.document_column.trim().is_empty() || self.journal_column.trim().is_empty() {
            return Err(CorpusError::InvalidConfig(
                "key column names must be non-empty".into(),
            ));
        }
        if self.document_column == self.journal_column {
            return Err(CorpusError::InvalidConfig(
                "document and journal columns must differ".into(),
            ));
        }
        Ok(())
    }
}

fn default_paper_path() -> PathBuf {
    PathBuf::from("data/paper_dataset.tsv.xz")
}

fn default_centroid_path() -> PathBuf {
    PathBuf::from("data/centroid_dataset.tsv")
}

fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}

fn default_document_column() -> String {
    "document".to_string()
}

fn default_journal_column() -> String {
    "journal".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_layout() {
        let cfg = CorpusConfig::default();
        assert_eq!(cfg.dimension, 300);
        assert_eq!(cfg.paper_path, PathBuf::from("data/paper_dataset.tsv.xz"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_dimension_rejected() {
        let cfg = CorpusConfig {
            dimension: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(CorpusError::InvalidConfig(_))));
    }

    #[test]
    fn same_key_columns_rejected() {
        let cfg = CorpusConfig {
            document_column: "journal".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
