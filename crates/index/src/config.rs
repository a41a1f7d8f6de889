use serde::{Deserialize, Serialize};

use crate::ann::AnnConfig;
use crate::error::SearchError;

pub const DEFAULT_N_NEIGHBORS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Neighbors returned per corpus.
    #[serde(default = "default_n_neighbors")]
    pub n_neighbors: usize,
    /// Also emit the journal name under `document` in journal neighbors,
    /// which older frontends read.
    #[serde(default = "default_true")]
    pub legacy_document_field: bool,
    #[serde(default)]
    pub ann: AnnConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            n_neighbors: DEFAULT_N_NEIGHBORS,
            legacy_document_field: true,
            ann: AnnConfig::default(),
        }
    }
}

impl IndexConfig {
    pub fn with_n_neighbors(mut self, k: usize) -> Self {
        self.n_neighbors = k;
        self
    }

    pub fn with_ann(mut self, ann: AnnConfig) -> Self {
        self.ann = ann;
        self
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.n_neighbors == 0 {
            return Err(SearchError::InvalidConfig("n_neighbors must be > 0".into()));
        }
        if self.ann.enabled && (self.ann.m == 0 || self.ann.ef_search == 0) {
            return Err(SearchError::InvalidConfig(
                "ann.m and ann.ef_search must be > 0".into(),
            ));
        }
        Ok(())
    }
}

fn default_n_neighbors() -> usize {
    DEFAULT_N_NEIGHBORS
}

fn default_true() -> bool {
    true
}
