use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::VectorizeError;

/// Controls tokenization and pooling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorizeConfig {
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Lowercase tokens before vocabulary lookup.
    #[serde(default = "default_true")]
    pub lowercase: bool,
    /// Apply NFKC before splitting into words.
    #[serde(default)]
    pub normalize_unicode: bool,
    /// Tokenize segments on the rayon pool.
    #[serde(default = "default_true")]
    pub use_parallel: bool,
    /// Replaces the bundled English stop-word list when set.
    #[serde(default)]
    pub stop_words_path: Option<PathBuf>,
}

impl Default for VectorizeConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            lowercase: true,
            normalize_unicode: false,
            use_parallel: true,
            stop_words_path: None,
        }
    }
}

impl VectorizeConfig {
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    pub fn validate(&self) -> Result<(), VectorizeError> {
        if self.dimension == 0 {
            return Err(VectorizeError::InvalidConfig("dimension must be > 0".into()));
        }
        Ok(())
    }
}

/// Location of the word2vec text artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VocabularyConfig {
    #[serde(default = "default_vocabulary_path")]
    pub path: PathBuf,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            path: default_vocabulary_path(),
        }
    }
}

fn default_dimension() -> usize {
    corpus::DEFAULT_DIMENSION
}

fn default_true() -> bool {
    true
}

fn default_vocabulary_path() -> PathBuf {
    PathBuf::from("data/word_model.wv.txt")
}
