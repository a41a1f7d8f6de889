//! YAML configuration for the journalrec pipeline.
//!
//! Every stage is configured from one file. All sections are optional and
//! default to the layout of a standard deployment, so an empty document with
//! only a `version` is a valid configuration.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1"
//!
//! corpus:
//!   paper_path: data/paper_dataset.tsv.xz
//!   centroid_path: data/centroid_dataset.tsv
//!   dimension: 300
//!
//! vocabulary:
//!   path: data/word_model.wv.txt
//!
//! vectorize:
//!   lowercase: true
//!   normalize_unicode: false
//!   # stop_words_path: data/stop_words.txt
//!
//! extract:
//!   fidelity: first_run      # or full_text
//!
//! index:
//!   n_neighbors: 10
//!   ann:
//!     enabled: false
//!
//! projection:
//!   model_path: models/projection.json
//!   required: false
//!
//! query:
//!   timeout_secs: 240
//!
//! fetch:
//!   api_base: https://api.biorxiv.org
//!   content_base: https://www.biorxiv.org/content
//!   request_timeout_secs: 60
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use corpus::CorpusConfig;
use extract::ExtractConfig;
use index::IndexConfig;
use projection::ProjectionConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vectorize::{VectorizeConfig, VocabularyConfig};

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration structure for the whole pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct JournalRecConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub corpus: CorpusConfig,

    #[serde(default)]
    pub vocabulary: VocabularyConfig,

    #[serde(default)]
    pub vectorize: VectorizeConfig,

    #[serde(default)]
    pub extract: ExtractConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub projection: ProjectionConfig,

    #[serde(default)]
    pub query: QueryYamlConfig,

    #[serde(default)]
    pub fetch: FetchYamlConfig,
}

impl JournalRecConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: JournalRecConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        let invalid = |e: &dyn std::fmt::Display| ConfigLoadError::Validation(e.to_string());
        self.corpus.validate().map_err(|e| invalid(&e))?;
        self.vectorize.validate().map_err(|e| invalid(&e))?;
        self.extract.validate().map_err(|e| invalid(&e))?;
        self.index.validate().map_err(|e| invalid(&e))?;
        self.query.validate()?;
        self.fetch.validate()?;

        if self.vectorize.dimension != self.corpus.dimension {
            return Err(ConfigLoadError::Validation(format!(
                "vectorize.dimension ({}) must equal corpus.dimension ({})",
                self.vectorize.dimension, self.corpus.dimension
            )));
        }
        Ok(())
    }
}

impl Default for JournalRecConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            corpus: CorpusConfig::default(),
            vocabulary: VocabularyConfig::default(),
            vectorize: VectorizeConfig::default(),
            extract: ExtractConfig::default(),
            index: IndexConfig::default(),
            projection: ProjectionConfig::default(),
            query: QueryYamlConfig::default(),
            fetch: FetchYamlConfig::default(),
        }
    }
}

/// Per-query limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryYamlConfig {
    /// Wall-clock budget for one query, fetch included
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl QueryYamlConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.timeout_secs == 0 {
            return Err(ConfigLoadError::Validation(
                "query.timeout_secs must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for QueryYamlConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// bioRxiv endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FetchYamlConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_content_base")]
    pub content_base: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl FetchYamlConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        for (field, url) in [("api_base", &self.api_base), ("content_base", &self.content_base)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigLoadError::Validation(format!(
                    "fetch.{field} must be an http(s) URL, got `{url}`"
                )));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigLoadError::Validation(
                "fetch.request_timeout_secs must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for FetchYamlConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            content_base: default_content_base(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_version() -> String {
    "1".to_string()
}

fn default_timeout_secs() -> u64 {
    240
}

fn default_api_base() -> String {
    "https://api.biorxiv.org".to_string()
}

fn default_content_base() -> String {
    "https://www.biorxiv.org/content".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_user_agent() -> String {
    concat!("journalrec/", env!("CARGO_PKG_VERSION")).to_string()
}
