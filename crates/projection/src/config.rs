use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    /// Fail the query when projection fails instead of answering without
    /// coordinates.
    #[serde(default)]
    pub required: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            required: false,
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/projection.json")
}
