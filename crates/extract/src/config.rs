use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// JATS elements removed before selection. Their text stays in place.
pub const DEFAULT_STRIP_TAGS: &[&str] = &[
    "sc",
    "italic",
    "xref",
    "label",
    "sub",
    "sup",
    "inline-formula",
    "fig",
    "disp-formula",
    "bold",
    "table-wrap",
    "table",
    "thead",
    "tbody",
    "caption",
    "tr",
    "td",
];

/// How much of a selected element's text is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFidelity {
    /// First text fragment only, up to the first surviving child element.
    /// Matches the vectors the reference corpora were built with.
    #[default]
    FirstRun,
    /// All descendant text, concatenated in document order.
    FullText,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractConfig {
    #[serde(default)]
    pub fidelity: TextFidelity,
    #[serde(default = "default_strip_tags")]
    pub strip_tags: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            fidelity: TextFidelity::default(),
            strip_tags: default_strip_tags(),
        }
    }
}

impl ExtractConfig {
    pub fn with_fidelity(mut self, fidelity: TextFidelity) -> Self {
        self.fidelity = fidelity;
        self
    }

    pub fn validate(&self) -> Result<(), ExtractError> {
        if let Some(tag) = self
            .strip_tags
            .iter()
            .find(|t| t.is_empty() || matches!(t.as_str(), "p" | "title" | "abstract" | "body" | "sec"))
        {
            return Err(ExtractError::InvalidConfig(format!(
                "`{tag}` cannot be stripped"
            )));
        }
        Ok(())
    }
}

fn default_strip_tags() -> Vec<String> {
    DEFAULT_STRIP_TAGS.iter().map(|t| t.to_string()).collect()
}
