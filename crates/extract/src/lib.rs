//! Text extraction for fetched preprints.
//!
//! A preprint arrives either as JATS XML or as a PDF, and the choice is made
//! once by the fetcher through [`DocumentContent`]. [`extract`] turns either
//! form into an ordered list of text blobs: one per selected XML node, or one
//! per PDF page.
//!
//! XML extraction never fails; broken markup yields whatever could be read up
//! to the break. PDF extraction fails with [`ExtractError::ParseFailure`] when
//! the bytes are not a PDF. An empty list is a valid result and is left for
//! the vectorizer to reject.
//!
//! ```
//! use bytes::Bytes;
//! use extract::{extract, DocumentContent, ExtractConfig};
//!
//! let xml = Bytes::from_static(b"<abstract><p>Gene <italic>X</italic> matters.</p></abstract>");
//! let blobs = extract(&DocumentContent::Structured(xml), &ExtractConfig::default()).unwrap();
//! assert_eq!(blobs, vec!["Gene X matters."]);
//! ```

mod config;
mod error;
mod jats;
mod pdf;

use std::time::Instant;

use bytes::Bytes;
use tracing::debug;

pub use crate::config::{ExtractConfig, TextFidelity, DEFAULT_STRIP_TAGS};
pub use crate::error::ExtractError;

/// Raw payload of a fetched document, tagged by format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentContent {
    /// JATS XML full text.
    Structured(Bytes),
    /// PDF bytes.
    Unstructured(Bytes),
}

impl DocumentContent {
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    pub fn format(&self) -> &'static str {
        match self {
            Self::Structured(_) => "xml",
            Self::Unstructured(_) => "pdf",
        }
    }

    pub fn bytes(&self) -> &Bytes {
        match self {
            Self::Structured(b) | Self::Unstructured(b) => b,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }
}

pub fn extract(content: &DocumentContent, cfg: &ExtractConfig) -> Result<Vec<String>, ExtractError> {
    cfg.validate()?;
    let start = Instant::now();
    let blobs = match content {
        DocumentContent::Structured(xml) => jats::extract_jats(xml, cfg),
        DocumentContent::Unstructured(pdf) => pdf::extract_pdf(pdf)?,
    };
    debug!(
        format = content.format(),
        input_bytes = content.len(),
        blobs = blobs.len(),
        elapsed_micros = start.elapsed().as_micros(),
        "extract.done"
    );
    Ok(blobs)
}
