//! Document retrieval.
//!
//! [`DocumentFetcher`] is the seam between the pipeline and the outside
//! world. [`BiorxivFetcher`] talks to the public bioRxiv API: the details
//! endpoint supplies the metadata returned to callers as `paper_info`, then
//! the JATS XML full text is downloaded when published, with the PDF as a
//! fallback.

use std::fmt;

use async_trait::async_trait;
use extract::DocumentContent;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid identifier `{0}`: expected a DOI such as 10.1101/2021.01.01.425000")]
    InvalidIdentifier(String),
    #[error("no preprint found for {0}")]
    NotFound(String),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    MalformedResponse(String),
}

/// A validated DOI, without any resolver prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Doi(String);

impl Doi {
    const PREFIXES: [&'static str; 5] = [
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
        "doi:",
    ];

    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let invalid = || FetchError::InvalidIdentifier(raw.trim().to_string());
        let mut doi = raw.trim();
        for prefix in Self::PREFIXES {
            if doi
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
            {
                doi = doi[prefix.len()..].trim_start();
                break;
            }
        }

        let rest = doi.strip_prefix("10.").ok_or_else(invalid)?;
        let (registrant, suffix) = rest.split_once('/').ok_or_else(invalid)?;
        if registrant.is_empty()
            || !registrant.bytes().all(|b| b.is_ascii_digit() || b == b'.')
            || registrant.starts_with('.')
            || registrant.ends_with('.')
        {
            return Err(invalid());
        }
        if suffix.is_empty() || suffix.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        Ok(Self(doi.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload and metadata of one fetched preprint.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub content: DocumentContent,
    /// Opaque metadata, passed through to the response as `paper_info`.
    pub metadata: Value,
}

impl FetchedDocument {
    pub fn xml_found(&self) -> bool {
        self.content.is_structured()
    }
}

#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, doi: &Doi) -> Result<FetchedDocument, FetchError>;
}

#[async_trait]
impl<F: DocumentFetcher + ?Sized> DocumentFetcher for std::sync::Arc<F> {
    async fn fetch(&self, doi: &Doi) -> Result<FetchedDocument, FetchError> {
        (**self).fetch(doi).await
    }
}

/// Pick the entry describing the latest version from a details response.
pub fn latest_entry(details: &Value) -> Option<&Value> {
    details
        .get("collection")?
        .as_array()?
        .iter()
        .max_by_key(|entry| version_of(entry).unwrap_or(0))
}

fn version_of(entry: &Value) -> Option<u64> {
    match entry.get("version")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `{content_base}/{doi}v{version}.full.pdf`
pub fn pdf_url(content_base: &str, doi: &Doi, entry: &Value) -> String {
    let version = version_of(entry).unwrap_or(1);
    format!(
        "{}/{}v{}.full.pdf",
        content_base.trim_end_matches('/'),
        doi,
        version
    )
}

/// The JATS URL of an entry, if the server published one.
pub fn jats_url(entry: &Value) -> Option<&str> {
    entry
        .get("jatsxml")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty() && *url != "NA")
}

#[cfg(feature = "biorxiv")]
pub use self::biorxiv::BiorxivFetcher;

#[cfg(feature = "biorxiv")]
mod biorxiv {
    use bytes::Bytes;
    use tracing::{debug, info};

    use super::*;
    use crate::config::FetchYamlConfig;

    /// Fetcher backed by `api.biorxiv.org`.
    #[derive(Debug, Clone)]
    pub struct BiorxivFetcher {
        client: reqwest::Client,
        api_base: String,
        content_base: String,
    }

    impl BiorxivFetcher {
        pub fn new(cfg: &FetchYamlConfig) -> Result<Self, FetchError> {
            let client = reqwest::Client::builder()
                .timeout(cfg.request_timeout())
                .user_agent(cfg.user_agent.clone())
                .build()
                .map_err(|e| FetchError::Transport(e.to_string()))?;
            Ok(Self {
                client,
                api_base: cfg.api_base.trim_end_matches('/').to_string(),
                content_base: cfg.content_base.trim_end_matches('/').to_string(),
            })
        }

        async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok(response)
        }

        async fn get_bytes(&self, url: &str) -> Result<Bytes, FetchError> {
            self.get(url)
                .await?
                .bytes()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))
        }
    }

    #[async_trait]
    impl DocumentFetcher for BiorxivFetcher {
        async fn fetch(&self, doi: &Doi) -> Result<FetchedDocument, FetchError> {
            let details_url = format!("{}/details/biorxiv/{}", self.api_base, doi);
            let details: Value = self
                .get(&details_url)
                .await?
                .json()
                .await
                .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;
            let entry = latest_entry(&details)
                .ok_or_else(|| FetchError::NotFound(doi.to_string()))?
                .clone();

            let content = match jats_url(&entry) {
                Some(url) => {
                    debug!(identifier = %doi, url, "fetch.jats");
                    DocumentContent::Structured(self.get_bytes(url).await?)
                }
                None => {
                    let url = pdf_url(&self.content_base, doi, &entry);
                    debug!(identifier = %doi, url = %url, "fetch.pdf");
                    DocumentContent::Unstructured(self.get_bytes(&url).await?)
                }
            };
            info!(
                identifier = %doi,
                format = content.format(),
                bytes = content.len(),
                "fetch.done"
            );
            Ok(FetchedDocument {
                content,
                metadata: entry,
            })
        }
    }
}
