//! # journalrec index
//!
//! Nearest-neighbor retrieval over the two reference corpora. A
//! [`NeighborSearch`] owns the loaded [`ReferenceCorpora`] and one
//! [`KnnIndex`] per table, built once at startup and read concurrently by any
//! number of queries.
//!
//! Distances are Euclidean, reported rounded to three decimals, and results
//! are ordered by ascending distance with ties broken by corpus row order.
//! When a corpus holds fewer than `k` entries, all of them are returned.
//!
//! ```
//! use corpus::{CentroidTable, JournalCentroid, PaperRecord, PaperTable, ReferenceCorpora};
//! use index::{IndexConfig, NeighborSearch};
//! use vectorize::DocumentVector;
//!
//! let papers = PaperTable::from_records(
//!     vec![PaperRecord {
//!         document_id: "PMC1".into(),
//!         journal: "J1".into(),
//!         feature_vector: vec![1.0, 0.0],
//!     }],
//!     2,
//! )
//! .unwrap();
//! let centroids = CentroidTable::from_records(
//!     vec![JournalCentroid { journal: "J1".into(), feature_vector: vec![1.0, 0.0] }],
//!     2,
//! )
//! .unwrap();
//! let search = NeighborSearch::build(
//!     ReferenceCorpora::new(papers, centroids).unwrap(),
//!     &IndexConfig::default(),
//! )
//! .unwrap();
//!
//! let query = DocumentVector::new(vec![1.0, 0.0], 2).unwrap();
//! let results = search.search(&query).unwrap();
//! assert_eq!(results.journal_neighbors[0].journal, "J1");
//! assert_eq!(results.journal_neighbors[0].distance, 0.0);
//! ```

pub mod ann;
mod config;
mod error;

use std::time::Instant;

use corpus::ReferenceCorpora;
use serde::{Deserialize, Serialize};
use vectorize::DocumentVector;

pub use crate::ann::{AnnConfig, Hit, KnnIndex};
pub use crate::config::{IndexConfig, DEFAULT_N_NEIGHBORS};
pub use crate::error::SearchError;

/// A nearby indexed paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperNeighbor {
    pub distance: f64,
    pub journal: String,
    #[serde(rename = "pmcid")]
    pub document_id: String,
}

/// A nearby journal centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalNeighbor {
    pub distance: f64,
    pub journal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub paper_neighbors: Vec<PaperNeighbor>,
    pub journal_neighbors: Vec<JournalNeighbor>,
}

/// Round to three decimal places, the precision reported to callers.
pub fn round_distance(distance: f64) -> f64 {
    (distance * 1000.0).round() / 1000.0
}

pub struct NeighborSearch {
    corpora: ReferenceCorpora,
    papers: KnnIndex,
    journals: KnnIndex,
    legacy_document_field: bool,
}

impl std::fmt::Debug for NeighborSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeighborSearch")
            .field("papers", &self.papers)
            .field("journals", &self.journals)
            .finish()
    }
}

impl NeighborSearch {
    pub fn build(corpora: ReferenceCorpora, cfg: &IndexConfig) -> Result<Self, SearchError> {
        cfg.validate()?;
        let start = Instant::now();
        let papers = KnnIndex::build(corpora.papers.features(), cfg.n_neighbors, cfg.ann)?;
        let journals = KnnIndex::build(corpora.centroids.features(), cfg.n_neighbors, cfg.ann)?;
        log::info!(
            "neighbor indices ready: {} papers, {} journals, k={}, ann={} ({:?})",
            papers.rows(),
            journals.rows(),
            cfg.n_neighbors,
            papers.uses_ann() || journals.uses_ann(),
            start.elapsed()
        );
        Ok(Self {
            corpora,
            papers,
            journals,
            legacy_document_field: cfg.legacy_document_field,
        })
    }

    pub fn corpora(&self) -> &ReferenceCorpora {
        &self.corpora
    }

    pub fn k(&self) -> usize {
        self.papers.k()
    }

    pub fn dimension(&self) -> usize {
        self.papers.dimension()
    }

    pub fn search(&self, query: &DocumentVector) -> Result<SearchResults, SearchError> {
        Ok(SearchResults {
            paper_neighbors: self.paper_neighbors(query)?,
            journal_neighbors: self.journal_neighbors(query)?,
        })
    }

    pub fn paper_neighbors(
        &self,
        query: &DocumentVector,
    ) -> Result<Vec<PaperNeighbor>, SearchError> {
        let table = &self.corpora.papers;
        let hits = self.papers.search(table.features(), query.as_slice())?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                table.row(hit.row).map(|paper| PaperNeighbor {
                    distance: round_distance(hit.distance),
                    journal: paper.journal.to_string(),
                    document_id: paper.document_id.to_string(),
                })
            })
            .collect())
    }

    pub fn journal_neighbors(
        &self,
        query: &DocumentVector,
    ) -> Result<Vec<JournalNeighbor>, SearchError> {
        let table = &self.corpora.centroids;
        let hits = self.journals.search(table.features(), query.as_slice())?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                table.row(hit.row).map(|centroid| JournalNeighbor {
                    distance: round_distance(hit.distance),
                    journal: centroid.journal.to_string(),
                    document: self
                        .legacy_document_field
                        .then(|| centroid.journal.to_string()),
                })
            })
            .collect())
    }
}
