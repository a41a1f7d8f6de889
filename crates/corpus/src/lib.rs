//! journalrec reference corpora.
//!
//! Two static datasets back every query: a per-paper feature matrix labelled
//! with journal and document identifier, and one centroid feature vector per
//! journal. Both are tab-separated with a header row; either can be xz or
//! zstd compressed.
//!
//! Loading is all-or-nothing. A missing file, a ragged row, a non-numeric
//! feature or a feature count that differs from the configured dimension is a
//! [`CorpusError`] and the process is expected to stop. Once loaded, the
//! tables never change.
//!
//! ```no_run
//! use corpus::{load, CorpusConfig};
//!
//! let corpora = load(&CorpusConfig::default()).expect("corpora");
//! println!("{} papers, {} journals", corpora.papers.len(), corpora.centroids.len());
//! ```

mod artifact;
mod config;
mod error;
mod table;

use std::time::Instant;

use tracing::info;

pub use crate::artifact::{open_artifact, Compression};
pub use crate::config::{CorpusConfig, DEFAULT_DIMENSION};
pub use crate::error::CorpusError;
pub use crate::table::{
    CentroidTable, CentroidView, JournalCentroid, PaperRecord, PaperTable, PaperView,
};

/// Both reference tables, immutable after [`load`].
#[derive(Debug, Clone)]
pub struct ReferenceCorpora {
    pub papers: PaperTable,
    pub centroids: CentroidTable,
}

impl ReferenceCorpora {
    /// Pair two tables, checking that they share a dimensionality.
    pub fn new(papers: PaperTable, centroids: CentroidTable) -> Result<Self, CorpusError> {
        if papers.dimension() != centroids.dimension() {
            return Err(CorpusError::InvalidConfig(format!(
                "paper dimension {} differs from centroid dimension {}",
                papers.dimension(),
                centroids.dimension()
            )));
        }
        Ok(Self { papers, centroids })
    }

    pub fn dimension(&self) -> usize {
        self.papers.dimension()
    }
}

/// Load both reference datasets described by `cfg`.
pub fn load(cfg: &CorpusConfig) -> Result<ReferenceCorpora, CorpusError> {
    cfg.validate()?;

    let start = Instant::now();
    let papers = PaperTable::load(
        &cfg.paper_path,
        &cfg.document_column,
        &cfg.journal_column,
        cfg.dimension,
    )?;
    info!(
        path = %cfg.paper_path.display(),
        papers = papers.len(),
        journals = papers.journal_count(),
        elapsed_micros = start.elapsed().as_micros(),
        "corpus.papers_loaded"
    );

    let start = Instant::now();
    let centroids = CentroidTable::load(&cfg.centroid_path, &cfg.journal_column, cfg.dimension)?;
    info!(
        path = %cfg.centroid_path.display(),
        centroids = centroids.len(),
        elapsed_micros = start.elapsed().as_micros(),
        "corpus.centroids_loaded"
    );

    ReferenceCorpora::new(papers, centroids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;
    use std::io::Write;
    use std::path::Path;

    fn header(dim: usize) -> String {
        (0..dim).map(|i| format!("\t{i}")).collect()
    }

    fn write_fixture(dir: &Path, dim: usize) -> CorpusConfig {
        let mut papers = format!("document\tjournal{}\n", header(dim));
        for (doc, journal, base) in [("PMC1", "J1", 0.0f32), ("PMC2", "J2", 1.0), ("PMC3", "J1", 2.0)] {
            write!(papers, "{doc}\t{journal}").unwrap();
            for i in 0..dim {
                write!(papers, "\t{}", base + i as f32 * 0.01).unwrap();
            }
            papers.push('\n');
        }

        let mut centroids = format!("journal{}\n", header(dim));
        for (journal, base) in [("J1", 1.0f32), ("J2", 1.0)] {
            centroids.push_str(journal);
            for _ in 0..dim {
                write!(centroids, "\t{base}").unwrap();
            }
            centroids.push('\n');
        }

        let paper_path = dir.join("paper_dataset.tsv.xz");
        let mut enc = xz2::write::XzEncoder::new(std::fs::File::create(&paper_path).unwrap(), 6);
        enc.write_all(papers.as_bytes()).unwrap();
        enc.finish().unwrap();

        let centroid_path = dir.join("centroid_dataset.tsv");
        std::fs::write(&centroid_path, centroids).unwrap();

        CorpusConfig {
            paper_path,
            centroid_path,
            dimension: dim,
            ..Default::default()
        }
    }

    #[test]
    fn load_reads_compressed_papers_and_plain_centroids() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = write_fixture(dir.path(), DEFAULT_DIMENSION);

        let corpora = load(&cfg).expect("load");
        assert_eq!(corpora.papers.len(), 3);
        assert_eq!(corpora.centroids.len(), 2);
        assert_eq!(corpora.dimension(), 300);
        assert_eq!(corpora.papers.get("PMC2").unwrap().journal, "J2");
        assert!(corpora.centroids.get("J1").is_some());
    }

    #[test]
    fn load_rejects_dimension_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = write_fixture(dir.path(), 4);
        cfg.dimension = 300;
        assert!(matches!(
            load(&cfg),
            Err(CorpusError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn load_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = write_fixture(dir.path(), 2);
        cfg.centroid_path = dir.path().join("nope.tsv");
        assert!(matches!(load(&cfg), Err(CorpusError::NotFound(_))));
    }

    #[test]
    fn loading_twice_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = write_fixture(dir.path(), 8);
        let a = load(&cfg).unwrap();
        let b = load(&cfg).unwrap();
        assert_eq!(a.papers.features(), b.papers.features());
        assert_eq!(a.centroids.features(), b.centroids.features());
    }
}
