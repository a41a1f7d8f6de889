//! journalrec: recommend journals for a bioRxiv preprint.
//!
//! A query takes a DOI through five stages:
//!
//! 1. **fetch** the preprint's metadata plus its JATS XML, or the PDF when no
//!    XML was published ([`fetch`]),
//! 2. **extract** prose segments from the document ([`extract`]),
//! 3. **vectorize** them into one mean-pooled word-embedding vector
//!    ([`vectorize`]),
//! 4. **search** the k nearest reference papers and journal centroids
//!    ([`index`]),
//! 5. **project** the vector into 2D for the landscape plot ([`projection`]).
//!
//! The reference corpora, the vocabulary and the projection model are loaded
//! once into a [`QueryContext`] that is shared read-only by every query.
//! Fetching is the only stage that waits on the network; the CPU-bound
//! stages run on the blocking pool so the async workers stay free.
//!
//! ```no_run
//! use std::sync::Arc;
//! use journalrec::{run_query, BiorxivFetcher, JournalRecConfig, QueryContext};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = JournalRecConfig::from_file("journalrec.yaml")?;
//! let ctx = Arc::new(QueryContext::load(&cfg)?);
//! let fetcher = BiorxivFetcher::new(&cfg.fetch)?;
//! let response = run_query(
//!     &ctx,
//!     &fetcher,
//!     "10.1101/2021.01.01.425000",
//!     ctx.deadline(),
//!     CancellationToken::new(),
//! )
//! .await?;
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fetch;
mod response;
mod session;

use std::sync::Arc;
use std::time::{Duration, Instant};

use extract::ExtractConfig;
use index::NeighborSearch;
use projection::{MlpProjector, Projector};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span};
use vectorize::Vectorizer;

pub use crate::config::{ConfigLoadError, FetchYamlConfig, JournalRecConfig, QueryYamlConfig};
pub use crate::error::{QueryError, StartupError};
#[cfg(feature = "biorxiv")]
pub use crate::fetch::BiorxivFetcher;
pub use crate::fetch::{Doi, DocumentFetcher, FetchError, FetchedDocument};
pub use crate::response::QueryResponse;
pub use crate::session::{QuerySession, QueryStage, StageTiming};

pub use corpus::{CorpusConfig, CorpusError, ReferenceCorpora};
pub use extract::{DocumentContent, ExtractError, TextFidelity};
pub use index::{IndexConfig, JournalNeighbor, PaperNeighbor, SearchError, SearchResults};
pub use projection::{Coordinates, ProjectionConfig, ProjectionError};
pub use vectorize::{DocumentVector, VectorizeConfig, VectorizeError, VocabularyConfig};

/// Per-query behavior that is not owned by any one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub extract: ExtractConfig,
    pub projection_required: bool,
    pub timeout: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            extract: ExtractConfig::default(),
            projection_required: false,
            timeout: QueryYamlConfig::default().timeout(),
        }
    }
}

/// Sizes reported by readiness probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ContextStats {
    pub papers: usize,
    pub journals: usize,
    pub vocabulary: usize,
    pub dimension: usize,
    pub n_neighbors: usize,
}

/// Everything a query reads and nothing it writes.
pub struct QueryContext {
    search: NeighborSearch,
    vectorizer: Vectorizer,
    projector: Arc<dyn Projector>,
    options: QueryOptions,
}

impl std::fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryContext")
            .field("stats", &self.stats())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl QueryContext {
    /// Load corpora, vocabulary and projection model named by `cfg`.
    ///
    /// Any failure here is fatal: the service must not start half-loaded.
    pub fn load(cfg: &JournalRecConfig) -> Result<Self, StartupError> {
        cfg.validate()?;
        let start = Instant::now();

        let corpora = corpus::load(&cfg.corpus)?;
        let search = NeighborSearch::build(corpora, &cfg.index)?;
        let vectorizer = Vectorizer::load(&cfg.vocabulary, cfg.vectorize.clone())?;
        let projector = MlpProjector::load(&cfg.projection.model_path)?;

        let options = QueryOptions {
            extract: cfg.extract.clone(),
            projection_required: cfg.projection.required,
            timeout: cfg.query.timeout(),
        };
        let ctx = Self::new(search, vectorizer, Arc::new(projector), options)?;
        let stats = ctx.stats();
        info!(
            papers = stats.papers,
            journals = stats.journals,
            vocabulary = stats.vocabulary,
            dimension = stats.dimension,
            elapsed_micros = start.elapsed().as_micros(),
            "context.loaded"
        );
        Ok(ctx)
    }

    /// Assemble a context from already-built parts.
    pub fn new(
        search: NeighborSearch,
        vectorizer: Vectorizer,
        projector: Arc<dyn Projector>,
        options: QueryOptions,
    ) -> Result<Self, StartupError> {
        let dimension = search.dimension();
        if vectorizer.dimension() != dimension {
            return Err(StartupError::Mismatch(format!(
                "vocabulary dimension {} differs from corpus dimension {dimension}",
                vectorizer.dimension()
            )));
        }
        if projector.input_dim() != dimension {
            return Err(StartupError::Mismatch(format!(
                "projection input dimension {} differs from corpus dimension {dimension}",
                projector.input_dim()
            )));
        }
        options
            .extract
            .validate()
            .map_err(|e| StartupError::Mismatch(e.to_string()))?;
        if options.timeout.is_zero() {
            return Err(StartupError::Mismatch("query timeout must be non-zero".into()));
        }
        Ok(Self {
            search,
            vectorizer,
            projector,
            options,
        })
    }

    pub fn search(&self) -> &NeighborSearch {
        &self.search
    }

    pub fn vectorizer(&self) -> &Vectorizer {
        &self.vectorizer
    }

    pub fn projector(&self) -> &dyn Projector {
        self.projector.as_ref()
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn extract_config(&self) -> &ExtractConfig {
        &self.options.extract
    }

    pub fn projection_required(&self) -> bool {
        self.options.projection_required
    }

    pub fn timeout(&self) -> Duration {
        self.options.timeout
    }

    /// Deadline for a query starting now.
    pub fn deadline(&self) -> tokio::time::Instant {
        tokio::time::Instant::now() + self.options.timeout
    }

    pub fn stats(&self) -> ContextStats {
        let corpora = self.search.corpora();
        ContextStats {
            papers: corpora.papers.len(),
            journals: corpora.centroids.len(),
            vocabulary: self.vectorizer.vocabulary().len(),
            dimension: self.search.dimension(),
            n_neighbors: self.search.k(),
        }
    }
}

/// Run one query to completion or failure.
///
/// `cancel` lets the caller abandon the query early (a disconnected client,
/// a shutdown). It is also cancelled when `deadline` passes.
pub async fn run_query(
    ctx: &Arc<QueryContext>,
    fetcher: &dyn DocumentFetcher,
    identifier: &str,
    deadline: tokio::time::Instant,
    cancel: CancellationToken,
) -> Result<QueryResponse, QueryError> {
    let span = info_span!("query.run", identifier = %identifier.trim());
    let mut session = QuerySession::new(identifier.trim());
    let result = session
        .run(ctx, fetcher, deadline, cancel)
        .instrument(span)
        .await;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(err) => err.kind(),
    };
    metrics::counter!("journalrec_queries_total", "outcome" => outcome).increment(1);
    metrics::histogram!("journalrec_query_duration_seconds")
        .record(session.elapsed().as_secs_f64());
    for timing in session.trail() {
        metrics::histogram!("journalrec_stage_duration_seconds", "stage" => timing.stage.name())
            .record(timing.elapsed.as_secs_f64());
    }
    result
}
