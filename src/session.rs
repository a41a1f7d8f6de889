//! Per-query state machine.
//!
//! A query moves `Start → Fetching → Extracting → Vectorizing → Searching →
//! Projecting → Done`, or to `Failed` from wherever it was. The session keeps
//! the intermediate products and a timing trail for logging, and is dropped
//! with the request.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use index::SearchResults;
use projection::{Coordinates, ProjectionError};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vectorize::DocumentVector;

use crate::QueryContext;
use crate::error::QueryError;
use crate::fetch::{Doi, DocumentFetcher, FetchedDocument};
use crate::response::QueryResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStage {
    Start,
    Fetching,
    Extracting,
    Vectorizing,
    Searching,
    Projecting,
    Done,
    /// Carries [`QueryError::kind`].
    Failed(&'static str),
}

impl QueryStage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Vectorizing => "vectorizing",
            Self::Searching => "searching",
            Self::Projecting => "projecting",
            Self::Done => "done",
            Self::Failed(_) => "failed",
        }
    }

    fn successor(&self) -> Option<QueryStage> {
        match self {
            Self::Start => Some(Self::Fetching),
            Self::Fetching => Some(Self::Extracting),
            Self::Extracting => Some(Self::Vectorizing),
            Self::Vectorizing => Some(Self::Searching),
            Self::Searching => Some(Self::Projecting),
            Self::Projecting => Some(Self::Done),
            Self::Done | Self::Failed(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed({reason})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Time spent in one completed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTiming {
    pub stage: QueryStage,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct QuerySession {
    identifier: String,
    stage: QueryStage,
    trail: Vec<StageTiming>,
    started: Instant,
    stage_started: Instant,
    document: Option<FetchedDocument>,
    segments: Vec<String>,
    vector: Option<DocumentVector>,
    results: Option<SearchResults>,
    coordinates: Option<Coordinates>,
    warnings: Vec<String>,
}

impl QuerySession {
    pub fn new(identifier: impl Into<String>) -> Self {
        let now = Instant::now();
        Self {
            identifier: identifier.into(),
            stage: QueryStage::Start,
            trail: Vec::new(),
            started: now,
            stage_started: now,
            document: None,
            segments: Vec::new(),
            vector: None,
            results: None,
            coordinates: None,
            warnings: Vec::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn stage(&self) -> QueryStage {
        self.stage
    }

    pub fn trail(&self) -> &[StageTiming] {
        &self.trail
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn vector(&self) -> Option<&DocumentVector> {
        self.vector.as_ref()
    }

    fn close_stage(&mut self) {
        self.trail.push(StageTiming {
            stage: self.stage,
            elapsed: self.stage_started.elapsed(),
        });
        self.stage_started = Instant::now();
    }

    fn advance(&mut self, next: QueryStage) {
        debug_assert_eq!(self.stage.successor(), Some(next), "out-of-order stage");
        self.close_stage();
        debug!(
            identifier = %self.identifier,
            from = self.stage.name(),
            to = next.name(),
            "query.stage"
        );
        self.stage = next;
    }

    fn fail(&mut self, err: &QueryError) {
        if self.stage.is_terminal() {
            return;
        }
        let at = self.stage;
        self.close_stage();
        self.stage = QueryStage::Failed(err.kind());
        warn!(
            identifier = %self.identifier,
            stage = at.name(),
            kind = err.kind(),
            error = %err,
            elapsed_micros = self.started.elapsed().as_micros(),
            "query.failed"
        );
    }

    /// Drive the session to a terminal stage.
    ///
    /// The whole run is bounded by `deadline`. On expiry `cancel` is
    /// triggered, so a CPU stage already running on the blocking pool is the
    /// last one to execute.
    pub async fn run(
        &mut self,
        ctx: &Arc<QueryContext>,
        fetcher: &dyn DocumentFetcher,
        deadline: tokio::time::Instant,
        cancel: CancellationToken,
    ) -> Result<QueryResponse, QueryError> {
        let budget = deadline.saturating_duration_since(tokio::time::Instant::now());
        let outcome = tokio::time::timeout_at(deadline, self.pipeline(ctx, fetcher, &cancel)).await;
        let result = match outcome {
            Ok(result) => result,
            Err(_) => {
                cancel.cancel();
                Err(QueryError::Timeout(budget))
            }
        };
        match &result {
            Ok(_) => info!(
                identifier = %self.identifier,
                elapsed_micros = self.started.elapsed().as_micros(),
                warnings = self.warnings.len(),
                "query.done"
            ),
            Err(err) => self.fail(err),
        }
        result
    }

    async fn pipeline(
        &mut self,
        ctx: &Arc<QueryContext>,
        fetcher: &dyn DocumentFetcher,
        cancel: &CancellationToken,
    ) -> Result<QueryResponse, QueryError> {
        let checkpoint = |cancel: &CancellationToken| {
            if cancel.is_cancelled() {
                Err(QueryError::Cancelled)
            } else {
                Ok(())
            }
        };

        self.advance(QueryStage::Fetching);
        let doi = Doi::parse(&self.identifier)?;
        let document = tokio::select! {
            _ = cancel.cancelled() => return Err(QueryError::Cancelled),
            fetched = fetcher.fetch(&doi) => fetched?,
        };
        let content = document.content.clone();
        self.document = Some(document);

        checkpoint(cancel)?;
        self.advance(QueryStage::Extracting);
        let segments = {
            let ctx = Arc::clone(ctx);
            let token = cancel.clone();
            tokio::task::spawn_blocking(move || {
                checkpoint(&token)?;
                extract::extract(&content, ctx.extract_config()).map_err(QueryError::from)
            })
            .await??
        };
        debug!(identifier = %self.identifier, segments = segments.len(), "query.extracted");

        checkpoint(cancel)?;
        self.advance(QueryStage::Vectorizing);
        let (segments, vector) = {
            let ctx = Arc::clone(ctx);
            let token = cancel.clone();
            tokio::task::spawn_blocking(move || {
                checkpoint(&token)?;
                let (vector, stats) = ctx.vectorizer().vectorize_with_stats(segments.as_slice())?;
                debug!(
                    tokens = stats.tokens,
                    matched = stats.matched,
                    stop_words = stats.stop_words,
                    "query.vectorized"
                );
                Ok::<_, QueryError>((segments, vector))
            })
            .await??
        };
        self.segments = segments;

        checkpoint(cancel)?;
        self.advance(QueryStage::Searching);
        let (vector, results) = {
            let ctx = Arc::clone(ctx);
            let token = cancel.clone();
            tokio::task::spawn_blocking(move || {
                checkpoint(&token)?;
                let results = ctx.search().search(&vector)?;
                Ok::<_, QueryError>((vector, results))
            })
            .await??
        };
        self.results = Some(results);

        checkpoint(cancel)?;
        self.advance(QueryStage::Projecting);
        let (vector, projected) = {
            let ctx = Arc::clone(ctx);
            let token = cancel.clone();
            tokio::task::spawn_blocking(move || {
                checkpoint(&token)?;
                let projected = ctx.projector().project(vector.as_slice());
                Ok::<_, QueryError>((vector, projected))
            })
            .await??
        };
        self.vector = Some(vector);
        match projected {
            Ok(coordinates) => self.coordinates = Some(coordinates),
            Err(err) => self.projection_failed(ctx, err)?,
        }

        checkpoint(cancel)?;
        self.advance(QueryStage::Done);
        Ok(self.response())
    }

    fn projection_failed(
        &mut self,
        ctx: &QueryContext,
        err: ProjectionError,
    ) -> Result<(), QueryError> {
        if ctx.projection_required() {
            return Err(QueryError::ProjectionUnavailable(err));
        }
        warn!(identifier = %self.identifier, error = %err, "query.projection_degraded");
        self.warnings.push(format!("coordinates unavailable: {err}"));
        Ok(())
    }

    fn response(&mut self) -> QueryResponse {
        let results = self.results.take().unwrap_or_default();
        let (paper_info, xml_found) = match self.document.take() {
            Some(doc) => {
                let xml_found = doc.xml_found();
                (doc.metadata, xml_found)
            }
            None => (serde_json::Value::Null, false),
        };
        QueryResponse {
            paper_neighbors: results.paper_neighbors,
            journal_neighbors: results.journal_neighbors,
            coordinates: self.coordinates,
            paper_info,
            xml_found,
            warnings: std::mem::take(&mut self.warnings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_linear() {
        let mut stage = QueryStage::Start;
        let mut seen = vec![stage];
        while let Some(next) = stage.successor() {
            seen.push(next);
            stage = next;
        }
        assert_eq!(
            seen,
            vec![
                QueryStage::Start,
                QueryStage::Fetching,
                QueryStage::Extracting,
                QueryStage::Vectorizing,
                QueryStage::Searching,
                QueryStage::Projecting,
                QueryStage::Done,
            ]
        );
        assert!(QueryStage::Failed("timeout").is_terminal());
        assert_eq!(QueryStage::Failed("timeout").to_string(), "failed(timeout)");
    }

    #[test]
    fn failure_is_recorded_once() {
        let mut session = QuerySession::new("10.1101/x");
        session.advance(QueryStage::Fetching);
        session.fail(&QueryError::Cancelled);
        session.fail(&QueryError::Timeout(Duration::from_secs(1)));
        assert_eq!(session.stage(), QueryStage::Failed("cancelled"));
        let stages: Vec<QueryStage> = session.trail().iter().map(|t| t.stage).collect();
        assert_eq!(stages, vec![QueryStage::Start, QueryStage::Fetching]);
    }
}
