use crate::config::ServerConfig;
use crate::error::ServerResult;
use journalrec::{BiorxivFetcher, DocumentFetcher, JournalRecConfig, QueryContext};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Corpora, vocabulary and projection model (shared across requests)
    pub context: Arc<QueryContext>,

    /// Document source for `/doi/...` queries
    pub fetcher: Arc<dyn DocumentFetcher>,

    /// Prometheus renderer, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,

    pub started: Instant,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        context: Arc<QueryContext>,
        fetcher: Arc<dyn DocumentFetcher>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            context,
            fetcher,
            metrics: None,
            started: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Load the pipeline named by `config.pipeline_config_path` and a bioRxiv
    /// fetcher. Blocks while the corpora are read.
    pub fn load(config: ServerConfig) -> ServerResult<Self> {
        let pipeline = JournalRecConfig::from_file(&config.pipeline_config_path)
            .map_err(journalrec::StartupError::from)?;
        let context = Arc::new(QueryContext::load(&pipeline)?);
        let fetcher = BiorxivFetcher::new(&pipeline.fetch)
            .map_err(|e| crate::error::ServerError::Config(e.to_string()))?;
        Ok(Self::new(config, context, Arc::new(fetcher)))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
