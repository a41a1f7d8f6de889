//! journalrec-server - HTTP API for journal recommendations
//!
//! Serves the journalrec pipeline over HTTP: a DOI in the path, the neighbor
//! papers, neighbor journals and 2D coordinates back as JSON.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /doi/{doi}` - Recommendations for one preprint
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe with corpus sizes
//! - `GET /metrics` - Prometheus metrics
//!
//! Errors are returned as `{"error": {"code": "...", "message": "..."}}`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ErrorResponse, ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
