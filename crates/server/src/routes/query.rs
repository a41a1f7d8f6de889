use crate::error::ServerResult;
use crate::middleware::RequestId;
use crate::state::ServerState;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use journalrec::{run_query, QueryResponse};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// `GET /doi/{*doi}`
///
/// The wildcard keeps the `/` inside a DOI, so the path is the DOI itself:
/// `/doi/10.1101/2021.01.01.425000`.
///
/// Dropping the handler future (client gone, server shutting down) cancels
/// the query at its next stage boundary.
pub async fn query_doi(
    State(state): State<Arc<ServerState>>,
    request_id: Option<Extension<RequestId>>,
    Path(doi): Path<String>,
) -> ServerResult<Json<QueryResponse>> {
    let cancel = CancellationToken::new();
    let _on_drop = cancel.clone().drop_guard();
    let request_id = request_id.map(|Extension(id)| id.0).unwrap_or_default();

    let response = run_query(
        &state.context,
        state.fetcher.as_ref(),
        &doi,
        state.context.deadline(),
        cancel,
    )
    .instrument(tracing::info_span!("request", request_id = %request_id))
    .await?;
    Ok(Json(response))
}
