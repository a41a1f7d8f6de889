mod common;

use std::sync::Arc;

use common::*;
use journalrec::{QueryContext, QuerySession, QueryStage, run_query};
use tokio_util::sync::CancellationToken;

fn ids(response: &journalrec::QueryResponse) -> Vec<&str> {
    response
        .paper_neighbors
        .iter()
        .map(|n| n.document_id.as_str())
        .collect()
}

#[tokio::test]
async fn xml_preprint_end_to_end() {
    let ctx = context();
    let fetcher = StaticFetcher::with_fixtures();

    let response = run_query(
        &ctx,
        &fetcher,
        GENETICS_DOI,
        ctx.deadline(),
        CancellationToken::new(),
    )
    .await
    .expect("query succeeds");

    assert!(response.xml_found);
    assert_eq!(ids(&response), vec!["PMC2", "PMC1", "PMC4", "PMC5", "PMC3"]);
    let distances: Vec<f64> = response.paper_neighbors.iter().map(|n| n.distance).collect();
    assert_eq!(distances, vec![0.212, 0.354, 1.061, 1.061, 1.275]);

    let journals: Vec<(&str, f64)> = response
        .journal_neighbors
        .iter()
        .map(|n| (n.journal.as_str(), n.distance))
        .collect();
    assert_eq!(
        journals,
        vec![("Genetics", 0.354), ("Proteins", 1.061), ("Neuron", 1.118)]
    );
    for neighbor in &response.journal_neighbors {
        assert_eq!(neighbor.document.as_deref(), Some(neighbor.journal.as_str()));
    }

    let coordinates = response.coordinates.expect("coordinates");
    assert_eq!((coordinates.dim1, coordinates.dim2), (0.75, 0.25));
    assert_eq!(response.paper_info["title"], "Gene regulation in toy cells");
    assert!(response.warnings.is_empty());
}

#[tokio::test]
async fn pdf_fallback_when_no_xml() {
    let ctx = context();
    let fetcher = StaticFetcher::with_fixtures();

    let response = run_query(&ctx, &fetcher, PDF_DOI, ctx.deadline(), CancellationToken::new())
        .await
        .expect("query succeeds");

    assert!(!response.xml_found);
    assert_eq!(response.paper_neighbors[0].journal, "Neuron");
    assert_eq!(response.journal_neighbors[0].journal, "Neuron");
}

#[tokio::test]
async fn doi_url_prefix_is_accepted() {
    let ctx = context();
    let fetcher = StaticFetcher::with_fixtures();
    let url = format!("https://doi.org/{GENETICS_DOI}");

    let response = run_query(&ctx, &fetcher, &url, ctx.deadline(), CancellationToken::new())
        .await
        .expect("query succeeds");
    assert_eq!(response.paper_neighbors[0].document_id, "PMC2");
}

#[tokio::test]
async fn session_walks_every_stage() {
    let ctx = context();
    let fetcher = StaticFetcher::with_fixtures();
    let mut session = QuerySession::new(GENETICS_DOI);

    session
        .run(&ctx, &fetcher, ctx.deadline(), CancellationToken::new())
        .await
        .expect("query succeeds");

    assert_eq!(session.stage(), QueryStage::Done);
    let stages: Vec<QueryStage> = session.trail().iter().map(|t| t.stage).collect();
    assert_eq!(
        stages,
        vec![
            QueryStage::Start,
            QueryStage::Fetching,
            QueryStage::Extracting,
            QueryStage::Vectorizing,
            QueryStage::Searching,
            QueryStage::Projecting,
        ]
    );
    assert_eq!(session.segments(), ["Gene gene protein", "The", "the gene"]);
    assert_eq!(
        session.vector().map(|v| v.as_slice().to_vec()),
        Some(vec![0.75, 0.25, 0.0, 0.0])
    );
}

#[tokio::test]
async fn context_loads_from_artifacts_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_artifacts(dir.path());

    let ctx = Arc::new(QueryContext::load(&cfg).expect("context loads"));
    let stats = ctx.stats();
    assert_eq!(stats.papers, 5);
    assert_eq!(stats.journals, 3);
    assert_eq!(stats.vocabulary, 4);
    assert_eq!(stats.dimension, DIM);
    assert_eq!(stats.n_neighbors, 10);
    assert_eq!(ctx.timeout().as_secs(), 30);

    let fetcher = StaticFetcher::with_fixtures();
    let cancel = CancellationToken::new();
    let from_disk = run_query(&ctx, &fetcher, GENETICS_DOI, ctx.deadline(), cancel)
        .await
        .expect("query succeeds");
    let in_memory = run_query(
        &context(),
        &fetcher,
        GENETICS_DOI,
        ctx.deadline(),
        CancellationToken::new(),
    )
    .await
    .expect("query succeeds");
    assert_eq!(from_disk, in_memory);
}

#[test]
fn missing_artifact_stops_startup() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = write_artifacts(dir.path());
    cfg.projection.model_path = dir.path().join("absent.json");

    let err = QueryContext::load(&cfg).unwrap_err();
    assert!(
        matches!(err, journalrec::StartupError::Projection(_)),
        "{err}"
    );
}
