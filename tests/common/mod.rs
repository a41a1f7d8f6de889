//! Shared fixtures: a four-dimensional toy corpus and in-memory fetchers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use corpus::{CentroidTable, JournalCentroid, PaperRecord, PaperTable, ReferenceCorpora};
use index::{IndexConfig, NeighborSearch};
use journalrec::{
    Coordinates, Doi, DocumentContent, DocumentFetcher, FetchError, FetchedDocument,
    JournalRecConfig, ProjectionError, QueryContext, QueryOptions,
};
use projection::{Activation, DenseLayer, MlpProjector, Projector};
use serde_json::json;
use vectorize::{EmbeddingVocabulary, StopWords, VectorizeConfig, Vectorizer};

pub const DIM: usize = 4;
pub const GENETICS_DOI: &str = "10.1101/2024.01.01.000001";
pub const EMPTY_DOI: &str = "10.1101/2024.01.01.000002";
pub const PDF_DOI: &str = "10.1101/2024.01.01.000003";
pub const BROKEN_PDF_DOI: &str = "10.1101/2024.01.01.000004";

pub const GENETICS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<article>
  <front>
    <article-meta>
      <title-group><article-title>Ignored title</article-title></title-group>
      <abstract><p>Gene gene protein</p></abstract>
    </article-meta>
  </front>
  <body>
    <sec><title>The</title><p>the gene</p></sec>
  </body>
</article>"#;

pub const UNKNOWN_WORDS_XML: &str = r#"<article><body><sec>
  <p>zebra xylophone quartz</p>
</sec></body></article>"#;

pub fn vocabulary() -> EmbeddingVocabulary {
    EmbeddingVocabulary::from_entries(
        [
            ("gene", vec![1.0, 0.0, 0.0, 0.0]),
            ("protein", vec![0.0, 1.0, 0.0, 0.0]),
            ("neuron", vec![0.0, 0.0, 1.0, 0.0]),
            ("cortex", vec![0.0, 0.0, 0.0, 1.0]),
        ],
        DIM,
    )
    .expect("vocabulary")
}

pub fn papers() -> Vec<PaperRecord> {
    [
        ("PMC1", "Genetics", [1.0, 0.0, 0.0, 0.0]),
        ("PMC2", "Genetics", [0.9, 0.1, 0.0, 0.0]),
        ("PMC3", "Neuron", [0.0, 0.0, 1.0, 0.0]),
        ("PMC4", "Neuron", [0.0, 0.0, 0.5, 0.5]),
        ("PMC5", "Proteins", [0.0, 1.0, 0.0, 0.0]),
    ]
    .into_iter()
    .map(|(id, journal, v)| PaperRecord {
        document_id: id.into(),
        journal: journal.into(),
        feature_vector: v.to_vec(),
    })
    .collect()
}

pub fn centroids() -> Vec<JournalCentroid> {
    [
        ("Genetics", [1.0, 0.0, 0.0, 0.0]),
        ("Neuron", [0.0, 0.0, 0.75, 0.25]),
        ("Proteins", [0.0, 1.0, 0.0, 0.0]),
    ]
    .into_iter()
    .map(|(journal, v)| JournalCentroid {
        journal: journal.into(),
        feature_vector: v.to_vec(),
    })
    .collect()
}

/// Identity onto the first two axes.
pub fn identity_projector() -> MlpProjector {
    MlpProjector::from_layers(
        DIM,
        vec![DenseLayer {
            weights: vec![vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.0]],
            bias: vec![0.0, 0.0],
            activation: Activation::Linear,
        }],
    )
    .expect("projector")
}

/// A projector whose model is permanently unavailable.
pub struct OfflineProjector;

impl Projector for OfflineProjector {
    fn input_dim(&self) -> usize {
        DIM
    }

    fn project(&self, _vector: &[f32]) -> Result<Coordinates, ProjectionError> {
        Err(ProjectionError::Unavailable("model offline".into()))
    }
}

/// A projector that blocks its thread before answering.
pub struct SlowProjector {
    pub delay: std::time::Duration,
    pub calls: AtomicUsize,
}

impl SlowProjector {
    pub fn new(delay: std::time::Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Projector for SlowProjector {
    fn input_dim(&self) -> usize {
        DIM
    }

    fn project(&self, _vector: &[f32]) -> Result<Coordinates, ProjectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        Ok(Coordinates { dim1: 0.0, dim2: 0.0 })
    }
}

pub fn context_with(projector: Arc<dyn Projector>, options: QueryOptions) -> Arc<QueryContext> {
    let corpora = ReferenceCorpora::new(
        PaperTable::from_records(papers(), DIM).expect("papers"),
        CentroidTable::from_records(centroids(), DIM).expect("centroids"),
    )
    .expect("corpora");
    let search = NeighborSearch::build(corpora, &IndexConfig::default()).expect("index");
    let vectorizer = Vectorizer::new(
        vocabulary(),
        StopWords::english(),
        VectorizeConfig::default().with_dimension(DIM),
    )
    .expect("vectorizer");
    Arc::new(QueryContext::new(search, vectorizer, projector, options).expect("context"))
}

pub fn context() -> Arc<QueryContext> {
    context_with(Arc::new(identity_projector()), QueryOptions::default())
}

/// Minimal single-page PDF with one text line.
pub fn pdf_with_text(text: &str) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("save pdf");
    out
}

/// Serves canned documents and counts calls.
#[derive(Default)]
pub struct StaticFetcher {
    documents: HashMap<String, FetchedDocument>,
    pub calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn with_fixtures() -> Self {
        let mut fetcher = Self::default();
        fetcher.insert_xml(GENETICS_DOI, GENETICS_XML, "Gene regulation in toy cells");
        fetcher.insert_xml(EMPTY_DOI, UNKNOWN_WORDS_XML, "Unrelated words");
        fetcher.insert(
            PDF_DOI,
            DocumentContent::Unstructured(Bytes::from(pdf_with_text("neuron cortex neuron"))),
            "Cortical neurons",
        );
        fetcher.insert(
            BROKEN_PDF_DOI,
            DocumentContent::Unstructured(Bytes::from_static(b"<html>not a pdf</html>")),
            "Broken download",
        );
        fetcher
    }

    pub fn insert_xml(&mut self, doi: &str, xml: &str, title: &str) {
        self.insert(
            doi,
            DocumentContent::Structured(Bytes::from(xml.to_string())),
            title,
        );
    }

    pub fn insert(&mut self, doi: &str, content: DocumentContent, title: &str) {
        self.documents.insert(
            doi.to_string(),
            FetchedDocument {
                content,
                metadata: json!({"doi": doi, "title": title, "version": "1"}),
            },
        );
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for StaticFetcher {
    async fn fetch(&self, doi: &Doi) -> Result<FetchedDocument, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.documents
            .get(doi.as_str())
            .cloned()
            .ok_or_else(|| FetchError::NotFound(doi.to_string()))
    }
}

/// Never answers.
pub struct StalledFetcher;

#[async_trait]
impl DocumentFetcher for StalledFetcher {
    async fn fetch(&self, _doi: &Doi) -> Result<FetchedDocument, FetchError> {
        std::future::pending().await
    }
}

/// Write every artifact a deployment needs into `dir` and return a config
/// pointing at them.
pub fn write_artifacts(dir: &Path) -> JournalRecConfig {
    let header: String = (0..DIM).map(|i| format!("\t{i}")).collect();

    let mut paper_tsv = format!("document\tjournal{header}\n");
    for record in papers() {
        write!(paper_tsv, "{}\t{}", record.document_id, record.journal).unwrap();
        for v in &record.feature_vector {
            write!(paper_tsv, "\t{v}").unwrap();
        }
        paper_tsv.push('\n');
    }
    let paper_path = dir.join("paper_dataset.tsv.xz");
    let mut enc = xz2::write::XzEncoder::new(std::fs::File::create(&paper_path).unwrap(), 6);
    enc.write_all(paper_tsv.as_bytes()).unwrap();
    enc.finish().unwrap();

    let mut centroid_tsv = format!("journal{header}\n");
    for centroid in centroids() {
        centroid_tsv.push_str(&centroid.journal);
        for v in &centroid.feature_vector {
            write!(centroid_tsv, "\t{v}").unwrap();
        }
        centroid_tsv.push('\n');
    }
    let centroid_path = dir.join("centroid_dataset.tsv");
    std::fs::write(&centroid_path, centroid_tsv).unwrap();

    let vocabulary_path = dir.join("word_model.wv.txt");
    std::fs::write(
        &vocabulary_path,
        "4 4\ngene 1 0 0 0\nprotein 0 1 0 0\nneuron 0 0 1 0\ncortex 0 0 0 1\n",
    )
    .unwrap();

    let model_path = dir.join("projection.json");
    std::fs::write(
        &model_path,
        json!({
            "input_dim": DIM,
            "layers": [{
                "weights": [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]],
                "bias": [0.0, 0.0],
                "activation": "linear"
            }]
        })
        .to_string(),
    )
    .unwrap();

    let yaml = format!(
        r#"version: "1"
corpus:
  paper_path: {papers}
  centroid_path: {centroids}
  dimension: {DIM}
vocabulary:
  path: {vocabulary}
vectorize:
  dimension: {DIM}
projection:
  model_path: {model}
query:
  timeout_secs: 30
"#,
        papers = paper_path.display(),
        centroids = centroid_path.display(),
        vocabulary = vocabulary_path.display(),
        model = model_path.display(),
    );
    JournalRecConfig::from_yaml(&yaml).expect("fixture config")
}
