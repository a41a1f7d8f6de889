use index::{JournalNeighbor, PaperNeighbor};
use projection::Coordinates;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The JSON body returned for a successful query.
///
/// ```json
/// {
///   "paper_neighbors":   [{"distance": 0.812, "journal": "eLife", "pmcid": "PMC6000001"}],
///   "journal_neighbors": [{"distance": 0.530, "journal": "eLife", "document": "eLife"}],
///   "coordinates":       {"dim1": -1.25, "dim2": 0.4},
///   "paper_info":        {"doi": "10.1101/...", "title": "..."},
///   "xml_found":         true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub paper_neighbors: Vec<PaperNeighbor>,
    pub journal_neighbors: Vec<JournalNeighbor>,
    /// `null` when projection failed and was not required.
    pub coordinates: Option<Coordinates>,
    pub paper_info: Value,
    pub xml_found: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_wire_field_names() {
        let response = QueryResponse {
            paper_neighbors: vec![PaperNeighbor {
                distance: 0.5,
                journal: "eLife".into(),
                document_id: "PMC1".into(),
            }],
            journal_neighbors: vec![JournalNeighbor {
                distance: 0.25,
                journal: "eLife".into(),
                document: Some("eLife".into()),
            }],
            coordinates: None,
            paper_info: json!({"title": "t"}),
            xml_found: false,
            warnings: Vec::new(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "paper_neighbors": [{"distance": 0.5, "journal": "eLife", "pmcid": "PMC1"}],
                "journal_neighbors": [{"distance": 0.25, "journal": "eLife", "document": "eLife"}],
                "coordinates": null,
                "paper_info": {"title": "t"},
                "xml_found": false
            })
        );
    }
}
