//! Memory-resident corpus tables.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use fxhash::FxHashMap;
use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::artifact::open_artifact;
use crate::error::CorpusError;

const IN_MEMORY: &str = "<memory>";

/// One indexed paper, as handed to [`PaperTable::from_records`].
#[derive(Debug, Clone, PartialEq)]
pub struct PaperRecord {
    pub document_id: String,
    pub journal: String,
    pub feature_vector: Vec<f32>,
}

/// Mean feature vector of every paper published in `journal`.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalCentroid {
    pub journal: String,
    pub feature_vector: Vec<f32>,
}

/// Borrowed view of a row in a [`PaperTable`].
#[derive(Debug, Clone, Copy)]
pub struct PaperView<'a> {
    pub document_id: &'a str,
    pub journal: &'a str,
    pub features: ArrayView1<'a, f32>,
}

/// Borrowed view of a row in a [`CentroidTable`].
#[derive(Debug, Clone, Copy)]
pub struct CentroidView<'a> {
    pub journal: &'a str,
    pub features: ArrayView1<'a, f32>,
}

/// Paper feature matrix keyed by document identifier.
#[derive(Debug, Clone)]
pub struct PaperTable {
    document_ids: Vec<String>,
    journals: Vec<String>,
    features: Array2<f32>,
    by_id: FxHashMap<String, usize>,
}

impl PaperTable {
    /// Parse the paper dataset. Row order in the file is preserved and defines
    /// tie-breaking order for neighbor search.
    pub fn load(
        path: &Path,
        document_column: &str,
        journal_column: &str,
        dimension: usize,
    ) -> Result<Self, CorpusError> {
        let reader = open_artifact(path)?;
        let parsed = parse_tsv(reader, path, &[document_column, journal_column], dimension)?;
        let mut keys = parsed.keys.into_iter();
        let document_ids = keys.next().unwrap_or_default();
        let journals = keys.next().unwrap_or_default();
        Self::assemble(path, document_ids, journals, parsed.features)
    }

    pub fn from_records(records: Vec<PaperRecord>, dimension: usize) -> Result<Self, CorpusError> {
        let path = Path::new(IN_MEMORY);
        let mut document_ids = Vec::with_capacity(records.len());
        let mut journals = Vec::with_capacity(records.len());
        let mut flat = Vec::with_capacity(records.len() * dimension);
        for record in records {
            check_vector(path, &record.feature_vector, dimension)?;
            document_ids.push(record.document_id);
            journals.push(record.journal);
            flat.extend_from_slice(&record.feature_vector);
        }
        let features = to_matrix(path, flat, document_ids.len(), dimension)?;
        Self::assemble(path, document_ids, journals, features)
    }

    fn assemble(
        path: &Path,
        document_ids: Vec<String>,
        journals: Vec<String>,
        features: Array2<f32>,
    ) -> Result<Self, CorpusError> {
        if document_ids.is_empty() {
            return Err(CorpusError::Empty(path.to_path_buf()));
        }
        let by_id = index_keys(path, &document_ids)?;
        Ok(Self {
            document_ids,
            journals,
            features,
            by_id,
        })
    }

    pub fn len(&self) -> usize {
        self.document_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document_ids.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.features.view()
    }

    pub fn row(&self, index: usize) -> Option<PaperView<'_>> {
        if index >= self.len() {
            return None;
        }
        Some(PaperView {
            document_id: &self.document_ids[index],
            journal: &self.journals[index],
            features: self.features.row(index),
        })
    }

    pub fn get(&self, document_id: &str) -> Option<PaperView<'_>> {
        self.by_id.get(document_id).and_then(|&idx| self.row(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = PaperView<'_>> + '_ {
        (0..self.len()).filter_map(move |idx| self.row(idx))
    }

    /// Number of distinct journals among the indexed papers.
    pub fn journal_count(&self) -> usize {
        let mut seen: Vec<&str> = self.journals.iter().map(String::as_str).collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }
}

/// Journal centroid matrix keyed by journal name.
#[derive(Debug, Clone)]
pub struct CentroidTable {
    journals: Vec<String>,
    features: Array2<f32>,
    by_journal: FxHashMap<String, usize>,
}

impl CentroidTable {
    pub fn load(path: &Path, journal_column: &str, dimension: usize) -> Result<Self, CorpusError> {
        let reader = open_artifact(path)?;
        let parsed = parse_tsv(reader, path, &[journal_column], dimension)?;
        let journals = parsed.keys.into_iter().next().unwrap_or_default();
        Self::assemble(path, journals, parsed.features)
    }

    pub fn from_records(
        records: Vec<JournalCentroid>,
        dimension: usize,
    ) -> Result<Self, CorpusError> {
        let path = Path::new(IN_MEMORY);
        let mut journals = Vec::with_capacity(records.len());
        let mut flat = Vec::with_capacity(records.len() * dimension);
        for record in records {
            check_vector(path, &record.feature_vector, dimension)?;
            journals.push(record.journal);
            flat.extend_from_slice(&record.feature_vector);
        }
        let features = to_matrix(path, flat, journals.len(), dimension)?;
        Self::assemble(path, journals, features)
    }

    fn assemble(
        path: &Path,
        journals: Vec<String>,
        features: Array2<f32>,
    ) -> Result<Self, CorpusError> {
        if journals.is_empty() {
            return Err(CorpusError::Empty(path.to_path_buf()));
        }
        let by_journal = index_keys(path, &journals)?;
        Ok(Self {
            journals,
            features,
            by_journal,
        })
    }

    pub fn len(&self) -> usize {
        self.journals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journals.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.features.view()
    }

    pub fn row(&self, index: usize) -> Option<CentroidView<'_>> {
        if index >= self.len() {
            return None;
        }
        Some(CentroidView {
            journal: &self.journals[index],
            features: self.features.row(index),
        })
    }

    pub fn get(&self, journal: &str) -> Option<CentroidView<'_>> {
        self.by_journal.get(journal).and_then(|&idx| self.row(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = CentroidView<'_>> + '_ {
        (0..self.len()).filter_map(move |idx| self.row(idx))
    }
}

struct ParsedTsv {
    /// One vector per requested key column, in request order.
    keys: Vec<Vec<String>>,
    features: Array2<f32>,
}

/// Parse a headered TSV where `key_columns` are string columns and every
/// other column is a feature. Feature column order follows the header.
fn parse_tsv<R: BufRead>(
    reader: R,
    path: &Path,
    key_columns: &[&str],
    dimension: usize,
) -> Result<ParsedTsv, CorpusError> {
    let malformed = |err: csv::Error| CorpusError::Malformed {
        path: path.to_path_buf(),
        message: err.to_string(),
    };

    let mut tsv = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let headers = tsv.headers().map_err(malformed)?.clone();
    let width = headers.len();

    let mut key_positions = Vec::with_capacity(key_columns.len());
    for column in key_columns {
        let pos = headers
            .iter()
            .position(|h| h.trim() == *column)
            .ok_or_else(|| CorpusError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            })?;
        key_positions.push(pos);
    }

    // pandas writes an unnamed leading index column; it is not a feature.
    let feature_positions: Vec<usize> = (0..width)
        .filter(|pos| !key_positions.contains(pos))
        .filter(|&pos| !(pos == 0 && headers[0].trim().is_empty()))
        .collect();
    if feature_positions.len() != dimension {
        return Err(CorpusError::DimensionMismatch {
            path: path.to_path_buf(),
            expected: dimension,
            found: feature_positions.len(),
        });
    }

    let mut keys: Vec<Vec<String>> = vec![Vec::new(); key_columns.len()];
    let mut flat: Vec<f32> = Vec::new();
    let mut record = csv::StringRecord::new();
    let mut rows = 0usize;

    while tsv.read_record(&mut record).map_err(malformed)? {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        // Blank trailing lines show up as single empty fields.
        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }
        if record.len() != width {
            return Err(CorpusError::RowWidth {
                path: path.to_path_buf(),
                line,
                expected: width,
                found: record.len(),
            });
        }
        for (slot, &pos) in keys.iter_mut().zip(key_positions.iter()) {
            slot.push(record[pos].trim().to_string());
        }
        for &pos in &feature_positions {
            let raw = record[pos].trim();
            let value = raw
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| CorpusError::InvalidValue {
                    path: path.to_path_buf(),
                    line,
                    column: headers[pos].to_string(),
                    value: raw.to_string(),
                })?;
            flat.push(value);
        }
        rows += 1;
    }

    let features = to_matrix(path, flat, rows, dimension)?;
    Ok(ParsedTsv { keys, features })
}

fn check_vector(path: &Path, vector: &[f32], dimension: usize) -> Result<(), CorpusError> {
    if vector.len() != dimension {
        return Err(CorpusError::DimensionMismatch {
            path: path.to_path_buf(),
            expected: dimension,
            found: vector.len(),
        });
    }
    if let Some(bad) = vector.iter().find(|v| !v.is_finite()) {
        return Err(CorpusError::InvalidValue {
            path: path.to_path_buf(),
            line: 0,
            column: "feature_vector".into(),
            value: bad.to_string(),
        });
    }
    Ok(())
}

fn to_matrix(
    path: &Path,
    flat: Vec<f32>,
    rows: usize,
    dimension: usize,
) -> Result<Array2<f32>, CorpusError> {
    Array2::from_shape_vec((rows, dimension), flat).map_err(|e| CorpusError::Malformed {
        path: PathBuf::from(path),
        message: e.to_string(),
    })
}

fn index_keys(path: &Path, keys: &[String]) -> Result<FxHashMap<String, usize>, CorpusError> {
    let mut map = FxHashMap::default();
    map.reserve(keys.len());
    for (idx, key) in keys.iter().enumerate() {
        if map.insert(key.clone(), idx).is_some() {
            return Err(CorpusError::DuplicateKey {
                path: path.to_path_buf(),
                key: key.clone(),
            });
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str, keys: &[&str], dim: usize) -> Result<ParsedTsv, CorpusError> {
        parse_tsv(Cursor::new(text.as_bytes().to_vec()), Path::new("t.tsv"), keys, dim)
    }

    #[test]
    fn parses_keys_and_features_in_header_order() {
        let text = "document\tjournal\tf0\tf1\nPMC1\tJ1\t1.0\t2.0\nPMC2\tJ2\t-0.5\t3e-1\n";
        let parsed = parse(text, &["document", "journal"], 2).unwrap();
        assert_eq!(parsed.keys[0], vec!["PMC1", "PMC2"]);
        assert_eq!(parsed.keys[1], vec!["J1", "J2"]);
        assert_eq!(parsed.features.shape(), &[2, 2]);
        assert_eq!(parsed.features[[1, 1]], 0.3);
    }

    #[test]
    fn key_column_may_sit_between_features() {
        let text = "f0\tjournal\tf1\n1\tJ1\t2\n";
        let parsed = parse(text, &["journal"], 2).unwrap();
        assert_eq!(parsed.features.row(0).to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn unnamed_leading_index_column_is_skipped() {
        let text = "\tjournal\tf0\n0\tJ1\t4.5\n";
        let parsed = parse(text, &["journal"], 1).unwrap();
        assert_eq!(parsed.features[[0, 0]], 4.5);
    }

    #[test]
    fn wrong_feature_count_is_rejected() {
        let text = "journal\tf0\tf1\nJ1\t1\t2\n";
        let err = parse(text, &["journal"], 3).err().unwrap();
        assert!(matches!(
            err,
            CorpusError::DimensionMismatch {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn ragged_row_is_rejected_with_line() {
        let text = "journal\tf0\tf1\nJ1\t1\t2\nJ2\t1\n";
        let err = parse(text, &["journal"], 2).err().unwrap();
        assert!(matches!(err, CorpusError::RowWidth { line: 3, .. }));
    }

    #[test]
    fn non_numeric_feature_is_rejected() {
        let text = "journal\tf0\nJ1\tNaN\n";
        let err = parse(text, &["journal"], 1).err().unwrap();
        assert!(matches!(err, CorpusError::InvalidValue { .. }));

        let text = "journal\tf0\nJ1\tabc\n";
        assert!(parse(text, &["journal"], 1).is_err());
    }

    #[test]
    fn missing_key_column_is_rejected() {
        let text = "name\tf0\nJ1\t1\n";
        let err = parse(text, &["journal"], 1).err().unwrap();
        assert!(matches!(err, CorpusError::MissingColumn { .. }));
    }

    #[test]
    fn duplicate_journal_is_rejected() {
        let records = vec![
            JournalCentroid {
                journal: "J1".into(),
                feature_vector: vec![0.0],
            },
            JournalCentroid {
                journal: "J1".into(),
                feature_vector: vec![1.0],
            },
        ];
        let err = CentroidTable::from_records(records, 1).err().unwrap();
        assert!(matches!(err, CorpusError::DuplicateKey { .. }));
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = PaperTable::from_records(Vec::new(), 3).err().unwrap();
        assert!(matches!(err, CorpusError::Empty(_)));
    }

    #[test]
    fn paper_lookup_by_id_and_row() {
        let table = PaperTable::from_records(
            vec![
                PaperRecord {
                    document_id: "PMC1".into(),
                    journal: "J1".into(),
                    feature_vector: vec![1.0, 0.0],
                },
                PaperRecord {
                    document_id: "PMC2".into(),
                    journal: "J1".into(),
                    feature_vector: vec![0.0, 1.0],
                },
            ],
            2,
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.dimension(), 2);
        assert_eq!(table.journal_count(), 1);
        let paper = table.get("PMC2").unwrap();
        assert_eq!(paper.journal, "J1");
        assert_eq!(paper.features.to_vec(), vec![0.0, 1.0]);
        assert!(table.row(2).is_none());
        assert_eq!(
            table.iter().map(|p| p.document_id).collect::<Vec<_>>(),
            vec!["PMC1", "PMC2"]
        );
    }

    #[test]
    fn record_vector_width_is_checked() {
        let err = CentroidTable::from_records(
            vec![JournalCentroid {
                journal: "J1".into(),
                feature_vector: vec![1.0],
            }],
            2,
        )
        .err()
        .unwrap();
        assert!(matches!(err, CorpusError::DimensionMismatch { .. }));
    }
}
