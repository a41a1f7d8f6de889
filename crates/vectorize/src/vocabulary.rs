//! Pretrained word-embedding table.
//!
//! The artifact is the word2vec text format: an optional `<count> <dim>`
//! header line, then one `word v1 ... vdim` line per entry. Compressed files
//! are handled by extension.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Instant;

use fxhash::FxHashMap;
use ndarray::{Array2, ArrayView1};
use tracing::{info, warn};

use crate::error::VectorizeError;

/// Read-only mapping from token to embedding row.
#[derive(Debug, Clone)]
pub struct EmbeddingVocabulary {
    rows: FxHashMap<String, u32>,
    vectors: Array2<f32>,
}

impl EmbeddingVocabulary {
    pub fn load(path: &Path, dimension: usize) -> Result<Self, VectorizeError> {
        let start = Instant::now();
        let reader = corpus::open_artifact(path)?;
        let vocab = Self::from_reader(reader, path, dimension)?;
        info!(
            path = %path.display(),
            words = vocab.len(),
            dimension,
            elapsed_micros = start.elapsed().as_micros(),
            "vocabulary.loaded"
        );
        Ok(vocab)
    }

    fn from_reader<R: BufRead>(
        reader: R,
        path: &Path,
        dimension: usize,
    ) -> Result<Self, VectorizeError> {
        if dimension == 0 {
            return Err(VectorizeError::InvalidConfig("dimension must be > 0".into()));
        }
        let malformed = |line: usize, message: String| VectorizeError::MalformedVocabulary {
            path: PathBuf::from(path),
            line,
            message,
        };

        let mut rows = FxHashMap::default();
        let mut flat: Vec<f32> = Vec::new();
        let mut duplicates = 0usize;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|source| VectorizeError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };
            let values: Vec<&str> = fields.collect();

            if line_no == 1 && values.len() == 1 && is_header(word, values[0]) {
                let declared: usize = values[0].parse().unwrap_or(0);
                if declared != dimension {
                    return Err(malformed(
                        line_no,
                        format!("header declares dimension {declared}, expected {dimension}"),
                    ));
                }
                continue;
            }

            if values.len() != dimension {
                return Err(malformed(
                    line_no,
                    format!("expected {dimension} values, found {}", values.len()),
                ));
            }
            if rows.contains_key(word) {
                duplicates += 1;
                continue;
            }
            for raw in values {
                let value = raw
                    .parse::<f32>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| malformed(line_no, format!("`{raw}` is not a finite number")))?;
                flat.push(value);
            }
            let row = u32::try_from(rows.len())
                .map_err(|_| malformed(line_no, "vocabulary exceeds u32 rows".into()))?;
            rows.insert(word.to_string(), row);
        }

        if rows.is_empty() {
            return Err(VectorizeError::EmptyVocabulary(path.to_path_buf()));
        }
        if duplicates > 0 {
            warn!(path = %path.display(), duplicates, "vocabulary.duplicate_words_skipped");
        }

        let vectors = Array2::from_shape_vec((rows.len(), dimension), flat)
            .map_err(|e| malformed(0, e.to_string()))?;
        Ok(Self { rows, vectors })
    }

    /// Build from in-memory entries. Later duplicates are ignored.
    pub fn from_entries<I, S>(entries: I, dimension: usize) -> Result<Self, VectorizeError>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut rows = FxHashMap::default();
        let mut flat = Vec::new();
        for (word, vector) in entries {
            if vector.len() != dimension {
                return Err(VectorizeError::DimensionMismatch {
                    expected: dimension,
                    found: vector.len(),
                });
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(VectorizeError::NonFinite);
            }
            let word = word.into();
            if rows.contains_key(&word) {
                continue;
            }
            rows.insert(word, rows.len() as u32);
            flat.extend(vector);
        }
        if rows.is_empty() {
            return Err(VectorizeError::EmptyVocabulary(PathBuf::from("<memory>")));
        }
        let vectors = Array2::from_shape_vec((rows.len(), dimension), flat)
            .map_err(|e| VectorizeError::InvalidConfig(e.to_string()))?;
        Ok(Self { rows, vectors })
    }

    pub fn row_of(&self, word: &str) -> Option<u32> {
        self.rows.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.rows.contains_key(word)
    }

    pub fn get(&self, word: &str) -> Option<ArrayView1<'_, f32>> {
        self.row_of(word).map(|row| self.vectors.row(row as usize))
    }

    pub(crate) fn row(&self, row: u32) -> ArrayView1<'_, f32> {
        self.vectors.row(row as usize)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }
}

fn is_header(first: &str, second: &str) -> bool {
    first.parse::<usize>().is_ok() && second.parse::<usize>().is_ok()
}
