//! Document vectorization by mean-pooled word embeddings.
//!
//! Each text segment is split into UAX #29 words, stop words and
//! out-of-vocabulary tokens are dropped, and the embeddings of every surviving
//! token across all segments are averaged into one [`DocumentVector`].
//!
//! Pooling sums in `f64` in segment order then token order and divides once,
//! so the same segments always yield the same bits regardless of how many
//! threads tokenized them. A document with no surviving token is
//! [`VectorizeError::NoVectorizableContent`], never a NaN vector.
//!
//! ```
//! use vectorize::{EmbeddingVocabulary, StopWords, VectorizeConfig, Vectorizer};
//!
//! let vocab = EmbeddingVocabulary::from_entries(
//!     [("cell", vec![1.0, 0.0]), ("gene", vec![0.0, 1.0])],
//!     2,
//! )
//! .unwrap();
//! let vectorizer = Vectorizer::new(
//!     vocab,
//!     StopWords::english(),
//!     VectorizeConfig::default().with_dimension(2),
//! )
//! .unwrap();
//! let v = vectorizer.vectorize(&["The cell and the gene"]).unwrap();
//! assert_eq!(v.as_slice(), &[0.5, 0.5]);
//! ```

mod config;
mod error;
mod stopwords;
mod token;
mod vector;
mod vocabulary;

use rayon::prelude::*;
use tracing::debug;

pub use crate::config::{VectorizeConfig, VocabularyConfig};
pub use crate::error::VectorizeError;
pub use crate::stopwords::StopWords;
pub use crate::token::tokenize;
pub use crate::vector::DocumentVector;
pub use crate::vocabulary::EmbeddingVocabulary;

/// Counters from one [`Vectorizer::vectorize_with_stats`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VectorizeStats {
    pub segments: usize,
    pub tokens: usize,
    pub stop_words: usize,
    pub matched: usize,
}

/// Immutable vectorizer. Share behind `Arc` across queries.
#[derive(Debug, Clone)]
pub struct Vectorizer {
    vocabulary: EmbeddingVocabulary,
    stop_words: StopWords,
    cfg: VectorizeConfig,
}

impl Vectorizer {
    pub fn new(
        vocabulary: EmbeddingVocabulary,
        stop_words: StopWords,
        cfg: VectorizeConfig,
    ) -> Result<Self, VectorizeError> {
        cfg.validate()?;
        if vocabulary.dimension() != cfg.dimension {
            return Err(VectorizeError::DimensionMismatch {
                expected: cfg.dimension,
                found: vocabulary.dimension(),
            });
        }
        Ok(Self {
            vocabulary,
            stop_words,
            cfg,
        })
    }

    /// Load the vocabulary and stop words named by the configs.
    pub fn load(
        vocabulary: &VocabularyConfig,
        cfg: VectorizeConfig,
    ) -> Result<Self, VectorizeError> {
        cfg.validate()?;
        let stop_words = match &cfg.stop_words_path {
            Some(path) => StopWords::load(path)?,
            None => StopWords::english(),
        };
        let vocab = EmbeddingVocabulary::load(&vocabulary.path, cfg.dimension)?;
        Self::new(vocab, stop_words, cfg)
    }

    pub fn vocabulary(&self) -> &EmbeddingVocabulary {
        &self.vocabulary
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    pub fn config(&self) -> &VectorizeConfig {
        &self.cfg
    }

    pub fn dimension(&self) -> usize {
        self.cfg.dimension
    }

    pub fn vectorize<S: AsRef<str> + Sync>(
        &self,
        segments: &[S],
    ) -> Result<DocumentVector, VectorizeError> {
        self.vectorize_with_stats(segments).map(|(v, _)| v)
    }

    pub fn vectorize_with_stats<S: AsRef<str> + Sync>(
        &self,
        segments: &[S],
    ) -> Result<(DocumentVector, VectorizeStats), VectorizeError> {
        let per_segment: Vec<SegmentMatches> = if self.cfg.use_parallel && segments.len() > 1 {
            segments
                .par_iter()
                .map(|s| self.match_segment(s.as_ref()))
                .collect()
        } else {
            segments
                .iter()
                .map(|s| self.match_segment(s.as_ref()))
                .collect()
        };

        let mut stats = VectorizeStats {
            segments: segments.len(),
            ..Default::default()
        };
        let dim = self.cfg.dimension;
        let mut sum = vec![0f64; dim];
        for seg in &per_segment {
            stats.tokens += seg.tokens;
            stats.stop_words += seg.stop_words;
            stats.matched += seg.rows.len();
            for &row in &seg.rows {
                for (acc, &x) in sum.iter_mut().zip(self.vocabulary.row(row).iter()) {
                    *acc += f64::from(x);
                }
            }
        }

        if stats.matched == 0 {
            debug!(
                segments = stats.segments,
                tokens = stats.tokens,
                "vectorize.no_matches"
            );
            return Err(VectorizeError::NoVectorizableContent);
        }

        let n = stats.matched as f64;
        let mean: Vec<f32> = sum.into_iter().map(|s| (s / n) as f32).collect();
        let vector = DocumentVector::new(mean, dim)?;
        debug!(
            segments = stats.segments,
            tokens = stats.tokens,
            stop_words = stats.stop_words,
            matched = stats.matched,
            "vectorize.pooled"
        );
        Ok((vector, stats))
    }

    fn match_segment(&self, text: &str) -> SegmentMatches {
        let mut out = SegmentMatches::default();
        for token in tokenize(text, self.cfg.lowercase, self.cfg.normalize_unicode) {
            out.tokens += 1;
            if self.stop_words.contains(&token) {
                out.stop_words += 1;
                continue;
            }
            if let Some(row) = self.vocabulary.row_of(&token) {
                out.rows.push(row);
            }
        }
        out
    }
}

#[derive(Debug, Default)]
struct SegmentMatches {
    tokens: usize,
    stop_words: usize,
    rows: Vec<u32>,
}
