use serde::{Deserialize, Serialize};

use crate::error::VectorizeError;

/// Fixed-length semantic summary of a document.
///
/// Construction checks dimensionality and finiteness, so every value of this
/// type can be handed to neighbor search or projection as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentVector(Vec<f32>);

impl DocumentVector {
    pub fn new(values: Vec<f32>, expected_dimension: usize) -> Result<Self, VectorizeError> {
        if values.len() != expected_dimension {
            return Err(VectorizeError::DimensionMismatch {
                expected: expected_dimension,
                found: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(VectorizeError::NonFinite);
        }
        Ok(Self(values))
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl AsRef<[f32]> for DocumentVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}
