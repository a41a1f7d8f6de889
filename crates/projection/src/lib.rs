//! 2D projection of document vectors for the landscape visualization.
//!
//! The trained encoder is an opaque artifact behind the [`Projector`] trait.
//! [`MlpProjector`] evaluates a dense feed-forward network exported as JSON:
//!
//! ```json
//! {
//!   "input_dim": 300,
//!   "layers": [
//!     { "weights": [[...300 values...], ...], "bias": [...], "activation": "leaky_relu" },
//!     { "weights": [[...], [...]], "bias": [0.0, 0.0], "activation": "linear" }
//!   ]
//! }
//! ```
//!
//! `weights` is row-major with one row per output unit. The last layer must
//! have exactly two outputs. A model that fails these checks is rejected at
//! load time; a query vector the model cannot handle yields
//! [`ProjectionError::Unavailable`].

mod config;
mod mlp;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::config::ProjectionConfig;
pub use crate::mlp::{Activation, DenseLayer, MlpProjector, LEAKY_RELU_SLOPE};

/// Position of a document in the 2D visualization space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub dim1: f64,
    pub dim2: f64,
}

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("projection model {} not found", .0.display())]
    NotFound(PathBuf),
    #[error("failed to load projection model {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },
    #[error("projection unavailable: {0}")]
    Unavailable(String),
}

impl ProjectionError {
    /// True for errors raised while answering a query rather than at load.
    pub fn is_inference(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Maps a document vector into 2D.
pub trait Projector: Send + Sync {
    fn input_dim(&self) -> usize;

    fn project(&self, vector: &[f32]) -> Result<Coordinates, ProjectionError>;
}

impl<P: Projector + ?Sized> Projector for std::sync::Arc<P> {
    fn input_dim(&self) -> usize {
        (**self).input_dim()
    }

    fn project(&self, vector: &[f32]) -> Result<Coordinates, ProjectionError> {
        (**self).project(vector)
    }
}

impl<P: Projector + ?Sized> Projector for Box<P> {
    fn input_dim(&self) -> usize {
        (**self).input_dim()
    }

    fn project(&self, vector: &[f32]) -> Result<Coordinates, ProjectionError> {
        (**self).project(vector)
    }
}
