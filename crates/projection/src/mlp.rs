use std::path::Path;
use std::time::Instant;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Coordinates, ProjectionError, Projector};

/// Negative-side slope of [`Activation::LeakyRelu`].
pub const LEAKY_RELU_SLOPE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Linear,
    Relu,
    LeakyRelu,
    Tanh,
    Sigmoid,
}

impl Activation {
    fn apply(self, x: f32) -> f32 {
        match self {
            Self::Linear => x,
            Self::Relu => x.max(0.0),
            Self::LeakyRelu => {
                if x >= 0.0 {
                    x
                } else {
                    LEAKY_RELU_SLOPE * x
                }
            }
            Self::Tanh => x.tanh(),
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        }
    }
}

/// Serialized form of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    pub activation: Activation,
}

#[derive(Debug, Deserialize)]
struct ModelFile {
    input_dim: usize,
    layers: Vec<DenseLayer>,
}

#[derive(Debug, Clone)]
struct Layer {
    weights: Array2<f32>,
    bias: Array1<f32>,
    activation: Activation,
}

/// Dense feed-forward encoder, evaluated in `f32`.
#[derive(Debug, Clone)]
pub struct MlpProjector {
    input_dim: usize,
    layers: Vec<Layer>,
}

impl MlpProjector {
    pub fn load(path: &Path) -> Result<Self, ProjectionError> {
        let start = Instant::now();
        let raw = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ProjectionError::NotFound(path.to_path_buf()),
            _ => ProjectionError::Load {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;
        let file: ModelFile = serde_json::from_slice(&raw).map_err(|e| ProjectionError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let model = Self::from_layers(file.input_dim, file.layers).map_err(|e| match e {
            ProjectionError::Load { reason, .. } => ProjectionError::Load {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;
        info!(
            path = %path.display(),
            input_dim = model.input_dim,
            layers = model.layers.len(),
            elapsed_micros = start.elapsed().as_micros(),
            "projection.loaded"
        );
        Ok(model)
    }

    pub fn from_layers(input_dim: usize, layers: Vec<DenseLayer>) -> Result<Self, ProjectionError> {
        let invalid = |reason: String| ProjectionError::Load {
            path: "<memory>".into(),
            reason,
        };
        if input_dim == 0 {
            return Err(invalid("input_dim must be > 0".into()));
        }
        if layers.is_empty() {
            return Err(invalid("model has no layers".into()));
        }

        let mut width = input_dim;
        let mut built = Vec::with_capacity(layers.len());
        for (idx, layer) in layers.into_iter().enumerate() {
            let outputs = layer.weights.len();
            if outputs == 0 {
                return Err(invalid(format!("layer {idx} has no outputs")));
            }
            if layer.bias.len() != outputs {
                return Err(invalid(format!(
                    "layer {idx}: bias has {} entries for {outputs} outputs",
                    layer.bias.len()
                )));
            }
            if let Some(row) = layer.weights.iter().position(|r| r.len() != width) {
                return Err(invalid(format!(
                    "layer {idx}: weight row {row} has {} inputs, expected {width}",
                    layer.weights[row].len()
                )));
            }
            let flat: Vec<f32> = layer.weights.into_iter().flatten().collect();
            if flat.iter().chain(layer.bias.iter()).any(|v| !v.is_finite()) {
                return Err(invalid(format!("layer {idx} has non-finite parameters")));
            }
            let weights = Array2::from_shape_vec((outputs, width), flat)
                .map_err(|e| invalid(e.to_string()))?;
            built.push(Layer {
                weights,
                bias: Array1::from(layer.bias),
                activation: layer.activation,
            });
            width = outputs;
        }
        if width != 2 {
            return Err(invalid(format!("final layer has {width} outputs, expected 2")));
        }

        Ok(Self {
            input_dim,
            layers: built,
        })
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

impl Projector for MlpProjector {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn project(&self, vector: &[f32]) -> Result<Coordinates, ProjectionError> {
        if vector.len() != self.input_dim {
            return Err(ProjectionError::Unavailable(format!(
                "vector has {} dimensions, model expects {}",
                vector.len(),
                self.input_dim
            )));
        }
        let mut x = Array1::from(vector.to_vec());
        for layer in &self.layers {
            let activation = layer.activation;
            x = (layer.weights.dot(&x) + &layer.bias).mapv_into(|v| activation.apply(v));
        }
        let (dim1, dim2) = (f64::from(x[0]), f64::from(x[1]));
        if !dim1.is_finite() || !dim2.is_finite() {
            return Err(ProjectionError::Unavailable("non-finite output".into()));
        }
        Ok(Coordinates { dim1, dim2 })
    }
}
