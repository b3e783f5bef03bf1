//! Model abstraction for the proof pipeline.
//!
//! The pipeline does not train or run real models; it only needs a scalar
//! prediction to bind into proof statements, plus a content hash of the
//! model's parameters. [`Model`] is the seam where a real inference
//! engine plugs in.

use crate::hdag::Vector;
use crate::types::ModelHash;

/// A scalar-prediction model with content-addressed parameters.
///
/// Implementations must be deterministic: the same input yields the same
/// prediction, and `params_hash` only changes when the parameters do.
pub trait Model: Send + Sync {
    /// Digest of the model's parameters.
    fn params_hash(&self) -> ModelHash;

    /// Produces a scalar prediction for the input vector.
    fn predict(&self, input: &Vector) -> f32;
}

/// Placeholder model: mean of the positive input components.
///
/// Parameter-free, so its hash is a fixed tag. Mirrors what the demo
/// pipeline needs from a model: a cheap, deterministic scalar output.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeanPositive;

impl Model for MeanPositive {
    fn params_hash(&self) -> ModelHash {
        ModelHash::from_params(b"mean-positive-v1")
    }

    fn predict(&self, input: &Vector) -> f32 {
        if input.is_empty() {
            return 0.0;
        }
        let sum: f32 = input.as_slice().iter().map(|v| v.max(0.0)).sum();
        sum / input.len() as f32
    }
}
