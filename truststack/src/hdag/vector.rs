//! Fixed-length float vector container.
//!
//! This is the numeric half of the HDAG, deliberately independent of any
//! tensor library and of the graph layer: an ordered sequence of `f32`
//! values with dot product, Euclidean norm, and cosine similarity.
//!
//! Degenerate-case policy: the cosine of any pair involving a zero-norm
//! operand is defined as `0.0` (not `NaN`, not an error), keeping the
//! metric bounded in `[-1, 1] ∪ {0}`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when two vectors of different lengths are combined.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DimensionMismatch {
    pub left: usize,
    pub right: usize,
}

impl fmt::Display for DimensionMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vector dimensions differ: {} vs {}",
            self.left, self.right
        )
    }
}

impl std::error::Error for DimensionMismatch {}

/// Ordered sequence of `f32` values with the operations the stack needs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector(Vec<f32>);

impl Vector {
    /// Wraps a `Vec<f32>` without copying.
    pub fn new(values: Vec<f32>) -> Self {
        Vector(values)
    }

    /// Copies a slice into a new vector.
    pub fn from_slice(values: &[f32]) -> Self {
        Vector(values.to_vec())
    }

    /// Returns the dimensionality.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the zero-dimensional vector.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the components as a slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Dot product of two equal-length vectors.
    pub fn dot(&self, other: &Vector) -> Result<f32, DimensionMismatch> {
        if self.len() != other.len() {
            return Err(DimensionMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        Ok(self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| a * b)
            .sum())
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f32 {
        self.0.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Cosine similarity: `dot(x, y) / (‖x‖ · ‖y‖)`.
    ///
    /// Returns `0.0` when either operand has zero norm, and
    /// [`DimensionMismatch`] when the lengths differ.
    pub fn cosine(&self, other: &Vector) -> Result<f32, DimensionMismatch> {
        let dot = self.dot(other)?;
        let denom = self.norm() * other.norm();
        if denom == 0.0 {
            return Ok(0.0);
        }
        Ok(dot / denom)
    }
}

impl From<Vec<f32>> for Vector {
    fn from(values: Vec<f32>) -> Self {
        Vector(values)
    }
}

impl From<&[f32]> for Vector {
    fn from(values: &[f32]) -> Self {
        Vector::from_slice(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f32 = 1e-3;

    #[test]
    fn cosine_of_vector_with_itself_is_one() {
        let v = Vector::from_slice(&[1.0, 0.5, 0.1]);
        let r = v.cosine(&v).unwrap();
        assert!((r - 1.0).abs() < TOL, "got {r}");
    }

    #[test]
    fn cosine_of_vector_with_negation_is_minus_one() {
        let v = Vector::from_slice(&[1.0, 0.5, 0.1]);
        let neg = Vector::new(v.as_slice().iter().map(|x| -x).collect());
        let r = v.cosine(&neg).unwrap();
        assert!((r + 1.0).abs() < TOL, "got {r}");
    }

    #[test]
    fn zero_norm_operand_yields_zero() {
        let zero = Vector::from_slice(&[0.0, 0.0, 0.0]);
        let v = Vector::from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(zero.cosine(&v).unwrap(), 0.0);
        assert_eq!(v.cosine(&zero).unwrap(), 0.0);
        assert_eq!(zero.cosine(&zero).unwrap(), 0.0);
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let a = Vector::from_slice(&[1.0, 2.0]);
        let b = Vector::from_slice(&[1.0, 2.0, 3.0]);
        let err = a.cosine(&b).unwrap_err();
        assert_eq!(err, DimensionMismatch { left: 2, right: 3 });
    }

    #[test]
    fn cosine_matches_reference_value() {
        // The worked example from the pipeline: sensor vs feature vectors.
        let sensor = Vector::from_slice(&[1.0, 0.5, 0.1]);
        let feature = Vector::from_slice(&[0.8, 0.55, 0.05]);
        // dot = 1.08, norms = sqrt(1.26) * sqrt(0.945) => cosine ~= 0.98974
        let r = sensor.cosine(&feature).unwrap();
        assert!((r - 0.98974).abs() < TOL, "got {r}");
    }

    #[test]
    fn dot_and_norm_basics() {
        let a = Vector::from_slice(&[3.0, 4.0]);
        let b = Vector::from_slice(&[1.0, 0.0]);
        assert_eq!(a.norm(), 5.0);
        assert_eq!(a.dot(&b).unwrap(), 3.0);
    }
}
