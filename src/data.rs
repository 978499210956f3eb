//! Training set storage.
//!
//! Batch training operates on a [`Dataset`]: validated, contiguous
//! row-major storage of (input, target) sample pairs.

use crate::{Error, Result};

#[derive(Debug, Clone)]
/// A supervised training set: inputs (X) and targets (Y).
///
/// Stored as contiguous buffers with row-major layout:
/// - `inputs.len() == len * input_dim`
/// - `targets.len() == len * target_dim`
pub struct Dataset {
    inputs: Vec<f64>,
    targets: Vec<f64>,
    len: usize,
    input_dim: usize,
    target_dim: usize,
}

impl Dataset {
    /// Builds a dataset from flat buffers.
    ///
    /// `inputs` is `(len, input_dim)` and `targets` is `(len, target_dim)`.
    pub fn from_flat(
        inputs: Vec<f64>,
        targets: Vec<f64>,
        input_dim: usize,
        target_dim: usize,
    ) -> Result<Self> {
        if input_dim == 0 || target_dim == 0 {
            return Err(Error::Shape(
                "input_dim and target_dim must be > 0".to_owned(),
            ));
        }
        if inputs.len() % input_dim != 0 {
            return Err(Error::Shape(format!(
                "inputs length {} is not divisible by input_dim {input_dim}",
                inputs.len()
            )));
        }

        let len = inputs.len() / input_dim;

        if targets.len() != len * target_dim {
            return Err(Error::Shape(format!(
                "targets length {} does not match len * target_dim ({len} * {target_dim})",
                targets.len()
            )));
        }

        Ok(Self {
            inputs,
            targets,
            len,
            input_dim,
            target_dim,
        })
    }

    /// Builds a dataset from per-sample rows.
    ///
    /// This is a convenience constructor (it copies into contiguous
    /// storage).
    pub fn from_rows(inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<Self> {
        if inputs.len() != targets.len() {
            return Err(Error::Shape(format!(
                "inputs/targets length mismatch: {} vs {}",
                inputs.len(),
                targets.len()
            )));
        }
        if inputs.is_empty() {
            return Err(Error::Shape("dataset must not be empty".to_owned()));
        }

        let input_dim = inputs[0].len();
        let target_dim = targets[0].len();

        for (i, row) in inputs.iter().enumerate() {
            if row.len() != input_dim {
                return Err(Error::Shape(format!(
                    "input row {i} has len {}, expected {input_dim}",
                    row.len()
                )));
            }
        }
        for (i, row) in targets.iter().enumerate() {
            if row.len() != target_dim {
                return Err(Error::Shape(format!(
                    "target row {i} has len {}, expected {target_dim}",
                    row.len()
                )));
            }
        }

        let mut inputs_flat = Vec::with_capacity(inputs.len() * input_dim);
        for row in inputs {
            inputs_flat.extend_from_slice(row);
        }
        let mut targets_flat = Vec::with_capacity(targets.len() * target_dim);
        for row in targets {
            targets_flat.extend_from_slice(row);
        }

        Self::from_flat(inputs_flat, targets_flat, input_dim, target_dim)
    }

    #[inline]
    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    /// Returns true if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    /// Returns the per-sample input dimension.
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    /// Returns the per-sample target dimension.
    pub fn target_dim(&self) -> usize {
        self.target_dim
    }

    #[inline]
    /// Returns the `idx`-th input row (shape: `(input_dim,)`).
    ///
    /// Panics if `idx >= len`.
    pub fn input(&self, idx: usize) -> &[f64] {
        let start = idx * self.input_dim;
        &self.inputs[start..start + self.input_dim]
    }

    #[inline]
    /// Returns the `idx`-th target row (shape: `(target_dim,)`).
    ///
    /// Panics if `idx >= len`.
    pub fn target(&self, idx: usize) -> &[f64] {
        let start = idx * self.target_dim;
        &self.targets[start..start + self.target_dim]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_flat_validates_shapes() {
        let ok = Dataset::from_flat(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0], 2, 1);
        assert!(ok.is_ok());

        let err = Dataset::from_flat(vec![0.0, 1.0, 2.0], vec![0.0], 2, 1);
        assert!(err.is_err());
    }

    #[test]
    fn rows_round_trip_through_flat_storage() {
        let set = Dataset::from_rows(
            &[vec![1.0, 2.0], vec![3.0, 4.0]],
            &[vec![5.0], vec![6.0]],
        )
        .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.input(1), &[3.0, 4.0]);
        assert_eq!(set.target(0), &[5.0]);
    }
}
