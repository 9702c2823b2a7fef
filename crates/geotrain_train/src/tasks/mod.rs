//! Built-in tasks.
//!
//! - [`ClassificationTask`] - multiclass classification of feature vectors
//! - [`RegressionTask`] - multi-output regression of feature vectors

mod classification;
mod regression;

pub use classification::{ClassificationBatch, ClassificationTask, ClassificationTaskConfig};
pub use regression::{RegressionBatch, RegressionTask, RegressionTaskConfig};

use burn::prelude::*;

use crate::error::{Result, TrainError};
use crate::metrics::MetricLog;

/// Phase of a run, used to prefix logged keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Training.
    Train,
    /// Validation.
    Val,
    /// Testing.
    Test,
}

impl Stage {
    /// Key prefix, e.g. `val_`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Stage::Train => "train_",
            Stage::Val => "val_",
            Stage::Test => "test_",
        }
    }

    /// Key under which the stage's loss is logged, e.g. `val_loss`.
    pub fn loss_key(&self) -> String {
        format!("{}loss", self.prefix())
    }
}

/// Loss and logged values of one step.
#[derive(Debug)]
pub struct StepOutput<B: Backend> {
    /// Scalar loss, still attached to the autodiff graph during training.
    pub loss: Tensor<B, 1>,
    /// Loss and metrics keyed by prefixed name.
    pub log: MetricLog,
}

fn check_batch<B: Backend>(inputs: &Tensor<B, 2>, n_targets: usize, in_features: usize) -> Result<()> {
    let [n_inputs, width] = inputs.dims();
    if n_inputs == 0 {
        return Err(TrainError::InvalidBatch("batch is empty".to_string()));
    }
    if n_inputs != n_targets {
        return Err(TrainError::InvalidBatch(format!(
            "{n_inputs} inputs but {n_targets} targets"
        )));
    }
    if width != in_features {
        return Err(TrainError::InvalidBatch(format!(
            "expected {in_features} features, got {width}"
        )));
    }
    Ok(())
}

/// Rejects labels outside `0..num_classes`. Expects a non-empty batch.
fn check_labels<B: Backend>(targets: &Tensor<B, 1, Int>, num_classes: usize) -> Result<()> {
    let min = targets.clone().min().into_scalar().elem::<i64>();
    let max = targets.clone().max().into_scalar().elem::<i64>();
    if min < 0 || max >= num_classes as i64 {
        return Err(TrainError::InvalidBatch(format!(
            "labels must lie in 0..{num_classes}, got range {min}..={max}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_stage_keys() {
        assert_eq!(Stage::Train.loss_key(), "train_loss");
        assert_eq!(Stage::Val.loss_key(), "val_loss");
        assert_eq!(Stage::Test.prefix(), "test_");
    }

    #[test]
    fn test_check_batch_rejects_empty() {
        let inputs = Tensor::<TestBackend, 2>::zeros([0, 2], &Default::default());
        assert!(matches!(
            check_batch(&inputs, 0, 2),
            Err(TrainError::InvalidBatch(_))
        ));
    }

    #[test]
    fn test_check_labels_range() {
        let device = Default::default();
        let valid = Tensor::<TestBackend, 1, Int>::from_ints([0, 2, 1], &device);
        assert!(check_labels(&valid, 3).is_ok());

        let too_large = Tensor::<TestBackend, 1, Int>::from_ints([0, 3], &device);
        assert!(matches!(
            check_labels(&too_large, 3),
            Err(TrainError::InvalidBatch(_))
        ));

        let negative = Tensor::<TestBackend, 1, Int>::from_ints([-1, 0], &device);
        assert!(check_labels(&negative, 3).is_err());
    }
}
