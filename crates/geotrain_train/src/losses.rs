//! Loss functions.
//!
//! Provides the criteria selectable through a task's `loss` hyperparameter.

use burn::nn::loss::{CrossEntropyLossConfig, MseLoss, Reduction};
use burn::prelude::*;
use burn::tensor::activation::log_softmax;
use geotrain_core::{CoreError, Hyperparameters};
use serde::{Deserialize, Serialize};

use crate::error::Result;

const DEFAULT_FOCAL_GAMMA: f64 = 2.0;

/// Loss criterion for classification.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationLoss {
    /// Cross-entropy over logits.
    #[default]
    CrossEntropy,
    /// Focal loss.
    ///
    /// FL(p_t) = -(1 - p_t)^gamma * log(p_t)
    ///
    /// Reference: "Focal Loss for Dense Object Detection" by Lin et al. (2017)
    Focal {
        /// Focusing parameter. Higher values increase focus on hard examples.
        gamma: f64,
    },
}

impl ClassificationLoss {
    /// Select the criterion from the `loss` (and, for focal, `gamma`) hyperparameters.
    ///
    /// Accepts `"ce"` and `"focal"`; defaults to cross-entropy when `loss` is absent.
    pub fn from_hparams(hparams: &Hyperparameters) -> Result<Self> {
        match hparams.get_str_or("loss", "ce")? {
            "ce" => Ok(Self::CrossEntropy),
            "focal" => Ok(Self::Focal {
                gamma: hparams.get_f64_or("gamma", DEFAULT_FOCAL_GAMMA)?,
            }),
            other => Err(unknown_loss(other, "one of: ce, focal")),
        }
    }

    /// Compute the mean loss.
    ///
    /// # Arguments
    ///
    /// * `logits` - Raw model outputs of shape (batch, n_classes)
    /// * `targets` - Integer class labels of shape (batch,)
    pub fn forward<B: Backend>(
        &self,
        logits: Tensor<B, 2>,
        targets: Tensor<B, 1, Int>,
    ) -> Tensor<B, 1> {
        match *self {
            Self::CrossEntropy => {
                let loss = CrossEntropyLossConfig::new().init(&logits.device());
                loss.forward(logits, targets)
            }
            Self::Focal { gamma } => {
                let log_probs = log_softmax(logits, 1);
                let log_p_t: Tensor<B, 1> = log_probs
                    .gather(1, targets.unsqueeze_dim(1))
                    .squeeze(1);
                let focal_weight = log_p_t
                    .clone()
                    .exp()
                    .neg()
                    .add_scalar(1.0)
                    .powf_scalar(gamma);
                (focal_weight * log_p_t).neg().mean()
            }
        }
    }

    /// Get the loss name.
    pub fn name(&self) -> &str {
        match self {
            Self::CrossEntropy => "ce",
            Self::Focal { .. } => "focal",
        }
    }
}

/// Loss criterion for regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegressionLoss {
    /// Mean squared error.
    #[default]
    Mse,
    /// Mean absolute error.
    Mae,
}

impl RegressionLoss {
    /// Select the criterion from the `loss` hyperparameter.
    ///
    /// Accepts `"mse"` and `"mae"`; defaults to MSE when `loss` is absent.
    pub fn from_hparams(hparams: &Hyperparameters) -> Result<Self> {
        match hparams.get_str_or("loss", "mse")? {
            "mse" => Ok(Self::Mse),
            "mae" => Ok(Self::Mae),
            other => Err(unknown_loss(other, "one of: mse, mae")),
        }
    }

    /// Compute the mean loss.
    pub fn forward<B: Backend>(&self, preds: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
        match self {
            Self::Mse => MseLoss::new().forward(preds, targets, Reduction::Mean),
            Self::Mae => (preds - targets).abs().mean(),
        }
    }

    /// Get the loss name.
    pub fn name(&self) -> &str {
        match self {
            Self::Mse => "mse",
            Self::Mae => "mae",
        }
    }
}

fn unknown_loss(got: &str, expected: &str) -> crate::error::TrainError {
    CoreError::InvalidHyperparameter {
        key: "loss".to_string(),
        expected: expected.to_string(),
        got: got.to_string(),
    }
    .into()
}
