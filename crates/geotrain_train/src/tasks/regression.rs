//! Regression task.

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use geotrain_core::Hyperparameters;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainError};
use crate::losses::RegressionLoss;
use crate::metrics::{Mae, MetricCollection, MetricLog, Mse, Rmse};
use crate::models::{Mlp, MlpConfig};
use crate::task::{BaseTask, Task};

use super::{check_batch, Stage, StepOutput};

/// Hyperparameters of a [`RegressionTask`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTaskConfig {
    /// Number of input features.
    pub in_features: usize,
    /// Number of regression targets.
    pub num_outputs: usize,
    /// Hidden layer width.
    pub hidden: usize,
    /// Loss name: `mse` or `mae`.
    pub loss: String,
    /// Learning rate.
    pub lr: f64,
    /// Epochs without improvement before the learning rate is reduced.
    pub patience: usize,
}

impl Default for RegressionTaskConfig {
    fn default() -> Self {
        Self {
            in_features: 1,
            num_outputs: 1,
            hidden: 64,
            loss: "mse".to_string(),
            lr: 1e-3,
            patience: 10,
        }
    }
}

impl RegressionTaskConfig {
    /// Create a new config.
    pub fn new(in_features: usize, num_outputs: usize) -> Self {
        Self {
            in_features,
            num_outputs,
            ..Default::default()
        }
    }

    /// Set hidden layer width.
    #[must_use]
    pub fn with_hidden(mut self, hidden: usize) -> Self {
        self.hidden = hidden;
        self
    }

    /// Set the loss.
    #[must_use]
    pub fn with_loss(mut self, loss: RegressionLoss) -> Self {
        self.loss = loss.name().to_string();
        self
    }

    /// Set learning rate.
    #[must_use]
    pub fn with_lr(mut self, lr: f64) -> Self {
        self.lr = lr;
        self
    }

    /// Set scheduler patience.
    #[must_use]
    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }
}

/// A batch of feature rows and real-valued targets.
#[derive(Debug, Clone)]
pub struct RegressionBatch<B: Backend> {
    /// Inputs of shape (batch, in_features).
    pub inputs: Tensor<B, 2>,
    /// Targets of shape (batch, num_outputs).
    pub targets: Tensor<B, 2>,
}

impl<B: Backend> RegressionBatch<B> {
    /// Create a new batch.
    pub fn new(inputs: Tensor<B, 2>, targets: Tensor<B, 2>) -> Self {
        Self { inputs, targets }
    }
}

/// Multi-output regression of feature vectors.
#[derive(Debug)]
pub struct RegressionTask<B: Backend> {
    criterion: RegressionLoss,
    train_metrics: MetricCollection<B>,
    val_metrics: MetricCollection<B>,
    test_metrics: MetricCollection<B>,
    in_features: usize,
    num_outputs: usize,
}

impl<B: Backend> Default for RegressionTask<B> {
    fn default() -> Self {
        Self {
            criterion: RegressionLoss::default(),
            train_metrics: MetricCollection::new(Stage::Train.prefix()),
            val_metrics: MetricCollection::new(Stage::Val.prefix()),
            test_metrics: MetricCollection::new(Stage::Test.prefix()),
            in_features: 0,
            num_outputs: 0,
        }
    }
}

impl<B: AutodiffBackend> RegressionTask<B> {
    /// Capture `config` as hyperparameters and build the task.
    pub fn build(config: &RegressionTaskConfig, device: &B::Device) -> Result<Task<B, Self>> {
        let hparams = Hyperparameters::capture(config)?;
        Task::new(Self::default(), hparams, device)
    }
}

impl<B: Backend> RegressionTask<B> {
    /// The loss criterion.
    pub fn criterion(&self) -> RegressionLoss {
        self.criterion
    }

    /// Metrics logged for a stage.
    pub fn metrics(&self, stage: Stage) -> &MetricCollection<B> {
        match stage {
            Stage::Train => &self.train_metrics,
            Stage::Val => &self.val_metrics,
            Stage::Test => &self.test_metrics,
        }
    }
}

fn regression_metrics<B: Backend>(stage: Stage) -> MetricCollection<B> {
    MetricCollection::new(stage.prefix())
        .with_metric(Rmse)
        .with_metric(Mse)
        .with_metric(Mae)
}

impl<B: AutodiffBackend> BaseTask<B> for RegressionTask<B> {
    type Model = Mlp<B>;

    fn configure_losses(&mut self, hparams: &Hyperparameters) -> Result<()> {
        self.criterion = RegressionLoss::from_hparams(hparams)?;
        Ok(())
    }

    fn configure_metrics(&mut self, _hparams: &Hyperparameters) -> Result<()> {
        self.train_metrics = regression_metrics(Stage::Train);
        self.val_metrics = regression_metrics(Stage::Val);
        self.test_metrics = regression_metrics(Stage::Test);
        Ok(())
    }

    fn configure_models(
        &mut self,
        hparams: &Hyperparameters,
        device: &B::Device,
    ) -> Result<Self::Model> {
        let in_features = hparams.get_usize("in_features")?;
        let num_outputs = hparams.get_usize_or("num_outputs", 1)?;
        if in_features == 0 || num_outputs == 0 {
            return Err(TrainError::ConfigureError {
                hook: "models",
                reason: format!(
                    "in_features and num_outputs must be positive, got {in_features} and {num_outputs}"
                ),
            });
        }
        self.in_features = in_features;
        self.num_outputs = num_outputs;

        let config = MlpConfig::new(in_features, num_outputs)
            .with_hidden(hparams.get_usize_or("hidden", MlpConfig::default().hidden)?);
        Ok(config.init(device))
    }
}

impl<B: AutodiffBackend> Task<B, RegressionTask<B>> {
    fn shared_step(&self, batch: RegressionBatch<B>, stage: Stage) -> Result<StepOutput<B>> {
        let RegressionBatch { inputs, targets } = batch;
        let [n_targets, target_width] = targets.dims();
        check_batch(&inputs, n_targets, self.inner().in_features)?;
        if target_width != self.inner().num_outputs {
            return Err(TrainError::InvalidBatch(format!(
                "expected {} targets per row, got {target_width}",
                self.inner().num_outputs
            )));
        }

        let preds = self.forward(inputs);
        let loss = self.inner().criterion.forward(preds.clone(), targets.clone());

        let mut log = self.inner().metrics(stage).compute(&preds, &targets);
        log.insert(stage.loss_key(), loss.clone().into_scalar().elem::<f64>());

        Ok(StepOutput { loss, log })
    }

    /// Compute the training loss and metrics for one batch.
    pub fn training_step(&self, batch: RegressionBatch<B>) -> Result<StepOutput<B>> {
        self.shared_step(batch, Stage::Train)
    }

    /// Compute validation loss and metrics (`val_loss`, `val_rmse`, `val_mse`, `val_mae`).
    pub fn validation_step(&self, batch: RegressionBatch<B>) -> Result<MetricLog> {
        Ok(self.shared_step(batch, Stage::Val)?.log)
    }

    /// Compute test loss and metrics.
    pub fn test_step(&self, batch: RegressionBatch<B>) -> Result<MetricLog> {
        Ok(self.shared_step(batch, Stage::Test)?.log)
    }

    /// Predictions of shape (batch, num_outputs).
    pub fn predict_step(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        self.forward(inputs)
    }
}
