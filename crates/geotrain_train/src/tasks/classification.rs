//! Classification task.

use burn::prelude::*;
use burn::tensor::activation::softmax;
use burn::tensor::backend::AutodiffBackend;
use geotrain_core::Hyperparameters;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainError};
use crate::losses::ClassificationLoss;
use crate::metrics::{Accuracy, F1Score, MetricCollection, MetricLog};
use crate::models::{Mlp, MlpConfig};
use crate::task::{BaseTask, Task};

use super::{check_batch, check_labels, Stage, StepOutput};

/// Hyperparameters of a [`ClassificationTask`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationTaskConfig {
    /// Number of input features.
    pub in_features: usize,
    /// Number of classes.
    pub num_classes: usize,
    /// Hidden layer width.
    pub hidden: usize,
    /// Loss name: `ce` or `focal`.
    pub loss: String,
    /// Focal loss focusing parameter.
    pub gamma: Option<f64>,
    /// Learning rate.
    pub lr: f64,
    /// Epochs without improvement before the learning rate is reduced.
    pub patience: usize,
}

impl Default for ClassificationTaskConfig {
    fn default() -> Self {
        Self {
            in_features: 1,
            num_classes: 2,
            hidden: 64,
            loss: "ce".to_string(),
            gamma: None,
            lr: 1e-3,
            patience: 10,
        }
    }
}

impl ClassificationTaskConfig {
    /// Create a new config.
    pub fn new(in_features: usize, num_classes: usize) -> Self {
        Self {
            in_features,
            num_classes,
            ..Default::default()
        }
    }

    /// Set hidden layer width.
    #[must_use]
    pub fn with_hidden(mut self, hidden: usize) -> Self {
        self.hidden = hidden;
        self
    }

    /// Use focal loss with the given gamma.
    #[must_use]
    pub fn with_focal_loss(mut self, gamma: f64) -> Self {
        self.loss = "focal".to_string();
        self.gamma = Some(gamma);
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

/// A batch of feature rows and integer class labels.
#[derive(Debug, Clone)]
pub struct ClassificationBatch<B: Backend> {
    /// Inputs of shape (batch, in_features).
    pub inputs: Tensor<B, 2>,
    /// Class labels of shape (batch,).
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> ClassificationBatch<B> {
    /// Create a new batch.
    pub fn new(inputs: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Self {
        Self { inputs, targets }
    }
}

/// Multiclass classification of feature vectors.
#[derive(Debug)]
pub struct ClassificationTask<B: Backend> {
    criterion: ClassificationLoss,
    train_metrics: MetricCollection<B>,
    val_metrics: MetricCollection<B>,
    test_metrics: MetricCollection<B>,
    in_features: usize,
    num_classes: usize,
}

impl<B: Backend> Default for ClassificationTask<B> {
    fn default() -> Self {
        Self {
            criterion: ClassificationLoss::default(),
            train_metrics: MetricCollection::new(Stage::Train.prefix()),
            val_metrics: MetricCollection::new(Stage::Val.prefix()),
            test_metrics: MetricCollection::new(Stage::Test.prefix()),
            in_features: 0,
            num_classes: 0,
        }
    }
}

impl<B: AutodiffBackend> ClassificationTask<B> {
    /// Capture `config` as hyperparameters and build the task.
    pub fn build(config: &ClassificationTaskConfig, device: &B::Device) -> Result<Task<B, Self>> {
        let hparams = Hyperparameters::capture(config)?;
        Task::new(Self::default(), hparams, device)
    }
}

impl<B: Backend> ClassificationTask<B> {
    /// The loss criterion.
    pub fn criterion(&self) -> ClassificationLoss {
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

fn classification_metrics<B: Backend>(stage: Stage, num_classes: usize) -> MetricCollection<B> {
    MetricCollection::new(stage.prefix())
        .with_metric(Accuracy)
        .with_metric(F1Score::new(num_classes))
}

impl<B: AutodiffBackend> BaseTask<B> for ClassificationTask<B> {
    type Model = Mlp<B>;

    fn configure_losses(&mut self, hparams: &Hyperparameters) -> Result<()> {
        self.criterion = ClassificationLoss::from_hparams(hparams)?;
        Ok(())
    }

    fn configure_metrics(&mut self, hparams: &Hyperparameters) -> Result<()> {
        let num_classes = hparams.get_usize("num_classes")?;
        if num_classes < 2 {
            return Err(TrainError::ConfigureError {
                hook: "metrics",
                reason: format!("num_classes must be at least 2, got {num_classes}"),
            });
        }
        self.train_metrics = classification_metrics(Stage::Train, num_classes);
        self.val_metrics = classification_metrics(Stage::Val, num_classes);
        self.test_metrics = classification_metrics(Stage::Test, num_classes);
        self.num_classes = num_classes;
        Ok(())
    }

    fn configure_models(
        &mut self,
        hparams: &Hyperparameters,
        device: &B::Device,
    ) -> Result<Self::Model> {
        let in_features = hparams.get_usize("in_features")?;
        if in_features == 0 {
            return Err(TrainError::ConfigureError {
                hook: "models",
                reason: "in_features must be positive".to_string(),
            });
        }
        self.in_features = in_features;

        let config = MlpConfig::new(in_features, self.num_classes)
            .with_hidden(hparams.get_usize_or("hidden", MlpConfig::default().hidden)?);
        Ok(config.init(device))
    }
}

impl<B: AutodiffBackend> Task<B, ClassificationTask<B>> {
    fn shared_step(&self, batch: ClassificationBatch<B>, stage: Stage) -> Result<StepOutput<B>> {
        let ClassificationBatch { inputs, targets } = batch;
        check_batch(&inputs, targets.dims()[0], self.inner().in_features)?;
        check_labels(&targets, self.inner().num_classes)?;

        let logits = self.forward(inputs);
        let loss = self.inner().criterion.forward(logits.clone(), targets.clone());

        let target_rows: Tensor<B, 2> = targets.float().unsqueeze_dim(1);
        let mut log = self.inner().metrics(stage).compute(&logits, &target_rows);
        log.insert(stage.loss_key(), loss.clone().into_scalar().elem::<f64>());

        Ok(StepOutput { loss, log })
    }

    /// Compute the training loss and metrics for one batch.
    pub fn training_step(&self, batch: ClassificationBatch<B>) -> Result<StepOutput<B>> {
        self.shared_step(batch, Stage::Train)
    }

    /// Compute validation loss and metrics (`val_loss`, `val_accuracy`, `val_f1_score`).
    pub fn validation_step(&self, batch: ClassificationBatch<B>) -> Result<MetricLog> {
        Ok(self.shared_step(batch, Stage::Val)?.log)
    }

    /// Compute test loss and metrics.
    pub fn test_step(&self, batch: ClassificationBatch<B>) -> Result<MetricLog> {
        Ok(self.shared_step(batch, Stage::Test)?.log)
    }

    /// Class probabilities of shape (batch, num_classes).
    pub fn predict_step(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        softmax(self.forward(inputs), 1)
    }
}
