//! # geotrain_train
//!
//! Training tasks for geotrain.
//!
//! This crate provides:
//! - [`BaseTask`] and [`Task`]: configuration hooks run in a fixed order
//!   (losses, metrics, models) and forward delegation to the held model
//! - [`OptimizerConfig`]: AdamW paired with [`ReduceLROnPlateau`] and a
//!   monitored key
//! - Losses, metrics, and a reference [`Mlp`] model
//! - Built-in [`ClassificationTask`] and [`RegressionTask`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use geotrain_train::{ClassificationTask, ClassificationTaskConfig};
//!
//! let config = ClassificationTaskConfig::new(16, 4).with_lr(1e-3).with_patience(5);
//! let mut task = ClassificationTask::<TrainBackend>::build(&config, &device)?;
//! let mut optim = task.configure_optimizers()?;
//!
//! let output = task.training_step(batch)?;
//! let grads = GradientsParams::from_grads(output.loss.backward(), task.model());
//! task.optimizer_step(&mut optim, grads);
//!
//! let logged = task.validation_step(valid_batch)?;
//! optim.scheduler_step(&logged)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod losses;
pub mod metrics;
pub mod models;
pub mod optimizer;
pub mod scheduler;
pub mod task;
pub mod tasks;

pub use error::{Result, TrainError};
pub use losses::{ClassificationLoss, RegressionLoss};
pub use metrics::{Accuracy, F1Score, Mae, Metric, MetricCollection, MetricLog, Mse, Rmse};
pub use models::{Mlp, MlpConfig};
pub use optimizer::{AdamWSettings, Interval, LrSchedulerConfig, OptimizerConfig, TaskOptimizer};
pub use scheduler::{ReduceLROnPlateau, ReduceLROnPlateauConfig, ReduceMode, ThresholdMode};
pub use task::{default_optimizers, BaseTask, Task, DEFAULT_MONITOR};
pub use tasks::{
    ClassificationBatch, ClassificationTask, ClassificationTaskConfig, RegressionBatch,
    RegressionTask, RegressionTaskConfig, Stage, StepOutput,
};
// Re-export core types for convenience
pub use geotrain_core::{Hyperparameters, TaskModel};
