//! Base task shared by all trainers.
//!
//! A trainer implements [`BaseTask`] and is wrapped in a [`Task`], which
//! records the trainer's hyperparameters and then runs its configuration
//! hooks in a fixed order: losses, metrics, models. The resulting [`Task`]
//! always holds a model, exposes the default optimizer setup, and delegates
//! its forward pass to the model.
//!
//! ## Example
//!
//! ```rust,ignore
//! let hparams = Hyperparameters::capture(&config)?;
//! let task = Task::new(MyTask::default(), hparams, &device)?;
//!
//! let mut optim = task.configure_optimizers()?;
//! let output = task.forward(x);
//! ```

use burn::module::AutodiffModule;
use burn::optim::GradientsParams;
use burn::tensor::backend::AutodiffBackend;
use geotrain_core::{Hyperparameters, TaskModel};

use crate::error::Result;
use crate::optimizer::{AdamWSettings, LrSchedulerConfig, OptimizerConfig};
use crate::scheduler::ReduceLROnPlateauConfig;

/// Logged value watched by the scheduler unless a task overrides [`BaseTask::monitor`].
pub const DEFAULT_MONITOR: &str = "val_loss";

/// Contract implemented by every trainer.
///
/// Only [`configure_models`](BaseTask::configure_models) is required, so a
/// type without a model cannot be a task:
///
/// ```compile_fail
/// use burn::tensor::backend::AutodiffBackend;
/// use geotrain_train::{BaseTask, Mlp};
///
/// struct NoModel;
///
/// impl<B: AutodiffBackend> BaseTask<B> for NoModel {
///     type Model = Mlp<B>;
/// }
/// ```
pub trait BaseTask<B: AutodiffBackend>: Sized {
    /// The model this task trains.
    type Model: TaskModel<B> + AutodiffModule<B> + 'static;

    /// Logged value that drives the learning rate scheduler and callbacks.
    fn monitor(&self) -> &str {
        DEFAULT_MONITOR
    }

    /// Initialize the loss criterion.
    fn configure_losses(&mut self, _hparams: &Hyperparameters) -> Result<()> {
        Ok(())
    }

    /// Initialize the performance metrics.
    fn configure_metrics(&mut self, _hparams: &Hyperparameters) -> Result<()> {
        Ok(())
    }

    /// Initialize the model.
    fn configure_models(
        &mut self,
        hparams: &Hyperparameters,
        device: &B::Device,
    ) -> Result<Self::Model>;

    /// Initialize the optimizer and learning rate scheduler.
    ///
    /// Builds AdamW at hyperparameter `lr`, wrapped in a reduce-on-plateau
    /// scheduler with hyperparameter `patience`, watching `monitor`.
    fn configure_optimizers(
        &self,
        hparams: &Hyperparameters,
        monitor: &str,
    ) -> Result<OptimizerConfig<B, Self::Model>> {
        default_optimizers(hparams, monitor)
    }
}

/// AdamW over every trainable parameter plus `ReduceLROnPlateau`.
///
/// Fails if `lr` is missing or not a number, or if `patience` is missing or
/// not a non-negative integer.
pub fn default_optimizers<B, M>(
    hparams: &Hyperparameters,
    monitor: &str,
) -> Result<OptimizerConfig<B, M>>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + 'static,
{
    let lr = hparams.get_f64("lr")?;
    let patience = hparams.get_usize("patience")?;

    let settings = AdamWSettings::new(lr);
    settings.validate()?;

    let scheduler = ReduceLROnPlateauConfig::new(patience).init(lr);
    Ok(OptimizerConfig::new(
        settings.init::<B, M>(),
        LrSchedulerConfig::new(scheduler, monitor),
    ))
}

/// A configured trainer together with its model and hyperparameters.
pub struct Task<B: AutodiffBackend, T: BaseTask<B>> {
    task: T,
    model: T::Model,
    hparams: Hyperparameters,
    monitor: String,
    device: B::Device,
}

impl<B: AutodiffBackend, T: BaseTask<B>> Task<B, T> {
    /// Record `hparams`, then run the losses, metrics, and models hooks in order.
    pub fn new(mut task: T, hparams: Hyperparameters, device: &B::Device) -> Result<Self> {
        tracing::debug!("configuring losses");
        task.configure_losses(&hparams)?;
        tracing::debug!("configuring metrics");
        task.configure_metrics(&hparams)?;
        tracing::debug!("configuring models");
        let model = task.configure_models(&hparams, device)?;

        let monitor = task.monitor().to_string();
        tracing::info!(
            task = std::any::type_name::<T>(),
            hparams = hparams.len(),
            monitor = %monitor,
            "task configured"
        );

        Ok(Self {
            task,
            model,
            hparams,
            monitor,
            device: device.clone(),
        })
    }

    /// Forward pass of the model.
    pub fn forward(
        &self,
        input: <T::Model as TaskModel<B>>::Input,
    ) -> <T::Model as TaskModel<B>>::Output {
        self.model.forward(input)
    }

    /// Build the optimizer and scheduler for this task.
    pub fn configure_optimizers(&self) -> Result<OptimizerConfig<B, T::Model>> {
        self.task.configure_optimizers(&self.hparams, &self.monitor)
    }

    /// Apply one optimizer step to the held model.
    pub fn optimizer_step(
        &mut self,
        optim: &mut OptimizerConfig<B, T::Model>,
        grads: GradientsParams,
    ) {
        self.model = optim.step(self.model.clone(), grads);
    }

    /// Get the model.
    pub fn model(&self) -> &T::Model {
        &self.model
    }

    /// Replace the model, e.g. after loading weights.
    pub fn set_model(&mut self, model: T::Model) {
        self.model = model;
    }

    /// Consume the task, returning the model.
    pub fn into_model(self) -> T::Model {
        self.model
    }

    /// Get the trainer.
    pub fn inner(&self) -> &T {
        &self.task
    }

    /// Get the captured hyperparameters.
    pub fn hparams(&self) -> &Hyperparameters {
        &self.hparams
    }

    /// Logged value watched by the scheduler.
    pub fn monitor(&self) -> &str {
        &self.monitor
    }

    /// Get the device the model was built on.
    pub fn device(&self) -> &B::Device {
        &self.device
    }
}

impl<B: AutodiffBackend, T: BaseTask<B> + std::fmt::Debug> std::fmt::Debug for Task<B, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("task", &self.task)
            .field("model", &self.model)
            .field("hparams", &self.hparams)
            .field("monitor", &self.monitor)
            .finish()
    }
}
