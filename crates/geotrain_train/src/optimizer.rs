//! Optimizer and learning rate scheduler configuration.
//!
//! [`OptimizerConfig`] pairs one optimizer with a metric-driven
//! [`ReduceLROnPlateau`] scheduler and the name of the logged value that
//! drives it. Burn passes the learning rate to every optimizer step, so the
//! scheduler owns the rate and the optimizer only owns its moment state.

use std::collections::BTreeMap;
use std::fmt;

use burn::module::AutodiffModule;
use burn::optim::{AdamWConfig, GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::LearningRate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainError};
use crate::scheduler::ReduceLROnPlateau;

/// Object-safe view over a Burn [`Optimizer`].
///
/// Burn's optimizer trait carries an associated record type, so it cannot be
/// boxed directly. Every Burn optimizer implements this trait.
pub trait TaskOptimizer<B, M>: Send
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    /// Apply one update to `module` using `grads` at learning rate `lr`.
    fn step(&mut self, lr: LearningRate, module: M, grads: GradientsParams) -> M;

    /// Get the optimizer name.
    fn name(&self) -> &str;
}

impl<B, M, O> TaskOptimizer<B, M> for O
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    fn step(&mut self, lr: LearningRate, module: M, grads: GradientsParams) -> M {
        Optimizer::step(self, lr, module, grads)
    }

    fn name(&self) -> &str {
        std::any::type_name::<O>()
    }
}

/// AdamW settings.
///
/// Defaults match PyTorch's `torch.optim.AdamW`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdamWSettings {
    /// Learning rate.
    pub lr: f64,
    /// Decoupled weight decay coefficient.
    pub weight_decay: f64,
    /// First moment decay (beta1).
    pub beta_1: f64,
    /// Second moment decay (beta2).
    pub beta_2: f64,
    /// Small epsilon for numerical stability.
    pub epsilon: f64,
}

impl Default for AdamWSettings {
    fn default() -> Self {
        Self {
            lr: 1e-3,
            weight_decay: 0.01,
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl AdamWSettings {
    /// Create new settings with the given learning rate.
    pub fn new(lr: f64) -> Self {
        Self {
            lr,
            ..Default::default()
        }
    }

    /// Set weight decay.
    #[must_use]
    pub fn with_weight_decay(mut self, weight_decay: f64) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Set the moment decays.
    #[must_use]
    pub fn with_betas(mut self, beta_1: f64, beta_2: f64) -> Self {
        self.beta_1 = beta_1;
        self.beta_2 = beta_2;
        self
    }

    /// Set epsilon for numerical stability.
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Check the settings before building an optimizer.
    pub fn validate(&self) -> Result<()> {
        if !self.lr.is_finite() || self.lr < 0.0 {
            return Err(TrainError::InvalidLearningRate(self.lr.to_string()));
        }
        if !(0.0..1.0).contains(&self.beta_1) || !(0.0..1.0).contains(&self.beta_2) {
            return Err(TrainError::Other(format!(
                "Invalid AdamW betas: ({}, {})",
                self.beta_1, self.beta_2
            )));
        }
        if self.weight_decay < 0.0 {
            return Err(TrainError::Other(format!(
                "Invalid weight decay: {}",
                self.weight_decay
            )));
        }
        Ok(())
    }

    /// Build the Burn optimizer. The learning rate is applied per step.
    pub fn init<B, M>(&self) -> impl Optimizer<M, B>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
    {
        AdamWConfig::new()
            .with_beta_1(self.beta_1 as f32)
            .with_beta_2(self.beta_2 as f32)
            .with_epsilon(self.epsilon as f32)
            .with_weight_decay(self.weight_decay as f32)
            .init::<B, M>()
    }
}

/// When the scheduler is stepped by the training loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    /// Once per epoch, after validation.
    #[default]
    Epoch,
    /// Once per optimizer step.
    Step,
}

/// Scheduler half of an [`OptimizerConfig`].
#[derive(Debug, Clone)]
pub struct LrSchedulerConfig {
    /// The scheduler.
    pub scheduler: ReduceLROnPlateau,
    /// Logged value that drives the scheduler.
    pub monitor: String,
    /// When the scheduler is stepped.
    ///
    /// The caller's training loop reads this to decide whether to call
    /// [`OptimizerConfig::scheduler_step`] after each epoch or after each step.
    pub interval: Interval,
    /// Step the scheduler every `frequency` intervals.
    pub frequency: usize,
    calls: usize,
}

impl LrSchedulerConfig {
    /// Create a per-epoch configuration monitoring `monitor`.
    pub fn new(scheduler: ReduceLROnPlateau, monitor: impl Into<String>) -> Self {
        Self {
            scheduler,
            monitor: monitor.into(),
            interval: Interval::Epoch,
            frequency: 1,
            calls: 0,
        }
    }

    /// Set the interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    /// Set the frequency. Zero is treated as one.
    #[must_use]
    pub fn with_frequency(mut self, frequency: usize) -> Self {
        self.frequency = frequency.max(1);
        self
    }
}

/// An optimizer paired with its learning rate scheduler.
pub struct OptimizerConfig<B, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    /// The optimizer.
    pub optimizer: Box<dyn TaskOptimizer<B, M>>,
    /// The scheduler and its monitored key.
    pub lr_scheduler: LrSchedulerConfig,
}

impl<B, M> OptimizerConfig<B, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    /// Pair an optimizer with a scheduler.
    pub fn new<O>(optimizer: O, lr_scheduler: LrSchedulerConfig) -> Self
    where
        O: Optimizer<M, B> + 'static,
    {
        Self {
            optimizer: Box::new(optimizer),
            lr_scheduler,
        }
    }

    /// Current learning rate.
    pub fn lr(&self) -> f64 {
        self.lr_scheduler.scheduler.current_lr()
    }

    /// Monitored key.
    pub fn monitor(&self) -> &str {
        &self.lr_scheduler.monitor
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &ReduceLROnPlateau {
        &self.lr_scheduler.scheduler
    }

    /// Apply one optimizer step at the current learning rate.
    pub fn step(&mut self, module: M, grads: GradientsParams) -> M {
        let lr = self.lr();
        self.optimizer.step(lr, module, grads)
    }

    /// Step the scheduler with the monitored value from `logged`.
    ///
    /// Only every `frequency`-th call reaches the scheduler. Returns true if
    /// the learning rate was reduced.
    pub fn scheduler_step(&mut self, logged: &BTreeMap<String, f64>) -> Result<bool> {
        let config = &mut self.lr_scheduler;
        let value = *logged
            .get(&config.monitor)
            .ok_or_else(|| TrainError::MonitorNotFound {
                monitor: config.monitor.clone(),
                available: logged.keys().cloned().collect(),
            })?;

        config.calls += 1;
        if config.calls % config.frequency != 0 {
            return Ok(false);
        }
        Ok(config.scheduler.step(value))
    }
}

impl<B, M> fmt::Debug for OptimizerConfig<B, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizerConfig")
            .field("optimizer", &self.optimizer.name())
            .field("lr_scheduler", &self.lr_scheduler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ReduceLROnPlateauConfig;

    #[test]
    fn test_adamw_defaults() {
        let settings = AdamWSettings::default();
        assert!((settings.lr - 1e-3).abs() < 1e-12);
        assert!((settings.weight_decay - 0.01).abs() < 1e-12);
        assert!((settings.beta_1 - 0.9).abs() < 1e-12);
        assert!((settings.beta_2 - 0.999).abs() < 1e-12);
        assert!((settings.epsilon - 1e-8).abs() < 1e-15);
    }

    #[test]
    fn test_adamw_validate() {
        assert!(AdamWSettings::new(1e-3).validate().is_ok());
        assert!(matches!(
            AdamWSettings::new(-1.0).validate(),
            Err(TrainError::InvalidLearningRate(_))
        ));
        assert!(AdamWSettings::new(f64::NAN).validate().is_err());
        assert!(AdamWSettings::new(1e-3)
            .with_betas(1.0, 0.999)
            .validate()
            .is_err());
        assert!(AdamWSettings::new(1e-3)
            .with_weight_decay(-0.1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_lr_scheduler_config() {
        let scheduler = ReduceLROnPlateauConfig::new(5).init(1e-3);
        let config = LrSchedulerConfig::new(scheduler, "val_loss")
            .with_interval(Interval::Step)
            .with_frequency(0);

        assert_eq!(config.monitor, "val_loss");
        assert_eq!(config.interval, Interval::Step);
        assert_eq!(config.frequency, 1);
    }
}
