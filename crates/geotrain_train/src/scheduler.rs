//! Learning rate schedulers.

use serde::{Deserialize, Serialize};

/// Mode for [`ReduceLROnPlateau`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReduceMode {
    /// Reduce LR when metric stops decreasing (for losses).
    #[default]
    Min,
    /// Reduce LR when metric stops increasing (for accuracy).
    Max,
}

/// How the improvement threshold is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    /// `best * (1 - threshold)` in min mode, `best * (1 + threshold)` in max mode.
    #[default]
    Rel,
    /// `best - threshold` in min mode, `best + threshold` in max mode.
    Abs,
}

/// Configuration for [`ReduceLROnPlateau`].
///
/// Defaults match PyTorch's `ReduceLROnPlateau`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReduceLROnPlateauConfig {
    /// Whether to minimize or maximize the monitored value.
    pub mode: ReduceMode,
    /// Factor to reduce LR by (new_lr = old_lr * factor).
    pub factor: f64,
    /// Number of epochs with no improvement tolerated before reducing.
    pub patience: usize,
    /// Minimum change that counts as an improvement.
    pub threshold: f64,
    /// Interpretation of `threshold`.
    pub threshold_mode: ThresholdMode,
    /// Epochs to wait after a reduction before resuming normal operation.
    pub cooldown: usize,
    /// Lower bound on the learning rate.
    pub min_lr: f64,
    /// Reductions smaller than this are ignored.
    pub eps: f64,
}

impl Default for ReduceLROnPlateauConfig {
    fn default() -> Self {
        Self {
            mode: ReduceMode::Min,
            factor: 0.1,
            patience: 10,
            threshold: 1e-4,
            threshold_mode: ThresholdMode::Rel,
            cooldown: 0,
            min_lr: 0.0,
            eps: 1e-8,
        }
    }
}

impl ReduceLROnPlateauConfig {
    /// Create a new configuration with the given patience.
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            ..Default::default()
        }
    }

    /// Set the mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ReduceMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the reduction factor.
    #[must_use]
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Set the improvement threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64, threshold_mode: ThresholdMode) -> Self {
        self.threshold = threshold;
        self.threshold_mode = threshold_mode;
        self
    }

    /// Set cooldown period after LR reduction.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: usize) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Set the minimum learning rate.
    #[must_use]
    pub fn with_min_lr(mut self, min_lr: f64) -> Self {
        self.min_lr = min_lr;
        self
    }

    /// Set the smallest reduction that is applied.
    #[must_use]
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Build the scheduler starting from `initial_lr`.
    pub fn init(&self, initial_lr: f64) -> ReduceLROnPlateau {
        ReduceLROnPlateau::new(initial_lr, self.clone())
    }
}

/// ReduceLROnPlateau - reduces LR when a monitored value stops improving.
///
/// This is stateful and must be updated with metric values.
#[derive(Debug, Clone)]
pub struct ReduceLROnPlateau {
    config: ReduceLROnPlateauConfig,
    current_lr: f64,
    best_value: f64,
    num_bad_epochs: usize,
    cooldown_counter: usize,
    last_epoch: usize,
}

impl ReduceLROnPlateau {
    /// Create a new ReduceLROnPlateau scheduler.
    pub fn new(initial_lr: f64, config: ReduceLROnPlateauConfig) -> Self {
        let best_value = worst_value(config.mode);
        Self {
            config,
            current_lr: initial_lr,
            best_value,
            num_bad_epochs: 0,
            cooldown_counter: 0,
            last_epoch: 0,
        }
    }

    /// Update with a new metric value.
    ///
    /// Returns true if the learning rate was reduced.
    pub fn step(&mut self, metric: f64) -> bool {
        self.last_epoch += 1;

        if self.is_better(metric) {
            self.best_value = metric;
            self.num_bad_epochs = 0;
        } else {
            self.num_bad_epochs += 1;
        }

        if self.cooldown_counter > 0 {
            self.cooldown_counter -= 1;
            self.num_bad_epochs = 0;
        }

        tracing::debug!(
            epoch = self.last_epoch,
            metric,
            best = self.best_value,
            bad_epochs = self.num_bad_epochs,
            "plateau scheduler step"
        );

        if self.num_bad_epochs > self.config.patience {
            self.cooldown_counter = self.config.cooldown;
            self.num_bad_epochs = 0;
            return self.reduce_lr();
        }
        false
    }

    fn is_better(&self, metric: f64) -> bool {
        if metric.is_nan() {
            return false;
        }
        let best = self.best_value;
        let threshold = self.config.threshold;
        match (self.config.mode, self.config.threshold_mode) {
            (ReduceMode::Min, ThresholdMode::Rel) => metric < best * (1.0 - threshold),
            (ReduceMode::Min, ThresholdMode::Abs) => metric < best - threshold,
            (ReduceMode::Max, ThresholdMode::Rel) => metric > best * (1.0 + threshold),
            (ReduceMode::Max, ThresholdMode::Abs) => metric > best + threshold,
        }
    }

    fn reduce_lr(&mut self) -> bool {
        let old_lr = self.current_lr;
        let new_lr = (old_lr * self.config.factor).max(self.config.min_lr);
        if old_lr - new_lr > self.config.eps {
            self.current_lr = new_lr;
            tracing::info!(
                epoch = self.last_epoch,
                "Reducing learning rate from {:.4e} to {:.4e}",
                old_lr,
                new_lr
            );
            true
        } else {
            false
        }
    }

    /// Get the current learning rate.
    pub fn current_lr(&self) -> f64 {
        self.current_lr
    }

    /// Best monitored value seen so far.
    pub fn best_value(&self) -> f64 {
        self.best_value
    }

    /// Consecutive epochs without improvement.
    pub fn num_bad_epochs(&self) -> usize {
        self.num_bad_epochs
    }

    /// Number of epochs tolerated without improvement.
    pub fn patience(&self) -> usize {
        self.config.patience
    }

    /// Scheduler configuration.
    pub fn config(&self) -> &ReduceLROnPlateauConfig {
        &self.config
    }

    /// Whether the scheduler is in its post-reduction cooldown.
    pub fn in_cooldown(&self) -> bool {
        self.cooldown_counter > 0
    }
}

fn worst_value(mode: ReduceMode) -> f64 {
    match mode {
        ReduceMode::Min => f64::INFINITY,
        ReduceMode::Max => f64::NEG_INFINITY,
    }
}
