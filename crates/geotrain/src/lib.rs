//! # geotrain
//!
//! Trainer tasks on top of Burn.
//!
//! geotrain standardizes how a trainer is put together:
//!
//! - **Hyperparameters**: a task's configuration is captured once, at construction
//! - **Hooks**: losses, metrics, and models are configured in that order
//! - **Optimization**: AdamW with a reduce-on-plateau scheduler watching `val_loss`
//! - **Forward**: a task's forward pass is its model's forward pass
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use geotrain::prelude::*;
//!
//! let config = RegressionTaskConfig::new(8, 1).with_lr(1e-3).with_patience(5);
//! let task = RegressionTask::<TrainBackend>::build(&config, &device)?;
//! let mut optim = task.configure_optimizers()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `backend-ndarray` (default): CPU backend using ndarray
//! - `backend-wgpu`: GPU backend using WGPU

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub use geotrain_core as core;
pub use geotrain_train as train;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use geotrain::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use geotrain_core::{CoreError, Hyperparameters, TaskModel};

    // Training
    pub use geotrain_train::{
        AdamWSettings, BaseTask, ClassificationBatch, ClassificationLoss, ClassificationTask,
        ClassificationTaskConfig, Interval, LrSchedulerConfig, Metric, MetricCollection,
        MetricLog, Mlp, MlpConfig, OptimizerConfig, ReduceLROnPlateau, ReduceLROnPlateauConfig,
        RegressionBatch, RegressionLoss, RegressionTask, RegressionTaskConfig, Stage, StepOutput,
        Task, TrainError, DEFAULT_MONITOR,
    };
}

/// Backend type aliases for convenience
pub mod backend {
    pub use burn::backend::Autodiff;

    #[cfg(feature = "backend-ndarray")]
    pub use burn::backend::NdArray;

    #[cfg(feature = "backend-wgpu")]
    pub use burn::backend::Wgpu;
}
