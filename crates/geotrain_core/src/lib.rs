//! # geotrain_core
//!
//! Core types and traits for geotrain training tasks.
//!
//! This crate provides:
//! - [`Hyperparameters`] for capturing a task's constructor arguments
//! - [`TaskModel`] for models whose forward pass a task delegates to
//! - Error types and common utilities
//!
//! ## Example
//!
//! ```rust,ignore
//! use geotrain_core::Hyperparameters;
//!
//! let hparams = Hyperparameters::capture(&config)?;
//! let lr = hparams.get_f64("lr")?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hparams;
mod model_trait;

pub use error::{CoreError, Result};
pub use hparams::{Hyperparameters, HPARAMS_FILE_NAME};
pub use model_trait::TaskModel;
