//! Reference models used by the built-in tasks.

use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;
use geotrain_core::TaskModel;
use serde::{Deserialize, Serialize};

/// Configuration for [`Mlp`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Number of input features.
    pub in_features: usize,
    /// Hidden layer width.
    pub hidden: usize,
    /// Number of outputs (classes or regression targets).
    pub out_features: usize,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            in_features: 1,
            hidden: 64,
            out_features: 1,
        }
    }
}

impl MlpConfig {
    /// Create a new config.
    pub fn new(in_features: usize, out_features: usize) -> Self {
        Self {
            in_features,
            out_features,
            ..Default::default()
        }
    }

    /// Set hidden layer width.
    #[must_use]
    pub fn with_hidden(mut self, hidden: usize) -> Self {
        self.hidden = hidden;
        self
    }

    /// Initialize the model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        Mlp {
            hidden: LinearConfig::new(self.in_features, self.hidden).init(device),
            activation: Relu::new(),
            head: LinearConfig::new(self.hidden, self.out_features).init(device),
        }
    }
}

/// Two-layer perceptron: `Linear -> ReLU -> Linear`.
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    hidden: Linear<B>,
    activation: Relu,
    head: Linear<B>,
}

impl<B: Backend> Mlp<B> {
    /// Forward pass.
    ///
    /// # Arguments
    ///
    /// * `x` - Input tensor of shape (batch, in_features)
    ///
    /// # Returns
    ///
    /// Output tensor of shape (batch, out_features)
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.hidden.forward(x);
        let x = self.activation.forward(x);
        self.head.forward(x)
    }
}

impl<B: Backend> TaskModel<B> for Mlp<B> {
    type Input = Tensor<B, 2>;
    type Output = Tensor<B, 2>;

    fn forward(&self, input: Self::Input) -> Self::Output {
        Mlp::forward(self, input)
    }
}
