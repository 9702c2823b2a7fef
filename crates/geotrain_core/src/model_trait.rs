//! Model trait for task forward delegation.

use burn::prelude::*;

/// A model whose forward pass a training task delegates to.
///
/// Inputs and outputs are associated types so that classification,
/// regression, and segmentation models can share one task contract.
pub trait TaskModel<B: Backend>: Module<B> + Clone + Send {
    /// Input to the forward pass.
    type Input;
    /// Output of the forward pass.
    type Output;

    /// Forward pass.
    fn forward(&self, input: Self::Input) -> Self::Output;
}
