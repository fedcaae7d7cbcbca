//! Fully connected block used after global pooling.

use burn::config::Config;
use burn::module::Module;
use burn::nn::{BatchNorm, BatchNormConfig, Linear, LinearConfig, Relu};
use burn::prelude::*;

/// Configuration for a [`LinearBlock`].
#[derive(Config, Debug)]
pub struct LinearBlockConfig {
    /// Input features.
    pub input_dim: usize,
    /// Output features.
    pub output_dim: usize,
    /// Whether to normalize the linear output.
    #[config(default = true)]
    pub use_bn: bool,
    /// Whether to add the input back onto the output (only when dims match).
    #[config(default = false)]
    pub residual: bool,
}

impl LinearBlockConfig {
    /// Initialize the block.
    pub fn init<B: Backend>(&self, device: &B::Device) -> LinearBlock<B> {
        let bn = if self.use_bn {
            Some(BatchNormConfig::new(self.output_dim).init(device))
        } else {
            None
        };

        LinearBlock {
            linear: LinearConfig::new(self.input_dim, self.output_dim).init(device),
            bn,
            activation: Relu::new(),
            residual: self.residual && self.input_dim == self.output_dim,
        }
    }
}

/// Linear + batch norm + ReLU.
#[derive(Module, Debug)]
pub struct LinearBlock<B: Backend> {
    linear: Linear<B>,
    bn: Option<BatchNorm<B, 1>>,
    activation: Relu,
    residual: bool,
}

impl<B: Backend> LinearBlock<B> {
    /// Forward pass.
    ///
    /// Input shape: [batch, input_dim]
    /// Output shape: [batch, output_dim]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut h = self.linear.forward(x.clone());

        if let Some(ref bn) = self.bn {
            // Batch norm expects [batch, channels, length].
            let [batch, features] = h.dims();
            h = bn.forward(h.reshape([batch, features, 1])).reshape([batch, features]);
        }

        h = self.activation.forward(h);

        if self.residual {
            h = h + x;
        }

        h
    }
}
