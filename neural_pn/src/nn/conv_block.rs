//! Shared 1x1 convolution block.

use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Relu};
use burn::prelude::*;

/// Configuration for a [`ConvBlock`].
#[derive(Config, Debug)]
pub struct ConvBlockConfig {
    /// Input channels.
    pub in_channels: usize,
    /// Output channels.
    pub out_channels: usize,
    /// Whether to normalize the convolution output.
    #[config(default = true)]
    pub use_bn: bool,
    /// Whether to add the input back onto the output.
    ///
    /// Only applied when `in_channels == out_channels`.
    #[config(default = false)]
    pub residual: bool,
    /// Dropout probability after the activation (0.0 = no dropout).
    #[config(default = 0.0)]
    pub dropout: f64,
}

impl ConvBlockConfig {
    /// Initialize the block.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvBlock<B> {
        let conv = Conv2dConfig::new([self.in_channels, self.out_channels], [1, 1]).init(device);

        let bn = if self.use_bn {
            Some(BatchNormConfig::new(self.out_channels).init(device))
        } else {
            None
        };

        let dropout = if self.dropout > 0.0 {
            Some(DropoutConfig::new(self.dropout).init())
        } else {
            None
        };

        ConvBlock {
            conv,
            bn,
            activation: Relu::new(),
            dropout,
            residual: self.residual && self.in_channels == self.out_channels,
        }
    }
}

/// Pointwise convolution + batch norm + ReLU, shared over every point.
///
/// A `1x1` kernel over a `[batch, channels, num_points, 1]` tensor is the same
/// per-point linear map applied to each point, i.e. a shared-weight MLP layer.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    /// Pointwise convolution.
    conv: Conv2d<B>,
    /// Optional batch normalization.
    bn: Option<BatchNorm<B, 2>>,
    /// Activation function.
    activation: Relu,
    /// Optional dropout.
    dropout: Option<Dropout>,
    /// Whether the identity shortcut is active.
    residual: bool,
}

impl<B: Backend> ConvBlock<B> {
    /// Forward pass.
    ///
    /// Input shape: [batch, in_channels, num_points, 1]
    /// Output shape: [batch, out_channels, num_points, 1]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut h = self.conv.forward(x.clone());

        if let Some(ref bn) = self.bn {
            h = bn.forward(h);
        }

        h = self.activation.forward(h);

        if self.residual {
            h = h + x;
        }

        if let Some(ref dropout) = self.dropout {
            h = dropout.forward(h);
        }

        h
    }

    /// Whether the identity shortcut is applied.
    pub fn is_residual(&self) -> bool {
        self.residual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_conv_block_forward() {
        let device = Default::default();
        let block = ConvBlockConfig::new(3, 64).init::<TestBackend>(&device);

        let input = Tensor::zeros([2, 3, 16, 1], &device);
        let output = block.forward(input);

        assert_eq!(output.dims(), [2, 64, 16, 1]);
    }

    #[test]
    fn test_residual_requires_matching_widths() {
        let device = Default::default();

        let widening = ConvBlockConfig::new(3, 8)
            .with_residual(true)
            .init::<TestBackend>(&device);
        assert!(!widening.is_residual());

        let same = ConvBlockConfig::new(8, 8)
            .with_residual(true)
            .init::<TestBackend>(&device);
        assert!(same.is_residual());
    }

    #[test]
    fn test_output_is_non_negative() {
        let device = Default::default();
        let block = ConvBlockConfig::new(3, 16)
            .with_use_bn(false)
            .init::<TestBackend>(&device);

        let input = Tensor::random([2, 3, 8, 1], burn::tensor::Distribution::Default, &device);
        let output = block.forward(input);

        let min: f32 = output.min().into_scalar();
        assert!(min >= 0.0, "ReLU output should be non-negative, got {}", min);
    }
}
