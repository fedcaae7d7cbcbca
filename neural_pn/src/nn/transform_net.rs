//! Spatial transform network (T-Net).

use burn::module::{Module, Param};
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::prelude::*;

use crate::config::TransformNetConfig;
use crate::loss::identity;

use super::conv_block::{ConvBlock, ConvBlockConfig};
use super::linear_block::{LinearBlock, LinearBlockConfig};

/// Learns a `K x K` matrix from a point set and applies it to every point.
///
/// Architecture:
/// 1. Shared 1x1 convolutions lift each point to a wide feature
/// 2. Max-pooling over points gives an order-independent global feature
/// 3. Fully connected layers regress the `K * K` matrix entries
///
/// The final layer starts with zero weights and an identity bias, so an
/// untrained net returns the identity transform.
#[derive(Module, Debug)]
pub struct TransformNet<B: Backend> {
    /// Per-point feature extractor.
    convs: Vec<ConvBlock<B>>,
    /// Fully connected tail after pooling.
    fcs: Vec<LinearBlock<B>>,
    /// Regression of the flattened matrix.
    output: Linear<B>,
    /// Matrix size.
    k: usize,
}

impl<B: Backend> TransformNet<B> {
    /// Create a new transform net from configuration.
    pub fn new(config: &TransformNetConfig, device: &B::Device) -> Self {
        let k = config.k;

        let mut convs = Vec::with_capacity(config.conv_dims.len());
        let mut in_dim = k;
        for &out_dim in &config.conv_dims {
            convs.push(
                ConvBlockConfig::new(in_dim, out_dim)
                    .with_use_bn(config.use_bn)
                    .with_residual(config.residual)
                    .init(device),
            );
            in_dim = out_dim;
        }

        let mut fcs = Vec::with_capacity(config.fc_dims.len());
        for &out_dim in &config.fc_dims {
            fcs.push(
                LinearBlockConfig::new(in_dim, out_dim)
                    .with_use_bn(config.use_bn)
                    .with_residual(config.residual)
                    .init(device),
            );
            in_dim = out_dim;
        }

        let mut output = LinearConfig::new(in_dim, k * k)
            .with_initializer(Initializer::Zeros)
            .init(device);
        output.bias = Some(Param::from_tensor(identity::<B>(k, device).reshape([k * k])));

        Self {
            convs,
            fcs,
            output,
            k,
        }
    }

    /// Predict the transform matrix.
    ///
    /// Input: [batch, k, num_points, 1]
    /// Output: [batch, k, k]
    pub fn matrix(&self, x: Tensor<B, 4>) -> Tensor<B, 3> {
        let [batch, channels, _, width] = x.dims();
        assert_eq!(channels, self.k, "transform net expects {} channels", self.k);
        assert_eq!(width, 1, "point tensor must have a trailing dimension of 1");

        let mut h = x;
        for conv in &self.convs {
            h = conv.forward(h);
        }

        // Symmetric function: max over the point axis.
        let features = h.dims()[1];
        let mut g = h.max_dim(2).reshape([batch, features]);

        for fc in &self.fcs {
            g = fc.forward(g);
        }

        self.output.forward(g).reshape([batch, self.k, self.k])
    }

    /// Forward pass.
    ///
    /// Input: [batch, k, num_points, 1]
    /// Output: (transformed points [batch, k, num_points, 1], matrix [batch, k, k])
    pub fn forward(&self, x: Tensor<B, 4>) -> (Tensor<B, 4>, Tensor<B, 3>) {
        let t = self.matrix(x.clone());
        let [batch, k, num_points, _] = x.dims();

        // Each point is a row vector multiplied on the right by T.
        let points = x.reshape([batch, k, num_points]).swap_dims(1, 2);
        let h = points.matmul(t.clone());
        let h = h.swap_dims(1, 2).reshape([batch, k, num_points, 1]);

        (h, t)
    }
}
