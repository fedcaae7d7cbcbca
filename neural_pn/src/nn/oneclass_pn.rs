//! OneClassPN: PointNet per-point classifier.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::loss::CrossEntropyLossConfig;
use burn::prelude::*;
use burn::tensor::ElementConversion;

use crate::config::OneClassPnConfig;
use crate::loss::{accuracy, calc_trans_loss};
use crate::training::Observation;

use super::conv_block::{ConvBlock, ConvBlockConfig};
use super::transform_net::TransformNet;

/// Per-point logits and the transforms learned on the way.
#[derive(Debug, Clone)]
pub struct PointNetOutput<B: Backend> {
    /// Class scores: [batch, num_classes, num_points]
    pub logits: Tensor<B, 3>,
    /// Input transform [batch, in_dim, in_dim], absent when transforms are disabled.
    pub input_transform: Option<Tensor<B, 3>>,
    /// Feature transform [batch, middle_dim, middle_dim], absent when transforms are disabled.
    pub feature_transform: Option<Tensor<B, 3>>,
}

/// Loss terms of a single forward pass.
#[derive(Debug, Clone)]
pub struct OneClassPnLoss<B: Backend> {
    /// Total loss (scalar).
    pub loss: Tensor<B, 1>,
    /// Cross-entropy over all points.
    pub cls_loss: Tensor<B, 1>,
    /// Weighted input transform orthogonality loss.
    pub trans_loss1: Option<Tensor<B, 1>>,
    /// Weighted feature transform orthogonality loss.
    pub trans_loss2: Option<Tensor<B, 1>>,
    /// Fraction of correctly classified points.
    pub accuracy: Option<Tensor<B, 1>>,
}

impl<B: Backend> OneClassPnLoss<B> {
    /// Get the total loss as a scalar value.
    pub fn loss_value(&self) -> f32 {
        scalar(self.loss.clone())
    }

    /// Collect every term as a named scalar observation.
    pub fn observation(&self) -> Observation {
        let mut observation = Observation::new();
        observation.insert("cls_loss", scalar(self.cls_loss.clone()));
        if let Some(ref t) = self.trans_loss1 {
            observation.insert("trans_loss1", scalar(t.clone()));
        }
        if let Some(ref t) = self.trans_loss2 {
            observation.insert("trans_loss2", scalar(t.clone()));
        }
        observation.insert("loss", self.loss_value());
        if let Some(ref acc) = self.accuracy {
            observation.insert("accuracy", scalar(acc.clone()));
        }
        observation
    }
}

fn scalar<B: Backend>(tensor: Tensor<B, 1>) -> f32 {
    tensor.into_scalar().elem::<f32>()
}

/// PointNet-style network that assigns a class to every input point.
///
/// Forward pipeline:
/// 1. Optional input transform (K = in_dim)
/// 2. Two shared conv blocks (in_dim -> 64 -> middle_dim)
/// 3. Optional feature transform (K = middle_dim)
/// 4. Three shared conv blocks (middle_dim -> 64 -> 128 -> 1024)
/// 5. Max-pool over points, broadcast the global feature back to every point
/// 6. Four conv blocks (1024 -> 512 -> 256 -> 128 -> 128) and a 1x1 classifier
#[derive(Module, Debug)]
pub struct OneClassPn<B: Backend> {
    input_transform: Option<TransformNet<B>>,
    conv_block1: ConvBlock<B>,
    conv_block2: ConvBlock<B>,
    feature_transform: Option<TransformNet<B>>,
    conv_block3: ConvBlock<B>,
    conv_block4: ConvBlock<B>,
    conv_block5: ConvBlock<B>,
    conv_block6: ConvBlock<B>,
    conv_block7: ConvBlock<B>,
    conv_block8: ConvBlock<B>,
    conv_block9: ConvBlock<B>,
    conv10: Conv2d<B>,
    in_dim: usize,
    trans: bool,
    trans_lam1: f64,
    trans_lam2: f64,
    compute_accuracy: bool,
}

impl<B: Backend> OneClassPn<B> {
    /// Create a new network from configuration.
    pub fn new(config: &OneClassPnConfig, device: &B::Device) -> Self {
        let block = |in_dim: usize, out_dim: usize| {
            ConvBlockConfig::new(in_dim, out_dim)
                .with_use_bn(config.use_bn)
                .with_residual(config.residual)
        };

        let [e1, e2, e3] = OneClassPnConfig::EXTRACTOR_DIMS;
        let [h1, h2, h3, h4] = OneClassPnConfig::HEAD_DIMS;

        let (input_transform, feature_transform) = if config.trans {
            (
                Some(TransformNet::new(&config.input_transform(), device)),
                Some(TransformNet::new(&config.feature_transform(), device)),
            )
        } else {
            (None, None)
        };

        Self {
            input_transform,
            conv_block1: block(config.in_dim, 64).init(device),
            conv_block2: block(64, config.middle_dim).init(device),
            feature_transform,
            conv_block3: block(config.middle_dim, e1).init(device),
            conv_block4: block(e1, e2).init(device),
            conv_block5: block(e2, e3).init(device),
            conv_block6: block(e3, h1).init(device),
            conv_block7: block(h1, h2).init(device),
            conv_block8: block(h2, h3).init(device),
            conv_block9: block(h3, h4).with_dropout(config.dropout).init(device),
            conv10: Conv2dConfig::new([h4, config.num_classes], [1, 1]).init(device),
            in_dim: config.in_dim,
            trans: config.trans,
            trans_lam1: config.trans_lam1,
            trans_lam2: config.trans_lam2,
            compute_accuracy: config.compute_accuracy,
        }
    }

    /// Whether the transform nets are part of the model.
    pub fn has_transforms(&self) -> bool {
        self.trans
    }

    /// Forward pass.
    ///
    /// Input: points [batch, in_dim, num_points, 1]
    /// Output: logits [batch, num_classes, num_points] and the learned transforms
    pub fn forward(&self, x: Tensor<B, 4>) -> PointNetOutput<B> {
        let [_, channels, _, width] = x.dims();
        assert_eq!(channels, self.in_dim, "expected {} input channels", self.in_dim);
        assert_eq!(width, 1, "point tensor must have a trailing dimension of 1");

        let (h, input_transform) = match self.input_transform {
            Some(ref net) => {
                let (h, t) = net.forward(x);
                (h, Some(t))
            }
            None => (x, None),
        };

        let h = self.conv_block1.forward(h);
        let h = self.conv_block2.forward(h);

        let (h, feature_transform) = match self.feature_transform {
            Some(ref net) => {
                let (h, t) = net.forward(h);
                (h, Some(t))
            }
            None => (h, None),
        };

        let h = self.conv_block3.forward(h);
        let h = self.conv_block4.forward(h);
        let h = self.conv_block5.forward(h);

        // Symmetric function: max pooling over points, then back to every point.
        let [batch, _, num_points, _] = h.dims();
        let global_feat = h.max_dim(2).repeat_dim(2, num_points);

        let h = self.conv_block6.forward(global_feat);
        let h = self.conv_block7.forward(h);
        let h = self.conv_block8.forward(h);
        let h = self.conv_block9.forward(h);
        let h = self.conv10.forward(h);

        let num_classes = h.dims()[1];

        PointNetOutput {
            logits: h.reshape([batch, num_classes, num_points]),
            input_transform,
            feature_transform,
        }
    }

    /// Compute the training loss.
    ///
    /// Inputs:
    /// - points: [batch, in_dim, num_points, 1]
    /// - labels: [batch, num_points] class ids
    ///
    /// Loss = cross-entropy + λ1·orth(T1) + λ2·orth(T2); a transform term is
    /// skipped when transforms are disabled or its weight is negative.
    pub fn forward_loss(&self, points: Tensor<B, 4>, labels: Tensor<B, 2, Int>) -> OneClassPnLoss<B> {
        let output = self.forward(points);
        let [batch, num_classes, num_points] = output.logits.dims();
        assert_eq!(
            labels.dims(),
            [batch, num_points],
            "labels must be [batch, num_points]"
        );

        let logits = output
            .logits
            .swap_dims(1, 2)
            .reshape([batch * num_points, num_classes]);
        let targets = labels.reshape([batch * num_points]);

        let device = logits.device();
        let cls_loss = CrossEntropyLossConfig::new()
            .init(&device)
            .forward(logits.clone(), targets.clone());

        let mut loss = cls_loss.clone();

        let trans_loss1 = match output.input_transform {
            Some(t) if self.trans && self.trans_lam1 >= 0.0 => {
                Some(calc_trans_loss(t) * self.trans_lam1)
            }
            _ => None,
        };
        if let Some(ref t) = trans_loss1 {
            loss = loss + t.clone();
        }

        let trans_loss2 = match output.feature_transform {
            Some(t) if self.trans && self.trans_lam2 >= 0.0 => {
                Some(calc_trans_loss(t) * self.trans_lam2)
            }
            _ => None,
        };
        if let Some(ref t) = trans_loss2 {
            loss = loss + t.clone();
        }

        let accuracy = if self.compute_accuracy {
            Some(accuracy(logits.detach(), targets))
        } else {
            None
        };

        OneClassPnLoss {
            loss,
            cls_loss,
            trans_loss1,
            trans_loss2,
            accuracy,
        }
    }
}

impl OneClassPnConfig {
    /// Initialize the network.
    pub fn init<B: Backend>(&self, device: &B::Device) -> OneClassPn<B> {
        OneClassPn::new(self, device)
    }
}
