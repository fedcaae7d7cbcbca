//! Neural network configuration types.

use burn::config::Config;

/// Configuration for a spatial transform network.
#[derive(Config, Debug)]
pub struct TransformNetConfig {
    /// Size `K` of the learned `K x K` transform (channel count of the input).
    pub k: usize,

    /// Channel widths of the shared 1x1 convolutions before pooling.
    #[config(default = "vec![64, 128, 1024]")]
    pub conv_dims: Vec<usize>,

    /// Widths of the fully connected layers after pooling.
    #[config(default = "vec![512, 256]")]
    pub fc_dims: Vec<usize>,

    /// Whether to use batch normalization.
    #[config(default = true)]
    pub use_bn: bool,

    /// Whether to add identity shortcuts where widths match.
    #[config(default = false)]
    pub residual: bool,
}

/// Configuration for the OneClassPN per-point classifier.
#[derive(Config, Debug)]
pub struct OneClassPnConfig {
    /// Number of output classes per point.
    pub num_classes: usize,

    /// Input channels per point (3 for xyz).
    #[config(default = 3)]
    pub in_dim: usize,

    /// Width of the feature space the feature transform acts on.
    #[config(default = 64)]
    pub middle_dim: usize,

    /// Dropout probability in the segmentation head (0.0 = no dropout).
    #[config(default = 0.0)]
    pub dropout: f64,

    /// Whether to use batch normalization in every block.
    #[config(default = true)]
    pub use_bn: bool,

    /// Whether to learn input and feature transforms.
    #[config(default = true)]
    pub trans: bool,

    /// Weight of the input transform orthogonality loss (negative disables it).
    #[config(default = 0.001)]
    pub trans_lam1: f64,

    /// Weight of the feature transform orthogonality loss (negative disables it).
    #[config(default = 0.001)]
    pub trans_lam2: f64,

    /// Whether to compute per-point accuracy alongside the loss.
    #[config(default = true)]
    pub compute_accuracy: bool,

    /// Whether to add identity shortcuts where block widths match.
    #[config(default = false)]
    pub residual: bool,
}

impl OneClassPnConfig {
    /// Channel widths of the point feature extractor after the feature transform.
    pub const EXTRACTOR_DIMS: [usize; 3] = [64, 128, 1024];

    /// Channel widths of the segmentation head before the classifier layer.
    pub const HEAD_DIMS: [usize; 4] = [512, 256, 128, 128];

    /// Transform net configuration for the input transform.
    pub fn input_transform(&self) -> TransformNetConfig {
        TransformNetConfig::new(self.in_dim)
            .with_use_bn(self.use_bn)
            .with_residual(self.residual)
    }

    /// Transform net configuration for the feature transform.
    pub fn feature_transform(&self) -> TransformNetConfig {
        TransformNetConfig::new(self.middle_dim)
            .with_use_bn(self.use_bn)
            .with_residual(self.residual)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_classes == 0 {
            return Err("num_classes must be positive".to_string());
        }
        if self.in_dim == 0 {
            return Err("in_dim must be positive".to_string());
        }
        if self.middle_dim == 0 {
            return Err("middle_dim must be positive".to_string());
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err("dropout must be in [0, 1)".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oneclass_defaults() {
        let config = OneClassPnConfig::new(4);
        assert_eq!(config.num_classes, 4);
        assert_eq!(config.in_dim, 3);
        assert_eq!(config.middle_dim, 64);
        assert!(config.trans);
        assert!(config.use_bn);
        assert!(!config.residual);
        assert!((config.trans_lam1 - 0.001).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_transform_configs_follow_model_flags() {
        let config = OneClassPnConfig::new(4)
            .with_use_bn(false)
            .with_residual(true)
            .with_middle_dim(32);

        let input = config.input_transform();
        assert_eq!(input.k, 3);
        assert!(!input.use_bn);
        assert!(input.residual);

        let feature = config.feature_transform();
        assert_eq!(feature.k, 32);
        assert_eq!(feature.conv_dims, vec![64, 128, 1024]);
    }

    #[test]
    fn test_validation() {
        assert!(OneClassPnConfig::new(0).validate().is_err());
        assert!(OneClassPnConfig::new(2).with_dropout(1.0).validate().is_err());
        assert!(OneClassPnConfig::new(2).with_in_dim(0).validate().is_err());
    }
}
