//! # neural_pn
//!
//! PointNet-style per-point classification with Burn.
//!
//! This crate provides OneClassPN, a network that assigns a class to every
//! point of a point cloud, together with the data loading and training loop
//! used to fit it to part-segmentation datasets.
//!
//! ## Features
//!
//! - **Transform nets**: learned input and feature transforms kept near-orthogonal
//! - **Shared 1x1 convolutions**: the same per-point weights for every point
//! - **Max-pool symmetric function**: order-independent global shape feature
//! - **Training**: Adam with a milestone learning-rate schedule, validation,
//!   JSON log, resumable snapshots
//! - **Data**: ShapeNet part-segmentation loader and a synthetic toy dataset
//!
//! ## Quick Start
//!
//! ```ignore
//! use neural_pn::{
//!     config::{OneClassPnConfig, TrainingConfig},
//!     data::{toy_dataset, InMemoryDataset, TOY_NUM_CLASSES},
//!     training::Trainer,
//! };
//! use burn::backend::{Autodiff, NdArray};
//!
//! type MyBackend = Autodiff<NdArray>;
//!
//! let train = toy_dataset(64, 256, 0);
//! let config = TrainingConfig::new(OneClassPnConfig::new(TOY_NUM_CLASSES))
//!     .with_num_points(256)
//!     .with_epochs(5);
//!
//! let trainer = Trainer::<MyBackend>::new(config, "result", Default::default());
//! let trained = trainer.fit(&train, None::<&InMemoryDataset>)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `wgpu`: GPU acceleration via WebGPU

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod data;
pub mod error;
pub mod loss;
pub mod nn;
pub mod training;

// Re-export key types for convenience
pub use config::{OneClassPnConfig, TrainingConfig};
pub use error::{PointNetError, Result};
pub use loss::calc_trans_loss;
pub use nn::{OneClassPn, OneClassPnLoss};
pub use training::Trainer;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{
        AdamSettings, LrScheduleConfig, OneClassPnConfig, TrainingConfig, TransformNetConfig,
    };
    pub use crate::data::{
        toy_dataset, BatchIterator, InMemoryDataset, PointCloud, PointCloudBatch,
        PointCloudDataset, ShapeNetPartDataset, Split, TOY_NUM_CLASSES,
    };
    pub use crate::error::{PointNetError, Result};
    pub use crate::loss::{accuracy, calc_trans_loss, identity};
    pub use crate::nn::{
        ConvBlock, ConvBlockConfig, LinearBlock, LinearBlockConfig, OneClassPn, OneClassPnLoss,
        PointNetOutput, TransformNet,
    };
    pub use crate::training::{
        evaluate, find_latest_snapshot, load_snapshot, save_snapshot, snapshot_dir,
        snapshot_exists, EpochSummary, LogReport, LrSchedule, Observation, Reporter,
        SnapshotState, TrainedModel, Trainer,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_public_api() {
        let config = TrainingConfig::new(OneClassPnConfig::new(4));
        assert!(config.validate().is_ok());
        assert!(config.model.trans);
    }

    #[test]
    fn test_model_creation() {
        let device = Default::default();
        let model = OneClassPnConfig::new(4).init::<TestBackend>(&device);
        assert!(model.has_transforms());
    }
}
