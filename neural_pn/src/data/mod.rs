//! Data loading and batching for training.

mod batch;
mod dataset;
mod point_cloud;
mod shapenet;

pub use batch::{BatchIterator, PointCloudBatch};
pub use dataset::{toy_dataset, InMemoryDataset, PointCloudDataset, TOY_NUM_CLASSES};
pub use point_cloud::PointCloud;
pub use shapenet::{ShapeNetPartDataset, Split};
