//! Training infrastructure for OneClassPN.
//!
//! This module provides:
//! - `Trainer`: epoch loop with Adam, learning-rate schedule and validation
//! - Observations, epoch summaries and the JSON training log
//! - Snapshot save/load for training resumption

mod checkpoint;
mod metrics;
mod schedule;
mod trainer;

pub use checkpoint::{
    find_latest_snapshot, load_snapshot, save_snapshot, snapshot_dir, snapshot_exists,
    SnapshotState,
};
pub use metrics::{EpochSummary, LogReport, Observation, Reporter};
pub use schedule::LrSchedule;
pub use trainer::{evaluate, TrainedModel, Trainer};
