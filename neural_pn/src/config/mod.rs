//! Configuration types for neural_pn.
//!
//! This module provides Burn-style configuration structs for the network blocks,
//! the learning-rate schedule and the trainer.

mod network;
mod training;

pub use network::{OneClassPnConfig, TransformNetConfig};
pub use training::{AdamSettings, LrScheduleConfig, TrainingConfig};
