//! Neural network modules for per-point classification.
//!
//! This module provides:
//! - `ConvBlock` / `LinearBlock`: shared-weight building blocks
//! - `TransformNet`: learned canonicalizing transform
//! - `OneClassPn`: the full segmentation network

mod conv_block;
mod linear_block;
mod oneclass_pn;
mod transform_net;

pub use conv_block::{ConvBlock, ConvBlockConfig};
pub use linear_block::{LinearBlock, LinearBlockConfig};
pub use oneclass_pn::{OneClassPn, OneClassPnLoss, PointNetOutput};
pub use transform_net::TransformNet;
