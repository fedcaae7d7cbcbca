//! Loss functions for OneClassPN training.
//!
//! - Orthogonality loss: learned transforms should stay close to rotations
//! - Accuracy: fraction of points whose arg-max class matches the label

mod classification;
mod orthogonality;

pub use classification::accuracy;
pub use orthogonality::{calc_trans_loss, identity};
