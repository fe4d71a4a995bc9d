#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pinhole camera projection.
pub mod camera;

/// Linear algebra utilities.
pub mod linalg;

/// 3D transforms algorithms.
pub mod transforms;
