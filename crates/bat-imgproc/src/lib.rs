#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// camera model and lens distortion module.
pub mod calibration;

/// Error types for the image processing module.
pub mod error;

/// utilities for interpolation and resampling.
pub mod interpolation;

/// module containing parallelization utilities.
pub mod parallel;

pub use error::DistortionMapError;
