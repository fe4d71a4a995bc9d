#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Camera calibration files.
///
/// Read the `cam_mtx` / `dist` JSON produced by common calibration tools and
/// apply it to a camera. See [`calibration::read_calibration`].
pub mod calibration;

/// Error types for I/O operations.
///
/// Defines [`IoError`] variants for file access, calibration validation and
/// PNG encoding/decoding failures.
pub mod error;

/// NumPy array export.
///
/// Write floating point passes such as depth as `.npy` files.
pub mod npy;

/// PNG image encoding and decoding.
///
/// Write render passes and annotation masks as 16-bit PNG files.
pub mod png;

/// Internal utility functions for image bit depth conversion.
mod conv_utils;

pub use error::IoError;
