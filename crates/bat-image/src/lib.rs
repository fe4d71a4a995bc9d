#![deny(missing_docs)]
//! Image types for render buffers and per-pixel lookup tables

/// image representation for dense per-pixel data.
pub mod image;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
