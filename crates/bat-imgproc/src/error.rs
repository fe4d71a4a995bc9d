use bat_image::{ImageError, ImageSize};

/// Errors raised while building or applying an inverse distortion map.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DistortionMapError {
    /// The oversampling factor must be a positive integer.
    #[error("The upscale factor must be at least 1, got {0}")]
    InvalidUpscaleFactor(usize),

    /// The image to resample does not have the size of the map.
    #[error("DistortionMap ({0}) and image ({1}) sizes do not match")]
    SizeMismatch(ImageSize, ImageSize),

    /// Error related to the underlying image buffers.
    #[error(transparent)]
    ImageError(#[from] ImageError),
}
