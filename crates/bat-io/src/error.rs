/// An error type for the io module.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// Error when the file does not exist.
    #[error("Could not access the selected file: {0}")]
    FileDoesNotExist(std::path::PathBuf),

    /// Error to open the file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// The calibration file could not be parsed.
    #[error("The selected file is not a valid JSON! {0}")]
    InvalidJson(String),

    /// The calibration file holds something other than a JSON object.
    #[error("The file must contain a dictionary!")]
    NotAnObject,

    /// `cam_mtx` is present but not a list.
    #[error("\"cam_mtx\" field must be a list!")]
    CameraMatrixNotList,

    /// `cam_mtx` is not a 3x3 matrix of numbers.
    #[error("\"cam_mtx\" must be 3x3 matrix!")]
    CameraMatrixShape,

    /// `dist` is present but not a list.
    #[error("\"dist\" field must be a list!")]
    DistortionNotList,

    /// `dist` is not a list of six numbers.
    #[error("\"dist\" field must be a list of six numbers! (k1,k2,p1,p2,k3,k4)")]
    DistortionShape,

    /// Error to create the image.
    #[error("Failed to create image. {0}")]
    ImageCreationError(#[from] bat_image::ImageError),

    /// Error to encode the PNG image.
    #[error("Failed to encode the png image. {0}")]
    PngEncodingError(String),

    /// Error to decode the PNG image.
    #[error("Failed to decode the png image. {0}")]
    PngDecodeError(String),
}
