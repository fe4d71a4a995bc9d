use bat_image::ImageError;
use bat_imgproc::DistortionMapError;
use bat_io::IoError;

/// An error type for the scene module.
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// No object with the given name exists.
    #[error("Object '{0}' not found.")]
    ObjectNotFound(String),

    /// No collection with the given name exists.
    #[error("Could not find collection {0}!")]
    CollectionNotFound(String),

    /// Following the parent links of an object never reaches a root.
    #[error("The parents of '{0}' form a cycle.")]
    ParentCycle(String),

    /// A requested vertex does not exist.
    #[error("Vertex index {index} is out of range for '{object}' with {count} vertices.")]
    VertexIndexOutOfRange {
        /// The object that was queried.
        object: String,
        /// The requested index.
        index: usize,
        /// The number of vertices of the object.
        count: usize,
    },

    /// A vertex selection could not be parsed.
    #[error("Invalid vertex indices '{0}', expected \"all\" or a comma separated list of integers.")]
    InvalidVertexSelection(String),

    /// The scene has no camera to render or project with.
    #[error("The scene has no active camera.")]
    NoCamera,

    /// An operation needs the inverse distortion map before it was generated.
    #[error("The DistortionMap has not been generated yet.")]
    NoDistortionMap,

    /// Annotation class names must not be empty.
    #[error("The class name must not be empty.")]
    EmptyClassName,

    /// An annotation class with the same name already exists.
    #[error("Class '{0}' already exists.")]
    DuplicateClass(String),

    /// No annotation class with the given name exists.
    #[error("Class '{0}' not found.")]
    ClassNotFound(String),

    /// The background class is always present.
    #[error("The Background class cannot be removed.")]
    CannotRemoveBackground,

    /// The scene description could not be parsed.
    #[error("Invalid scene description. {0}")]
    InvalidDescription(String),

    /// Error building or applying the inverse distortion map.
    #[error(transparent)]
    DistortionMap(#[from] DistortionMapError),

    /// Error reading calibration files or writing renders.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Error related to image buffers.
    #[error(transparent)]
    Image(#[from] ImageError),
}
