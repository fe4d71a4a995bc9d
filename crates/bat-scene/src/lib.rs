#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Annotation classes and mask color assignment.
pub mod annotation;

/// Camera settings and remote camera updates.
pub mod camera;

/// Collection hierarchy.
pub mod collection;

/// Error types for the scene module.
pub mod error;

/// Scene objects.
pub mod object;

/// Finite palette of instance colors.
pub mod palette;

/// Render passes and the renderer interface.
pub mod render;

/// The scene and its operations.
pub mod scene;

/// Vertex selection and projection results.
pub mod vertices;

pub use error::SceneError;
pub use scene::{Scene, SceneDescription};
