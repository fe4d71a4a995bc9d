use bat_scene::vertices::VertexProjection;
use serde::{Deserialize, Serialize};

/// Outcome reported in every response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The request was handled.
    Success,
    /// The request was rejected; see the message.
    Failed,
}

/// A status with a human readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// The outcome.
    pub status: Status,
    /// What was done, or why nothing was.
    pub message: String,
}

impl StatusResponse {
    /// A successful response.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
        }
    }

    /// A failed response.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            message: message.into(),
        }
    }
}

/// Answer to `GET /object`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectResponse {
    /// Always [`Status::Success`].
    pub status: Status,
    /// The name of the object.
    pub object: String,
    /// The location of the object.
    pub location: [f64; 3],
    /// The XYZ Euler rotation of the object in radians.
    pub rotation: [f64; 3],
}

/// Answer to `GET /frame`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameResponse {
    /// Always [`Status::Success`].
    pub status: Status,
    /// The current frame.
    pub frame: i64,
}

/// Answer to `GET /vertices`.
///
/// Vertices behind the camera have `null` image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerticesResponse {
    /// Always [`Status::Success`].
    pub status: Status,
    /// The name of the object.
    pub object: String,
    /// Distorted pixel coordinates `[y, x]`.
    #[serde(rename = "2D_Coordinates")]
    pub coordinates_2d: Vec<[f64; 2]>,
    /// Distance between each vertex and the camera center.
    pub distance_from_cam: Vec<f64>,
    /// World coordinates `[x, y, z]`.
    #[serde(rename = "3D_Coordinates")]
    pub coordinates_3d: Vec<[f64; 3]>,
}

impl VerticesResponse {
    /// Wrap the projection of an object's vertices.
    pub fn new(object: impl Into<String>, projection: VertexProjection) -> Self {
        Self {
            status: Status::Success,
            object: object.into(),
            coordinates_2d: projection.coordinates_2d,
            distance_from_cam: projection.distance_from_cam,
            coordinates_3d: projection.coordinates_3d,
        }
    }
}

/// The `pose` command of `POST /`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PoseCommand {
    /// The object to move.
    pub name: String,
    /// The new location.
    #[serde(default)]
    pub location: Option<[f64; 3]>,
    /// The new XYZ Euler rotation in radians.
    #[serde(default)]
    pub rotation: Option<[f64; 3]>,
}

/// The `render` command of `POST /`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RenderCommand {
    /// Render the color pass.
    #[serde(default)]
    pub render: bool,
    /// Render the annotation mask.
    #[serde(default)]
    pub annotation: bool,
    /// Render the depth map.
    #[serde(default)]
    pub depth: bool,
}
