use bat_3d::transforms::RigidTransform;
use serde::{Deserialize, Serialize};

/// The color an object shows in annotation masks when no class claims it.
pub const UNLABELED_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// The shade used for objects in color renders when none is given.
pub const DEFAULT_ALBEDO: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

/// An object of the scene.
///
/// The pose is relative to the parent object, if any. Vertices are in the
/// object's local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// The unique name of the object.
    pub name: String,
    /// The location of the object.
    #[serde(default)]
    pub location: [f64; 3],
    /// The XYZ Euler rotation of the object in radians.
    #[serde(default)]
    pub rotation: [f64; 3],
    /// The name of the parent object.
    #[serde(default)]
    pub parent: Option<String>,
    /// The mesh vertices in object coordinates.
    #[serde(default)]
    pub vertices: Vec<[f64; 3]>,
    /// The shade of the object in color renders.
    #[serde(default = "default_albedo")]
    pub albedo: [f32; 4],
    /// The mask color assigned by the annotation classes.
    #[serde(skip, default = "unlabeled_color")]
    pub color: [f32; 4],
    /// The pass index of the class the object belongs to, 0 for background.
    #[serde(skip)]
    pub pass_index: u32,
}

fn default_albedo() -> [f32; 4] {
    DEFAULT_ALBEDO
}

fn unlabeled_color() -> [f32; 4] {
    UNLABELED_COLOR
}

impl SceneObject {
    /// Create an object at the origin without vertices.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: [0.0; 3],
            rotation: [0.0; 3],
            parent: None,
            vertices: Vec::new(),
            albedo: DEFAULT_ALBEDO,
            color: UNLABELED_COLOR,
            pass_index: 0,
        }
    }

    /// Set the pose of the object.
    pub fn with_pose(mut self, location: [f64; 3], rotation: [f64; 3]) -> Self {
        self.location = location;
        self.rotation = rotation;
        self
    }

    /// Set the parent of the object.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the vertices of the object.
    pub fn with_vertices(mut self, vertices: Vec<[f64; 3]>) -> Self {
        self.vertices = vertices;
        self
    }

    /// The transformation from object to parent coordinates.
    pub fn local_transform(&self) -> RigidTransform {
        RigidTransform::from_location_euler(&self.location, &self.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_defaults() -> Result<(), serde_json::Error> {
        let obj: SceneObject = serde_json::from_str(r#"{"name": "Cube", "location": [1, 2, 3]}"#)?;
        assert_eq!(obj.name, "Cube");
        assert_eq!(obj.location, [1.0, 2.0, 3.0]);
        assert_eq!(obj.rotation, [0.0; 3]);
        assert_eq!(obj.parent, None);
        assert_eq!(obj.albedo, DEFAULT_ALBEDO);
        assert_eq!(obj.color, UNLABELED_COLOR);
        Ok(())
    }

    #[test]
    fn test_local_transform() {
        let obj = SceneObject::new("Empty").with_pose([1.0, 0.0, 0.0], [0.0; 3]);
        assert_eq!(obj.local_transform().transform_point(&[1.0, 1.0, 1.0]), [2.0, 1.0, 1.0]);
    }
}
