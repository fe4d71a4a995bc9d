use bat_scene::camera::CameraUpdate;
use bat_scene::vertices::{VertexProjection, VertexSelection};
use bat_scene::{Scene, SceneError};

/// The operations remote clients can trigger on the application state.
///
/// Every method runs on the main thread.
pub trait RemoteHost: 'static {
    /// Apply a partial camera update.
    fn update_camera(&mut self, update: &CameraUpdate) -> Result<(), SceneError>;

    /// Move an object; `None` keeps the current value.
    fn set_object_pose(
        &mut self,
        name: &str,
        location: Option<[f64; 3]>,
        rotation: Option<[f64; 3]>,
    ) -> Result<(), SceneError>;

    /// The location and XYZ Euler rotation of an object.
    fn object_pose(&self, name: &str) -> Result<([f64; 3], [f64; 3]), SceneError>;

    /// The current frame.
    fn frame(&self) -> i64;

    /// Jump to a frame.
    fn set_frame(&mut self, frame: i64);

    /// Project vertices of an object into the distorted image.
    fn project_vertices(
        &self,
        name: &str,
        selection: &VertexSelection,
    ) -> Result<VertexProjection, SceneError>;

    /// Render the current frame to disk.
    fn render(&mut self) -> Result<(), SceneError>;

    /// Render the annotation mask of the current frame to disk.
    fn render_annotation(&mut self) -> Result<(), SceneError>;

    /// Render the depth map of the current frame to disk.
    fn render_depth(&mut self) -> Result<(), SceneError>;
}

impl RemoteHost for Scene {
    fn update_camera(&mut self, update: &CameraUpdate) -> Result<(), SceneError> {
        Scene::update_camera(self, update)
    }

    fn set_object_pose(
        &mut self,
        name: &str,
        location: Option<[f64; 3]>,
        rotation: Option<[f64; 3]>,
    ) -> Result<(), SceneError> {
        Scene::set_object_pose(self, name, location, rotation)
    }

    fn object_pose(&self, name: &str) -> Result<([f64; 3], [f64; 3]), SceneError> {
        let obj = self.object(name)?;
        Ok((obj.location, obj.rotation))
    }

    fn frame(&self) -> i64 {
        Scene::frame(self)
    }

    fn set_frame(&mut self, frame: i64) {
        Scene::set_frame(self, frame)
    }

    fn project_vertices(
        &self,
        name: &str,
        selection: &VertexSelection,
    ) -> Result<VertexProjection, SceneError> {
        Scene::project_vertices(self, name, selection)
    }

    fn render(&mut self) -> Result<(), SceneError> {
        Scene::render(self, true).map(|_| ())
    }

    fn render_annotation(&mut self) -> Result<(), SceneError> {
        let (_, report) = Scene::render_annotation(self, true)?;
        if !report.is_complete() {
            log::warn!(
                "annotation of frame {} is incomplete: missing collections {:?}, palette exhausted: {}",
                self.frame(),
                report.missing_collections,
                report.palette_exhausted
            );
        }
        Ok(())
    }

    fn render_depth(&mut self) -> Result<(), SceneError> {
        Scene::render_depth(self, true).map(|_| ())
    }
}
