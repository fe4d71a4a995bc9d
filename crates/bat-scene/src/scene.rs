use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use bat_3d::camera::PinholeCamera;
use bat_3d::transforms::RigidTransform;
use bat_image::Image;
use bat_imgproc::calibration::distortion::distort_point;
use bat_imgproc::calibration::inverse_map::{InverseDistortionMap, InverseMapBuilder};
use bat_imgproc::interpolation::apply_inverse_map;
use bat_io::calibration::read_calibration;
use bat_io::npy::write_image_npy_f32;
use bat_io::png::write_image_png_rgba_f32;
use bat_io::IoError;
use serde::{Deserialize, Serialize};

use crate::annotation::{self, AnnotationClass, AnnotationReport, ClassRegistry};
use crate::camera::{CameraSettings, CameraUpdate, LensSettings, RenderSettings};
use crate::collection::{Collection, CollectionTree, ROOT_COLLECTION_NAME};
use crate::error::SceneError;
use crate::object::SceneObject;
use crate::render::{PointSplatRenderer, RenderFrame, RenderObject, RenderPass, Renderer};
use crate::vertices::{VertexProjection, VertexSelection};

/// The default directory renders are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "renders";

/// A serializable description of a scene.
///
/// Collections that are not the child of another collection are linked below
/// the root collection, and so are objects not linked to any collection.
///
/// # Example
///
/// ```
/// use bat_scene::{Scene, SceneDescription};
///
/// let description: SceneDescription = serde_json::from_str(r#"{
///     "render": {"resolution_x": 64, "resolution_y": 48},
///     "camera": "Camera",
///     "objects": [
///         {"name": "Camera", "location": [0, 0, 10]},
///         {"name": "Cube", "vertices": [[0, 0, 0]]}
///     ],
///     "collections": [{"name": "Cubes", "objects": ["Cube"]}],
///     "classes": [{"name": "Cube", "collection": "Cubes", "mask_color": [1, 0, 0, 1]}]
/// }"#).unwrap();
///
/// let scene = Scene::from_description(description).unwrap();
/// assert_eq!(scene.camera_name(), Some("Camera"));
/// assert!(scene.distortion_map().is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDescription {
    /// The output resolution.
    pub render: RenderSettings,
    /// The name of the camera object.
    #[serde(default)]
    pub camera: Option<String>,
    /// Overrides of the default camera parameters.
    #[serde(default)]
    pub camera_parameters: Option<CameraUpdate>,
    /// The current frame.
    #[serde(default)]
    pub frame: i64,
    /// The objects of the scene.
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    /// The collections of the scene.
    #[serde(default)]
    pub collections: Vec<Collection>,
    /// The annotation classes, without the background class.
    #[serde(default)]
    pub classes: Vec<AnnotationClass>,
    /// The directory renders are written to.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// The state of the annotation tool: objects, camera, annotation classes and
/// the inverse distortion map of the lens.
///
/// Every operation either succeeds or leaves the scene unchanged.
pub struct Scene {
    objects: BTreeMap<String, SceneObject>,
    collections: CollectionTree,
    frame: i64,
    render_settings: RenderSettings,
    camera: Option<String>,
    camera_settings: CameraSettings,
    distortion_map: Option<InverseDistortionMap>,
    classes: ClassRegistry,
    output_dir: PathBuf,
    renderer: Box<dyn Renderer>,
}

impl Scene {
    /// Create an empty scene rendering at the given resolution.
    ///
    /// The camera parameters default to [`CameraSettings::from_resolution`]
    /// and no distortion map is generated yet.
    pub fn new(render_settings: RenderSettings) -> Self {
        Self {
            objects: BTreeMap::new(),
            collections: CollectionTree::new(),
            frame: 0,
            render_settings,
            camera: None,
            camera_settings: CameraSettings::from_resolution(render_settings.size()),
            distortion_map: None,
            classes: ClassRegistry::new(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            renderer: Box::new(PointSplatRenderer::default()),
        }
    }

    /// Build a scene from its description and generate the distortion map.
    pub fn from_description(description: SceneDescription) -> Result<Self, SceneError> {
        let mut scene = Scene::new(description.render);
        scene.frame = description.frame;
        if let Some(dir) = description.output_dir {
            scene.output_dir = dir;
        }

        for obj in description.objects {
            if scene.objects.contains_key(&obj.name) {
                return Err(SceneError::InvalidDescription(format!(
                    "Duplicate object '{}'.",
                    obj.name
                )));
            }
            scene.objects.insert(obj.name.clone(), obj);
        }

        let children = description
            .collections
            .iter()
            .flat_map(|c| c.children.iter().cloned())
            .collect::<HashSet<_>>();
        let mut orphans = Vec::new();
        for collection in description.collections {
            if collection.name != ROOT_COLLECTION_NAME && !children.contains(&collection.name) {
                orphans.push(collection.name.clone());
            }
            scene.collections.insert_unlinked(collection);
        }
        for name in orphans {
            if let Some(collection) = scene.collections.get(&name).cloned() {
                scene.collections.insert(ROOT_COLLECTION_NAME, collection)?;
            }
        }

        let linked = scene
            .collections
            .all_objects(ROOT_COLLECTION_NAME)?
            .into_iter()
            .map(str::to_string)
            .collect::<HashSet<_>>();
        let unlinked = scene
            .objects
            .keys()
            .filter(|name| !linked.contains(*name))
            .cloned()
            .collect::<Vec<_>>();
        for name in unlinked {
            scene.collections.link_object(ROOT_COLLECTION_NAME, &name)?;
        }

        for class in description.classes {
            scene.classes.add_class(class)?;
        }

        if let Some(camera) = description.camera {
            scene.set_camera(camera)?;
        }
        if let Some(update) = description.camera_parameters {
            scene.camera_settings = scene.camera_settings.updated(&update);
        }
        scene.regenerate_distortion_map()?;

        Ok(scene)
    }

    /// Read a [`SceneDescription`] JSON file and build the scene.
    pub fn load(file_path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let file_path = file_path.as_ref();
        if !file_path.is_file() {
            return Err(IoError::FileDoesNotExist(file_path.to_path_buf()).into());
        }

        let contents = fs::read_to_string(file_path).map_err(IoError::from)?;
        let description = serde_json::from_str::<SceneDescription>(&contents)
            .map_err(|e| SceneError::InvalidDescription(e.to_string()))?;

        log::info!("loading scene from {}", file_path.display());
        Self::from_description(description)
    }

    /// Set the directory renders are written to.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Replace the renderer.
    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// The directory renders are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Add an object and link it to the root collection.
    ///
    /// An object with the same name is replaced.
    pub fn add_object(&mut self, obj: SceneObject) -> Result<(), SceneError> {
        self.collections.link_object(ROOT_COLLECTION_NAME, &obj.name)?;
        self.objects.insert(obj.name.clone(), obj);
        Ok(())
    }

    /// Get an object by name.
    pub fn object(&self, name: &str) -> Result<&SceneObject, SceneError> {
        self.objects
            .get(name)
            .ok_or_else(|| SceneError::ObjectNotFound(name.to_string()))
    }

    /// Iterate over all objects, sorted by name.
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values()
    }

    /// The collection hierarchy.
    pub fn collections(&self) -> &CollectionTree {
        &self.collections
    }

    /// The collection hierarchy, for editing.
    pub fn collections_mut(&mut self) -> &mut CollectionTree {
        &mut self.collections
    }

    /// Move an object.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the object.
    /// * `location` - The new location, or `None` to keep the current one.
    /// * `rotation` - The new XYZ Euler rotation in radians, or `None` to keep the current one.
    pub fn set_object_pose(
        &mut self,
        name: &str,
        location: Option<[f64; 3]>,
        rotation: Option<[f64; 3]>,
    ) -> Result<(), SceneError> {
        let obj = self
            .objects
            .get_mut(name)
            .ok_or_else(|| SceneError::ObjectNotFound(name.to_string()))?;
        if let Some(location) = location {
            obj.location = location;
        }
        if let Some(rotation) = rotation {
            obj.rotation = rotation;
        }
        Ok(())
    }

    /// Find the top most ancestor of an object.
    ///
    /// # Errors
    ///
    /// If an object of the chain does not exist or the parents form a cycle.
    pub fn find_root(&self, name: &str) -> Result<&str, SceneError> {
        let mut visited = HashSet::new();
        let mut obj = self.object(name)?;
        while let Some(parent) = obj.parent.as_deref() {
            if !visited.insert(obj.name.as_str()) {
                return Err(SceneError::ParentCycle(name.to_string()));
            }
            obj = self.object(parent)?;
        }
        Ok(obj.name.as_str())
    }

    /// The transformation from object to world coordinates.
    pub fn world_transform(&self, name: &str) -> Result<RigidTransform, SceneError> {
        let mut visited = HashSet::new();
        let mut obj = self.object(name)?;
        let mut transform = obj.local_transform();
        while let Some(parent) = obj.parent.as_deref() {
            if !visited.insert(obj.name.as_str()) {
                return Err(SceneError::ParentCycle(name.to_string()));
            }
            obj = self.object(parent)?;
            transform = obj.local_transform().compose(&transform);
        }
        Ok(transform)
    }

    /// The current frame.
    pub fn frame(&self) -> i64 {
        self.frame
    }

    /// Jump to a frame.
    pub fn set_frame(&mut self, frame: i64) {
        self.frame = frame;
    }

    /// The output resolution.
    pub fn render_settings(&self) -> &RenderSettings {
        &self.render_settings
    }

    /// The name of the camera object.
    pub fn camera_name(&self) -> Option<&str> {
        self.camera.as_deref()
    }

    /// Use an object as the camera.
    pub fn set_camera(&mut self, name: impl Into<String>) -> Result<(), SceneError> {
        let name = name.into();
        self.object(&name)?;
        self.camera = Some(name);
        Ok(())
    }

    /// The calibrated camera parameters.
    pub fn camera_settings(&self) -> &CameraSettings {
        &self.camera_settings
    }

    /// The lens parameters a host camera needs to match the calibration.
    pub fn lens(&self) -> LensSettings {
        self.camera_settings.lens(&self.render_settings)
    }

    /// Apply a partial camera update and regenerate the distortion map.
    ///
    /// If the map cannot be built the camera keeps its previous parameters.
    pub fn update_camera(&mut self, update: &CameraUpdate) -> Result<(), SceneError> {
        let settings = self.camera_settings.updated(update);
        let map = self.build_distortion_map(&settings)?;
        self.camera_settings = settings;
        self.distortion_map = Some(map);
        Ok(())
    }

    /// Import a calibration file and regenerate the distortion map.
    ///
    /// An invalid file leaves the camera untouched.
    pub fn import_calibration(&mut self, file_path: impl AsRef<Path>) -> Result<(), SceneError> {
        let calibration = read_calibration(file_path)?;

        let mut settings = self.camera_settings;
        calibration.apply(&mut settings.intrinsics, &mut settings.distortion);
        let map = self.build_distortion_map(&settings)?;

        self.camera_settings = settings;
        self.distortion_map = Some(map);
        Ok(())
    }

    /// Rebuild the inverse distortion map from the current camera parameters.
    pub fn regenerate_distortion_map(&mut self) -> Result<&InverseDistortionMap, SceneError> {
        let map = self.build_distortion_map(&self.camera_settings)?;
        let map: &InverseDistortionMap = self.distortion_map.insert(map);
        Ok(map)
    }

    fn build_distortion_map(
        &self,
        settings: &CameraSettings,
    ) -> Result<InverseDistortionMap, SceneError> {
        let now = Instant::now();
        let size = self.render_settings.size();
        let map = InverseMapBuilder::new()
            .upscale_factor(settings.upscale_factor)
            .build(size, &settings.intrinsics, &settings.distortion)?;

        log::info!(
            "generated distortion map {} (upscale factor {}, {} missing) in {:?}",
            size,
            settings.upscale_factor,
            map.num_missing(),
            now.elapsed()
        );
        Ok(map)
    }

    /// The inverse distortion map, if generated.
    pub fn distortion_map(&self) -> Option<&InverseDistortionMap> {
        self.distortion_map.as_ref()
    }

    /// Apply the lens distortion to an undistorted render.
    ///
    /// # Errors
    ///
    /// If the map was not generated or the image does not have the render size.
    pub fn distort_image(&self, image: &Image<f32, 4>) -> Result<Image<f32, 4>, SceneError> {
        let map = self
            .distortion_map
            .as_ref()
            .ok_or(SceneError::NoDistortionMap)?;
        Ok(apply_inverse_map(image, map)?)
    }

    /// The undistorted pinhole model of the scene camera.
    pub fn pinhole_camera(&self) -> Result<PinholeCamera, SceneError> {
        let name = self.camera.as_deref().ok_or(SceneError::NoCamera)?;
        let intrinsics = &self.camera_settings.intrinsics;
        Ok(PinholeCamera {
            pose: self.world_transform(name)?,
            fx: intrinsics.fx,
            fy: intrinsics.fy_floored(),
            px: intrinsics.px,
            py: intrinsics.py,
        })
    }

    /// Project vertices of an object into the distorted image.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the object.
    /// * `selection` - The vertices to project.
    ///
    /// # Returns
    ///
    /// The distorted pixel coordinates, the distance to the camera and the
    /// world coordinates of each selected vertex.
    pub fn project_vertices(
        &self,
        name: &str,
        selection: &VertexSelection,
    ) -> Result<VertexProjection, SceneError> {
        let obj = self.object(name)?;
        let indices = selection.resolve(name, obj.vertices.len())?;
        let camera = self.pinhole_camera()?;
        let transform = self.world_transform(name)?;

        let coordinates_3d = indices
            .iter()
            .map(|&i| transform.transform_point(&obj.vertices[i]))
            .collect::<Vec<_>>();

        let settings = &self.camera_settings;
        let (coordinates_2d, distance_from_cam) = camera
            .project_points(&coordinates_3d)
            .into_iter()
            .map(|p| {
                let [x, y] = p.pixel;
                let (xd, yd) = distort_point(y, x, &settings.intrinsics, &settings.distortion);
                ([yd, xd], p.distance)
            })
            .unzip();

        Ok(VertexProjection {
            coordinates_2d,
            distance_from_cam,
            coordinates_3d,
        })
    }

    /// The annotation classes.
    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// The annotation classes, for editing.
    pub fn classes_mut(&mut self) -> &mut ClassRegistry {
        &mut self.classes
    }

    /// Assign the mask colors of all objects from the annotation classes.
    pub fn assign_mask_colors(&mut self) -> AnnotationReport {
        annotation::assign_mask_colors(&mut self.objects, &self.collections, &self.classes)
    }

    /// Collect what the renderer needs for the current state.
    pub fn render_frame(&self) -> Result<RenderFrame, SceneError> {
        self.render_frame_of(&self.objects)
    }

    // the render frame of `objects`, placed with the poses of this scene
    fn render_frame_of(
        &self,
        objects: &BTreeMap<String, SceneObject>,
    ) -> Result<RenderFrame, SceneError> {
        let camera = self.pinhole_camera()?;
        let objects = objects
            .values()
            .filter(|obj| Some(obj.name.as_str()) != self.camera.as_deref())
            .map(|obj| {
                let transform = self.world_transform(&obj.name)?;
                Ok(RenderObject {
                    name: obj.name.clone(),
                    world_vertices: obj
                        .vertices
                        .iter()
                        .map(|v| transform.transform_point(v))
                        .collect(),
                    albedo: obj.albedo,
                    color: obj.color,
                    pass_index: obj.pass_index,
                })
            })
            .collect::<Result<Vec<_>, SceneError>>()?;

        Ok(RenderFrame {
            size: self.render_settings.size(),
            camera,
            objects,
        })
    }

    /// Render one pass of the current frame, distorted when the map exists.
    pub fn render_pass(&self, pass: RenderPass) -> Result<Image<f32, 4>, SceneError> {
        self.render_frame_pass(&self.render_frame()?, pass)
    }

    fn render_frame_pass(
        &self,
        frame: &RenderFrame,
        pass: RenderPass,
    ) -> Result<Image<f32, 4>, SceneError> {
        let image = self.renderer.render(frame, pass)?;
        match self.distortion_map {
            Some(_) => self.distort_image(&image),
            None => Ok(image),
        }
    }

    /// Render the current frame.
    ///
    /// # Arguments
    ///
    /// * `write` - Also write the image to `{output_dir}/{frame:04}.png`.
    pub fn render(&self, write: bool) -> Result<Image<f32, 4>, SceneError> {
        let image = self.render_pass(RenderPass::Color)?;
        if write {
            let path = self.output_path(&format!("{:04}.png", self.frame))?;
            write_image_png_rgba_f32(&path, &image)?;
            log::info!("wrote render to {}", path.display());
        }
        Ok(image)
    }

    /// Assign mask colors and render the annotation mask of the current frame.
    ///
    /// The new mask colors are kept only if the render and the writes succeed.
    ///
    /// # Arguments
    ///
    /// * `write` - Also write the mask to `{output_dir}/{frame:04}_annotation.png`
    ///   and the class names to `{output_dir}/{frame:04}_class_info.json`.
    pub fn render_annotation(
        &mut self,
        write: bool,
    ) -> Result<(Image<f32, 4>, AnnotationReport), SceneError> {
        let mut objects = self.objects.clone();
        let report = annotation::assign_mask_colors(&mut objects, &self.collections, &self.classes);
        let frame = self.render_frame_of(&objects)?;
        let image = self.render_frame_pass(&frame, RenderPass::Annotation)?;
        if write {
            let path = self.output_path(&format!("{:04}_annotation.png", self.frame))?;
            write_image_png_rgba_f32(&path, &image)?;

            let info_path = self.output_path(&format!("{:04}_class_info.json", self.frame))?;
            fs::write(&info_path, format!("{:#}", self.classes.class_info()))
                .map_err(IoError::from)?;
            log::info!("wrote annotation to {}", path.display());
        }
        self.objects = objects;
        Ok((image, report))
    }

    /// Render the distance to the camera for the current frame.
    ///
    /// Pixels without geometry are zero.
    ///
    /// # Arguments
    ///
    /// * `write` - Also write the distances as a `(height, width)` float32
    ///   array to `{output_dir}/{frame:04}_depth_map.npy`.
    pub fn render_depth(&self, write: bool) -> Result<Image<f32, 1>, SceneError> {
        let depth = self.render_pass(RenderPass::Depth)?.channel(0)?;
        if write {
            let path = self.output_path(&format!("{:04}_depth_map.npy", self.frame))?;
            write_image_npy_f32(&path, &depth)?;
            log::info!("wrote depth map to {}", path.display());
        }
        Ok(depth)
    }

    fn output_path(&self, file_name: &str) -> Result<PathBuf, SceneError> {
        fs::create_dir_all(&self.output_dir).map_err(IoError::from)?;
        Ok(self.output_dir.join(file_name))
    }
}
