use bat_3d::camera::PinholeCamera;
use bat_image::{Image, ImageSize};

use crate::error::SceneError;

/// The kind of image a render produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPass {
    /// The shaded image of the scene.
    Color,
    /// Mask colors of the annotation classes on an opaque black background.
    Annotation,
    /// Distance to the camera in the color channels.
    Depth,
}

/// An object as seen by a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderObject {
    /// The name of the object.
    pub name: String,
    /// The vertices of the object in world coordinates.
    pub world_vertices: Vec<[f64; 3]>,
    /// The shade used by the color pass.
    pub albedo: [f32; 4],
    /// The mask color used by the annotation pass.
    pub color: [f32; 4],
    /// The pass index of the object's class.
    pub pass_index: u32,
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    /// The size of the output image.
    pub size: ImageSize,
    /// The undistorted camera.
    pub camera: PinholeCamera,
    /// The objects to draw.
    pub objects: Vec<RenderObject>,
}

/// Produces pixel buffers from a scene.
///
/// Implementations draw the undistorted view; the scene applies the lens
/// distortion afterwards.
pub trait Renderer {
    /// Render one pass of a frame.
    ///
    /// # Arguments
    ///
    /// * `frame` - The camera and objects to draw.
    /// * `pass` - The kind of image to produce.
    ///
    /// # Returns
    ///
    /// An RGBA image of `frame.size` with samples in `[0, 1]`, except for the
    /// depth pass which holds distances.
    fn render(&self, frame: &RenderFrame, pass: RenderPass) -> Result<Image<f32, 4>, SceneError>;
}

/// A headless renderer that splats every vertex onto its nearest pixel.
///
/// Closer vertices win. Each vertex covers a square of `2 * radius + 1` pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointSplatRenderer {
    /// Half size of the square drawn for each vertex.
    pub radius: usize,
}

impl PointSplatRenderer {
    /// Create a renderer drawing squares of `2 * radius + 1` pixels.
    pub fn new(radius: usize) -> Self {
        Self { radius }
    }
}

impl Renderer for PointSplatRenderer {
    fn render(&self, frame: &RenderFrame, pass: RenderPass) -> Result<Image<f32, 4>, SceneError> {
        let size = frame.size;
        let background = match pass {
            RenderPass::Color | RenderPass::Depth => [0.0; 4],
            RenderPass::Annotation => [0.0, 0.0, 0.0, 1.0],
        };

        let mut image = Image::<f32, 4>::from_fn(size, |_, _| background);
        let mut zbuffer = vec![f64::INFINITY; size.area()];
        let r = self.radius as i64;

        for obj in frame.objects.iter() {
            for p in frame.camera.project_points(&obj.world_vertices) {
                let [x, y] = p.pixel;
                if !(x.is_finite() && y.is_finite()) {
                    continue;
                }
                let (cx, cy) = (x.floor() as i64, y.floor() as i64);

                let value = match pass {
                    RenderPass::Color => obj.albedo,
                    RenderPass::Annotation => obj.color,
                    RenderPass::Depth => {
                        let d = p.distance as f32;
                        [d, d, d, 1.0]
                    }
                };

                for py in (cy - r)..=(cy + r) {
                    for px in (cx - r)..=(cx + r) {
                        if px < 0 || py < 0 || px >= size.width as i64 || py >= size.height as i64 {
                            continue;
                        }
                        let (px, py) = (px as usize, py as usize);
                        let idx = py * size.width + px;
                        if p.distance >= zbuffer[idx] {
                            continue;
                        }
                        zbuffer[idx] = p.distance;
                        image.pixel_mut(px, py)?.copy_from_slice(&value);
                    }
                }
            }
        }

        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bat_3d::transforms::RigidTransform;

    fn frame() -> RenderFrame {
        let camera = PinholeCamera {
            pose: RigidTransform::identity(),
            fx: 10.0,
            fy: 10.0,
            px: 4.0,
            py: 3.0,
        };
        let object = |name: &str, z: f64, color: [f32; 4]| RenderObject {
            name: name.to_string(),
            world_vertices: vec![[0.0, 0.0, z]],
            albedo: color,
            color,
            pass_index: 1,
        };
        RenderFrame {
            size: [8, 6].into(),
            camera,
            objects: vec![
                object("Far", -4.0, [0.0, 0.0, 1.0, 1.0]),
                object("Near", -2.0, [1.0, 0.0, 0.0, 1.0]),
                object("Behind", 2.0, [0.0, 1.0, 0.0, 1.0]),
            ],
        }
    }

    #[test]
    fn test_depth_test() -> Result<(), SceneError> {
        let image = PointSplatRenderer::new(0).render(&frame(), RenderPass::Color)?;
        assert_eq!(image.pixel(4, 3)?, &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(image.pixel(0, 0)?, &[0.0, 0.0, 0.0, 0.0]);

        let covered = image
            .as_slice()
            .chunks_exact(4)
            .filter(|p| p[3] > 0.0)
            .count();
        assert_eq!(covered, 1);
        Ok(())
    }

    #[test]
    fn test_annotation_and_depth_pass() -> Result<(), SceneError> {
        let renderer = PointSplatRenderer::new(1);

        let mask = renderer.render(&frame(), RenderPass::Annotation)?;
        assert_eq!(mask.pixel(0, 0)?, &[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(mask.pixel(3, 2)?, &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(mask.pixel(5, 4)?, &[1.0, 0.0, 0.0, 1.0]);

        let depth = renderer.render(&frame(), RenderPass::Depth)?;
        assert_eq!(depth.pixel(4, 3)?, &[2.0, 2.0, 2.0, 1.0]);
        assert_eq!(depth.pixel(7, 5)?, &[0.0; 4]);
        Ok(())
    }
}
