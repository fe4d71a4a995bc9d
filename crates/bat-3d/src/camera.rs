use crate::linalg::distance3;
use crate::transforms::RigidTransform;

/// A pinhole camera placed in the world.
///
/// The camera looks down its local `-Z` axis with `+Y` up, and image rows grow
/// downwards. Focal lengths and the principal point are in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeCamera {
    /// The camera to world transformation.
    pub pose: RigidTransform,
    /// The focal length in the x direction.
    pub fx: f64,
    /// The focal length in the y direction.
    pub fy: f64,
    /// The x coordinate of the principal point.
    pub px: f64,
    /// The y coordinate of the principal point.
    pub py: f64,
}

/// A world point seen by a [`PinholeCamera`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Undistorted pixel coordinates `[x, y]`, NaN if the point is not in front of the camera.
    pub pixel: [f64; 2],
    /// Euclidean distance between the point and the camera center.
    pub distance: f64,
}

impl PinholeCamera {
    /// The position of the camera center in world coordinates.
    pub fn center(&self) -> [f64; 3] {
        self.pose.translation
    }

    /// Project a world point onto the image plane.
    ///
    /// # Example
    ///
    /// ```
    /// use bat_3d::camera::PinholeCamera;
    /// use bat_3d::transforms::RigidTransform;
    ///
    /// let camera = PinholeCamera {
    ///     pose: RigidTransform::identity(),
    ///     fx: 100.0,
    ///     fy: 100.0,
    ///     px: 50.0,
    ///     py: 40.0,
    /// };
    /// let projection = camera.project_point(&[1.0, 1.0, -10.0]);
    /// assert_eq!(projection.pixel, [60.0, 30.0]);
    /// ```
    pub fn project_point(&self, world: &[f64; 3]) -> Projection {
        let p = self.pose.inverse().transform_point(world);
        Projection {
            pixel: self.project_camera_point(&p),
            distance: distance3(world, &self.center()),
        }
    }

    /// Project a batch of world points onto the image plane.
    pub fn project_points(&self, world: &[[f64; 3]]) -> Vec<Projection> {
        let world_to_camera = self.pose.inverse();
        let center = self.center();
        world
            .iter()
            .map(|w| Projection {
                pixel: self.project_camera_point(&world_to_camera.transform_point(w)),
                distance: distance3(w, &center),
            })
            .collect()
    }

    fn project_camera_point(&self, p: &[f64; 3]) -> [f64; 2] {
        let depth = -p[2];
        if !(depth > 0.0) {
            return [f64::NAN, f64::NAN];
        }
        [
            self.fx * p[0] / depth + self.px,
            -self.fy * p[1] / depth + self.py,
        ]
    }
}
