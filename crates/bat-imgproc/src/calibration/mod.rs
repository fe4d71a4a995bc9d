/// lens distortion model.
pub mod distortion;

/// inverse distortion map construction.
pub mod inverse_map;

use bat_image::ImageSize;

/// Nominal sensor width in millimeters used when no calibration is known.
pub const DEFAULT_SENSOR_WIDTH_MM: f64 = 36.0;

/// Nominal focal length in millimeters used when no calibration is known.
pub const DEFAULT_FOCAL_LENGTH_MM: f64 = 24.0;

/// Lower bound applied to `fy` wherever it is used as a divisor.
pub const FY_EPSILON: f64 = 1e-5;

/// Represents the intrinsic parameters of a pinhole camera
///
/// # Fields
///
/// * `sensor_width_mm` - The physical sensor width in millimeters
/// * `fx` - The focal length in the x direction, in pixels
/// * `fy` - The focal length in the y direction, in pixels
/// * `px` - The x coordinate of the principal point, in pixels
/// * `py` - The y coordinate of the principal point, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    /// The physical sensor width in millimeters
    pub sensor_width_mm: f64,
    /// The focal length in the x direction
    pub fx: f64,
    /// The focal length in the y direction
    pub fy: f64,
    /// The x coordinate of the principal point
    pub px: f64,
    /// The y coordinate of the principal point
    pub py: f64,
}

impl CameraIntrinsics {
    /// Default intrinsics for a render of the given size.
    ///
    /// Uses a 24mm lens on a 36mm wide sensor with square pixels and the
    /// principal point at the image center.
    ///
    /// # Example
    ///
    /// ```
    /// use bat_imgproc::calibration::CameraIntrinsics;
    ///
    /// let intrinsics = CameraIntrinsics::from_image_size([1920, 1080].into());
    /// assert_eq!(intrinsics.fx, 1280.0);
    /// assert_eq!(intrinsics.px, 960.0);
    /// assert_eq!(intrinsics.py, 540.0);
    /// ```
    pub fn from_image_size(size: ImageSize) -> Self {
        let f = size.width as f64 * DEFAULT_FOCAL_LENGTH_MM / DEFAULT_SENSOR_WIDTH_MM;
        Self {
            sensor_width_mm: DEFAULT_SENSOR_WIDTH_MM,
            fx: f,
            fy: f,
            px: size.width as f64 / 2.0,
            py: size.height as f64 / 2.0,
        }
    }

    /// Focal length in millimeters for an image `width` pixels wide.
    pub fn focal_length_mm(&self, width: usize) -> f64 {
        self.fx / width as f64 * self.sensor_width_mm
    }

    /// `fy`, floored to [`FY_EPSILON`] when it is not strictly positive.
    pub fn fy_floored(&self) -> f64 {
        if self.fy > 0.0 {
            self.fy
        } else {
            FY_EPSILON
        }
    }

    /// Pixel aspect ratio `fx / fy`, never below 0.1.
    pub fn pixel_aspect(&self) -> f64 {
        (self.fx / self.fy_floored()).max(0.1)
    }

    /// Principal point in normalized device coordinates (-1..1 across the image).
    pub fn principal_point_ndc(&self, size: ImageSize) -> (f64, f64) {
        (
            self.px / (size.width as f64 / 2.0) - 1.0,
            self.py / (size.height as f64 / 2.0) - 1.0,
        )
    }

    /// The 3x3 camera matrix.
    pub fn camera_matrix(&self) -> [[f64; 3]; 3] {
        [
            [self.fx, 0.0, self.px],
            [0.0, self.fy, self.py],
            [0.0, 0.0, 1.0],
        ]
    }
}

/// Represents the Brown-Conrady distortion parameters of a camera
///
/// All coefficients act on normalized image coordinates.
///
/// # Fields
///
/// * `p1` - The first tangential distortion coefficient
/// * `p2` - The second tangential distortion coefficient
/// * `k1` - The first radial distortion coefficient
/// * `k2` - The second radial distortion coefficient
/// * `k3` - The third radial distortion coefficient
/// * `k4` - The fourth radial distortion coefficient
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DistortionParams {
    /// The first tangential distortion coefficient
    pub p1: f64,
    /// The second tangential distortion coefficient
    pub p2: f64,
    /// The first radial distortion coefficient
    pub k1: f64,
    /// The second radial distortion coefficient
    pub k2: f64,
    /// The third radial distortion coefficient
    pub k3: f64,
    /// The fourth radial distortion coefficient
    pub k4: f64,
}

impl DistortionParams {
    /// Whether every coefficient is zero, i.e. the lens is an ideal pinhole.
    pub fn is_identity(&self) -> bool {
        [self.p1, self.p2, self.k1, self.k2, self.k3, self.k4]
            .iter()
            .all(|c| *c == 0.0)
    }
}
