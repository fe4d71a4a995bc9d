use bat_image::ImageSize;
use bat_imgproc::calibration::{CameraIntrinsics, DistortionParams};
use serde::{Deserialize, Serialize};

/// Output resolution of the renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Nominal width in pixels.
    pub resolution_x: usize,
    /// Nominal height in pixels.
    pub resolution_y: usize,
    /// Scale applied to the nominal resolution, in percent.
    #[serde(default = "default_resolution_percentage")]
    pub resolution_percentage: usize,
}

fn default_resolution_percentage() -> usize {
    100
}

impl RenderSettings {
    /// Render at the given resolution without scaling.
    pub fn new(resolution_x: usize, resolution_y: usize) -> Self {
        Self {
            resolution_x,
            resolution_y,
            resolution_percentage: 100,
        }
    }

    /// The size of the rendered images after scaling.
    ///
    /// # Example
    ///
    /// ```
    /// use bat_scene::camera::RenderSettings;
    ///
    /// let settings = RenderSettings { resolution_x: 1920, resolution_y: 1080, resolution_percentage: 50 };
    /// assert_eq!(settings.size(), [960, 540].into());
    /// ```
    pub fn size(&self) -> ImageSize {
        ImageSize {
            width: self.resolution_x * self.resolution_percentage / 100,
            height: self.resolution_y * self.resolution_percentage / 100,
        }
    }
}

/// Lens parameters derived from the camera settings, in the units a host
/// camera or a movie clip tracker expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensSettings {
    /// Focal length in millimeters.
    pub focal_length_mm: f64,
    /// Sensor width in millimeters.
    pub sensor_width_mm: f64,
    /// Pixel aspect ratio `fx / fy`.
    pub pixel_aspect: f64,
    /// Principal point in normalized device coordinates.
    pub principal_point: (f64, f64),
}

/// The calibrated camera of the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    /// Intrinsic parameters in pixels.
    pub intrinsics: CameraIntrinsics,
    /// Lens distortion coefficients.
    pub distortion: DistortionParams,
    /// Oversampling factor used to build the inverse distortion map.
    pub upscale_factor: usize,
}

impl CameraSettings {
    /// Default camera for a render of the given size.
    pub fn from_resolution(size: ImageSize) -> Self {
        Self {
            intrinsics: CameraIntrinsics::from_image_size(size),
            distortion: DistortionParams::default(),
            upscale_factor: 1,
        }
    }

    /// Derive the lens parameters for the given render settings.
    ///
    /// The focal length is relative to the nominal width, the principal point
    /// to the scaled size.
    pub fn lens(&self, render: &RenderSettings) -> LensSettings {
        LensSettings {
            focal_length_mm: self.intrinsics.focal_length_mm(render.resolution_x),
            sensor_width_mm: self.intrinsics.sensor_width_mm,
            pixel_aspect: self.intrinsics.pixel_aspect(),
            principal_point: self.intrinsics.principal_point_ndc(render.size()),
        }
    }

    /// Return a copy of the settings with `update` applied.
    pub fn updated(&self, update: &CameraUpdate) -> Self {
        let mut settings = *self;
        let intr = &mut settings.intrinsics;
        let dist = &mut settings.distortion;

        let fields = [
            (update.sensor_width, &mut intr.sensor_width_mm),
            (update.fx, &mut intr.fx),
            (update.fy, &mut intr.fy),
            (update.cx, &mut intr.px),
            (update.cy, &mut intr.py),
            (update.p1, &mut dist.p1),
            (update.p2, &mut dist.p2),
            (update.k1, &mut dist.k1),
            (update.k2, &mut dist.k2),
            (update.k3, &mut dist.k3),
            (update.k4, &mut dist.k4),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }

        if let Some(upscale_factor) = update.upscale_factor {
            settings.upscale_factor = upscale_factor;
        }
        settings
    }
}

/// A partial update of the camera, as sent by remote clients.
///
/// Missing fields keep their current value. `cx` and `cy` are the principal
/// point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraUpdate {
    /// Sensor width in millimeters.
    pub sensor_width: Option<f64>,
    /// Focal length in the x direction.
    pub fx: Option<f64>,
    /// Focal length in the y direction.
    pub fy: Option<f64>,
    /// x coordinate of the principal point.
    pub cx: Option<f64>,
    /// y coordinate of the principal point.
    pub cy: Option<f64>,
    /// First tangential coefficient.
    pub p1: Option<f64>,
    /// Second tangential coefficient.
    pub p2: Option<f64>,
    /// First radial coefficient.
    pub k1: Option<f64>,
    /// Second radial coefficient.
    pub k2: Option<f64>,
    /// Third radial coefficient.
    pub k3: Option<f64>,
    /// Fourth radial coefficient.
    pub k4: Option<f64>,
    /// Oversampling factor of the inverse distortion map.
    pub upscale_factor: Option<usize>,
}
