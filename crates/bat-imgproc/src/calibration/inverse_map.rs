use std::time::Instant;

use bat_image::{Image, ImageSize};

use super::{distortion::distort_points, CameraIntrinsics, DistortionParams};
use crate::error::DistortionMapError;
use crate::interpolation::{fill_missing_values, grid::oversampled_meshgrid};

/// A dense per-pixel lookup table from distorted to undistorted coordinates.
///
/// For every pixel of the distorted image the map stores the `(y, x)`
/// coordinate of the undistorted image that lands on it, plus whether that
/// coordinate was hit directly by a distorted sample (`valid`) or estimated by
/// interpolation. Estimation can fail for extreme distortions, in which case
/// the coordinate is NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct InverseDistortionMap {
    source: Image<f64, 2>,
    valid: Image<bool, 1>,
}

impl InverseDistortionMap {
    /// Create a map from its source coordinates and validity mask.
    ///
    /// # Errors
    ///
    /// If the two images differ in size.
    pub fn new(source: Image<f64, 2>, valid: Image<bool, 1>) -> Result<Self, DistortionMapError> {
        if source.size() != valid.size() {
            return Err(DistortionMapError::SizeMismatch(source.size(), valid.size()));
        }
        Ok(Self { source, valid })
    }

    /// The size of the distorted image the map was built for.
    pub fn size(&self) -> ImageSize {
        self.source.size()
    }

    /// The `(y, x)` source coordinates of every pixel.
    pub fn source_coordinates(&self) -> &Image<f64, 2> {
        &self.source
    }

    /// The mask of pixels that were hit directly by a distorted sample.
    pub fn valid_mask(&self) -> &Image<bool, 1> {
        &self.valid
    }

    /// The `[y, x]` source coordinate of the pixel at `(x, y)`.
    ///
    /// Returns `None` if the pixel is outside the map.
    pub fn source(&self, x: usize, y: usize) -> Option<[f64; 2]> {
        self.source.pixel(x, y).ok().map(|yx| [yx[0], yx[1]])
    }

    /// Whether the pixel at `(x, y)` was hit directly by a distorted sample.
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        self.valid.get_pixel(x, y, 0).unwrap_or(false)
    }

    /// Number of pixels hit directly by a distorted sample.
    pub fn num_valid(&self) -> usize {
        self.valid.as_slice().iter().filter(|v| **v).count()
    }

    /// Number of pixels whose source coordinate could not be estimated.
    pub fn num_missing(&self) -> usize {
        self.source
            .as_slice()
            .chunks_exact(2)
            .filter(|yx| yx[0].is_nan() || yx[1].is_nan())
            .count()
    }

    /// Encode the map as a four channel image `(source_y, source_x, valid, 1)`.
    ///
    /// This is the layout used when the map is stored as an image file.
    pub fn to_rgba(&self) -> Image<f32, 4> {
        let mut rgba = Image::from_size_val(self.size(), 0.0f32);
        rgba.as_slice_mut()
            .chunks_exact_mut(4)
            .zip(self.source.as_slice().chunks_exact(2))
            .zip(self.valid.as_slice())
            .for_each(|((dst, yx), valid)| {
                dst[0] = yx[0] as f32;
                dst[1] = yx[1] as f32;
                dst[2] = if *valid { 1.0 } else { 0.0 };
                dst[3] = 1.0;
            });
        rgba
    }

    /// Decode a map from the layout produced by [`InverseDistortionMap::to_rgba`].
    pub fn from_rgba(rgba: &Image<f32, 4>) -> Self {
        let mut source = Image::from_size_val(rgba.size(), 0.0f64);
        source
            .as_slice_mut()
            .chunks_exact_mut(2)
            .zip(rgba.as_slice().chunks_exact(4))
            .for_each(|(yx, px)| {
                yx[0] = px[0] as f64;
                yx[1] = px[1] as f64;
            });

        let valid = rgba.channel(2).map_or_else(
            |_| Image::from_size_val(rgba.size(), false),
            |ch| ch.map(|v| *v > 0.5),
        );

        Self { source, valid }
    }
}

/// Options for building an [`InverseDistortionMap`].
///
/// # Example
///
/// ```
/// use bat_imgproc::calibration::{inverse_map::InverseMapBuilder, CameraIntrinsics, DistortionParams};
///
/// let size = [32, 24].into();
/// let intrinsics = CameraIntrinsics::from_image_size(size);
/// let distortion = DistortionParams { k1: -0.05, ..Default::default() };
///
/// let map = InverseMapBuilder::new()
///     .upscale_factor(2)
///     .build(size, &intrinsics, &distortion)
///     .unwrap();
/// assert_eq!(map.size(), size);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InverseMapBuilder {
    upscale_factor: usize,
    falloff: i32,
    reject_folds: bool,
}

impl Default for InverseMapBuilder {
    fn default() -> Self {
        Self {
            upscale_factor: 1,
            falloff: 1,
            reject_folds: false,
        }
    }
}

impl InverseMapBuilder {
    /// Create a builder with a single sample per pixel and linear falloff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of undistorted samples per pixel along each axis.
    pub fn upscale_factor(mut self, upscale_factor: usize) -> Self {
        self.upscale_factor = upscale_factor;
        self
    }

    /// Exponent of the interpolation weight falloff.
    pub fn falloff(mut self, falloff: i32) -> Self {
        self.falloff = falloff;
        self
    }

    /// Drop samples where the distortion folds the image over itself.
    pub fn reject_folds(mut self, reject_folds: bool) -> Self {
        self.reject_folds = reject_folds;
        self
    }

    /// Build the inverse distortion map for an image of the given size.
    ///
    /// The oversampled grid of the upscale factor is scattered last. Before it,
    /// the grids of the factors in `(factor / 2, factor)` are scattered, so
    /// every coarser grid is covered and a larger factor never hits fewer
    /// pixels. With `reject_folds` the fold filter is evaluated per grid.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the distorted image.
    /// * `intrinsics` - The intrinsic parameters of the camera.
    /// * `distortion` - The distortion parameters of the camera.
    ///
    /// # Errors
    ///
    /// If the upscale factor is zero.
    pub fn build(
        &self,
        size: ImageSize,
        intrinsics: &CameraIntrinsics,
        distortion: &DistortionParams,
    ) -> Result<InverseDistortionMap, DistortionMapError> {
        if self.upscale_factor == 0 {
            return Err(DistortionMapError::InvalidUpscaleFactor(self.upscale_factor));
        }

        let now = Instant::now();

        let mut ys = Image::<f64, 1>::from_size_val(size, 0.0);
        let mut xs = Image::<f64, 1>::from_size_val(size, 0.0);
        let mut valid = Image::<bool, 1>::from_size_val(size, false);

        // every grid coarser than the requested one is a subgrid of one of these,
        // so the sample set only grows with the factor. The requested grid goes last.
        let mut num_samples = 0;
        for factor in (self.upscale_factor / 2 + 1)..=self.upscale_factor {
            num_samples += self.scatter(
                size,
                factor,
                intrinsics,
                distortion,
                [&mut ys, &mut xs],
                &mut valid,
            );
        }

        log::debug!(
            "scattered {} samples onto {} of {} pixels in {:?}",
            num_samples,
            valid.as_slice().iter().filter(|v| **v).count(),
            size.area(),
            now.elapsed()
        );

        let (ys, xs) = rayon::join(
            || fill_missing_values(&ys, &valid, self.falloff),
            || fill_missing_values(&xs, &valid, self.falloff),
        );
        let (ys, xs) = (ys?, xs?);

        let mut source = Image::<f64, 2>::from_size_val(size, 0.0);
        source
            .as_slice_mut()
            .chunks_exact_mut(2)
            .zip(ys.as_slice().iter().zip(xs.as_slice()))
            .for_each(|(yx, (y, x))| {
                yx[0] = *y;
                yx[1] = *x;
            });

        log::debug!("built inverse distortion map {} in {:?}", size, now.elapsed());

        InverseDistortionMap::new(source, valid)
    }

    // write the undistorted coordinates of one grid at the pixels they land on,
    // later samples overwrite earlier ones
    fn scatter(
        &self,
        size: ImageSize,
        factor: usize,
        intrinsics: &CameraIntrinsics,
        distortion: &DistortionParams,
        [ys, xs]: [&mut Image<f64, 1>; 2],
        valid: &mut Image<bool, 1>,
    ) -> usize {
        let undistorted = oversampled_meshgrid(size, factor);
        let distorted = distort_points(&undistorted, intrinsics, distortion);

        let keep = if self.reject_folds {
            fold_mask(&distorted, size.width * factor, size.height * factor)
        } else {
            vec![true; distorted.len()]
        };

        let (width, height) = (size.width as f64, size.height as f64);
        for ((&[y, x], &[xd, yd]), keep) in undistorted.iter().zip(distorted.iter()).zip(keep) {
            if !keep || !(xd >= 0.0 && xd < width && yd >= 0.0 && yd < height) {
                continue;
            }
            let idx = yd as usize * size.width + xd as usize;
            ys.as_slice_mut()[idx] = y;
            xs.as_slice_mut()[idx] = x;
            valid.as_slice_mut()[idx] = true;
        }
        undistorted.len()
    }
}

/// Build the inverse distortion map of a camera.
///
/// Shorthand for `InverseMapBuilder::new().upscale_factor(upscale_factor).build(..)`.
///
/// # Arguments
///
/// * `size` - The size of the distorted image.
/// * `intrinsics` - The intrinsic parameters of the camera.
/// * `distortion` - The distortion parameters of the camera.
/// * `upscale_factor` - Number of undistorted samples per pixel along each axis.
///
/// # Returns
///
/// The lookup table from distorted pixels to undistorted coordinates.
pub fn build_inverse_map(
    size: ImageSize,
    intrinsics: &CameraIntrinsics,
    distortion: &DistortionParams,
    upscale_factor: usize,
) -> Result<InverseDistortionMap, DistortionMapError> {
    InverseMapBuilder::new()
        .upscale_factor(upscale_factor)
        .build(size, intrinsics, distortion)
}

// a sample survives if its distorted x grows to the right and its distorted y grows downwards
fn fold_mask(distorted: &[[f64; 2]], cols: usize, rows: usize) -> Vec<bool> {
    let at = |r: usize, c: usize| distorted[r * cols + c];
    let grows_x = |r: usize, c: usize| {
        let c = if c + 1 < cols { c } else { c.saturating_sub(1) };
        cols < 2 || at(r, c + 1)[0] - at(r, c)[0] > 0.0
    };
    let grows_y = |r: usize, c: usize| {
        let r = if r + 1 < rows { r } else { r.saturating_sub(1) };
        rows < 2 || at(r + 1, c)[1] - at(r, c)[1] > 0.0
    };

    let mut mask = Vec::with_capacity(distorted.len());
    for r in 0..rows {
        for c in 0..cols {
            mask.push(grows_x(r, c) && grows_y(r, c));
        }
    }
    mask
}
