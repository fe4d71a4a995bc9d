use crate::calibration::inverse_map::InverseDistortionMap;
use crate::error::DistortionMapError;
use crate::parallel;
use bat_image::Image;

/// Resample an image through an inverse distortion map.
///
/// Every destination pixel copies the full channel vector of the source pixel
/// at the truncated `(y, x)` coordinate stored in the map (nearest neighbor
/// gather). Map cells that are NaN or point outside the source produce a zero
/// pixel.
///
/// # Arguments
///
/// * `src` - The undistorted image with the size of the map.
/// * `map` - The lookup table from distorted pixels to undistorted coordinates.
///
/// # Errors
///
/// If the image does not have the size of the map.
///
/// # Example
///
/// ```
/// use bat_image::Image;
/// use bat_imgproc::calibration::{inverse_map::build_inverse_map, CameraIntrinsics, DistortionParams};
/// use bat_imgproc::interpolation::apply_inverse_map;
///
/// let size = [4, 2].into();
/// let intrinsics = CameraIntrinsics::from_image_size(size);
/// let map = build_inverse_map(size, &intrinsics, &DistortionParams::default(), 1).unwrap();
///
/// let image = Image::<u8, 3>::from_size_val(size, 7);
/// let distorted = apply_inverse_map(&image, &map).unwrap();
/// assert_eq!(distorted.size(), size);
/// ```
pub fn apply_inverse_map<T, const C: usize>(
    src: &Image<T, C>,
    map: &InverseDistortionMap,
) -> Result<Image<T, C>, DistortionMapError>
where
    T: Copy + Default + Send + Sync,
{
    if src.size() != map.size() {
        return Err(DistortionMapError::SizeMismatch(map.size(), src.size()));
    }

    let (width, height) = (src.width() as f64, src.height() as f64);
    let mut dst = Image::from_size_val(src.size(), T::default());

    // parallelize the gather by rows
    parallel::par_iter_rows_resample(&mut dst, map.source_coordinates(), |y, x, dst_pixel| {
        // NaN fails every comparison
        if !(y >= 0.0 && y < height && x >= 0.0 && x < width) {
            return;
        }
        if let Ok(src_pixel) = src.pixel(x as usize, y as usize) {
            dst_pixel.copy_from_slice(src_pixel);
        }
    });

    Ok(dst)
}
