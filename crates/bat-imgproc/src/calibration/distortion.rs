use super::{CameraIntrinsics, DistortionParams};
use rayon::prelude::*;

/// Distort a point using the Brown-Conrady polynomial model
///
/// The point is given in undistorted pixel coordinates, row first, matching the
/// `(y, x)` layout of the inverse distortion map.
///
/// # Arguments
///
/// * `y` - The y coordinate (row) of the undistorted point
/// * `x` - The x coordinate (column) of the undistorted point
/// * `intrinsics` - The intrinsic parameters of the camera
/// * `distortion` - The distortion parameters of the camera
///
/// # Returns
///
/// * `x` - The x coordinate of the distorted point
/// * `y` - The y coordinate of the distorted point
///
/// # Example
///
/// ```
/// use bat_imgproc::calibration::{distortion::distort_point, CameraIntrinsics, DistortionParams};
///
/// let intrinsics = CameraIntrinsics::from_image_size([640, 480].into());
/// let (x, y) = distort_point(12.0, 34.0, &intrinsics, &DistortionParams::default());
/// assert!((x - 34.0).abs() < 1e-9);
/// assert!((y - 12.0).abs() < 1e-9);
/// ```
pub fn distort_point(
    y: f64,
    x: f64,
    intrinsics: &CameraIntrinsics,
    distortion: &DistortionParams,
) -> (f64, f64) {
    // unpack the intrinsic and distortion parameters
    let (fx, fy, px, py) = (intrinsics.fx, intrinsics.fy, intrinsics.px, intrinsics.py);
    let DistortionParams {
        p1,
        p2,
        k1,
        k2,
        k3,
        k4,
    } = *distortion;

    // normalize the coordinates
    let x = (x - px) / fx;
    let y = (y - py) / fy;

    // intermediate terms
    let x2 = x * x;
    let y2 = y * y;
    let xy2 = 2.0 * x * y;
    let r2 = x2 + y2;

    // radial distortion
    let r_coeff = 1.0 + (((k4 * r2 + k3) * r2 + k2) * r2 + k1) * r2;

    // tangential distortion
    let tx = p1 * (r2 + 2.0 * x2) + p2 * xy2;
    let ty = p2 * (r2 + 2.0 * y2) + p1 * xy2;

    let xd = x * r_coeff + tx;
    let yd = y * r_coeff + ty;

    // denormalize the coordinates
    (fx * xd + px, fy * yd + py)
}

/// Distort a batch of points in parallel.
///
/// # Arguments
///
/// * `points` - Undistorted pixel coordinates as `[y, x]` pairs.
/// * `intrinsics` - The intrinsic parameters of the camera
/// * `distortion` - The distortion parameters of the camera
///
/// # Returns
///
/// The distorted coordinates as `[x, y]` pairs, in the same order as `points`.
pub fn distort_points(
    points: &[[f64; 2]],
    intrinsics: &CameraIntrinsics,
    distortion: &DistortionParams,
) -> Vec<[f64; 2]> {
    points
        .par_iter()
        .map(|&[y, x]| {
            let (xd, yd) = distort_point(y, x, intrinsics, distortion);
            [xd, yd]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::Rng;

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics {
            sensor_width_mm: 36.0,
            fx: 577.48583984375,
            fy: 652.8748779296875,
            px: 320.0,
            py: 240.0,
        }
    }

    #[test]
    fn test_distort_point_identity() {
        let intrinsics = intrinsics();
        let distortion = DistortionParams::default();

        let mut rng = rand::rng();
        for _ in 0..1000 {
            let y = rng.random_range(-100.0..580.0);
            let x = rng.random_range(-100.0..740.0);
            let (xd, yd) = distort_point(y, x, &intrinsics, &distortion);
            assert_relative_eq!(xd, x, epsilon = 1e-9);
            assert_relative_eq!(yd, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_distort_point_principal_point_is_fixed() {
        let distortion = DistortionParams {
            p1: 0.01,
            p2: -0.02,
            k1: -0.3,
            k2: 0.1,
            k3: 0.01,
            k4: -0.001,
        };
        let (x, y) = distort_point(240.0, 320.0, &intrinsics(), &distortion);
        assert_eq!((x, y), (320.0, 240.0));
    }

    #[test]
    fn test_distort_point_reference_values() {
        let intrinsics = CameraIntrinsics {
            sensor_width_mm: 36.0,
            fx: 100.0,
            fy: 100.0,
            px: 0.0,
            py: 0.0,
        };

        // xn = 0.5, yn = 0.25, r2 = 0.3125
        let radial = DistortionParams {
            k1: 0.1,
            ..Default::default()
        };
        let (x, y) = distort_point(25.0, 50.0, &intrinsics, &radial);
        assert_relative_eq!(x, 50.0 * (1.0 + 0.1 * 0.3125), epsilon = 1e-12);
        assert_relative_eq!(y, 25.0 * (1.0 + 0.1 * 0.3125), epsilon = 1e-12);

        // tx = p1 * (r2 + 2 xn^2) = 0.01 * 0.8125, ty = 2 p1 xn yn = 0.01 * 0.25
        let tangential = DistortionParams {
            p1: 0.01,
            ..Default::default()
        };
        let (x, y) = distort_point(25.0, 50.0, &intrinsics, &tangential);
        assert_relative_eq!(x, 100.0 * (0.5 + 0.01 * 0.8125), epsilon = 1e-12);
        assert_relative_eq!(y, 100.0 * (0.25 + 0.01 * 0.25), epsilon = 1e-12);
    }

    #[test]
    fn test_distort_points_matches_scalar() {
        let intrinsics = intrinsics();
        let distortion = DistortionParams {
            p1: 1e-3,
            p2: -2e-3,
            k1: -0.2,
            k2: 0.05,
            k3: 0.0,
            k4: 0.0,
        };
        let points = vec![[0.0, 0.0], [10.5, 600.0], [479.0, 639.0]];
        let distorted = distort_points(&points, &intrinsics, &distortion);
        assert_eq!(distorted.len(), 3);
        for (p, d) in points.iter().zip(distorted.iter()) {
            let (x, y) = distort_point(p[0], p[1], &intrinsics, &distortion);
            assert_eq!(*d, [x, y]);
        }
    }

    #[test]
    fn test_distort_point_nan_propagates() {
        let (x, y) = distort_point(f64::NAN, 1.0, &intrinsics(), &DistortionParams::default());
        assert!(x.is_nan());
        assert!(y.is_nan());
    }
}
