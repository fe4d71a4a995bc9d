use std::path::Path;

use bat_imgproc::calibration::{CameraIntrinsics, DistortionParams};
use serde_json::Value;

use crate::error::IoError;

/// The camera parameters stored in a calibration file.
///
/// Both fields are optional in the file; a missing field leaves the matching
/// camera parameters untouched when the data is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationData {
    /// The 3x3 camera matrix `cam_mtx`.
    pub camera_matrix: Option<[[f64; 3]; 3]>,
    /// The `dist` coefficients in file order `k1, k2, p1, p2, k3, k4`.
    pub distortion: Option<[f64; 6]>,
}

impl CalibrationData {
    /// Overwrite the camera parameters present in the calibration.
    ///
    /// `fx`, `fy`, `px` and `py` are taken from `cam_mtx[0][0]`,
    /// `cam_mtx[1][1]`, `cam_mtx[0][2]` and `cam_mtx[1][2]`.
    pub fn apply(&self, intrinsics: &mut CameraIntrinsics, distortion: &mut DistortionParams) {
        if let Some(m) = self.camera_matrix {
            intrinsics.fx = m[0][0];
            intrinsics.fy = m[1][1];
            intrinsics.px = m[0][2];
            intrinsics.py = m[1][2];
        }

        if let Some([k1, k2, p1, p2, k3, k4]) = self.distortion {
            *distortion = DistortionParams {
                p1,
                p2,
                k1,
                k2,
                k3,
                k4,
            };
        }
    }
}

/// Read a camera calibration JSON file.
///
/// The file must hold an object with an optional `cam_mtx` (3x3 list of
/// numbers) and an optional `dist` (six numbers, `k1, k2, p1, p2, k3, k4`).
/// Other keys are ignored.
///
/// # Arguments
///
/// * `file_path` - The path to the calibration file.
///
/// # Errors
///
/// An [`IoError`] naming the field that failed validation.
pub fn read_calibration(file_path: impl AsRef<Path>) -> Result<CalibrationData, IoError> {
    let file_path = file_path.as_ref();
    if !file_path.is_file() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(file_path)?;
    let data = parse_calibration(&contents)?;

    log::debug!("read calibration from {}: {:?}", file_path.display(), data);

    Ok(data)
}

/// Parse the contents of a camera calibration file.
///
/// See [`read_calibration`].
pub fn parse_calibration(contents: &str) -> Result<CalibrationData, IoError> {
    let value: Value =
        serde_json::from_str(contents).map_err(|e| IoError::InvalidJson(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(IoError::NotAnObject);
    };

    let camera_matrix = match fields.get("cam_mtx") {
        None => None,
        Some(Value::Array(rows)) => Some(parse_camera_matrix(rows)?),
        Some(_) => return Err(IoError::CameraMatrixNotList),
    };

    let distortion = match fields.get("dist") {
        None => None,
        Some(Value::Array(coeffs)) => Some(parse_numbers::<6>(coeffs).ok_or(IoError::DistortionShape)?),
        Some(_) => return Err(IoError::DistortionNotList),
    };

    Ok(CalibrationData {
        camera_matrix,
        distortion,
    })
}

fn parse_camera_matrix(rows: &[Value]) -> Result<[[f64; 3]; 3], IoError> {
    if rows.len() != 3 {
        return Err(IoError::CameraMatrixShape);
    }

    let mut m = [[0.0; 3]; 3];
    for (dst, row) in m.iter_mut().zip(rows) {
        let Value::Array(row) = row else {
            return Err(IoError::CameraMatrixShape);
        };
        *dst = parse_numbers::<3>(row).ok_or(IoError::CameraMatrixShape)?;
    }
    Ok(m)
}

// exactly N json numbers
fn parse_numbers<const N: usize>(values: &[Value]) -> Option<[f64; N]> {
    if values.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (dst, v) in out.iter_mut().zip(values) {
        *dst = v.as_f64()?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_calibration() -> Result<(), IoError> {
        let data = parse_calibration(
            r#"{
                "cam_mtx": [[800.5, 0, 320.25], [0, 801, 239.75], [0, 0, 1]],
                "dist": [1, 2, 3, 4, 5, 6],
                "rms": 0.21
            }"#,
        )?;
        assert_eq!(
            data.camera_matrix,
            Some([[800.5, 0.0, 320.25], [0.0, 801.0, 239.75], [0.0, 0.0, 1.0]])
        );
        assert_eq!(data.distortion, Some([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        Ok(())
    }

    #[test]
    fn test_apply_reorders_distortion() -> Result<(), IoError> {
        let data = parse_calibration(r#"{"dist": [1, 2, 3, 4, 5, 6]}"#)?;

        let mut intrinsics = CameraIntrinsics::from_image_size([640, 480].into());
        let before = intrinsics;
        let mut distortion = DistortionParams::default();
        data.apply(&mut intrinsics, &mut distortion);

        assert_eq!(
            distortion,
            DistortionParams {
                k1: 1.0,
                k2: 2.0,
                p1: 3.0,
                p2: 4.0,
                k3: 5.0,
                k4: 6.0,
            }
        );
        assert_eq!(intrinsics, before);
        Ok(())
    }

    #[test]
    fn test_apply_camera_matrix() -> Result<(), IoError> {
        let data = parse_calibration(r#"{"cam_mtx": [[1, 0, 3], [0, 2, 4], [0, 0, 1]]}"#)?;

        let mut intrinsics = CameraIntrinsics::from_image_size([640, 480].into());
        let mut distortion = DistortionParams {
            k1: 0.5,
            ..Default::default()
        };
        data.apply(&mut intrinsics, &mut distortion);

        assert_eq!(
            (intrinsics.fx, intrinsics.fy, intrinsics.px, intrinsics.py),
            (1.0, 2.0, 3.0, 4.0)
        );
        assert_eq!(intrinsics.sensor_width_mm, 36.0);
        assert_eq!(distortion.k1, 0.5);
        Ok(())
    }

    #[test]
    fn test_validation_errors() {
        let cases = [
            ("{not json", "not a valid JSON"),
            ("[1, 2, 3]", "must contain a dictionary"),
            (r#"{"cam_mtx": 3}"#, "\"cam_mtx\" field must be a list!"),
            (r#"{"cam_mtx": [[1, 0, 0], [0, 1, 0]]}"#, "\"cam_mtx\" must be 3x3 matrix!"),
            (
                r#"{"cam_mtx": [[1, 0, 0], [0, 1, 0], [0, "a", 1]]}"#,
                "\"cam_mtx\" must be 3x3 matrix!",
            ),
            (r#"{"cam_mtx": [1, 2, 3]}"#, "\"cam_mtx\" must be 3x3 matrix!"),
            (r#"{"dist": {"k1": 1}}"#, "\"dist\" field must be a list!"),
            (r#"{"dist": [1, 2, 3, 4, 5]}"#, "list of six numbers"),
            (r#"{"dist": [1, 2, 3, 4, 5, null]}"#, "list of six numbers"),
        ];

        for (contents, message) in cases {
            match parse_calibration(contents) {
                Err(e) => assert!(
                    e.to_string().contains(message),
                    "{contents}: '{e}' does not contain '{message}'"
                ),
                Ok(data) => panic!("{contents} parsed as {data:?}"),
            }
        }
    }

    #[test]
    fn test_empty_object_is_valid() -> Result<(), IoError> {
        assert_eq!(parse_calibration("{}")?, CalibrationData::default());
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let res = read_calibration("/definitely/not/here.json");
        assert!(matches!(res, Err(IoError::FileDoesNotExist(_))));
    }

    #[test]
    fn test_read_calibration_file() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("calib.json");
        std::fs::write(&file_path, r#"{"cam_mtx": [[10, 0, 5], [0, 20, 6], [0, 0, 1]]}"#)?;

        let data = read_calibration(&file_path)?;
        assert_eq!(data.camera_matrix.map(|m| m[1][1]), Some(20.0));
        assert_eq!(data.distortion, None);
        Ok(())
    }
}
