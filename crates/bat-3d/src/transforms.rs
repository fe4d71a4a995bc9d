use serde::{Deserialize, Serialize};

use crate::linalg::{matmul33, matvec3, transpose33};

/// Compute the rotation matrix from XYZ Euler angles.
///
/// The rotations are applied about the fixed X, then Y, then Z axes, i.e.
/// `R = Rz(z) * Ry(y) * Rx(x)`.
///
/// # Arguments
///
/// * `euler` - The rotation angles `[x, y, z]` in radians.
///
/// # Returns
///
/// The rotation matrix.
///
/// Example:
///
/// ```
/// use bat_3d::transforms::euler_xyz_to_rotation_matrix;
///
/// let rotation = euler_xyz_to_rotation_matrix(&[0.0, 0.0, 0.0]);
/// assert_eq!(rotation, [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
/// ```
pub fn euler_xyz_to_rotation_matrix(euler: &[f64; 3]) -> [[f64; 3]; 3] {
    let (sx, cx) = euler[0].sin_cos();
    let (sy, cy) = euler[1].sin_cos();
    let (sz, cz) = euler[2].sin_cos();

    [
        [cy * cz, sx * sy * cz - cx * sz, cx * sy * cz + sx * sz],
        [cy * sz, sx * sy * sz + cx * cz, cx * sy * sz - sx * cz],
        [-sy, sx * cy, cx * cy],
    ]
}

/// A rigid body transformation from a local frame to its parent frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    /// The rotation matrix.
    pub rotation: [[f64; 3]; 3],
    /// The translation vector.
    pub translation: [f64; 3],
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    /// The transformation that leaves every point in place.
    pub fn identity() -> Self {
        Self {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: [0.0; 3],
        }
    }

    /// Create the transformation of an object placed at `location` with XYZ
    /// Euler `rotation`.
    pub fn from_location_euler(location: &[f64; 3], rotation: &[f64; 3]) -> Self {
        Self {
            rotation: euler_xyz_to_rotation_matrix(rotation),
            translation: *location,
        }
    }

    /// Apply the transformation to a point.
    pub fn transform_point(&self, p: &[f64; 3]) -> [f64; 3] {
        let r = matvec3(&self.rotation, p);
        [
            r[0] + self.translation[0],
            r[1] + self.translation[1],
            r[2] + self.translation[2],
        ]
    }

    /// The transformation `self * other`, applying `other` first.
    pub fn compose(&self, other: &RigidTransform) -> Self {
        Self {
            rotation: matmul33(&self.rotation, &other.rotation),
            translation: self.transform_point(&other.translation),
        }
    }

    /// The inverse transformation.
    pub fn inverse(&self) -> Self {
        let rotation = transpose33(&self.rotation);
        let t = matvec3(&rotation, &self.translation);
        Self {
            rotation,
            translation: [-t[0], -t[1], -t[2]],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn assert_points_eq(a: [f64; 3], b: [f64; 3]) {
        for i in 0..3 {
            assert_relative_eq!(a[i], b[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_euler_single_axis() {
        // a quarter turn about z maps x to y
        let rz = euler_xyz_to_rotation_matrix(&[0.0, 0.0, FRAC_PI_2]);
        assert_points_eq(matvec3(&rz, &[1.0, 0.0, 0.0]), [0.0, 1.0, 0.0]);

        // a quarter turn about x maps y to z
        let rx = euler_xyz_to_rotation_matrix(&[FRAC_PI_2, 0.0, 0.0]);
        assert_points_eq(matvec3(&rx, &[0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);

        // a quarter turn about y maps z to x
        let ry = euler_xyz_to_rotation_matrix(&[0.0, FRAC_PI_2, 0.0]);
        assert_points_eq(matvec3(&ry, &[0.0, 0.0, 1.0]), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_euler_order() {
        // x is applied first: y -> z, then the z turn leaves it in place
        let r = euler_xyz_to_rotation_matrix(&[FRAC_PI_2, 0.0, FRAC_PI_2]);
        assert_points_eq(matvec3(&r, &[0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);
        assert_points_eq(matvec3(&r, &[1.0, 0.0, 0.0]), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_rigid_transform_inverse() {
        let t = RigidTransform::from_location_euler(&[1.0, -2.0, 3.0], &[0.3, -0.2, 1.1]);
        let p = [0.5, 4.0, -1.5];

        let back = t.inverse().transform_point(&t.transform_point(&p));
        assert_points_eq(back, p);

        let id = t.compose(&t.inverse());
        assert_points_eq(id.transform_point(&p), p);
    }

    #[test]
    fn test_rigid_transform_compose() {
        let parent = RigidTransform::from_location_euler(&[10.0, 0.0, 0.0], &[0.0, 0.0, FRAC_PI_2]);
        let child = RigidTransform::from_location_euler(&[1.0, 0.0, 0.0], &[0.0, 0.0, 0.0]);

        // the child sits one unit along the parent's rotated x axis
        let world = parent.compose(&child);
        assert_points_eq(world.transform_point(&[0.0, 0.0, 0.0]), [10.0, 1.0, 0.0]);
        assert_eq!(RigidTransform::default(), RigidTransform::identity());
    }
}
