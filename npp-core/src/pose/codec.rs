use nalgebra::{Matrix3, Matrix3x4, Matrix4, Quaternion, Rotation3, UnitQuaternion, Vector3};

use crate::error::{PoseError, Result};

/// Smallest `|det| / prod(column norms)` accepted by [`invert`]
///
/// The ratio is 1 for orthogonal columns and does not depend on scale.
const SINGULAR_EPS: f64 = 1e-12;

/// Camera position and orientation for a single frame
///
/// The quaternion is kept exactly as supplied; callers are responsible for
/// passing unit quaternions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    translation: Vector3<f64>,
    rotation: Quaternion<f64>,
}

impl CameraPose {
    /// Create a pose from a translation and a quaternion in `(x, y, z, w)` order
    pub fn new(translation: Vector3<f64>, quat_xyzw: [f64; 4]) -> Self {
        let [x, y, z, w] = quat_xyzw;
        Self {
            translation,
            rotation: Quaternion::new(w, x, y, z),
        }
    }

    /// Create a pose from a table row `[trans_x, trans_y, trans_z, quot_x, quot_y, quot_z, quot_w]`
    pub fn from_row(row: &[f64; 7]) -> Self {
        Self::new(
            Vector3::new(row[0], row[1], row[2]),
            [row[3], row[4], row[5], row[6]],
        )
    }

    /// Recover a pose from a `[R | t]` matrix whose rotation block is orthonormal
    pub fn from_matrix(matrix: &Matrix3x4<f64>) -> Self {
        let rotation =
            Rotation3::from_matrix_unchecked(matrix.fixed_view::<3, 3>(0, 0).into_owned());
        let quat = UnitQuaternion::from_rotation_matrix(&rotation);
        Self {
            translation: matrix.column(3).into_owned(),
            rotation: quat.into_inner(),
        }
    }

    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    pub fn quaternion(&self) -> &Quaternion<f64> {
        &self.rotation
    }

    /// Quaternion in `(x, y, z, w)` order
    pub fn quaternion_xyzw(&self) -> [f64; 4] {
        [self.rotation.i, self.rotation.j, self.rotation.k, self.rotation.w]
    }

    /// Table row `[trans_x, trans_y, trans_z, quot_x, quot_y, quot_z, quot_w]`
    pub fn to_row(&self) -> [f64; 7] {
        let [x, y, z, w] = self.quaternion_xyzw();
        [
            self.translation.x,
            self.translation.y,
            self.translation.z,
            x,
            y,
            z,
            w,
        ]
    }

    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        quaternion_to_rotation_matrix(&self.rotation)
    }

    /// Camera-to-world `[R | t]`
    pub fn to_matrix(&self) -> Matrix3x4<f64> {
        let mut m = Matrix3x4::zeros();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.rotation_matrix());
        m.set_column(3, &self.translation);
        m
    }

    /// Camera-to-world as a 4x4 homogeneous matrix
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        to_homogeneous(&self.to_matrix())
    }
}

/// Convert a quaternion to a rotation matrix (Hamilton convention)
///
/// The input is not checked for unit norm. A non-unit quaternion gives a
/// matrix that is not a rotation; that is the caller's responsibility.
pub fn quaternion_to_rotation_matrix(q: &Quaternion<f64>) -> Matrix3<f64> {
    UnitQuaternion::new_unchecked(*q)
        .to_rotation_matrix()
        .into_inner()
}

/// Append the `[0, 0, 0, 1]` row
pub fn to_homogeneous(matrix: &Matrix3x4<f64>) -> Matrix4<f64> {
    let mut h = Matrix4::identity();
    h.fixed_view_mut::<3, 4>(0, 0).copy_from(matrix);
    h
}

/// Drop the last row of a homogeneous transform
pub fn truncate(matrix: &Matrix4<f64>) -> Matrix3x4<f64> {
    matrix.fixed_view::<3, 4>(0, 0).into_owned()
}

/// Invert a 4x4 homogeneous transform
pub fn invert(matrix: &Matrix4<f64>) -> Result<Matrix4<f64>> {
    let det = matrix.determinant();
    let volume: f64 = matrix.column_iter().map(|c| c.norm()).product();
    if !det.is_finite() || volume == 0.0 || det.abs() / volume < SINGULAR_EPS {
        return Err(PoseError::SingularMatrix.into());
    }

    matrix
        .try_inverse()
        .filter(|inv| inv.iter().all(|v| v.is_finite()))
        .ok_or_else(|| PoseError::SingularMatrix.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NppError;
    use proptest::prelude::*;

    #[test]
    fn test_identity_quaternion() {
        let pose = CameraPose::new(Vector3::zeros(), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(pose.rotation_matrix(), Matrix3::identity());
    }

    #[test]
    fn test_quarter_turn_about_z() {
        let h = std::f64::consts::FRAC_1_SQRT_2;
        let pose = CameraPose::new(Vector3::zeros(), [0.0, 0.0, h, h]);
        let r = pose.rotation_matrix();

        // x axis maps to y axis
        let x = r * Vector3::x();
        assert!((x - Vector3::y()).norm() < 1e-12);
    }

    #[test]
    fn test_from_row_order() {
        let pose = CameraPose::from_row(&[1.0, 2.0, 3.0, 0.1, 0.2, 0.3, 0.9]);
        assert_eq!(pose.translation(), &Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(pose.quaternion_xyzw(), [0.1, 0.2, 0.3, 0.9]);
        assert_eq!(pose.quaternion().w, 0.9);
        assert_eq!(pose.to_row(), [1.0, 2.0, 3.0, 0.1, 0.2, 0.3, 0.9]);
    }

    #[test]
    fn test_to_matrix_layout() {
        let pose = CameraPose::new(Vector3::new(4.0, 5.0, 6.0), [0.0, 0.0, 0.0, 1.0]);
        let m = pose.to_matrix();
        assert_eq!(m.fixed_view::<3, 3>(0, 0).into_owned(), Matrix3::identity());
        assert_eq!(m.column(3).into_owned(), Vector3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_from_matrix_roundtrip() {
        let q = UnitQuaternion::from_euler_angles(0.3, -0.2, 1.1);
        let c = q.coords;
        let pose = CameraPose::new(Vector3::new(1.0, -2.0, 0.5), [c.x, c.y, c.z, c.w]);
        let back = CameraPose::from_matrix(&pose.to_matrix());

        assert!((back.to_matrix() - pose.to_matrix()).norm() < 1e-12);
    }

    #[test]
    fn test_homogeneous_roundtrip() {
        let pose = CameraPose::new(Vector3::new(1.0, 2.0, 3.0), [0.0, 0.0, 0.0, 1.0]);
        let h = pose.to_homogeneous();
        assert_eq!(h[(3, 0)], 0.0);
        assert_eq!(h[(3, 3)], 1.0);
        assert_eq!(truncate(&h), pose.to_matrix());
    }

    #[test]
    fn test_invert_rigid_transform() {
        let h = std::f64::consts::FRAC_1_SQRT_2;
        let pose = CameraPose::new(Vector3::new(1.0, 2.0, 3.0), [h, 0.0, 0.0, h]);
        let m = pose.to_homogeneous();
        let inv = invert(&m).unwrap();
        assert!((m * inv - Matrix4::identity()).norm() < 1e-12);
    }

    #[test]
    fn test_invert_singular() {
        let mut m = Matrix4::identity();
        m[(2, 2)] = 0.0;
        let result = invert(&m);
        assert!(matches!(
            result.unwrap_err(),
            NppError::Pose(PoseError::SingularMatrix)
        ));
    }

    #[test]
    fn test_invert_small_scale_transform() {
        // det = 1.25e-13, still perfectly conditioned
        let m = Matrix4::from_diagonal(&nalgebra::Vector4::new(5e-5, 5e-5, 5e-5, 1.0));
        let inv = invert(&m).unwrap();
        assert!((inv[(0, 0)] - 2e4).abs() < 1e-6);
        assert!((m * inv - Matrix4::identity()).norm() < 1e-12);
    }

    #[test]
    fn test_invert_nearly_dependent_columns() {
        let mut m = Matrix4::identity();
        m[(0, 1)] = 1.0;
        m[(1, 1)] = 1e-14;
        assert!(invert(&m).is_err());
    }

    #[test]
    fn test_invert_non_finite() {
        let mut m = Matrix4::identity();
        m[(0, 3)] = f64::NAN;
        assert!(invert(&m).is_err());
    }

    proptest! {
        #[test]
        fn prop_unit_quaternion_gives_orthonormal_matrix(
            x in -1.0f64..1.0,
            y in -1.0f64..1.0,
            z in -1.0f64..1.0,
            w in -1.0f64..1.0,
        ) {
            let norm = (x * x + y * y + z * z + w * w).sqrt();
            prop_assume!(norm > 1e-3);

            let q = Quaternion::new(w / norm, x / norm, y / norm, z / norm);
            let r = quaternion_to_rotation_matrix(&q);

            prop_assert!((r.transpose() * r - Matrix3::identity()).norm() < 1e-9);
            prop_assert!((r.determinant() - 1.0).abs() < 1e-9);
        }
    }
}
