use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

/// Pinhole intrinsics shared by every pose in a set
///
/// Stored as `(height, width, focal)` to match the column order of the
/// poses/bounds array. Principal point is always the image center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub height: f64,
    pub width: f64,
    pub focal: f64,
}

impl Intrinsics {
    pub fn new(height: f64, width: f64, focal: f64) -> Self {
        Self {
            height,
            width,
            focal,
        }
    }

    /// 4x4 projection matrix, see [`build_intrinsic_matrix`]
    pub fn matrix(&self) -> Matrix4<f64> {
        build_intrinsic_matrix(self.height, self.width, self.focal)
    }
}

/// Build the pinhole projection matrix with principal point at `(W/2, H/2)`
///
/// ```text
/// [f 0 W/2 0]
/// [0 f H/2 0]
/// [0 0  1  0]
/// [0 0  0  1]
/// ```
#[rustfmt::skip]
pub fn build_intrinsic_matrix(height: f64, width: f64, focal: f64) -> Matrix4<f64> {
    Matrix4::new(
        focal, 0.0, 0.5 * width, 0.0,
        0.0, focal, 0.5 * height, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}
