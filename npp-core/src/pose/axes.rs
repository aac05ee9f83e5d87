use nalgebra::{Matrix3, Matrix3x4};

use crate::error::{NppError, Result};

/// Column relabeling between camera axis conventions
///
/// Output column `i` is `signs[i] * input column permutation[i]`. Only the
/// three rotation columns are touched; a translation column passes through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRemap {
    permutation: [usize; 3],
    signs: [f64; 3],
}

impl AxisRemap {
    pub const IDENTITY: AxisRemap = AxisRemap {
        permutation: [0, 1, 2],
        signs: [1.0, 1.0, 1.0],
    };

    /// "down, right, back" to "right, up, back": `[c1, -c0, c2]`
    pub const DOWN_RIGHT_BACK_TO_RIGHT_UP_BACK: AxisRemap = AxisRemap {
        permutation: [1, 0, 2],
        signs: [1.0, -1.0, 1.0],
    };

    pub fn new(permutation: [usize; 3], signs: [f64; 3]) -> Result<Self> {
        let mut seen = [false; 3];
        for &p in &permutation {
            if p > 2 || seen[p] {
                return Err(NppError::InvalidInput(format!(
                    "{:?} is not a permutation of the three axes",
                    permutation
                )));
            }
            seen[p] = true;
        }

        if signs.iter().any(|s| s.abs() != 1.0) {
            return Err(NppError::InvalidInput(format!(
                "axis signs must be +1 or -1, got {:?}",
                signs
            )));
        }

        Ok(Self { permutation, signs })
    }

    pub fn permutation(&self) -> [usize; 3] {
        self.permutation
    }

    pub fn signs(&self) -> [f64; 3] {
        self.signs
    }

    /// The remap that undoes this one exactly
    pub fn inverse(&self) -> AxisRemap {
        let mut permutation = [0; 3];
        let mut signs = [1.0; 3];
        for (i, &p) in self.permutation.iter().enumerate() {
            permutation[p] = i;
            signs[p] = self.signs[i];
        }
        AxisRemap { permutation, signs }
    }

    pub fn remap_rotation(&self, rotation: &Matrix3<f64>) -> Matrix3<f64> {
        Matrix3::from_fn(|row, col| self.signs[col] * rotation[(row, self.permutation[col])])
    }

    /// Remap the rotation block of `[R | t]`, leaving `t` untouched
    pub fn remap_pose(&self, pose: &Matrix3x4<f64>) -> Matrix3x4<f64> {
        let rotation = pose.fixed_view::<3, 3>(0, 0).into_owned();
        let mut out = *pose;
        out.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&self.remap_rotation(&rotation));
        out
    }

    pub fn remap_all(&self, poses: &[Matrix3x4<f64>]) -> Vec<Matrix3x4<f64>> {
        poses.iter().map(|pose| self.remap_pose(pose)).collect()
    }
}
