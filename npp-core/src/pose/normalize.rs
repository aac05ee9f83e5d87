use std::cmp::Ordering;

use log::debug;
use nalgebra::{Matrix3x4, Matrix4, Vector3};
use serde::{Deserialize, Serialize};

use super::codec::{invert, to_homogeneous, truncate};
use crate::error::{PoseError, Result};

/// Nearest depth ends up at `1 / NEAR_SCALE` after rescaling
pub const NEAR_SCALE: f64 = 0.75;

/// Mean axes shorter than this cannot be normalized
const DEGENERATE_EPS: f64 = 1e-9;

/// Near/far depth bounds of one pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub near: f64,
    pub far: f64,
}

impl Bounds {
    pub fn new(near: f64, far: f64) -> Self {
        Self { near, far }
    }
}

/// Output of [`recenter_and_rescale`]
#[derive(Debug, Clone)]
pub struct NormalizedPoses {
    pub poses: Vec<Matrix3x4<f64>>,
    pub bounds: Vec<Bounds>,
    /// Inverse of the homogeneous average pose used for centering
    pub avg_inverse: Matrix4<f64>,
    pub scale_factor: f64,
    /// Index of the pose nearest the new origin, usable as a validation view
    pub closest_to_center: usize,
}

fn mean_column(poses: &[Matrix3x4<f64>], col: usize) -> Vector3<f64> {
    let sum = poses
        .iter()
        .fold(Vector3::zeros(), |acc, pose| acc + pose.column(col));
    sum / poses.len() as f64
}

fn normalize(v: &Vector3<f64>) -> Result<Vector3<f64>> {
    v.try_normalize(DEGENERATE_EPS)
        .ok_or_else(|| PoseError::DegenerateAverage.into())
}

/// Compute the average camera-to-world pose
///
/// 1. center: mean of the translations
/// 2. z: normalized mean of the forward (third) columns
/// 3. y': mean of the up (second) columns, not normalized
/// 4. x: normalized `y' x z`
/// 5. y: `z x x`, unit length since `z` and `x` are orthonormal
///
/// `y'` cannot be used directly because it is not necessarily orthogonal to `z`.
pub fn average_pose(poses: &[Matrix3x4<f64>]) -> Result<Matrix3x4<f64>> {
    if poses.is_empty() {
        return Err(PoseError::EmptyPoseSet.into());
    }

    let center = mean_column(poses, 3);
    let z = normalize(&mean_column(poses, 2))?;
    let y_ref = mean_column(poses, 1);
    let x = normalize(&y_ref.cross(&z))?;
    let y = z.cross(&x);

    Ok(Matrix3x4::from_columns(&[x, y, z, center]))
}

/// Re-express every pose relative to the average pose
///
/// Returns the centered poses (same order and count) and the inverse of the
/// homogeneous average pose that was applied.
pub fn center_poses(poses: &[Matrix3x4<f64>]) -> Result<(Vec<Matrix3x4<f64>>, Matrix4<f64>)> {
    let avg = average_pose(poses)?;
    let avg_inverse = invert(&to_homogeneous(&avg))?;

    let centered = poses
        .iter()
        .map(|pose| truncate(&(avg_inverse * to_homogeneous(pose))))
        .collect();

    Ok((centered, avg_inverse))
}

/// Undo [`center_poses`] given the inverse average pose it returned
pub fn uncenter_poses(
    centered: &[Matrix3x4<f64>],
    avg_inverse: &Matrix4<f64>,
) -> Result<Vec<Matrix3x4<f64>>> {
    let avg = invert(avg_inverse)?;
    Ok(centered
        .iter()
        .map(|pose| truncate(&(avg * to_homogeneous(pose))))
        .collect())
}

/// Divide translations and bounds by `reference_near * NEAR_SCALE`
///
/// Returns the scaled poses, scaled bounds and the scale factor.
pub fn rescale(
    poses: &[Matrix3x4<f64>],
    bounds: &[Bounds],
    reference_near: f64,
) -> Result<(Vec<Matrix3x4<f64>>, Vec<Bounds>, f64)> {
    if poses.len() != bounds.len() {
        return Err(PoseError::LengthMismatch {
            poses: poses.len(),
            bounds: bounds.len(),
        }
        .into());
    }

    let scale_factor = reference_near * NEAR_SCALE;
    if !scale_factor.is_finite() || scale_factor == 0.0 {
        return Err(PoseError::InvalidScale(scale_factor).into());
    }

    let scaled_poses = poses
        .iter()
        .map(|pose| {
            let mut scaled = *pose;
            scaled.set_column(3, &(pose.column(3) / scale_factor));
            scaled
        })
        .collect();

    let scaled_bounds = bounds
        .iter()
        .map(|b| Bounds::new(b.near / scale_factor, b.far / scale_factor))
        .collect();

    Ok((scaled_poses, scaled_bounds, scale_factor))
}

/// Center the poses, then rescale so the nearest bound lands a little past 1.0
pub fn recenter_and_rescale(
    poses: &[Matrix3x4<f64>],
    bounds: &[Bounds],
) -> Result<NormalizedPoses> {
    if poses.len() != bounds.len() {
        return Err(PoseError::LengthMismatch {
            poses: poses.len(),
            bounds: bounds.len(),
        }
        .into());
    }

    let (centered, avg_inverse) = center_poses(poses)?;

    let closest_to_center = centered
        .iter()
        .map(|pose| pose.column(3).norm())
        .enumerate()
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(idx, _)| idx)
        .unwrap_or(0);

    let reference_near = bounds
        .iter()
        .flat_map(|b| [b.near, b.far])
        .fold(f64::INFINITY, f64::min);
    debug!("reference near bound: {}", reference_near);

    let (poses, bounds, scale_factor) = rescale(&centered, bounds, reference_near)?;
    debug!("scale factor: {}", scale_factor);

    Ok(NormalizedPoses {
        poses,
        bounds,
        avg_inverse,
        scale_factor,
        closest_to_center,
    })
}
