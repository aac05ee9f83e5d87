//! Scripted camera trajectories and pose-table resampling

use nalgebra::{Matrix3x4, UnitQuaternion, Vector3};

use crate::error::{NppError, Result};
use crate::pose::CameraPose;

/// Pitch added when turning sampled cameras upside down
pub const FLIP_PITCH_DEG: f64 = 180.0;

/// Height added to sampled cameras after the flip
pub const LIFT_Z: f64 = 37.0;

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Camera positions of a boustrophedon sweep over a `rows x cols` grid
///
/// Position `row * cols + col` is the frame index. `y` and `z` follow the
/// column; even rows keep the row's `x`, odd rows step back along `x` by one
/// grid spacing per column.
pub fn serpentine_grid(
    rows: usize,
    cols: usize,
    x_range: (f64, f64),
    y_range: (f64, f64),
    z_range: (f64, f64),
) -> Vec<Vector3<f64>> {
    let xs = linspace(x_range.0, x_range.1, rows);
    let ys = linspace(y_range.0, y_range.1, cols);
    let zs = linspace(z_range.0, z_range.1, cols);
    let dx = if xs.len() > 1 { xs[1] - xs[0] } else { 0.0 };

    let mut positions = Vec::with_capacity(rows * cols);
    for (row, &x) in xs.iter().enumerate() {
        for col in 0..cols {
            let x = if row % 2 == 0 { x } else { x - col as f64 * dx };
            positions.push(Vector3::new(x, ys[col], zs[col]));
        }
    }
    positions
}

/// Pose at `position` whose -Z axis tracks `target` with +Y kept towards `up`
pub fn look_at(
    position: &Vector3<f64>,
    target: &Vector3<f64>,
    up: &Vector3<f64>,
) -> Result<CameraPose> {
    let z = (position - target)
        .try_normalize(1e-12)
        .ok_or_else(|| NppError::InvalidInput("camera position equals its target".to_string()))?;
    let x = up
        .cross(&z)
        .try_normalize(1e-12)
        .ok_or_else(|| {
            NppError::InvalidInput("up vector is parallel to the view direction".to_string())
        })?;
    let y = z.cross(&x);

    let matrix = Matrix3x4::from_columns(&[x, y, z, *position]);
    Ok(CameraPose::from_matrix(&matrix))
}

/// Add `delta_pitch_deg` to the y angle of the extrinsic x-y-z Euler
/// decomposition and shift the camera up by `delta_z`
pub fn flip_and_lift(pose: &CameraPose, delta_pitch_deg: f64, delta_z: f64) -> CameraPose {
    let q = UnitQuaternion::new_normalize(*pose.quaternion());
    let (roll, pitch, yaw) = q.euler_angles();
    let pitch = pitch + delta_pitch_deg.to_radians();
    let flipped = UnitQuaternion::from_euler_angles(roll, pitch, yaw);

    let mut translation = *pose.translation();
    translation.z += delta_z;

    let c = flipped.coords;
    CameraPose::new(translation, [c.x, c.y, c.z, c.w])
}

/// Keep items whose frame index is a multiple of `step`, exactly `count` of them
///
/// Fails when the table runs out before `count` items are collected.
pub fn sample_every<T: Clone>(
    items: &[T],
    frame_index: impl Fn(&T) -> usize,
    step: usize,
    count: usize,
) -> Result<Vec<T>> {
    if step == 0 {
        return Err(NppError::InvalidInput("sampling step must be positive".to_string()));
    }

    let sampled: Vec<T> = items
        .iter()
        .filter(|item| frame_index(*item) % step == 0)
        .take(count)
        .cloned()
        .collect();

    if sampled.len() < count {
        return Err(NppError::InvalidInput(format!(
            "not enough rows for {} samples every {} frames (found {}), try a smaller step",
            count,
            step,
            sampled.len()
        )));
    }

    Ok(sampled)
}
