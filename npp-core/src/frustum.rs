//! Camera frustum line geometry for visual checks of pose data

use nalgebra::{Matrix4, Point3, Vector4};
use serde::{Deserialize, Serialize};

use crate::error::{NppError, Result};
use crate::pose::invert;

/// Apex plus four image-plane corners
pub const FRUSTUM_POINTS: usize = 5;

/// Four apex-to-corner edges plus the four edges of the image rectangle
pub const FRUSTUM_LINES: usize = 8;

pub const ORANGE: [f64; 3] = [1.0, 0.6, 0.2];
pub const BLUE: [f64; 3] = [0.2, 0.6, 1.0];

const LINES: [[usize; 2]; FRUSTUM_LINES] = [
    [0, 1],
    [0, 2],
    [0, 3],
    [0, 4],
    [1, 2],
    [2, 3],
    [3, 4],
    [4, 1],
];

/// World-space frustum of a single camera
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// 0 = apex, 1..=4 = top-left, top-right, bottom-right, bottom-left
    pub points: [Point3<f64>; FRUSTUM_POINTS],
    pub lines: [[usize; 2]; FRUSTUM_LINES],
    pub colors: [[f64; 3]; FRUSTUM_LINES],
}

/// Merged geometry of many frustums, ready for a line-set viewer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineSet {
    pub points: Vec<[f64; 3]>,
    pub lines: Vec<[usize; 2]>,
    pub colors: Vec<[f64; 3]>,
}

/// Build the frustum of a camera
///
/// # Arguments
/// * `image_size` - `(width, height)` in pixels
/// * `k` - intrinsic matrix, focal lengths read from `k[(0, 0)]` and `k[(1, 1)]`
/// * `w2c` - world-to-camera transform
/// * `length` - distance from apex to the image plane
/// * `color` - color given to all eight lines
pub fn build_frustum(
    image_size: (f64, f64),
    k: &Matrix4<f64>,
    w2c: &Matrix4<f64>,
    length: f64,
    color: [f64; 3],
) -> Result<Frustum> {
    let (width, height) = image_size;
    let (fx, fy) = (k[(0, 0)], k[(1, 1)]);
    if !(fx.is_finite() && fy.is_finite()) || fx == 0.0 || fy == 0.0 {
        return Err(NppError::InvalidInput(format!(
            "invalid focal lengths ({}, {})",
            fx, fy
        )));
    }

    let hfov = 2.0 * (width / 2.0 / fx).atan();
    let vfov = 2.0 * (height / 2.0 / fy).atan();
    let half_w = length * (hfov / 2.0).tan();
    let half_h = length * (vfov / 2.0).tan();

    let camera_points = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(-half_w, -half_h, length),
        Point3::new(half_w, -half_h, length),
        Point3::new(half_w, half_h, length),
        Point3::new(-half_w, half_h, length),
    ];

    let c2w = invert(w2c)?;
    let points = camera_points.map(|p| {
        let h = c2w * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(h.x / h.w, h.y / h.w, h.z / h.w)
    });

    Ok(Frustum {
        points,
        lines: LINES,
        colors: [color; FRUSTUM_LINES],
    })
}

/// Concatenate frustums into one line set
///
/// Line indices of frustum `i` are offset by `5 * i` so each frustum keeps
/// referencing its own points.
pub fn merge_frustums(frustums: &[Frustum]) -> LineSet {
    let mut merged = LineSet {
        points: Vec::with_capacity(frustums.len() * FRUSTUM_POINTS),
        lines: Vec::with_capacity(frustums.len() * FRUSTUM_LINES),
        colors: Vec::with_capacity(frustums.len() * FRUSTUM_LINES),
    };

    for (i, frustum) in frustums.iter().enumerate() {
        let offset = i * FRUSTUM_POINTS;
        merged
            .points
            .extend(frustum.points.iter().map(|p| [p.x, p.y, p.z]));
        merged
            .lines
            .extend(frustum.lines.iter().map(|[a, b]| [a + offset, b + offset]));
        merged.colors.extend_from_slice(&frustum.colors);
    }

    merged
}
