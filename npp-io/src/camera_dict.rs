//! Per-camera `K` / `W2C` dictionaries consumed by external viewers
//!
//! ```json
//! { "000": { "K": [16 floats], "W2C": [16 floats], "img_size": [H, W] }, ... }
//! ```
//!
//! Matrices are flattened row-major.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::{debug, info};
use nalgebra::{Matrix3x4, Matrix4};
use npp_core::frustum::{build_frustum, Frustum};
use npp_core::pose::{invert, recenter_and_rescale, to_homogeneous};
use npp_core::{AxisRemap, Intrinsics, RecordError};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::poses_bounds::PosesBounds;

/// Focal length used when exporting camera dictionaries for the stomach scenes
pub const DEFAULT_FOCAL: f64 = 680.0;

pub const ORIGINAL_FILE: &str = "camera_original.json";
pub const RECENTER_FILE: &str = "camera_recenter.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraEntry {
    #[serde(rename = "K")]
    pub k: Vec<f64>,
    #[serde(rename = "W2C")]
    pub w2c: Vec<f64>,
    /// `[height, width]`
    pub img_size: [f64; 2],
}

impl CameraEntry {
    pub fn k_matrix(&self) -> std::result::Result<Matrix4<f64>, RecordError> {
        unflatten(&self.k, "K")
    }

    pub fn w2c_matrix(&self) -> std::result::Result<Matrix4<f64>, RecordError> {
        unflatten(&self.w2c, "W2C")
    }

    /// `(width, height)`
    pub fn image_size(&self) -> (f64, f64) {
        (self.img_size[1], self.img_size[0])
    }
}

/// Entries keyed by zero-padded frame index
///
/// Keys sort as strings, so `"1000"` comes before `"999"`. Iterate with
/// [`entries_in_frame_order`] when order matters.
pub type CameraDict = BTreeMap<String, CameraEntry>;

/// Entries sorted by the numeric value of their key
///
/// Keys that are not integers go last, in string order.
pub fn entries_in_frame_order(dict: &CameraDict) -> Vec<(&str, &CameraEntry)> {
    let mut entries: Vec<_> = dict.iter().map(|(k, v)| (k.as_str(), v)).collect();
    entries.sort_by_key(|(key, _)| (key.parse::<usize>().unwrap_or(usize::MAX), *key));
    entries
}

fn flatten(matrix: &Matrix4<f64>) -> Vec<f64> {
    // nalgebra storage is column-major
    matrix.transpose().as_slice().to_vec()
}

fn unflatten(values: &[f64], name: &str) -> std::result::Result<Matrix4<f64>, RecordError> {
    if values.len() != 16 {
        return Err(RecordError::Shape {
            expected: format!("16 values for {}", name),
            found: values.len().to_string(),
        });
    }
    Ok(Matrix4::from_row_slice(values))
}

/// Invert each camera-to-world pose into a dictionary entry
pub fn build_camera_dict(poses: &[Matrix3x4<f64>], intrinsics: &Intrinsics) -> Result<CameraDict> {
    let k = flatten(&intrinsics.matrix());

    let mut dict = CameraDict::new();
    for (idx, pose) in poses.iter().enumerate() {
        let w2c = invert(&to_homogeneous(pose))?;
        dict.insert(
            format!("{:03}", idx),
            CameraEntry {
                k: k.clone(),
                w2c: flatten(&w2c),
                img_size: [intrinsics.height, intrinsics.width],
            },
        );
    }
    Ok(dict)
}

/// Frustums for every entry, in frame order
pub fn frustums_from_camera_dict(
    dict: &CameraDict,
    length: f64,
    color: [f64; 3],
) -> Result<Vec<Frustum>> {
    entries_in_frame_order(dict)
        .into_iter()
        .map(|(_, entry)| {
            let frustum = build_frustum(
                entry.image_size(),
                &entry.k_matrix()?,
                &entry.w2c_matrix()?,
                length,
                color,
            )?;
            Ok(frustum)
        })
        .collect()
}

/// Build the camera dictionary of a poses/bounds set
///
/// Rotations are relabeled from "down, right, back" to "right, up, back".
/// With `recenter` the poses are also centered on their average and scaled
/// by the nearest bound. `focal_override` replaces the stored focal length.
pub fn export_camera_dicts(
    poses_bounds: &PosesBounds,
    focal_override: Option<f64>,
    recenter: bool,
) -> Result<CameraDict> {
    let mut intrinsics = poses_bounds.intrinsics;
    if let Some(focal) = focal_override {
        intrinsics.focal = focal;
    }
    debug!(
        "exporting {} cameras ({} x {}, f = {})",
        poses_bounds.len(),
        intrinsics.height,
        intrinsics.width,
        intrinsics.focal
    );

    let mut poses = AxisRemap::DOWN_RIGHT_BACK_TO_RIGHT_UP_BACK.remap_all(&poses_bounds.poses);
    if recenter {
        let normalized = recenter_and_rescale(&poses, &poses_bounds.bounds)?;
        info!(
            "Recentered {} poses, scale factor {:.4}, closest to center: {}",
            normalized.poses.len(),
            normalized.scale_factor,
            normalized.closest_to_center
        );
        poses = normalized.poses;
    }

    build_camera_dict(&poses, &intrinsics)
}

pub fn write_camera_dict<P: AsRef<Path>>(path: P, dict: &CameraDict) -> Result<()> {
    let writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer(writer, dict)?;
    info!("Wrote {} cameras to {}", dict.len(), path.as_ref().display());
    Ok(())
}

pub fn read_camera_dict<P: AsRef<Path>>(path: P) -> Result<CameraDict> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IoError;
    use nalgebra::Vector3;
    use npp_core::frustum::ORANGE;
    use npp_core::{Bounds, CameraPose, NppError, PoseError};
    use tempfile::tempdir;

    fn sample_set() -> PosesBounds {
        let poses = (0..3)
            .map(|i| {
                CameraPose::new(Vector3::new(i as f64, 0.0, 1.0), [0.0, 0.0, 0.0, 1.0]).to_matrix()
            })
            .collect();
        PosesBounds {
            poses,
            bounds: vec![Bounds::new(0.75, 2.0); 3],
            intrinsics: Intrinsics::new(480.0, 640.0, 28.0),
        }
    }

    #[test]
    fn test_flatten_is_row_major() {
        let m = Matrix4::from_fn(|r, c| (r * 4 + c) as f64);
        let flat = flatten(&m);
        assert_eq!(flat, (0..16).map(|v| v as f64).collect::<Vec<_>>());
        assert_eq!(unflatten(&flat, "M").unwrap(), m);
    }

    #[test]
    fn test_unflatten_wrong_length() {
        assert!(matches!(
            unflatten(&[1.0; 9], "K"),
            Err(RecordError::Shape { .. })
        ));
    }

    #[test]
    fn test_build_camera_dict() {
        let set = sample_set();
        let dict = build_camera_dict(&set.poses, &set.intrinsics).unwrap();

        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["000", "001", "002"]);

        let entry = &dict["002"];
        assert_eq!(entry.img_size, [480.0, 640.0]);
        assert_eq!(entry.k[0], 28.0);
        assert_eq!(entry.k[2], 320.0);
        assert_eq!(entry.k[6], 240.0);

        // Identity rotation: W2C translation is the negated camera position
        let w2c = entry.w2c_matrix().unwrap();
        assert!((w2c[(0, 3)] + 2.0).abs() < 1e-12);
        assert!((w2c[(2, 3)] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_singular_pose() {
        let result = build_camera_dict(&[Matrix3x4::zeros()], &Intrinsics::new(1.0, 1.0, 1.0));
        assert!(matches!(
            result.unwrap_err(),
            IoError::Core(NppError::Pose(PoseError::SingularMatrix))
        ));
    }

    #[test]
    fn test_export_remaps_axes() {
        let set = sample_set();
        let dict = export_camera_dicts(&set, Some(DEFAULT_FOCAL), false).unwrap();

        let entry = &dict["000"];
        assert_eq!(entry.k[0], DEFAULT_FOCAL);

        // c2w rotation columns become [c1, -c0, c2]; W2C rotation is its transpose
        let w2c = entry.w2c_matrix().unwrap();
        assert!((w2c[(0, 1)] - 1.0).abs() < 1e-12);
        assert!((w2c[(1, 0)] + 1.0).abs() < 1e-12);
        assert!((w2c[(2, 2)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_export_recentered() {
        let set = sample_set();
        let dict = export_camera_dicts(&set, None, true).unwrap();
        assert_eq!(dict.len(), 3);

        // Middle camera sits at the average pose, so it becomes the origin
        let c2w = invert(&dict["001"].w2c_matrix().unwrap()).unwrap();
        let center = Vector3::new(c2w[(0, 3)], c2w[(1, 3)], c2w[(2, 3)]);
        assert!(center.norm() < 1e-9);
    }

    #[test]
    fn test_frustums_follow_key_order() {
        let set = sample_set();
        let dict = export_camera_dicts(&set, Some(DEFAULT_FOCAL), false).unwrap();
        let frustums = frustums_from_camera_dict(&dict, 0.1, ORANGE).unwrap();

        assert_eq!(frustums.len(), 3);
        for (i, frustum) in frustums.iter().enumerate() {
            assert!((frustum.points[0].x - i as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_frustums_follow_frame_order_past_999() {
        let poses: Vec<_> = (0..1001)
            .map(|i| {
                CameraPose::new(Vector3::new(i as f64, 0.0, 1.0), [0.0, 0.0, 0.0, 1.0]).to_matrix()
            })
            .collect();
        let dict = build_camera_dict(&poses, &Intrinsics::new(480.0, 640.0, 28.0)).unwrap();
        assert!(dict.contains_key("1000"));

        let frustums = frustums_from_camera_dict(&dict, 0.1, ORANGE).unwrap();
        assert_eq!(frustums.len(), 1001);
        assert!((frustums[101].points[0].x - 101.0).abs() < 1e-9);
        assert!((frustums[1000].points[0].x - 1000.0).abs() < 1e-9);
        assert!(frustums
            .windows(2)
            .all(|pair| pair[0].points[0].x < pair[1].points[0].x));
    }

    #[test]
    fn test_entries_in_frame_order() {
        let entry = CameraEntry {
            k: vec![0.0; 16],
            w2c: vec![0.0; 16],
            img_size: [1.0, 1.0],
        };
        let dict: CameraDict = ["1000", "999", "extra", "002"]
            .into_iter()
            .map(|k| (k.to_string(), entry.clone()))
            .collect();

        let keys: Vec<&str> = entries_in_frame_order(&dict).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["002", "999", "1000", "extra"]);
    }

    #[test]
    fn test_write_and_read_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(ORIGINAL_FILE);
        let set = sample_set();
        let dict = export_camera_dicts(&set, None, false).unwrap();

        write_camera_dict(&path, &dict).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"W2C\""));
        assert!(text.contains("\"img_size\":[480.0,640.0]"));

        assert_eq!(read_camera_dict(&path).unwrap(), dict);
    }
}
