//! `poses_bounds.npy`: one 17-value row per camera
//!
//! Each row is the 3x5 matrix `[R | t | (H, W, f)]` flattened row-major,
//! followed by the near and far depth bounds.

use std::path::Path;

use log::{debug, info};
use nalgebra::Matrix3x4;
use ndarray::{Array2, ArrayD, ArrayView1, Ix2};
use ndarray_npy::{read_npy, write_npy};
use npp_core::{Bounds, Intrinsics, RecordError};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pose_table::PoseRecord;

/// Values per row
pub const ROW_LEN: usize = 17;

/// File name expected by NeRF's forward-facing loader
pub const FILE_NAME: &str = "poses_bounds.npy";

/// Settings for converting a pose table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertSettings {
    /// Number of leading table rows to convert
    pub frames: usize,
    pub intrinsics: Intrinsics,
    pub near: f64,
    pub far: f64,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            frames: 20,
            intrinsics: Intrinsics::new(320.0, 320.0, 28.0),
            near: 0.75,
            far: 2.0,
        }
    }
}

/// Flatten one camera into a 17-value row
pub fn encode_row(
    pose: &Matrix3x4<f64>,
    intrinsics: &Intrinsics,
    bounds: &Bounds,
) -> [f64; ROW_LEN] {
    let hwf = [intrinsics.height, intrinsics.width, intrinsics.focal];
    let mut row = [0.0; ROW_LEN];
    for r in 0..3 {
        for c in 0..4 {
            row[r * 5 + c] = pose[(r, c)];
        }
        row[r * 5 + 4] = hwf[r];
    }
    row[15] = bounds.near;
    row[16] = bounds.far;
    row
}

/// Split a 17-value row back into pose, intrinsics and bounds
pub fn decode_row(
    row: ArrayView1<f64>,
) -> std::result::Result<(Matrix3x4<f64>, Intrinsics, Bounds), RecordError> {
    if row.len() != ROW_LEN {
        return Err(RecordError::Shape {
            expected: format!("{}", ROW_LEN),
            found: format!("{}", row.len()),
        });
    }

    let pose = Matrix3x4::from_fn(|r, c| row[r * 5 + c]);
    let intrinsics = Intrinsics::new(row[4], row[9], row[14]);
    let bounds = Bounds::new(row[15], row[16]);
    Ok((pose, intrinsics, bounds))
}

/// Decoded contents of a poses/bounds array
#[derive(Debug, Clone, PartialEq)]
pub struct PosesBounds {
    pub poses: Vec<Matrix3x4<f64>>,
    pub bounds: Vec<Bounds>,
    /// Taken from the first row; every row of a set shares them
    pub intrinsics: Intrinsics,
}

impl PosesBounds {
    /// Encode pose table records with fixed intrinsics and bounds
    pub fn from_records(records: &[PoseRecord], settings: &ConvertSettings) -> Self {
        Self {
            poses: records.iter().map(|r| r.pose.to_matrix()).collect(),
            bounds: vec![Bounds::new(settings.near, settings.far); records.len()],
            intrinsics: settings.intrinsics,
        }
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// `(N, 17)` array in row order
    pub fn to_array(&self) -> Array2<f64> {
        let mut array = Array2::zeros((self.poses.len(), ROW_LEN));
        for (i, (pose, bounds)) in self.poses.iter().zip(&self.bounds).enumerate() {
            let row = encode_row(pose, &self.intrinsics, bounds);
            array.row_mut(i).iter_mut().zip(row).for_each(|(dst, v)| *dst = v);
        }
        array
    }

    pub fn from_array(array: &Array2<f64>) -> std::result::Result<Self, RecordError> {
        if array.ncols() != ROW_LEN || array.nrows() == 0 {
            return Err(RecordError::Shape {
                expected: format!("(N > 0, {})", ROW_LEN),
                found: format!("{:?}", array.shape()),
            });
        }

        let mut poses = Vec::with_capacity(array.nrows());
        let mut bounds = Vec::with_capacity(array.nrows());
        let mut intrinsics = None;
        for row in array.rows() {
            let (pose, row_intrinsics, row_bounds) = decode_row(row)?;
            intrinsics.get_or_insert(row_intrinsics);
            poses.push(pose);
            bounds.push(row_bounds);
        }

        Ok(Self {
            poses,
            bounds,
            intrinsics: intrinsics.unwrap_or(Intrinsics::new(0.0, 0.0, 0.0)),
        })
    }
}

/// Write rows as a float64 `(N, 17)` `.npy` file
pub fn write_poses_bounds<P: AsRef<Path>>(path: P, poses_bounds: &PosesBounds) -> Result<()> {
    let array = poses_bounds.to_array();
    write_npy(path.as_ref(), &array)?;
    info!(
        "Wrote {} poses to {}",
        poses_bounds.len(),
        path.as_ref().display()
    );
    Ok(())
}

/// Read the raw array, checking it is `(N, 17)`
pub fn read_array<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let array: ArrayD<f64> = read_npy(path.as_ref())?;
    debug!("{} has shape {:?}", path.as_ref().display(), array.shape());

    let found = format!("{:?}", array.shape());
    let array = array
        .into_dimensionality::<Ix2>()
        .map_err(|_| RecordError::Shape {
            expected: format!("(N, {})", ROW_LEN),
            found,
        })?;
    Ok(array)
}

pub fn read_poses_bounds<P: AsRef<Path>>(path: P) -> Result<PosesBounds> {
    let array = read_array(path)?;
    Ok(PosesBounds::from_array(&array)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IoError;
    use nalgebra::Vector3;
    use ndarray::{arr1, Array3};
    use npp_core::{CameraPose, NppError};
    use tempfile::tempdir;

    fn records(n: usize) -> Vec<PoseRecord> {
        (0..n)
            .map(|i| {
                let pose = CameraPose::new(Vector3::new(i as f64, 0.5, -1.0), [0.0, 0.0, 0.0, 1.0]);
                PoseRecord::new(i, pose)
            })
            .collect()
    }

    #[test]
    fn test_default_settings() {
        let settings = ConvertSettings::default();
        assert_eq!(settings.frames, 20);
        assert_eq!(settings.intrinsics, Intrinsics::new(320.0, 320.0, 28.0));
        assert_eq!(settings.near, 0.75);
        assert_eq!(settings.far, 2.0);
    }

    #[test]
    fn test_settings_partial_json() {
        let settings: ConvertSettings = serde_json::from_str(r#"{"frames": 120}"#).unwrap();
        assert_eq!(settings.frames, 120);
        assert_eq!(settings.far, 2.0);
    }

    #[test]
    fn test_identity_row_layout() {
        let pose = CameraPose::new(Vector3::new(1.0, 2.0, 3.0), [0.0, 0.0, 0.0, 1.0]).to_matrix();
        let row = encode_row(&pose, &Intrinsics::new(320.0, 320.0, 28.0), &Bounds::new(0.75, 2.0));

        assert_eq!(
            row,
            [
                1.0, 0.0, 0.0, 1.0, 320.0, 0.0, 1.0, 0.0, 2.0, 320.0, 0.0, 0.0, 1.0, 3.0, 28.0,
                0.75, 2.0
            ]
        );
    }

    #[test]
    fn test_decode_row() {
        let pose = CameraPose::new(Vector3::new(1.0, 2.0, 3.0), [0.0, 1.0, 0.0, 0.0]).to_matrix();
        let intrinsics = Intrinsics::new(480.0, 640.0, 28.0);
        let row = encode_row(&pose, &intrinsics, &Bounds::new(0.1, 5.0));

        let (decoded, decoded_intrinsics, bounds) = decode_row(arr1(&row).view()).unwrap();
        assert_eq!(decoded, pose);
        assert_eq!(decoded_intrinsics, intrinsics);
        assert_eq!(bounds, Bounds::new(0.1, 5.0));

        assert!(decode_row(arr1(&[1.0, 2.0]).view()).is_err());
    }

    #[test]
    fn test_write_and_read_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        let data = PosesBounds::from_records(&records(20), &ConvertSettings::default());

        write_poses_bounds(&path, &data).unwrap();
        let array = read_array(&path).unwrap();
        assert_eq!(array.shape(), &[20, 17]);
        assert!(array.column(15).iter().all(|&v| v == 0.75));
        assert!(array.column(16).iter().all(|&v| v == 2.0));
        assert_eq!(array[[7, 3]], 7.0);

        let back = read_poses_bounds(&path).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_wrong_columns() {
        let array = Array2::<f64>::zeros((3, 15));
        let err = PosesBounds::from_array(&array).unwrap_err();
        assert!(matches!(err, RecordError::Shape { .. }));
    }

    #[test]
    fn test_empty_array_rejected() {
        let array = Array2::<f64>::zeros((0, ROW_LEN));
        assert!(PosesBounds::from_array(&array).is_err());
    }

    #[test]
    fn test_wrong_rank_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cube.npy");
        write_npy(&path, &Array3::<f64>::zeros((2, 3, 5))).unwrap();

        let err = read_poses_bounds(&path).unwrap_err();
        assert!(matches!(
            err,
            IoError::Core(NppError::Record(RecordError::Shape { .. }))
        ));
    }
}
