//! `transforms.json` listing rendered frames and their camera-to-world matrices

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const FILE_NAME: &str = "transforms.json";

/// One rendered frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestFrame {
    /// Frame path without extension, e.g. `<output>/r_007`
    pub file_path: String,
    /// Camera-to-world, row by row
    pub transform_matrix: [[f64; 4]; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_file_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Horizontal field of view in radians
    pub camera_angle_x: f64,
    pub frames: Vec<ManifestFrame>,
}

impl Manifest {
    pub fn new(camera_angle_x: f64) -> Self {
        Self {
            camera_angle_x,
            frames: Vec::new(),
        }
    }

    pub fn push(
        &mut self,
        file_path: impl Into<String>,
        c2w: &Matrix4<f64>,
        depth_file_path: Option<String>,
    ) {
        let transform_matrix = std::array::from_fn(|r| std::array::from_fn(|c| c2w[(r, c)]));
        self.frames.push(ManifestFrame {
            file_path: file_path.into(),
            transform_matrix,
            depth_file_path,
        });
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Pretty-printed, four-space indentation
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
        self.serialize(&mut serializer)?;
        Ok(())
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        Ok(serde_json::from_reader(reader)?)
    }
}
