//! Depth maps saved next to rendered frames as compressed `.npz`

use std::fs::File;
use std::path::Path;

use ndarray::{s, Array2};
use ndarray_npy::{NpzReader, NpzWriter};
use npp_core::RecordError;

use crate::error::Result;

/// Array name inside the `.npz` archive
pub const DEPTH_KEY: &str = "depth";

/// Pull channel 3 out of an interleaved RGBA float buffer whose alpha carries depth
///
/// Rows keep the buffer order; renderer buffers are usually bottom-up, see [`flip_rows`].
pub fn depth_from_rgbz(
    pixels: &[f32],
    width: usize,
    height: usize,
) -> std::result::Result<Array2<f32>, RecordError> {
    let expected = width * height * 4;
    if pixels.len() != expected {
        return Err(RecordError::Shape {
            expected: format!("{} values ({} x {} x 4)", expected, height, width),
            found: pixels.len().to_string(),
        });
    }

    let depth: Vec<f32> = pixels.chunks_exact(4).map(|px| px[3]).collect();
    Array2::from_shape_vec((height, width), depth).map_err(|e| RecordError::Shape {
        expected: format!("({}, {})", height, width),
        found: e.to_string(),
    })
}

/// Reverse the row order (bottom-up buffer to top-down image)
pub fn flip_rows(depth: &Array2<f32>) -> Array2<f32> {
    depth.slice(s![..;-1, ..]).to_owned()
}

pub fn write_depth_npz<P: AsRef<Path>>(path: P, depth: &Array2<f32>) -> Result<()> {
    let mut npz = NpzWriter::new_compressed(File::create(path.as_ref())?);
    npz.add_array(DEPTH_KEY, depth)?;
    npz.finish()?;
    Ok(())
}

pub fn read_depth_npz<P: AsRef<Path>>(path: P) -> Result<Array2<f32>> {
    let mut npz = NpzReader::new(File::open(path.as_ref())?)?;
    Ok(npz.by_name(DEPTH_KEY)?)
}
