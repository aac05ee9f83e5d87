//! Drive an external renderer along a camera trajectory
//!
//! The renderer itself is opaque and hidden behind [`Renderer`]. For every
//! pose this module saves the colour frame, optionally a depth map, and
//! finally a `transforms.json` manifest.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use log::{debug, info, warn};
use nalgebra::Vector3;
use ndarray::Array2;
use npp_core::trajectory::{flip_and_lift, look_at, serpentine_grid, FLIP_PITCH_DEG, LIFT_Z};
use npp_core::CameraPose;
use serde::{Deserialize, Serialize};

use crate::depth::{depth_from_rgbz, flip_rows, write_depth_npz};
use crate::error::{IoError, Result};
use crate::manifest::{self, Manifest};
use crate::pose_table::{read_pose_csv, read_pose_xlsx};

/// Horizontal field of view of the stomach scene camera, 26.2 degrees
pub const DEFAULT_CAMERA_ANGLE_X: f64 = 26.2 * std::f64::consts::PI / 180.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Pose table (CSV or XLSX) to follow; a scripted grid sweep when absent
    pub input_path: Option<PathBuf>,
    pub output_path: PathBuf,
    pub frames: usize,
    /// `(width, height)` in pixels
    pub resolution: (u32, u32),
    pub render_depth: bool,
    /// Log the first camera and stop before rendering anything
    pub debug: bool,
    /// Turn table poses upside down and lift them before rendering
    pub update_camera: bool,
    pub camera_angle_x: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            input_path: None,
            output_path: PathBuf::from("frames"),
            frames: 70,
            resolution: (640, 480),
            render_depth: true,
            debug: false,
            update_camera: false,
            camera_angle_x: DEFAULT_CAMERA_ANGLE_X,
        }
    }
}

/// Passes the renderer must produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOutputs {
    pub color: bool,
    pub depth: bool,
}

/// Output of one [`Renderer::render_frame`] call
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub color: RgbaImage,
    /// Row 0 is the bottom of the image, as renderer buffers are laid out
    pub depth: Option<Array2<f32>>,
}

impl RenderedFrame {
    pub fn color_only(color: RgbaImage) -> Self {
        Self { color, depth: None }
    }

    /// Colour frame plus depth taken from the alpha channel of an RGBA float pass
    ///
    /// `rgbz` must hold `width * height * 4` values with the frame's dimensions.
    pub fn with_rgbz(color: RgbaImage, rgbz: &[f32]) -> Result<Self> {
        let (width, height) = color.dimensions();
        let depth = depth_from_rgbz(rgbz, width as usize, height as usize)?;
        Ok(Self {
            color,
            depth: Some(depth),
        })
    }
}

/// An external renderer with a single camera
pub trait Renderer {
    fn configure(&mut self, resolution: (u32, u32), outputs: RenderOutputs) -> Result<()>;

    fn render_frame(&mut self, pose: &CameraPose) -> Result<RenderedFrame>;
}

/// Stem of frame `index`: `r_000`, `r_001`, ...
pub fn frame_stem(index: usize) -> String {
    format!("r_{:03}", index)
}

/// Grid sweep used when no pose table is given
///
/// Five rows of six cameras between z = 8.2 and 8.4, all looking at the origin.
pub fn scripted_trajectory() -> Result<Vec<CameraPose>> {
    let target = Vector3::zeros();
    let up = Vector3::y();
    let poses = serpentine_grid(5, 6, (-0.3, 0.3), (-0.3, 0.3), (8.2, 8.4))
        .iter()
        .map(|position| look_at(position, &target, &up))
        .collect::<npp_core::Result<Vec<_>>>()?;
    Ok(poses)
}

/// Camera poses to render for `config`
pub fn load_trajectory(config: &RenderConfig) -> Result<Vec<CameraPose>> {
    let Some(path) = &config.input_path else {
        return scripted_trajectory();
    };

    let records = match path.extension().and_then(|e| e.to_str()) {
        Some("xlsx") => read_pose_xlsx(path, Some(config.frames))?,
        Some("csv") => read_pose_csv(path, Some(config.frames))?,
        _ => {
            return Err(IoError::Renderer(format!(
                "unsupported pose table {}",
                path.display()
            )));
        }
    };

    let poses = records.iter().map(|r| r.pose);
    if config.update_camera {
        Ok(poses.map(|p| flip_and_lift(&p, FLIP_PITCH_DEG, LIFT_Z)).collect())
    } else {
        Ok(poses.collect())
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Render up to `config.frames` poses into `config.output_path`
///
/// Writes `r_###.png`, `r_###_depth.npz` when depth is requested, and
/// `transforms.json` once every frame has been saved. In debug mode only the
/// first pose is logged and nothing is rendered or written.
pub fn render_trajectory<R: Renderer + ?Sized>(
    renderer: &mut R,
    poses: &[CameraPose],
    config: &RenderConfig,
) -> Result<Manifest> {
    let mut manifest = Manifest::new(config.camera_angle_x);

    if config.debug {
        if let Some(first) = poses.first() {
            info!(
                "Debug: first camera at {:?}, quaternion (x, y, z, w) {:?}",
                first.translation(),
                first.quaternion_xyzw()
            );
        }
        return Ok(manifest);
    }

    if poses.len() < config.frames {
        warn!(
            "{} frames requested but only {} poses available",
            config.frames,
            poses.len()
        );
    }

    fs::create_dir_all(&config.output_path)?;
    renderer.configure(
        config.resolution,
        RenderOutputs {
            color: true,
            depth: config.render_depth,
        },
    )?;

    let (width, height) = config.resolution;
    for (i, pose) in poses.iter().take(config.frames).enumerate() {
        let stem = config.output_path.join(frame_stem(i));
        info!("Rendering frame {}...", i);

        let frame = renderer.render_frame(pose)?;
        if frame.color.dimensions() != (width, height) {
            return Err(IoError::Renderer(format!(
                "frame {} is {:?}, expected {:?}",
                i,
                frame.color.dimensions(),
                (width, height)
            )));
        }
        frame.color.save(stem.with_extension("png"))?;

        let depth_file_path = if config.render_depth {
            let depth = frame
                .depth
                .ok_or_else(|| IoError::Renderer(format!("no depth returned for frame {}", i)))?;
            let depth = flip_rows(&depth);
            debug!(
                "frame {} depth range [{}, {}]",
                i,
                depth.iter().copied().fold(f32::INFINITY, f32::min),
                depth.iter().copied().fold(f32::NEG_INFINITY, f32::max)
            );

            let path = PathBuf::from(format!("{}_depth.npz", path_string(&stem)));
            write_depth_npz(&path, &depth)?;
            Some(path_string(&path))
        } else {
            None
        };

        manifest.push(path_string(&stem), &pose.to_homogeneous(), depth_file_path);
    }

    manifest.write(config.output_path.join(manifest::FILE_NAME))?;
    info!(
        "Rendered {} frames to {}",
        manifest.len(),
        config.output_path.display()
    );
    Ok(manifest)
}
