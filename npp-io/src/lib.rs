//! File adapters for pose tables, NeRF training arrays and render outputs

pub mod camera_dict;
pub mod depth;
pub mod error;
pub mod manifest;
pub mod pose_table;
pub mod poses_bounds;
pub mod render;

pub use camera_dict::{export_camera_dicts, CameraDict, CameraEntry};
pub use error::{IoError, Result};
pub use manifest::Manifest;
pub use pose_table::PoseRecord;
pub use poses_bounds::{ConvertSettings, PosesBounds};
pub use render::{render_trajectory, RenderConfig, Renderer};
