//! Camera pose math for preparing NeRF training data

pub mod camera;
pub mod error;
pub mod frustum;
pub mod pose;
pub mod trajectory;

pub use camera::{build_intrinsic_matrix, Intrinsics};
pub use error::{NppError, PoseError, RecordError, Result};
pub use frustum::{build_frustum, merge_frustums, Frustum, LineSet};
pub use pose::{AxisRemap, Bounds, CameraPose};
