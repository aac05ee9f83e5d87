//! Camera pose encoding, normalization and axis conventions

mod axes;
mod codec;
mod normalize;

pub use axes::AxisRemap;
pub use codec::{invert, quaternion_to_rotation_matrix, to_homogeneous, truncate, CameraPose};
pub use normalize::{
    average_pose, center_poses, recenter_and_rescale, rescale, uncenter_poses, Bounds,
    NormalizedPoses, NEAR_SCALE,
};
