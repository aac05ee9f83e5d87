//! Pinhole camera intrinsics

mod pinhole;

pub use pinhole::{build_intrinsic_matrix, Intrinsics};
