use thiserror::Error;

/// Common errors across the pose pipeline
#[derive(Error, Debug)]
pub enum NppError {
    #[error("Pose error: {0}")]
    Pose(#[from] PoseError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    #[error("Matrix is singular")]
    SingularMatrix,

    #[error("Average pose is degenerate (mean axis has near-zero length)")]
    DegenerateAverage,

    #[error("Invalid scale factor: {0}")]
    InvalidScale(f64),

    #[error("Pose set is empty")]
    EmptyPoseSet,

    #[error("Pose set has {poses} entries but bounds has {bounds}")]
    LengthMismatch { poses: usize, bounds: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Malformed record at row {row}: {reason}")]
    Malformed { row: usize, reason: String },

    #[error("Unexpected array shape: expected {expected}, found {found}")]
    Shape { expected: String, found: String },
}

pub type Result<T> = std::result::Result<T, NppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_error_display() {
        let err = PoseError::SingularMatrix;
        assert_eq!(err.to_string(), "Matrix is singular");

        let err = PoseError::InvalidScale(0.0);
        assert_eq!(err.to_string(), "Invalid scale factor: 0");

        let err = PoseError::LengthMismatch { poses: 3, bounds: 2 };
        assert_eq!(err.to_string(), "Pose set has 3 entries but bounds has 2");
    }

    #[test]
    fn test_record_error_display() {
        let err = RecordError::Malformed {
            row: 4,
            reason: "missing quot_w".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed record at row 4: missing quot_w");

        let err = RecordError::Shape {
            expected: "(N, 17)".to_string(),
            found: "(3, 15)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unexpected array shape: expected (N, 17), found (3, 15)"
        );
    }

    #[test]
    fn test_npp_error_from_pose_error() {
        let npp_err: NppError = PoseError::DegenerateAverage.into();
        assert!(matches!(npp_err, NppError::Pose(PoseError::DegenerateAverage)));
    }

    #[test]
    fn test_npp_error_from_record_error() {
        let record_err = RecordError::Malformed {
            row: 1,
            reason: "empty".to_string(),
        };
        let npp_err: NppError = record_err.into();
        assert!(matches!(npp_err, NppError::Record(_)));
    }

    #[test]
    fn test_npp_error_invalid_input() {
        let err = NppError::InvalidInput("step must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid input: step must be positive");
    }
}
