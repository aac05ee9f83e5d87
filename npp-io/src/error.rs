use npp_core::{NppError, PoseError, RecordError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),

    #[error("Spreadsheet has no worksheet")]
    NoWorksheet,

    #[error("NPY read error: {0}")]
    ReadNpy(#[from] ndarray_npy::ReadNpyError),

    #[error("NPY write error: {0}")]
    WriteNpy(#[from] ndarray_npy::WriteNpyError),

    #[error("NPZ read error: {0}")]
    ReadNpz(#[from] ndarray_npy::ReadNpzError),

    #[error("NPZ write error: {0}")]
    WriteNpz(#[from] ndarray_npy::WriteNpzError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Renderer error: {0}")]
    Renderer(String),

    #[error(transparent)]
    Core(#[from] NppError),
}

impl From<PoseError> for IoError {
    fn from(err: PoseError) -> Self {
        IoError::Core(err.into())
    }
}

impl From<RecordError> for IoError {
    fn from(err: RecordError) -> Self {
        IoError::Core(err.into())
    }
}

pub type Result<T> = std::result::Result<T, IoError>;
