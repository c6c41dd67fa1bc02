use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] flv::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No such input file: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("No such output directory: {}", .0.display())]
    MissingOutputDir(PathBuf),
}

pub type Result<T> = std::result::Result<T, AppError>;
