//! Error types for I/O operations

use thiserror::Error;

/// Errors raised while reading images or writing meshes
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Cannot decode image {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Write error for {path}: {message}")]
    WriteError { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IoError> for tactilecrate_core::Error {
    fn from(err: IoError) -> Self {
        match err {
            IoError::FileNotFound { .. } | IoError::Decode { .. } => {
                tactilecrate_core::Error::Input(err.to_string())
            }
            IoError::WriteError { .. } => {
                tactilecrate_core::Error::Io(std::io::Error::other(err.to_string()))
            }
            IoError::Io(io) => tactilecrate_core::Error::Io(io),
        }
    }
}
