//! Error types for tactilecrate

use thiserror::Error;

/// Main error type for tactilecrate operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source image could not be read or decoded.
    #[error("Input error: {0}")]
    Input(String),

    /// The pipeline cannot run with the given settings or image content.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A mesh buffer broke one of its structural invariants.
    #[error("Geometry invariant violated: {0}")]
    GeometryInvariant(String),

    /// The downstream mesh engine failed.
    #[error("Generation unsuccessful: {0}")]
    PostProcess(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for tactilecrate operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Configuration("no relevant colors".to_string());
        assert_eq!(format!("{err}"), "Configuration error: no relevant colors");

        let err = Error::PostProcess("disk full".to_string());
        assert!(format!("{err}").starts_with("Generation unsuccessful"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
