//! Error types for bathygrid

use thiserror::Error;

/// Boxed error raised by an external collaborator (point store, sink, ...).
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for bathygrid operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in grid of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Area has zero extent: x [{min_x}, {max_x}], y [{min_y}, {max_y}]")]
    ZeroArea {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },

    #[error("Degenerate cell size: {dx} x {dy}")]
    DegenerateCellSize { dx: f64, dy: f64 },

    #[error("Unsupported projection zone: {0}")]
    UnsupportedZone(String),

    #[error("TIFF error: {0}")]
    Tiff(String),

    #[error("Point or feature source failed: {0}")]
    Source(#[source] BoxedError),

    #[error("Output sink failed: {0}")]
    Sink(#[source] BoxedError),

    #[error("Synthesis cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap a collaborator error raised while reading input data.
    pub fn from_source<E: Into<BoxedError>>(err: E) -> Self {
        Error::Source(err.into())
    }

    /// Wrap a collaborator error raised while writing output.
    pub fn from_sink<E: Into<BoxedError>>(err: E) -> Self {
        Error::Sink(err.into())
    }

    /// Configuration errors are detected before any grid is allocated.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidParameter { .. }
                | Error::ZeroArea { .. }
                | Error::DegenerateCellSize { .. }
                | Error::UnsupportedZone(_)
        )
    }
}

impl From<tiff::TiffError> for Error {
    fn from(e: tiff::TiffError) -> Self {
        Error::Tiff(e.to_string())
    }
}

/// Result type alias for bathygrid operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(Error::DegenerateCellSize { dx: 0.0, dy: 0.0 }.is_configuration());
        assert!(Error::UnsupportedZone("61".into()).is_configuration());
        assert!(!Error::Cancelled.is_configuration());
        assert!(!Error::from_sink("disk full").is_configuration());
        assert!(matches!(Error::from_source("bad bin index"), Error::Source(_)));
    }

    #[test]
    fn test_sink_error_keeps_source() {
        use std::error::Error as _;
        let err = Error::from_sink(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("disk full"));
    }
}
