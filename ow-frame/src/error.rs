//! Error taxonomy shared by every stage of the frame pipeline

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FrameError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Invalid target dimensions, normalization divisor or codec setting
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Buffer layout the requested stage cannot consume
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Failure surfaced by the resampling or codec primitive
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Codec or worker resources could not be created
    #[error("Resource initialisation failed: {0}")]
    ResourceInit(String),

    /// Byte length or stride violates the buffer invariants
    #[error("Invalid buffer: {0}")]
    InvalidBuffer(String),
}

/// Discriminant of [`FrameError`], for binding layers mapping errors to
/// host exception classes.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration = 1,
    UnsupportedFormat = 2,
    Pipeline = 3,
    ResourceInit = 4,
    InvalidBuffer = 5,
}

impl FrameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FrameError::Configuration(_) => ErrorKind::Configuration,
            FrameError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            FrameError::Pipeline(_) => ErrorKind::Pipeline,
            FrameError::ResourceInit(_) => ErrorKind::ResourceInit,
            FrameError::InvalidBuffer(_) => ErrorKind::InvalidBuffer,
        }
    }

    /// Message without the category prefix
    pub fn message(&self) -> &str {
        match self {
            FrameError::Configuration(msg)
            | FrameError::UnsupportedFormat(msg)
            | FrameError::Pipeline(msg)
            | FrameError::ResourceInit(msg)
            | FrameError::InvalidBuffer(msg) => msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_message() {
        let err = FrameError::UnsupportedFormat("unsupported channel count: 2".into());
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        assert_eq!(err.message(), "unsupported channel count: 2");
        assert_eq!(
            err.to_string(),
            "Unsupported format: unsupported channel count: 2"
        );
    }
}
