//! Error types for texture processing.
//!
//! Every failure a stage can report is a [`TextureError`]. Callers that only
//! care about the category (for batch reporting or exit codes) use
//! [`TextureError::kind`].

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type for texture operations.
pub type TextureResult<T> = Result<T, TextureError>;

/// Failure category of a [`TextureError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Source image could not be read or is in an unsupported layout.
    DecodeError,
    /// No valid pixel or container format could be derived.
    UndefinedFormat,
    /// Unrecognised or inconsistent codec request.
    UnknownCompression,
    /// Two inputs that must share dimensions do not.
    DimensionMismatch,
    /// Input has fewer channels than the operation needs.
    InsufficientChannels,
    /// Operation is not valid for the current texture state.
    UnsupportedOperation,
    /// Open, read or write failure.
    IoError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::DecodeError => "decode error",
            ErrorKind::UndefinedFormat => "undefined format",
            ErrorKind::UnknownCompression => "unknown compression",
            ErrorKind::DimensionMismatch => "dimension mismatch",
            ErrorKind::InsufficientChannels => "insufficient channels",
            ErrorKind::UnsupportedOperation => "unsupported operation",
            ErrorKind::IoError => "I/O error",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while baking a texture.
#[derive(Debug)]
pub enum TextureError {
    /// Source image could not be decoded.
    Decode(String),

    /// No target format could be derived.
    UndefinedFormat(String),

    /// Codec request is unknown or inconsistent with the source.
    UnknownCompression(String),

    /// Width/height of two inputs differ.
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Input provides fewer channels than required.
    InsufficientChannels { required: u8, actual: u8 },

    /// Operation not valid for the texture in its current state.
    UnsupportedOperation(String),

    /// I/O failure, optionally tied to a file.
    Io {
        path: Option<PathBuf>,
        source: io::Error,
    },
}

impl TextureError {
    /// Create an I/O error tied to a path.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TextureError::Io {
            path: Some(path.into()),
            source,
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TextureError::Decode(_) => ErrorKind::DecodeError,
            TextureError::UndefinedFormat(_) => ErrorKind::UndefinedFormat,
            TextureError::UnknownCompression(_) => ErrorKind::UnknownCompression,
            TextureError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            TextureError::InsufficientChannels { .. } => ErrorKind::InsufficientChannels,
            TextureError::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            TextureError::Io { .. } => ErrorKind::IoError,
        }
    }
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::Decode(msg) => write!(f, "Failed to decode image: {}", msg),
            TextureError::UndefinedFormat(msg) => write!(f, "Undefined format: {}", msg),
            TextureError::UnknownCompression(msg) => write!(f, "Unknown compression: {}", msg),
            TextureError::DimensionMismatch { expected, actual } => write!(
                f,
                "Dimension mismatch: expected {}×{}, got {}×{}",
                expected.0, expected.1, actual.0, actual.1
            ),
            TextureError::InsufficientChannels { required, actual } => write!(
                f,
                "Insufficient channels: need at least {}, got {}",
                required, actual
            ),
            TextureError::UnsupportedOperation(msg) => {
                write!(f, "Unsupported operation: {}", msg)
            }
            TextureError::Io {
                path: Some(path),
                source,
            } => write!(f, "I/O error on {}: {}", path.display(), source),
            TextureError::Io { path: None, source } => write!(f, "I/O error: {}", source),
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextureError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for TextureError {
    fn from(err: io::Error) -> Self {
        TextureError::Io {
            path: None,
            source: err,
        }
    }
}

impl From<image::ImageError> for TextureError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => TextureError::from(e),
            other => TextureError::Decode(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_dimension_mismatch() {
        let err = TextureError::DimensionMismatch {
            expected: (64, 64),
            actual: (32, 32),
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: expected 64×64, got 32×32"
        );
    }

    #[test]
    fn test_display_io_with_path() {
        let err = TextureError::io(
            "/tmp/out.tex",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.to_string(), "I/O error on /tmp/out.tex: gone");
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            TextureError::Decode("bad".into()).kind(),
            ErrorKind::DecodeError
        );
        assert_eq!(
            TextureError::InsufficientChannels {
                required: 3,
                actual: 2
            }
            .kind(),
            ErrorKind::InsufficientChannels
        );
        assert_eq!(
            TextureError::UnsupportedOperation("swizzle".into()).kind(),
            ErrorKind::UnsupportedOperation
        );
    }

    #[test]
    fn test_from_io_error() {
        let err: TextureError = io::Error::new(io::ErrorKind::Other, "disk").into();
        assert_eq!(err.kind(), ErrorKind::IoError);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_from_image_error_is_decode() {
        let img_err = image::ImageError::Unsupported(
            image::error::UnsupportedError::from_format_and_kind(
                image::error::ImageFormatHint::Unknown,
                image::error::UnsupportedErrorKind::Format(image::error::ImageFormatHint::Unknown),
            ),
        );
        let err: TextureError = img_err.into();
        assert_eq!(err.kind(), ErrorKind::DecodeError);
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::UnknownCompression.to_string(), "unknown compression");
    }
}
