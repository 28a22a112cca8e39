//! Error types for adskip.

use thiserror::Error;

use crate::template::TemplateId;

/// Result alias for adskip operations.
pub type AdSkipResult<T> = std::result::Result<T, AdSkipError>;

/// Errors that can occur while converting, storing, or matching templates.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AdSkipError {
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Pixel buffer length does not match the declared dimensions.
    #[error("buffer length mismatch: needed {needed}, got {got}")]
    BufferLength { needed: usize, got: usize },
    /// A rectangle does not fit inside the image it is applied to.
    #[error("region {x},{y} {width}x{height} outside {img_width}x{img_height} image")]
    RegionOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Skip durations must be positive milliseconds.
    #[error("invalid duration: {0} ms")]
    InvalidDuration(i64),
    /// No template with this id exists in the store.
    #[error("template {0} not found")]
    NotFound(TemplateId),
    /// Correlation search image is smaller than the template.
    #[error(
        "search image {search_width}x{search_height} smaller than template {template_width}x{template_height}"
    )]
    SearchTooSmall {
        template_width: usize,
        template_height: usize,
        search_width: usize,
        search_height: usize,
    },
    /// The backing store failed.
    #[error("storage error: {reason}")]
    Storage { reason: String },
    /// A capture file could not be read or decoded.
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}

/// Coarse classification of [`AdSkipError`] for callers deciding on retries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input supplied by the caller.
    Validation,
    /// Lookup by an unknown id.
    NotFound,
    /// Persistence failure; the caller may retry.
    Storage,
    /// Correlation contract violation (search smaller than template).
    Precondition,
}

impl AdSkipError {
    /// Returns the taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::SearchTooSmall { .. } => ErrorKind::Precondition,
            Self::InvalidDimensions { .. }
            | Self::InvalidStride { .. }
            | Self::BufferLength { .. }
            | Self::RegionOutOfBounds { .. }
            | Self::InvalidInput(_)
            | Self::InvalidDuration(_)
            | Self::ImageIo { .. } => ErrorKind::Validation,
        }
    }

    pub(crate) fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage {
            reason: err.to_string(),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for AdSkipError {
    fn from(err: rusqlite::Error) -> Self {
        Self::storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::{AdSkipError, ErrorKind};
    use crate::template::TemplateId;

    #[test]
    fn kinds_are_distinguishable() {
        assert_eq!(
            AdSkipError::NotFound(TemplateId(7)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(AdSkipError::storage("disk full").kind(), ErrorKind::Storage);
        assert_eq!(AdSkipError::InvalidDuration(0).kind(), ErrorKind::Validation);
        assert_eq!(
            AdSkipError::ImageIo {
                reason: "truncated png".into()
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            AdSkipError::SearchTooSmall {
                template_width: 4,
                template_height: 4,
                search_width: 2,
                search_height: 8,
            }
            .kind(),
            ErrorKind::Precondition
        );
    }

    #[test]
    fn storage_message_keeps_reason() {
        let err = AdSkipError::storage("database is locked");
        assert_eq!(err.to_string(), "storage error: database is locked");
    }
}
