// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the tritanopia pipelines

use thiserror::Error;

/// Result type alias using PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failures of a still-image operation (one capture or one image load)
///
/// None of these are fatal to the process. They abort the current operation,
/// are caught at the pipeline boundary and surfaced through [`user_message`].
///
/// [`user_message`]: PipelineError::user_message
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Corrupt or unsupported source image
    #[error("Decode failed: {0}")]
    Decode(String),
    /// Render target could not be created (usually memory pressure)
    #[error("Allocation failed: {0}")]
    Allocation(String),
    /// Rendered result could not be serialized
    #[error("Encoding failed: {0}")]
    Encode(String),
    /// Reading the source or writing the temporary output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Photo-library collaborator refused or failed the save
    #[error("Save failed: {0}")]
    Save(String),
    /// Camera or storage access refused
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Background task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),
}

impl PipelineError {
    /// Short message suitable for showing to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::Decode(_) => "The photo could not be read.",
            PipelineError::Allocation(_) => "Not enough memory to process the photo.",
            PipelineError::Encode(_) => "The filtered photo could not be encoded.",
            PipelineError::Io(_) => "The photo could not be written to storage.",
            PipelineError::Save(_) => "The photo could not be saved to the library.",
            PipelineError::PermissionDenied(_) => "Storage access is required to save photos.",
            PipelineError::Task(_) => "Photo processing was interrupted.",
        }
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => PipelineError::Io(e),
            image::ImageError::Limits(e) => PipelineError::Allocation(e.to_string()),
            image::ImageError::Encoding(e) => PipelineError::Encode(e.to_string()),
            other => PipelineError::Decode(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        PipelineError::Task(err.to_string())
    }
}

/// Failure reported by a frame's render operation
///
/// Render failures on the live path are logged and counted, never propagated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Backing surface size does not match the frame dimensions
    #[error("Frame buffer is {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    /// Collaborator-specific render failure
    #[error("Render failed: {0}")]
    Render(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_error_mapping() {
        let io = image::ImageError::IoError(std::io::Error::other("disk gone"));
        assert!(matches!(PipelineError::from(io), PipelineError::Io(_)));

        let unsupported = image::ImageError::Unsupported(
            image::error::UnsupportedError::from_format_and_kind(
                image::error::ImageFormatHint::Unknown,
                image::error::UnsupportedErrorKind::Format(image::error::ImageFormatHint::Unknown),
            ),
        );
        assert!(matches!(
            PipelineError::from(unsupported),
            PipelineError::Decode(_)
        ));
    }

    #[test]
    fn test_user_messages_are_not_empty() {
        let errors = [
            PipelineError::Decode("x".into()),
            PipelineError::Allocation("x".into()),
            PipelineError::Encode("x".into()),
            PipelineError::Save("x".into()),
            PipelineError::PermissionDenied("x".into()),
            PipelineError::Task("x".into()),
        ];
        for err in errors {
            assert!(!err.user_message().is_empty(), "{err:?}");
        }
    }
}
