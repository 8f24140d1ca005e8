//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while analyzing images, videos and datasets.
#[derive(Debug, Error)]
pub enum MediaError {
    /// No face in the image, or in any sampled frame of the video.
    #[error("No face detected")]
    NoFaceDetected,

    #[error("Cannot read source {path}: {reason}")]
    SourceUnreadable { path: PathBuf, reason: String },

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Invalid sampling stride {0}: must be at least 1")]
    InvalidStride(usize),

    #[error("Face detection failed: {0}")]
    DetectionFailed(String),

    #[error("Face classification failed: {0}")]
    ClassificationFailed(String),

    #[error("Cannot write output {path}: {reason}")]
    OutputFailed { path: PathBuf, reason: String },

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a source-unreadable error.
    pub fn source_unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an output failure error.
    pub fn output_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::OutputFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create a classification failure error.
    pub fn classification_failed(message: impl Into<String>) -> Self {
        Self::ClassificationFailed(message.into())
    }

    /// Create a model unavailable error.
    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable(message.into())
    }

    /// Create an invalid dataset error.
    pub fn invalid_dataset(message: impl Into<String>) -> Self {
        Self::InvalidDataset(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True for errors caused by the input rather than by this process.
    ///
    /// Service boundaries report these as client errors.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            MediaError::NoFaceDetected
                | MediaError::SourceUnreadable { .. }
                | MediaError::Image(_)
                | MediaError::InvalidStride(_)
        )
    }
}
