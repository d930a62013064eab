use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for the prediction demo.
///
/// Each variant captures the context of its error domain (filesystem, image
/// decoding/encoding, model loading and execution, input validation) so
/// callers never have to parse error strings. Failures are local to one
/// pipeline run: a rejected stage halts that run and nothing is written.
#[derive(Error, Debug)]
pub enum InferVizError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image processing error: {operation} failed (file: {path})")]
    ImageProcessing {
        path: String,
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Model error: {operation} failed")]
    Model {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {field} {reason}")]
    Validation { field: String, reason: String },
}

pub type Result<T> = std::result::Result<T, InferVizError>;

impl InferVizError {
    /// Caller contract violations (wrong rank, wrong channel count, index out
    /// of range). These fail fast rather than silently reshaping.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Dependencies that report through anyhow lose their structure at our
/// boundary; they surface as configuration errors.
impl From<anyhow::Error> for InferVizError {
    fn from(err: anyhow::Error) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}

/// Fallback for I/O errors without path/operation context. Code that has the
/// context should construct `InferVizError::FileSystem` directly.
impl From<std::io::Error> for InferVizError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

impl From<image::ImageError> for InferVizError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageProcessing {
            path: "unknown".to_string(),
            operation: "image processing".to_string(),
            source: Box::new(err),
        }
    }
}

impl From<ort::Error> for InferVizError {
    fn from(err: ort::Error) -> Self {
        Self::Model {
            operation: "ort operation".to_string(),
            source: Box::new(err),
        }
    }
}

/// Shape errors occur while wiring tensors into or out of the session, so
/// they live in the model category rather than a separate tensor variant.
impl From<ndarray::ShapeError> for InferVizError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Model {
            operation: "tensor shape conversion".to_string(),
            source: Box::new(err),
        }
    }
}

/// Topology manifests and label files are JSON; parse failures mean the
/// uploaded bundle is unusable, so they land in the model category.
impl From<serde_json::Error> for InferVizError {
    fn from(err: serde_json::Error) -> Self {
        Self::Model {
            operation: "JSON parsing".to_string(),
            source: Box::new(err),
        }
    }
}
