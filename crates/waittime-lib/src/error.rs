//! Error taxonomy for the wait time predictor
//!
//! Every failure crossing the library boundary maps to one of these kinds.
//! The HTTP layer relies on `kind()` being stable.

use std::path::PathBuf;
use std::time::Duration;

/// Errors surfaced by simulation, training, persistence and prediction
#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    /// Bad ranges, bad types, or an unknown model type. Raised before any work starts.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Dataset or model artifact could not be read or written
    #[error("storage error at {path}: {message}")]
    Storage { path: PathBuf, message: String },

    /// No model is loaded and fallback training failed
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// A training run did not finish within the configured bound
    #[error("training did not complete within {0:?}")]
    TrainingTimeout(Duration),

    /// The numeric backend rejected the fit
    #[error("training failed: {0}")]
    TrainingFailed(String),

    /// The external people counter could not produce a count
    #[error("people count failed: {0}")]
    PeopleCountFailed(String),
}

impl PredictorError {
    pub fn invalid(message: impl Into<String>) -> Self {
        PredictorError::InvalidArgument(message.into())
    }

    pub fn storage(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        PredictorError::Storage {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            PredictorError::InvalidArgument(_) => "invalid_argument",
            PredictorError::Storage { .. } => "storage_error",
            PredictorError::ModelUnavailable(_) => "model_unavailable",
            PredictorError::TrainingTimeout(_) => "training_timeout",
            PredictorError::TrainingFailed(_) => "training_failed",
            PredictorError::PeopleCountFailed(_) => "people_count_failed",
        }
    }
}

pub type Result<T, E = PredictorError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(PredictorError::invalid("x").kind(), "invalid_argument");
        assert_eq!(PredictorError::storage("/tmp/x", "denied").kind(), "storage_error");
        assert_eq!(
            PredictorError::TrainingTimeout(Duration::from_secs(1)).kind(),
            "training_timeout"
        );
    }

    #[test]
    fn test_storage_message_includes_path() {
        let err = PredictorError::storage("/data/queue.csv", "permission denied");
        let msg = err.to_string();
        assert!(msg.contains("/data/queue.csv"));
        assert!(msg.contains("permission denied"));
    }
}
