//! Persisted model artifact
//!
//! The artifact is a JSON envelope around the serialized estimator. The
//! envelope carries the model type, holdout metrics, the feature column order
//! used at training time, and a SHA-256 checksum of the estimator payload.
//! A load fails if any of these disagree with what inference expects.

use crate::error::{PredictorError, Result};
use crate::models::{ModelMetrics, ModelType, FEATURE_COLUMNS};
use crate::storage::write_atomic;
use crate::training::{Estimator, TrainedModel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default location of the persisted model
pub const DEFAULT_MODEL_PATH: &str = "models/wait_time_model.json";

const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ModelArtifact {
    format_version: u32,
    model_type: ModelType,
    metrics: ModelMetrics,
    feature_columns: Vec<String>,
    train_samples: usize,
    holdout_samples: usize,
    trained_at: DateTime<Utc>,
    /// SHA-256 of `estimator`
    checksum: String,
    /// Serialized [`Estimator`]
    estimator: String,
}

/// Reads and atomically replaces the single live model artifact
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Persist `model`, replacing any previous artifact only once the write is complete
    pub fn save(&self, model: &TrainedModel) -> Result<()> {
        let estimator = serde_json::to_string(model.estimator())
            .map_err(|e| PredictorError::storage(&self.path, format!("failed to encode estimator: {}", e)))?;

        let artifact = ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_type: model.model_type(),
            metrics: model.metrics(),
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            train_samples: model.train_samples(),
            holdout_samples: model.holdout_samples(),
            trained_at: model.trained_at(),
            checksum: compute_checksum(estimator.as_bytes()),
            estimator,
        };
        let bytes = serde_json::to_vec_pretty(&artifact)
            .map_err(|e| PredictorError::storage(&self.path, format!("failed to encode artifact: {}", e)))?;

        write_atomic(&self.path, &bytes)?;
        info!(
            path = %self.path.display(),
            model_type = %artifact.model_type,
            checksum = %artifact.checksum,
            size = bytes.len(),
            "Model saved"
        );
        Ok(())
    }

    /// Load the persisted model. `Ok(None)` means no artifact exists yet.
    pub fn load(&self) -> Result<Option<TrainedModel>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No persisted model");
                return Ok(None);
            }
            Err(e) => {
                return Err(PredictorError::storage(&self.path, format!("failed to read model: {}", e)))
            }
        };

        let artifact: ModelArtifact = serde_json::from_slice(&bytes)
            .map_err(|e| PredictorError::storage(&self.path, format!("malformed model artifact: {}", e)))?;
        self.verify(&artifact)?;

        let estimator: Estimator = serde_json::from_str(&artifact.estimator)
            .map_err(|e| PredictorError::storage(&self.path, format!("malformed estimator: {}", e)))?;
        if estimator.model_type() != artifact.model_type {
            return Err(PredictorError::storage(
                &self.path,
                format!(
                    "artifact tagged {} but estimator is {}",
                    artifact.model_type,
                    estimator.model_type()
                ),
            ));
        }

        info!(
            path = %self.path.display(),
            model_type = %artifact.model_type,
            r2_score = artifact.metrics.r2_score,
            "Model loaded"
        );
        Ok(Some(TrainedModel::from_parts(
            estimator,
            artifact.metrics,
            artifact.train_samples,
            artifact.holdout_samples,
            artifact.trained_at,
        )))
    }

    fn verify(&self, artifact: &ModelArtifact) -> Result<()> {
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PredictorError::storage(
                &self.path,
                format!("unsupported artifact version {}", artifact.format_version),
            ));
        }
        if artifact.feature_columns.iter().map(String::as_str).ne(FEATURE_COLUMNS) {
            return Err(PredictorError::storage(
                &self.path,
                format!(
                    "feature order mismatch: artifact {:?}, expected {:?}",
                    artifact.feature_columns, FEATURE_COLUMNS
                ),
            ));
        }
        let computed = compute_checksum(artifact.estimator.as_bytes());
        if computed != artifact.checksum {
            return Err(PredictorError::storage(
                &self.path,
                format!("checksum mismatch: expected {}, got {}", artifact.checksum, computed),
            ));
        }
        Ok(())
    }
}

/// Compute SHA256 checksum of data
fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
