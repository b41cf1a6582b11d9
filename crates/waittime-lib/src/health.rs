//! Health reporting for the predictor service
//!
//! The service is healthy exactly when a model is loaded. Computing the
//! response never loads or trains anything.

use serde::{Deserialize, Serialize};

/// Overall health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

/// Lifecycle of the live model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelPhase {
    /// Nothing loaded yet, or the last load attempt failed
    Unloaded,
    /// A load or training run holds the gate
    Loading,
    /// A model is serving predictions
    Loaded,
}

/// Health response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub model_loaded: bool,
}

impl HealthResponse {
    pub fn from_model_loaded(model_loaded: bool) -> Self {
        let status = if model_loaded {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };
        Self {
            status,
            model_loaded,
        }
    }
}
