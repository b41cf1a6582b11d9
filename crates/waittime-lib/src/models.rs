//! Core data models for the wait time predictor

use crate::error::{PredictorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Arrival rate assumed when a request omits it (people per minute)
pub const DEFAULT_ARRIVAL_RATE: f64 = 2.0;

/// Feature columns in the order fed to every estimator, at training and inference
pub const FEATURE_COLUMNS: [&str; 3] = ["queue_size", "avg_service_time", "arrival_rate"];

/// Target column of the dataset
pub const TARGET_COLUMN: &str = "wait_time_seconds";

/// One synthetic or requested queueing situation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub queue_size: u32,
    /// Seconds to serve one person
    pub avg_service_time: f64,
    /// People arriving per minute
    pub arrival_rate: f64,
}

impl Scenario {
    /// Build a scenario, rejecting non-positive or non-finite values
    pub fn new(queue_size: u32, avg_service_time: f64, arrival_rate: f64) -> Result<Self> {
        if queue_size == 0 {
            return Err(PredictorError::invalid("queue_size must be greater than 0"));
        }
        check_positive("avg_service_time", avg_service_time)?;
        check_positive("arrival_rate", arrival_rate)?;
        Ok(Self {
            queue_size,
            avg_service_time,
            arrival_rate,
        })
    }

    /// Feature vector in `FEATURE_COLUMNS` order
    pub fn features(&self) -> [f64; 3] {
        [
            self.queue_size as f64,
            self.avg_service_time,
            self.arrival_rate,
        ]
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PredictorError::invalid(format!(
            "{} must be a finite number greater than 0, got {}",
            name, value
        )));
    }
    Ok(())
}

/// A scenario with its generated ground-truth wait time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub queue_size: u32,
    pub avg_service_time: f64,
    pub arrival_rate: f64,
    pub wait_time_seconds: f64,
}

impl LabeledSample {
    pub fn new(scenario: Scenario, wait_time_seconds: f64) -> Self {
        Self {
            queue_size: scenario.queue_size,
            avg_service_time: scenario.avg_service_time,
            arrival_rate: scenario.arrival_rate,
            wait_time_seconds,
        }
    }

    pub fn scenario(&self) -> Scenario {
        Scenario {
            queue_size: self.queue_size,
            avg_service_time: self.avg_service_time,
            arrival_rate: self.arrival_rate,
        }
    }
}

/// Estimator family selected at training time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Least squares fitted in log space by default: `ln(1 + wait)` against
    /// the logarithms of the features. See [`LinearBasis`](crate::training::LinearBasis)
    /// for the raw-column fit.
    #[default]
    Linear,
    /// Bagged regression trees on the raw features
    RandomForest,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Linear => "linear",
            ModelType::RandomForest => "random_forest",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = PredictorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(ModelType::Linear),
            "random_forest" => Ok(ModelType::RandomForest),
            other => Err(PredictorError::invalid(format!(
                "model_type must be 'linear' or 'random_forest', got '{}'",
                other
            ))),
        }
    }
}

/// Incoming prediction parameters, validated into a [`Scenario`]
///
/// `queue_size` is signed so that zero and negative inputs reach validation
/// and come back as `InvalidArgument` rather than a decode failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub queue_size: i64,
    pub avg_service_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_rate: Option<f64>,
}

impl PredictionRequest {
    pub fn into_scenario(self) -> Result<Scenario> {
        if self.queue_size <= 0 {
            return Err(PredictorError::invalid(format!(
                "queue_size must be greater than 0, got {}",
                self.queue_size
            )));
        }
        let queue_size = u32::try_from(self.queue_size).map_err(|_| {
            PredictorError::invalid(format!("queue_size {} is too large", self.queue_size))
        })?;
        Scenario::new(
            queue_size,
            self.avg_service_time,
            self.arrival_rate.unwrap_or(DEFAULT_ARRIVAL_RATE),
        )
    }
}

/// Predicted wait time plus the scenario it was computed for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_wait_time_seconds: f64,
    pub predicted_wait_time_minutes: f64,
    pub queue_size: u32,
    pub avg_service_time: f64,
    pub arrival_rate: f64,
}

impl PredictionResult {
    /// Build a result from a raw estimator output, floored at zero and rounded to 2 decimals
    pub fn from_raw(scenario: &Scenario, raw_seconds: f64) -> Self {
        let seconds = if raw_seconds.is_finite() {
            raw_seconds.max(0.0)
        } else {
            0.0
        };
        Self {
            predicted_wait_time_seconds: round2(seconds),
            predicted_wait_time_minutes: round2(seconds / 60.0),
            queue_size: scenario.queue_size,
            avg_service_time: scenario.avg_service_time,
            arrival_rate: scenario.arrival_rate,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Holdout metrics of a fitted estimator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub r2_score: f64,
    pub mse: f64,
}

/// Outcome of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub status: String,
    pub model_type: ModelType,
    pub r2_score: f64,
    pub mse: f64,
    pub train_samples: usize,
    pub holdout_samples: usize,
    pub trained_at: DateTime<Utc>,
}
