//! Observability infrastructure for the wait time predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, training duration, holdout scores)
//! - Structured JSON logging with tracing

use crate::models::{ModelMetrics, ModelType, PredictionResult};
use prometheus::{
    register_gauge, register_gauge_vec, register_histogram, register_int_counter, Gauge, GaugeVec,
    Histogram, IntCounter,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Training runs take seconds, not milliseconds
const TRAINING_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PredictorMetricsInner> = OnceLock::new();

struct PredictorMetricsInner {
    prediction_latency_seconds: Histogram,
    training_duration_seconds: Histogram,
    predictions_served: IntCounter,
    training_runs: IntCounter,
    prediction_errors: IntCounter,
    model_r2_score: Gauge,
    model_mse: Gauge,
    model_info: GaugeVec,
}

impl PredictorMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "wait_time_prediction_latency_seconds",
                "Time spent serving a wait time prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            training_duration_seconds: register_histogram!(
                "wait_time_training_duration_seconds",
                "Wall time of a model training run",
                TRAINING_BUCKETS.to_vec()
            )
            .expect("Failed to register training_duration_seconds"),

            predictions_served: register_int_counter!(
                "wait_time_predictions_total",
                "Total number of predictions served"
            )
            .expect("Failed to register predictions_total"),

            training_runs: register_int_counter!(
                "wait_time_training_runs_total",
                "Total number of completed training runs"
            )
            .expect("Failed to register training_runs_total"),

            prediction_errors: register_int_counter!(
                "wait_time_prediction_errors_total",
                "Total number of failed prediction requests"
            )
            .expect("Failed to register prediction_errors_total"),

            model_r2_score: register_gauge!(
                "wait_time_model_r2_score",
                "Holdout R² of the live model"
            )
            .expect("Failed to register model_r2_score"),

            model_mse: register_gauge!(
                "wait_time_model_mse",
                "Holdout mean squared error of the live model"
            )
            .expect("Failed to register model_mse"),

            model_info: register_gauge_vec!(
                "wait_time_model_info",
                "Information about the currently loaded model",
                &["model_type"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Predictor metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct PredictorMetrics {
    _private: (),
}

impl Default for PredictorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PredictorMetricsInner {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn observe_training_duration(&self, duration_secs: f64) {
        self.inner().training_duration_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_served.inc();
    }

    pub fn inc_training_runs(&self) {
        self.inner().training_runs.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    pub fn prediction_errors(&self) -> u64 {
        self.inner().prediction_errors.get()
    }

    /// Publish the live model's type and holdout scores
    pub fn set_model(&self, model_type: ModelType, metrics: ModelMetrics) {
        let inner = self.inner();
        inner.model_r2_score.set(metrics.r2_score);
        inner.model_mse.set(metrics.mse);
        // Reset previous model type
        inner.model_info.reset();
        inner
            .model_info
            .with_label_values(&[model_type.as_str()])
            .set(1.0);
    }
}

/// Structured logger for predictor events
///
/// Every record carries an `event` field so log pipelines can filter on it.
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn log_startup(&self, version: &str, model_path: &str) {
        info!(
            event = "service_started",
            service = %self.service_name,
            version = %version,
            model_path = %model_path,
            "Wait time predictor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service_name,
            reason = %reason,
            "Wait time predictor shutting down"
        );
    }

    pub fn log_model_trained(
        &self,
        model_type: ModelType,
        metrics: ModelMetrics,
        duration_secs: f64,
        implicit: bool,
    ) {
        info!(
            event = "model_trained",
            service = %self.service_name,
            model_type = %model_type,
            r2_score = metrics.r2_score,
            mse = metrics.mse,
            duration_secs = duration_secs,
            implicit = implicit,
            "Model training completed"
        );
    }

    pub fn log_training_failed(&self, model_type: ModelType, kind: &str, details: &str) {
        warn!(
            event = "model_training_failed",
            service = %self.service_name,
            model_type = %model_type,
            error_kind = %kind,
            details = %details,
            "Model training failed, keeping previous model"
        );
    }

    pub fn log_model_loaded(&self, model_type: ModelType, path: &str) {
        info!(
            event = "model_loaded",
            service = %self.service_name,
            model_type = %model_type,
            path = %path,
            "Persisted model loaded"
        );
    }

    pub fn log_prediction(&self, result: &PredictionResult, model_type: ModelType) {
        info!(
            event = "prediction_served",
            service = %self.service_name,
            queue_size = result.queue_size,
            avg_service_time = result.avg_service_time,
            arrival_rate = result.arrival_rate,
            predicted_wait_time_seconds = result.predicted_wait_time_seconds,
            model_type = %model_type,
            "Served wait time prediction"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predictor_metrics_creation() {
        // Registration is global, so every handle shares one set of metrics
        let metrics = PredictorMetrics::new();
        let other = PredictorMetrics::new();

        metrics.observe_prediction_latency(0.002);
        metrics.observe_training_duration(1.5);
        metrics.inc_predictions();
        other.inc_training_runs();
        other.inc_prediction_errors();
        metrics.set_model(
            ModelType::RandomForest,
            ModelMetrics {
                r2_score: 0.9,
                mse: 12.0,
            },
        );

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "wait_time_model_info"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-service");
        assert_eq!(logger.service_name(), "test-service");
    }
}
