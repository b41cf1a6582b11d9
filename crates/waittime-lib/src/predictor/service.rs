//! Lazily trained wait time predictor
//!
//! The live model sits behind a read-write lock as an `Arc`, so readers clone
//! it and never wait on training. Loading and training both go through a
//! single async mutex: concurrent callers that find no model queue on it and
//! re-check once they hold it, so only the first one does any work.
//!
//! A run that outlives the training timeout cannot be cancelled. Its caller
//! gets `TrainingTimeout`, the gate stays held until the blocking task
//! returns, and the abandoned result is never persisted or published.

use super::vision::{PeopleCounter, DEFAULT_MAX_PEOPLE};
use crate::error::{PredictorError, Result};
use crate::health::{HealthResponse, ModelPhase};
use crate::models::{
    ModelType, PredictionRequest, PredictionResult, Scenario, TrainingReport, DEFAULT_ARRIVAL_RATE,
};
use crate::observability::{PredictorMetrics, StructuredLogger};
use crate::training::{ModelTrainer, TrainedModel, TrainerConfig};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

/// Upper bound on a single load or training run
pub const DEFAULT_TRAINING_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for the predictor service
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    pub trainer: TrainerConfig,
    pub training_timeout: Duration,
    /// Trained when a prediction arrives and no model is persisted
    pub fallback_model_type: ModelType,
    /// Cap applied to people counts from images
    pub max_people: u32,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            trainer: TrainerConfig::default(),
            training_timeout: DEFAULT_TRAINING_TIMEOUT,
            fallback_model_type: ModelType::Linear,
            max_people: DEFAULT_MAX_PEOPLE,
        }
    }
}

/// Counters since process start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictorStats {
    pub training_runs: u64,
    pub predictions_served: u64,
}

/// Serves wait time predictions, loading or training a model on first use
pub struct WaitTimePredictor {
    config: PredictorConfig,
    trainer: Arc<ModelTrainer>,
    model: RwLock<Option<Arc<TrainedModel>>>,
    /// Single-flight gate for loading and training
    gate: Arc<Mutex<()>>,
    metrics: PredictorMetrics,
    logger: StructuredLogger,
    training_runs: AtomicU64,
    predictions_served: AtomicU64,
}

impl WaitTimePredictor {
    pub fn new(config: PredictorConfig) -> Self {
        let trainer = Arc::new(ModelTrainer::new(config.trainer.clone()));
        Self {
            config,
            trainer,
            model: RwLock::new(None),
            gate: Arc::new(Mutex::new(())),
            metrics: PredictorMetrics::new(),
            logger: StructuredLogger::new("wait-time-predictor"),
            training_runs: AtomicU64::new(0),
            predictions_served: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn stats(&self) -> PredictorStats {
        PredictorStats {
            training_runs: self.training_runs.load(Ordering::Relaxed),
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
        }
    }

    /// The model currently serving predictions, if any
    pub async fn current_model(&self) -> Option<Arc<TrainedModel>> {
        self.model.read().await.clone()
    }

    pub async fn phase(&self) -> ModelPhase {
        if self.gate.try_lock().is_err() {
            return ModelPhase::Loading;
        }
        if self.model.read().await.is_some() {
            ModelPhase::Loaded
        } else {
            ModelPhase::Unloaded
        }
    }

    /// Report whether a model is loaded. Never loads or trains.
    pub async fn health(&self) -> HealthResponse {
        HealthResponse::from_model_loaded(self.model.read().await.is_some())
    }

    /// Load or train the model ahead of the first request
    pub async fn warm_up(&self) -> Result<()> {
        self.ensure_loaded().await.map(|_| ())
    }

    /// Return the live model, loading the persisted one or training a
    /// fallback when none is loaded.
    ///
    /// Failures other than a timeout surface as `ModelUnavailable` and leave
    /// the predictor unloaded, so the next call tries again.
    pub async fn ensure_loaded(&self) -> Result<Arc<TrainedModel>> {
        if let Some(model) = self.current_model().await {
            return Ok(model);
        }

        let mut gate = Some(Arc::clone(&self.gate).lock_owned().await);
        // Another caller may have finished loading while we waited
        if let Some(model) = self.current_model().await {
            return Ok(model);
        }

        match self.load_or_train(&mut gate).await {
            Ok(model) => {
                self.publish(Arc::clone(&model)).await;
                Ok(model)
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "No model available, will retry on next request");
                Err(match e {
                    PredictorError::TrainingTimeout(_) => e,
                    other => PredictorError::ModelUnavailable(other.to_string()),
                })
            }
        }
    }

    /// Predict the wait time for a request, training a model first if needed
    pub async fn predict(&self, request: PredictionRequest) -> Result<PredictionResult> {
        let start = Instant::now();
        let outcome = self.predict_request(request).await;
        match &outcome {
            Ok(_) => self
                .metrics
                .observe_prediction_latency(start.elapsed().as_secs_f64()),
            Err(e) => {
                self.metrics.inc_prediction_errors();
                debug!(error = %e, "Prediction failed");
            }
        }
        outcome
    }

    async fn predict_request(&self, request: PredictionRequest) -> Result<PredictionResult> {
        let scenario = request.into_scenario()?;
        let model = self.ensure_loaded().await?;
        let raw = model.predict(&scenario)?;

        let result = PredictionResult::from_raw(&scenario, raw);
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        self.metrics.inc_predictions();
        self.logger.log_prediction(&result, model.model_type());
        Ok(result)
    }

    /// Predict from an image, using the people count as the queue size
    pub async fn predict_from_image(
        &self,
        counter: &dyn PeopleCounter,
        image: &[u8],
        avg_service_time: f64,
        arrival_rate: Option<f64>,
    ) -> Result<PredictionResult> {
        if image.is_empty() {
            return Err(PredictorError::invalid("image is empty"));
        }
        // Reject bad scalars before paying for detection
        Scenario::new(1, avg_service_time, arrival_rate.unwrap_or(DEFAULT_ARRIVAL_RATE))?;

        let detected = counter.count_people(image).await.map_err(|e| match e {
            PredictorError::PeopleCountFailed(_) => e,
            other => PredictorError::PeopleCountFailed(other.to_string()),
        })?;
        let queue_size = detected.min(self.config.max_people);
        if queue_size < detected {
            debug!(detected, cap = self.config.max_people, "People count capped");
        }

        self.predict(PredictionRequest {
            queue_size: i64::from(queue_size),
            avg_service_time,
            arrival_rate,
        })
        .await
    }

    /// Retrain with the named model type and swap it in on success.
    ///
    /// The previous model keeps serving while training runs and stays live
    /// if training fails.
    pub async fn train(&self, model_type: &str) -> Result<TrainingReport> {
        let model_type: ModelType = model_type.parse()?;
        self.train_model(model_type).await
    }

    pub async fn train_model(&self, model_type: ModelType) -> Result<TrainingReport> {
        let mut gate = Some(Arc::clone(&self.gate).lock_owned().await);
        let model = self.run_training(model_type, false, &mut gate).await?;
        let report = model.report();
        self.publish(model).await;
        Ok(report)
    }

    async fn load_or_train(&self, gate: &mut Option<OwnedMutexGuard<()>>) -> Result<Arc<TrainedModel>> {
        let store = self.trainer.store().clone();
        let path = store.path().display().to_string();

        if let Some(model) = self.run_blocking(gate, move |_| store.load()).await? {
            self.logger.log_model_loaded(model.model_type(), &path);
            return Ok(Arc::new(model));
        }

        info!(
            path = %path,
            model_type = %self.config.fallback_model_type,
            "No persisted model, training one"
        );
        self.run_training(self.config.fallback_model_type, true, gate)
            .await
    }

    async fn run_training(
        &self,
        model_type: ModelType,
        implicit: bool,
        gate: &mut Option<OwnedMutexGuard<()>>,
    ) -> Result<Arc<TrainedModel>> {
        let trainer = Arc::clone(&self.trainer);
        let limit = self.config.training_timeout;
        let start = Instant::now();
        let outcome = self
            .run_blocking(gate, move |abandoned| {
                let model = trainer.fit(model_type, None)?;
                if abandoned.load(Ordering::Acquire) {
                    return Err(PredictorError::TrainingTimeout(limit));
                }
                trainer.store().save(&model)?;
                Ok(model)
            })
            .await;
        let elapsed = start.elapsed().as_secs_f64();

        match outcome {
            Ok(model) => {
                self.training_runs.fetch_add(1, Ordering::Relaxed);
                self.metrics.inc_training_runs();
                self.metrics.observe_training_duration(elapsed);
                self.logger
                    .log_model_trained(model_type, model.metrics(), elapsed, implicit);
                Ok(Arc::new(model))
            }
            Err(e) => {
                self.logger
                    .log_training_failed(model_type, e.kind(), &e.to_string());
                Err(e)
            }
        }
    }

    /// Run CPU-bound work on the blocking pool, bounded by the training timeout.
    ///
    /// On timeout `work` sees its flag raised and the gate guard moves to a
    /// task that releases it once the blocking call returns.
    async fn run_blocking<T, F>(&self, gate: &mut Option<OwnedMutexGuard<()>>, work: F) -> Result<T>
    where
        F: FnOnce(&AtomicBool) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let limit = self.config.training_timeout;
        let abandoned = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&abandoned);
        let mut handle = tokio::task::spawn_blocking(move || work(&flag));

        match tokio::time::timeout(limit, &mut handle).await {
            Err(_) => {
                abandoned.store(true, Ordering::Release);
                if let Some(guard) = gate.take() {
                    tokio::spawn(async move {
                        let _ = handle.await;
                        drop(guard);
                        debug!("Abandoned background task finished, gate released");
                    });
                }
                Err(PredictorError::TrainingTimeout(limit))
            }
            Ok(Err(join_error)) => Err(PredictorError::TrainingFailed(format!(
                "background task failed: {}",
                join_error
            ))),
            Ok(Ok(result)) => result,
        }
    }

    async fn publish(&self, model: Arc<TrainedModel>) {
        self.metrics.set_model(model.model_type(), model.metrics());
        *self.model.write().await = Some(model);
    }
}
