//! Model training
//!
//! Splits a dataset into train and holdout partitions, fits the selected
//! estimator, scores it on the holdout and persists it through the
//! [`ModelStore`](crate::store::ModelStore).

mod estimator;
mod forest;
mod linear;
mod metrics;

pub use estimator::{Estimator, Regressor};
pub use forest::{ForestParams, RandomForestModel};
pub use linear::{LinearBasis, LinearModel};
pub use metrics::{mean_squared_error, r2_score, train_holdout_split};

use crate::error::Result;
use crate::models::{ModelMetrics, ModelType, Scenario, TrainingReport};
use crate::simulation::{Dataset, DatasetBuilder, SimulationConfig, DEFAULT_DATA_PATH};
use crate::store::{ModelStore, DEFAULT_MODEL_PATH};
use chrono::{DateTime, Utc};
use ndarray::arr2;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Default fraction of samples withheld for scoring
pub const DEFAULT_HOLDOUT_FRACTION: f64 = 0.2;

/// Default seed for the train/holdout shuffle
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Configuration for the model trainer
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Dataset location, generated on demand when missing
    pub data_path: PathBuf,
    /// Model artifact location
    pub model_path: PathBuf,
    /// Settings used when the dataset has to be generated
    pub simulation: SimulationConfig,
    pub holdout_fraction: f64,
    pub split_seed: u64,
    pub linear_basis: LinearBasis,
    pub forest: ForestParams,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            simulation: SimulationConfig::default(),
            holdout_fraction: DEFAULT_HOLDOUT_FRACTION,
            split_seed: DEFAULT_SPLIT_SEED,
            linear_basis: LinearBasis::default(),
            forest: ForestParams::default(),
        }
    }
}

/// A fitted estimator with its holdout metrics
#[derive(Debug, Clone)]
pub struct TrainedModel {
    estimator: Estimator,
    metrics: ModelMetrics,
    train_samples: usize,
    holdout_samples: usize,
    trained_at: DateTime<Utc>,
}

impl TrainedModel {
    pub(crate) fn from_parts(
        estimator: Estimator,
        metrics: ModelMetrics,
        train_samples: usize,
        holdout_samples: usize,
        trained_at: DateTime<Utc>,
    ) -> Self {
        Self {
            estimator,
            metrics,
            train_samples,
            holdout_samples,
            trained_at,
        }
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    pub fn model_type(&self) -> ModelType {
        self.estimator.model_type()
    }

    pub fn metrics(&self) -> ModelMetrics {
        self.metrics
    }

    pub fn train_samples(&self) -> usize {
        self.train_samples
    }

    pub fn holdout_samples(&self) -> usize {
        self.holdout_samples
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Raw estimator output in seconds for one scenario
    pub fn predict(&self, scenario: &Scenario) -> Result<f64> {
        let row = arr2(&[scenario.features()]);
        let output = self.estimator.predict(&row)?;
        Ok(output[0])
    }

    pub fn report(&self) -> TrainingReport {
        TrainingReport {
            status: "success".to_string(),
            model_type: self.model_type(),
            r2_score: self.metrics.r2_score,
            mse: self.metrics.mse,
            train_samples: self.train_samples,
            holdout_samples: self.holdout_samples,
            trained_at: self.trained_at,
        }
    }
}

/// Fits, scores and persists wait time models
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    config: TrainerConfig,
    store: ModelStore,
    builder: DatasetBuilder,
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        let store = ModelStore::new(config.model_path.clone());
        let builder = DatasetBuilder::new(config.simulation.clone());
        Self {
            config,
            store,
            builder,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Parse `model_type` and train. Unknown names fail before any data is touched.
    pub fn train_named(&self, model_type: &str, dataset: Option<Dataset>) -> Result<TrainedModel> {
        let model_type: ModelType = model_type.parse()?;
        self.train(model_type, dataset)
    }

    /// Train on `dataset`, or on the persisted dataset (generated if absent),
    /// then persist the fitted model over the previous one.
    pub fn train(&self, model_type: ModelType, dataset: Option<Dataset>) -> Result<TrainedModel> {
        let model = self.fit(model_type, dataset)?;
        self.store.save(&model)?;
        Ok(model)
    }

    /// Fit and score without persisting anything
    pub fn fit(&self, model_type: ModelType, dataset: Option<Dataset>) -> Result<TrainedModel> {
        let start = Instant::now();
        let dataset = match dataset {
            Some(dataset) => dataset,
            None => self.builder.load_or_generate(&self.config.data_path)?,
        };

        let (train_idx, holdout_idx) =
            train_holdout_split(dataset.len(), self.config.holdout_fraction, self.config.split_seed)?;
        let train = dataset.select(&train_idx);
        let holdout = dataset.select(&holdout_idx);
        debug!(
            model_type = %model_type,
            train_samples = train.len(),
            holdout_samples = holdout.len(),
            "Fitting estimator"
        );

        let mut estimator = Estimator::new(model_type, self.config.linear_basis, &self.config.forest);
        estimator.fit(&train.features(), &train.targets())?;

        let actual = holdout.targets();
        let predicted = estimator.predict(&holdout.features())?;
        let metrics = ModelMetrics {
            r2_score: r2_score(&actual, &predicted),
            mse: mean_squared_error(&actual, &predicted),
        };

        let model = TrainedModel::from_parts(estimator, metrics, train.len(), holdout.len(), Utc::now());

        info!(
            model_type = %model_type,
            r2_score = metrics.r2_score,
            mse = metrics.mse,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Model fitted"
        );
        Ok(model)
    }
}
