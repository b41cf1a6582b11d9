//! Regression estimator capability and its variants

use super::forest::{ForestParams, RandomForestModel};
use super::linear::{LinearBasis, LinearModel};
use crate::error::{PredictorError, Result};
use crate::models::{ModelType, FEATURE_COLUMNS};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Fit on a feature matrix, then predict one value per row
pub trait Regressor {
    fn fit(&mut self, features: &Array2<f64>, targets: &Array1<f64>) -> Result<()>;

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>>;
}

/// Estimator selected by [`ModelType`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "model_type", rename_all = "snake_case")]
pub enum Estimator {
    Linear(LinearModel),
    RandomForest(RandomForestModel),
}

impl Estimator {
    /// Unfitted estimator for `model_type`
    pub fn new(model_type: ModelType, linear_basis: LinearBasis, forest: &ForestParams) -> Self {
        match model_type {
            ModelType::Linear => Estimator::Linear(LinearModel::new(linear_basis)),
            ModelType::RandomForest => Estimator::RandomForest(RandomForestModel::new(forest.clone())),
        }
    }

    pub fn model_type(&self) -> ModelType {
        match self {
            Estimator::Linear(_) => ModelType::Linear,
            Estimator::RandomForest(_) => ModelType::RandomForest,
        }
    }
}

impl Regressor for Estimator {
    fn fit(&mut self, features: &Array2<f64>, targets: &Array1<f64>) -> Result<()> {
        check_shape(features, Some(targets))?;
        match self {
            Estimator::Linear(m) => m.fit(features, targets),
            Estimator::RandomForest(m) => m.fit(features, targets),
        }
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        check_shape(features, None)?;
        match self {
            Estimator::Linear(m) => m.predict(features),
            Estimator::RandomForest(m) => m.predict(features),
        }
    }
}

fn check_shape(features: &Array2<f64>, targets: Option<&Array1<f64>>) -> Result<()> {
    if features.ncols() != FEATURE_COLUMNS.len() {
        return Err(PredictorError::invalid(format!(
            "expected {} feature columns, got {}",
            FEATURE_COLUMNS.len(),
            features.ncols()
        )));
    }
    if let Some(targets) = targets {
        if targets.len() != features.nrows() {
            return Err(PredictorError::invalid(format!(
                "{} feature rows but {} targets",
                features.nrows(),
                targets.len()
            )));
        }
        if features.nrows() == 0 {
            return Err(PredictorError::invalid("cannot fit on an empty dataset"));
        }
    }
    Ok(())
}
