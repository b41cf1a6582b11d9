//! Ordinary least squares via linfa-linear
//!
//! With the default [`LinearBasis::Log`] the model regresses `ln(1 + y)` on the
//! logarithms of the features, so a multiplicative relation such as
//! `queue_size * avg_service_time` becomes linear and is recovered exactly.
//! [`LinearBasis::Identity`] fits the raw columns.

use super::estimator::Regressor;
use crate::error::{PredictorError, Result};
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Space in which the least-squares fit is performed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearBasis {
    Identity,
    #[default]
    Log,
}

impl LinearBasis {
    fn features(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        match self {
            LinearBasis::Identity => Ok(features.to_owned()),
            LinearBasis::Log => {
                if features.iter().any(|v| !(*v > 0.0)) {
                    return Err(PredictorError::invalid(
                        "log-basis linear model needs strictly positive features",
                    ));
                }
                Ok(features.mapv(f64::ln))
            }
        }
    }

    fn targets(&self, targets: &Array1<f64>) -> Array1<f64> {
        match self {
            LinearBasis::Identity => targets.to_owned(),
            LinearBasis::Log => targets.mapv(|y| y.max(0.0).ln_1p()),
        }
    }

    fn invert(&self, output: Array1<f64>) -> Array1<f64> {
        match self {
            LinearBasis::Identity => output,
            LinearBasis::Log => output.mapv(f64::exp_m1),
        }
    }
}

/// Fitted linear model, stored as plain weights so it serializes cleanly
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearModel {
    basis: LinearBasis,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    pub fn new(basis: LinearBasis) -> Self {
        Self {
            basis,
            ..Default::default()
        }
    }

    pub fn basis(&self) -> LinearBasis {
        self.basis
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    fn is_fitted(&self) -> bool {
        !self.coefficients.is_empty()
    }
}

impl Regressor for LinearModel {
    fn fit(&mut self, features: &Array2<f64>, targets: &Array1<f64>) -> Result<()> {
        let dataset = Dataset::new(self.basis.features(features)?, self.basis.targets(targets));
        let fitted = LinearRegression::new()
            .fit(&dataset)
            .map_err(|e| PredictorError::TrainingFailed(format!("linear regression: {}", e)))?;

        let coefficients = fitted.params().to_vec();
        let intercept = fitted.intercept();
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(PredictorError::TrainingFailed(
                "linear regression produced non-finite weights".to_string(),
            ));
        }

        self.coefficients = coefficients;
        self.intercept = intercept;
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted() {
            return Err(PredictorError::ModelUnavailable(
                "linear model has not been fitted".to_string(),
            ));
        }
        let weights = Array1::from_vec(self.coefficients.clone());
        let output = self.basis.features(features)?.dot(&weights) + self.intercept;
        Ok(self.basis.invert(output))
    }
}
