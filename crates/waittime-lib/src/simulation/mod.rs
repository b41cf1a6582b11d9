//! Synthetic queue data generation
//!
//! Draws queueing scenarios, labels them with a noisy serial-service wait
//! time, and assembles them into a persisted tabular dataset.

mod dataset;
mod labels;
mod sampler;

pub use dataset::{Dataset, DatasetBuilder, DEFAULT_DATA_PATH};
pub use labels::{base_wait_time, LabelGenerator, DEFAULT_NOISE_LEVEL};
pub use sampler::Sampler;

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};

/// Default number of samples per generated dataset
pub const DEFAULT_NUM_SAMPLES: usize = 300;

/// Default seed for dataset generation
pub const DEFAULT_SEED: u64 = 42;

/// Mixed into the dataset seed to derive the label generator's seed
const LABEL_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Ranges and sizes for synthetic data generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub num_samples: usize,
    pub seed: u64,
    pub min_queue_size: u32,
    pub max_queue_size: u32,
    /// Service time range in seconds, `[min, max)`
    pub min_service_time: f64,
    pub max_service_time: f64,
    /// Arrival rate range in people per minute, `[min, max)`
    pub min_arrival_rate: f64,
    pub max_arrival_rate: f64,
    /// Standard deviation of the multiplicative label noise
    pub noise_level: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_samples: DEFAULT_NUM_SAMPLES,
            seed: DEFAULT_SEED,
            min_queue_size: 1,
            max_queue_size: 200,
            min_service_time: 30.0,
            max_service_time: 300.0,
            min_arrival_rate: 0.5,
            max_arrival_rate: 10.0,
            noise_level: DEFAULT_NOISE_LEVEL,
        }
    }
}

impl SimulationConfig {
    /// Check that every range is non-empty and strictly positive
    pub fn validate(&self) -> Result<()> {
        if self.min_queue_size == 0 || self.min_queue_size > self.max_queue_size {
            return Err(PredictorError::invalid(format!(
                "queue size range [{}, {}] must be positive and non-empty",
                self.min_queue_size, self.max_queue_size
            )));
        }
        check_range("service time", self.min_service_time, self.max_service_time)?;
        check_range("arrival rate", self.min_arrival_rate, self.max_arrival_rate)?;
        if !self.noise_level.is_finite() || self.noise_level < 0.0 {
            return Err(PredictorError::invalid(format!(
                "noise_level must be a finite non-negative number, got {}",
                self.noise_level
            )));
        }
        Ok(())
    }

    /// Seed used by the label generator for this configuration
    pub fn label_seed(&self) -> u64 {
        self.seed ^ LABEL_SEED_SALT
    }
}

fn check_range(name: &str, low: f64, high: f64) -> Result<()> {
    if !(low.is_finite() && high.is_finite()) || low <= 0.0 || low >= high {
        return Err(PredictorError::invalid(format!(
            "{} range [{}, {}) must be positive and non-empty",
            name, low, high
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_samples, 300);
        assert_eq!(config.max_queue_size, 200);
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let config = SimulationConfig {
            min_service_time: 300.0,
            max_service_time: 30.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            min_queue_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_noise() {
        let config = SimulationConfig {
            noise_level: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
