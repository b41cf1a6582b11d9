//! Ground-truth wait time labels

use crate::error::{PredictorError, Result};
use crate::models::{LabeledSample, Scenario};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Default multiplicative noise (15% standard deviation)
pub const DEFAULT_NOISE_LEVEL: f64 = 0.15;

/// Serial service estimate: everyone ahead is served one after another
pub fn base_wait_time(scenario: &Scenario) -> f64 {
    scenario.queue_size as f64 * scenario.avg_service_time
}

/// Labels scenarios with `max(0, base * (1 + noise))`, `noise ~ N(0, noise_level)`
#[derive(Debug, Clone)]
pub struct LabelGenerator {
    noise: Normal<f64>,
}

impl LabelGenerator {
    pub fn new(noise_level: f64) -> Result<Self> {
        if !noise_level.is_finite() || noise_level < 0.0 {
            return Err(PredictorError::invalid(format!(
                "noise_level must be a finite non-negative number, got {}",
                noise_level
            )));
        }
        let noise = Normal::new(0.0, noise_level)
            .map_err(|e| PredictorError::invalid(format!("invalid noise level: {}", e)))?;
        Ok(Self { noise })
    }

    pub fn label<R: Rng + ?Sized>(&self, scenario: &Scenario, rng: &mut R) -> f64 {
        let noise = self.noise.sample(rng);
        label_with_noise(scenario, noise)
    }

    /// Label every scenario in order from a single seeded stream
    pub fn label_all(&self, scenarios: &[Scenario], seed: u64) -> Vec<LabeledSample> {
        let mut rng = StdRng::seed_from_u64(seed);
        scenarios
            .iter()
            .map(|s| LabeledSample::new(*s, self.label(s, &mut rng)))
            .collect()
    }
}

fn label_with_noise(scenario: &Scenario, noise: f64) -> f64 {
    (base_wait_time(scenario) * (1.0 + noise)).max(0.0)
}
