//! Uniform scenario sampling

use super::SimulationConfig;
use crate::error::{PredictorError, Result};
use crate::models::Scenario;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};

/// Draws independent scenarios from uniform distributions over the configured ranges
#[derive(Debug, Clone)]
pub struct Sampler {
    queue_size: Uniform<u32>,
    service_time: Uniform<f64>,
    arrival_rate: Uniform<f64>,
}

impl Sampler {
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            queue_size: Uniform::new_inclusive(config.min_queue_size, config.max_queue_size),
            service_time: Uniform::new(config.min_service_time, config.max_service_time),
            arrival_rate: Uniform::new(config.min_arrival_rate, config.max_arrival_rate),
        })
    }

    /// Draw `count` scenarios. The same seed always yields the same sequence.
    pub fn sample(&self, count: usize, seed: u64) -> Result<Vec<Scenario>> {
        if count == 0 {
            return Err(PredictorError::invalid("sample count must be a positive integer"));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let scenarios = (0..count)
            .map(|_| Scenario {
                queue_size: self.queue_size.sample(&mut rng),
                avg_service_time: self.service_time.sample(&mut rng),
                arrival_rate: self.arrival_rate.sample(&mut rng),
            })
            .collect();
        Ok(scenarios)
    }
}
