//! Tabular dataset assembly and CSV persistence

use super::{LabelGenerator, Sampler, SimulationConfig};
use crate::error::{PredictorError, Result};
use crate::models::{LabeledSample, Scenario, FEATURE_COLUMNS, TARGET_COLUMN};
use crate::storage::write_atomic;
use ndarray::{Array1, Array2};
use std::path::Path;
use tracing::{debug, info};

/// Default location of the generated dataset
pub const DEFAULT_DATA_PATH: &str = "data/queue_data.csv";

/// Ordered, immutable collection of labeled samples
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    samples: Vec<LabeledSample>,
}

impl Dataset {
    pub fn new(samples: Vec<LabeledSample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[LabeledSample] {
        &self.samples
    }

    /// Feature matrix with one row per sample, columns in `FEATURE_COLUMNS` order
    pub fn features(&self) -> Array2<f64> {
        let mut features = Array2::zeros((self.samples.len(), FEATURE_COLUMNS.len()));
        for (mut row, sample) in features.rows_mut().into_iter().zip(&self.samples) {
            for (cell, value) in row.iter_mut().zip(sample.scenario().features()) {
                *cell = value;
            }
        }
        features
    }

    pub fn targets(&self) -> Array1<f64> {
        self.samples.iter().map(|s| s.wait_time_seconds).collect()
    }

    /// New dataset holding the samples at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset::new(indices.iter().map(|&i| self.samples[i]).collect())
    }

    /// Serialize as CSV with a single header row
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for sample in &self.samples {
            writer
                .serialize(sample)
                .map_err(|e| PredictorError::storage("<memory>", format!("failed to encode row: {}", e)))?;
        }
        writer
            .into_inner()
            .map_err(|e| PredictorError::storage("<memory>", format!("failed to flush csv: {}", e)))
    }

    /// Write the dataset to `path`, replacing any existing file
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_csv_bytes()?;
        write_atomic(path, &bytes)?;
        info!(path = %path.display(), rows = self.len(), "Queue data saved");
        Ok(())
    }

    /// Read a dataset back, checking the header and every row's invariants
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| PredictorError::storage(path, format!("failed to open dataset: {}", e)))?;

        let headers = reader
            .headers()
            .map_err(|e| PredictorError::storage(path, format!("failed to read header: {}", e)))?;
        let expected: Vec<&str> = FEATURE_COLUMNS.iter().copied().chain([TARGET_COLUMN]).collect();
        if headers.iter().collect::<Vec<_>>() != expected {
            return Err(PredictorError::storage(
                path,
                format!("unexpected header {:?}, expected {:?}", headers, expected),
            ));
        }

        let mut samples = Vec::new();
        for (row, record) in reader.deserialize::<LabeledSample>().enumerate() {
            let sample = record
                .map_err(|e| PredictorError::storage(path, format!("row {}: {}", row + 1, e)))?;
            validate_sample(&sample)
                .map_err(|e| PredictorError::storage(path, format!("row {}: {}", row + 1, e)))?;
            samples.push(sample);
        }

        debug!(path = %path.display(), rows = samples.len(), "Loaded queue data");
        Ok(Self { samples })
    }
}

fn validate_sample(sample: &LabeledSample) -> Result<()> {
    Scenario::new(sample.queue_size, sample.avg_service_time, sample.arrival_rate)?;
    if !sample.wait_time_seconds.is_finite() || sample.wait_time_seconds < 0.0 {
        return Err(PredictorError::invalid(format!(
            "wait_time_seconds must be finite and non-negative, got {}",
            sample.wait_time_seconds
        )));
    }
    Ok(())
}

/// Runs the sampler and label generator to produce a dataset
#[derive(Debug, Clone, Default)]
pub struct DatasetBuilder {
    config: SimulationConfig,
}

impl DatasetBuilder {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn build(&self) -> Result<Dataset> {
        let sampler = Sampler::new(&self.config)?;
        let labels = LabelGenerator::new(self.config.noise_level)?;
        let scenarios = sampler.sample(self.config.num_samples, self.config.seed)?;
        Ok(Dataset::new(
            labels.label_all(&scenarios, self.config.label_seed()),
        ))
    }

    /// Build a fresh dataset and write it to `path`, overwriting what was there
    pub fn build_and_save(&self, path: &Path) -> Result<Dataset> {
        let dataset = self.build()?;
        dataset.save(path)?;
        Ok(dataset)
    }

    /// Load the dataset at `path`, generating and saving one if the file is absent
    pub fn load_or_generate(&self, path: &Path) -> Result<Dataset> {
        if path.exists() {
            info!(path = %path.display(), "Loading queue data");
            Dataset::load(path)
        } else {
            info!(path = %path.display(), "Queue data not found, generating");
            self.build_and_save(path)
        }
    }
}
