//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use waittime_lib::{
    predictor::PredictorConfig,
    simulation::{SimulationConfig, DEFAULT_DATA_PATH, DEFAULT_NUM_SAMPLES, DEFAULT_SEED},
    store::DEFAULT_MODEL_PATH,
    training::TrainerConfig,
    ModelType,
};

/// Environment variable prefix, e.g. `WAITTIME_API_PORT`
const ENV_PREFIX: &str = "WAITTIME";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name attached to structured log records
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// HTTP port for the prediction API
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Dataset CSV, generated on first training when missing
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Persisted model artifact
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Rows generated when the dataset is missing
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Upper bound on a single training run in seconds
    #[serde(default = "default_training_timeout")]
    pub training_timeout_secs: u64,

    /// Model type trained when a request arrives and none is persisted
    #[serde(default = "default_fallback_model_type")]
    pub fallback_model_type: String,

    /// Load or train the model in the background at startup
    #[serde(default = "default_warm_start")]
    pub warm_start: bool,

    /// Cap on people counted in an uploaded image
    #[serde(default = "default_max_people")]
    pub max_people: u32,

    /// Detection service that counts people in images. Image predictions
    /// are refused when unset.
    #[serde(default)]
    pub people_counter_url: Option<String>,
}

fn default_service_name() -> String {
    "wait-time-predictor".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

fn default_num_samples() -> usize {
    DEFAULT_NUM_SAMPLES
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_training_timeout() -> u64 {
    120
}

fn default_fallback_model_type() -> String {
    ModelType::Linear.to_string()
}

fn default_warm_start() -> bool {
    true
}

fn default_max_people() -> u32 {
    500
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            api_port: default_api_port(),
            data_path: default_data_path(),
            model_path: default_model_path(),
            num_samples: default_num_samples(),
            seed: default_seed(),
            training_timeout_secs: default_training_timeout(),
            fallback_model_type: default_fallback_model_type(),
            warm_start: default_warm_start(),
            max_people: default_max_people(),
            people_counter_url: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `WAITTIME_*` environment variables
    pub fn load() -> Result<Self> {
        Self::from_source(None)
    }

    /// Load from an explicit variable map instead of the process environment
    pub fn from_env_map(vars: HashMap<String, String>) -> Result<Self> {
        Self::from_source(Some(vars))
    }

    fn from_source(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(vars),
            )
            .build()
            .context("failed to read configuration")?;

        config
            .try_deserialize()
            .context("invalid WAITTIME_* configuration")
    }

    pub fn training_timeout(&self) -> Duration {
        Duration::from_secs(self.training_timeout_secs)
    }

    /// Build the predictor configuration, validating what serde cannot
    pub fn predictor_config(&self) -> Result<PredictorConfig> {
        let fallback_model_type: ModelType = self
            .fallback_model_type
            .parse()
            .context("invalid WAITTIME_FALLBACK_MODEL_TYPE")?;
        if self.training_timeout_secs == 0 {
            anyhow::bail!("WAITTIME_TRAINING_TIMEOUT_SECS must be greater than 0");
        }
        if self.num_samples < 2 {
            anyhow::bail!("WAITTIME_NUM_SAMPLES must be at least 2 to split for training");
        }

        let simulation = SimulationConfig {
            num_samples: self.num_samples,
            seed: self.seed,
            ..Default::default()
        };
        simulation
            .validate()
            .context("invalid simulation settings")?;

        Ok(PredictorConfig {
            trainer: TrainerConfig {
                data_path: self.data_path.clone(),
                model_path: self.model_path.clone(),
                simulation,
                ..Default::default()
            },
            training_timeout: self.training_timeout(),
            fallback_model_type,
            max_people: self.max_people,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = ServerConfig::from_env_map(HashMap::new()).unwrap();
        assert_eq!(config.api_port, 8000);
        assert_eq!(config.num_samples, 300);
        assert_eq!(config.seed, 42);
        assert_eq!(config.training_timeout(), Duration::from_secs(120));
        assert!(config.warm_start);
        assert!(config.people_counter_url.is_none());
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn test_prefixed_variables_override() {
        let config = ServerConfig::from_env_map(vars(&[
            ("WAITTIME_API_PORT", "9100"),
            ("WAITTIME_MODEL_PATH", "/var/lib/wtp/model.json"),
            ("WAITTIME_WARM_START", "false"),
            ("WAITTIME_FALLBACK_MODEL_TYPE", "random_forest"),
        ]))
        .unwrap();

        assert_eq!(config.api_port, 9100);
        assert_eq!(config.model_path, PathBuf::from("/var/lib/wtp/model.json"));
        assert!(!config.warm_start);

        let predictor = config.predictor_config().unwrap();
        assert_eq!(predictor.fallback_model_type, ModelType::RandomForest);
        assert_eq!(
            predictor.trainer.model_path,
            PathBuf::from("/var/lib/wtp/model.json")
        );
    }

    #[test]
    fn test_bad_model_type_rejected() {
        let config = ServerConfig {
            fallback_model_type: "svm".to_string(),
            ..Default::default()
        };
        assert!(config.predictor_config().is_err());
    }

    #[test]
    fn test_too_few_samples_rejected() {
        let config = ServerConfig {
            num_samples: 1,
            ..Default::default()
        };
        assert!(config.predictor_config().is_err());
    }
}
