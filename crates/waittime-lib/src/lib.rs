//! Wait time prediction library
//!
//! This crate provides the core functionality for:
//! - Synthetic queue data generation
//! - Regression training (linear and random forest) with holdout scoring
//! - Model persistence with integrity checks
//! - A lazily trained predictor service
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod simulation;
pub mod storage;
pub mod store;
pub mod training;

pub use error::{PredictorError, Result};
pub use health::{HealthResponse, HealthStatus, ModelPhase};
pub use models::*;
pub use observability::{PredictorMetrics, StructuredLogger};
pub use predictor::{PeopleCounter, PredictorConfig, WaitTimePredictor};
pub use store::ModelStore;
pub use training::{ModelTrainer, TrainedModel, TrainerConfig};
